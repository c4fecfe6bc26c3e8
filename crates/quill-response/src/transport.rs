//! The host-side response primitives a [`ResponseBuffer`] drives.
//!
//! [`ResponseBuffer`]: crate::ResponseBuffer

use std::io;

use crate::cookie::Cookie;

pub const CONTENT_TYPE: &str = "Content-Type";

/// Native response object supplied by the host for one request.
///
/// A transport is owned exclusively by a single `ResponseBuffer` for the
/// lifetime of one request and must not be shared across requests.
pub trait Transport: Send {
    /// The response body sink.
    ///
    /// Repeated calls return the same logical stream. Fails once the host
    /// has finalized the response.
    fn write_stream(&mut self) -> io::Result<&mut dyn io::Write>;

    /// Drop any body bytes written so far that have not been sent.
    fn discard_output(&mut self);

    fn header(&self, name: &str) -> Option<String>;

    fn set_header(&mut self, name: &str, value: &str);

    fn append_cookie(&mut self, cookie: Cookie);

    fn content_type(&self) -> Option<String> {
        self.header(CONTENT_TYPE)
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.set_header(CONTENT_TYPE, content_type);
    }
}
