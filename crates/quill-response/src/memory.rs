//! In-memory [`Transport`] used by the HTTP trigger and by tests.

use std::io;

use bytes::Bytes;

use crate::cookie::Cookie;
use crate::header::HeaderMap;
use crate::transport::Transport;

/// A transport that collects headers, cookies and body bytes in memory.
///
/// Nothing reaches the client until the host converts the collected parts
/// into a wire response, so a redirect can still discard the body.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Vec<u8>,
    finalized: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the response as committed. Later writes fail.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (HeaderMap, Vec<Cookie>, Bytes) {
        (self.headers, self.cookies, Bytes::from(self.body))
    }
}

impl Transport for MemoryTransport {
    fn write_stream(&mut self) -> io::Result<&mut dyn io::Write> {
        if self.finalized {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response has already been finalized",
            ));
        }
        Ok(&mut self.body)
    }

    fn discard_output(&mut self) {
        self.body.clear();
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).map(str::to_string)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    fn append_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }
}
