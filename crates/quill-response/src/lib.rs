//! quill-response — the scriptable, buffer-capable response object.
//!
//! A [`ResponseBuffer`] sits between page code and the host's native
//! response (the [`Transport`]). Page code writes text, sets cookies and
//! the content type, and may abort generation with a redirect:
//!
//! ```text
//! page code
//!   │ write / writeln
//!   ▼
//! ResponseBuffer ── frames non-empty ──▶ top frame (String)
//!   │
//!   └── frames empty ──▶ Transport::write_stream()
//! ```
//!
//! Output can be captured with [`ResponseBuffer::push`] /
//! [`ResponseBuffer::pop`], which lets layout code render fragments out of
//! order without threading buffers through unrelated code.
//!
//! # Redirects
//!
//! [`ResponseBuffer::redirect`] never returns normally. It yields
//! [`Abort::Redirect`], which every layer propagates with `?` until
//! [`run_page`] converts it into [`Completion::Redirected`]. Frames opened
//! with [`ResponseBuffer::scope`] are released on the way out.

mod boundary;
mod buffer;
mod cookie;
mod error;
mod header;
mod host;
mod memory;
mod transport;
mod value;

pub use boundary::{run_page, Completion};
pub use buffer::{FrameGuard, ResponseBuffer, LINE_TERMINATOR};
pub use cookie::{Cookie, CookieOptions, DEFAULT_COOKIE_PATH, SECONDS_PER_DAY};
pub use error::{Abort, PageResult, Redirect, ResponseError, ResponseResult};
pub use header::{Header, HeaderMap};
pub use host::HostObject;
pub use memory::MemoryTransport;
pub use transport::{Transport, CONTENT_TYPE};
pub use value::ScriptValue;
