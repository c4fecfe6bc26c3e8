//! quill-trigger — HTTP trigger for Quill pages.
//!
//! Each inbound request gets its own [`ResponseBuffer`] over a
//! [`MemoryTransport`]. The page handler runs inside [`run_page`], and the
//! outcome is converted into an HTTP response:
//!
//! ```text
//! HTTP client
//!   │
//!   ▼
//! hyper server
//!   │
//!   ├── build PageRequest, fresh ResponseBuffer<MemoryTransport>
//!   ├── run_page(handler)        (blocking pool)
//!   │     ├── Finished       → 200 + headers + Set-Cookie + body
//!   │     ├── Redirected(to) → 3xx + Location, no body
//!   │     └── Err(e)         → 500
//!   ▼
//! HTTP response
//! ```
//!
//! [`ResponseBuffer`]: quill_response::ResponseBuffer
//! [`MemoryTransport`]: quill_response::MemoryTransport
//! [`run_page`]: quill_response::run_page

pub mod convert;
pub mod handler;

pub use handler::{HttpTrigger, PageHandler, PageRequest, TriggerOptions};
