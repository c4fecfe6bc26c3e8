//! Output routing and the stack of capture buffers.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cookie::{Cookie, CookieOptions};
use crate::error::{PageResult, Redirect, ResponseError, ResponseResult};
use crate::transport::Transport;
use crate::value::ScriptValue;

pub const LINE_TERMINATOR: &str = "\r\n";

/// Request-scoped response object exposed to page code.
///
/// Text written through [`write`](Self::write) goes to the innermost frame
/// pushed with [`push`](Self::push), or straight to the transport when no
/// frame is active. [`pop`](Self::pop) removes the innermost frame and
/// returns everything written while it was on top, in write order.
///
/// # Concurrency
///
/// The frame stack and the transport each sit behind a `std::sync::Mutex`
/// so the object is `Sync` and every stack mutation is atomic. Lock order
/// is always frames → transport. No lock is held while page code runs, so
/// nested page code may call back into the same object freely.
pub struct ResponseBuffer<T> {
    transport: Mutex<T>,
    frames: Mutex<FrameStack>,
}

/// Capture frames, each tagged with an id so a [`FrameGuard`] only ever
/// releases the frame it pushed.
#[derive(Default)]
struct FrameStack {
    frames: Vec<Frame>,
    next_id: u64,
}

struct Frame {
    id: u64,
    text: String,
}

impl FrameStack {
    fn push(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.frames.push(Frame {
            id,
            text: String::new(),
        });
        id
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.frames.iter().rposition(|frame| frame.id == id)
    }

    fn len(&self) -> usize {
        self.frames.len()
    }
}

impl<T: Transport> ResponseBuffer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            frames: Mutex::new(FrameStack::default()),
        }
    }

    fn frames(&self) -> MutexGuard<'_, FrameStack> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the values space-separated, without a terminator.
    pub fn write<V: fmt::Display>(&self, values: &[V]) -> ResponseResult<()> {
        self.write_str(&join(values, ""))
    }

    /// Write the values space-separated, followed by `\r\n`.
    pub fn writeln<V: fmt::Display>(&self, values: &[V]) -> ResponseResult<()> {
        self.write_str(&join(values, LINE_TERMINATOR))
    }

    /// Send raw text to the current sink.
    pub fn write_str(&self, text: &str) -> ResponseResult<()> {
        let mut frames = self.frames();
        if let Some(top) = frames.frames.last_mut() {
            top.text.push_str(text);
            return Ok(());
        }

        let mut transport = self.lock_transport();
        transport.write_stream()?.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Start capturing output in a new innermost frame.
    pub fn push(&self) {
        let mut frames = self.frames();
        frames.push();
        tracing::debug!(depth = frames.len(), "response buffer pushed");
    }

    /// Remove the innermost frame and return its text.
    pub fn pop(&self) -> ResponseResult<String> {
        let mut frames = self.frames();
        let text = frames.frames.pop().ok_or(ResponseError::EmptyStack)?.text;
        tracing::debug!(depth = frames.len(), bytes = text.len(), "response buffer popped");
        Ok(text)
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames().len()
    }

    /// Push a frame that is released when the guard drops.
    ///
    /// Call [`FrameGuard::finish`] to pop it and keep the text. If the guard
    /// is dropped instead (early return, `?` on an error or redirect) the
    /// frame and anything pushed above it are discarded. A frame that was
    /// already popped by hand is never replaced by whatever sits at its old
    /// depth.
    pub fn scope(&self) -> FrameGuard<'_, T> {
        let (id, depth) = {
            let mut frames = self.frames();
            let id = frames.push();
            (id, frames.len())
        };
        tracing::debug!(depth, "response buffer scope opened");
        FrameGuard {
            buffer: self,
            id,
            finished: false,
        }
    }

    /// Drop every active frame, returning how many there were.
    pub fn clear_frames(&self) -> usize {
        let mut frames = self.frames();
        let open = frames.len();
        frames.frames.clear();
        open
    }

    /// Abort page generation and ask the host to redirect to `target`.
    ///
    /// Always returns `Err`, so page code writes `res.redirect("/login")?;`.
    pub fn redirect<R>(&self, target: impl Into<String>) -> PageResult<R> {
        let redirect = Redirect::new(target);
        tracing::debug!(location = redirect.target(), depth = self.depth(), "redirect requested");
        Err(redirect.into())
    }

    pub fn set_cookie(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        options: CookieOptions,
    ) -> ResponseResult<()> {
        self.append_cookie(Cookie::build(name, value, options)?);
        Ok(())
    }

    /// Script form: `setCookie(name, value[, days[, path[, domain]]])`.
    pub fn set_cookie_args(&self, args: &[ScriptValue]) -> ResponseResult<()> {
        self.append_cookie(Cookie::from_script_args(args)?);
        Ok(())
    }

    fn append_cookie(&self, cookie: Cookie) {
        tracing::debug!(
            name = %cookie.name,
            max_age = ?cookie.max_age,
            path = %cookie.path,
            "appending cookie"
        );
        self.lock_transport().append_cookie(cookie);
    }

    pub fn content_type(&self) -> Option<String> {
        self.lock_transport().content_type()
    }

    pub fn set_content_type(&self, content_type: &str) {
        self.lock_transport().set_content_type(content_type);
    }

    /// Run `f` against the raw transport.
    ///
    /// `f` must not call back into this `ResponseBuffer`.
    pub fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut transport = self.lock_transport();
        f(&mut *transport)
    }

    /// Recover the transport once the request is done. Open frames are lost.
    pub fn into_transport(self) -> T {
        self.transport
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn join<V: fmt::Display>(values: &[V], terminator: &str) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing into a String cannot fail.
        let _ = fmt::Write::write_fmt(&mut out, format_args!("{value}"));
    }
    out.push_str(terminator);
    out
}

/// A frame pushed by [`ResponseBuffer::scope`].
pub struct FrameGuard<'a, T: Transport> {
    buffer: &'a ResponseBuffer<T>,
    id: u64,
    finished: bool,
}

impl<T: Transport> FrameGuard<'_, T> {
    /// Pop the guarded frame and return its text.
    ///
    /// Fails with [`ResponseError::EmptyStack`] if the frame was already
    /// popped by hand, or with `InvalidArguments` if frames pushed later are
    /// still open on top of it. The stack is left untouched on failure.
    pub fn finish(mut self) -> ResponseResult<String> {
        self.finished = true;
        let mut frames = self.buffer.frames();
        let position = frames.position(self.id).ok_or(ResponseError::EmptyStack)?;
        let above = frames.len() - position - 1;
        if above > 0 {
            return Err(ResponseError::InvalidArguments(format!(
                "{above} frame(s) still open above scope at depth {}",
                position + 1
            )));
        }
        let text = frames.frames.pop().map(|frame| frame.text).unwrap_or_default();
        tracing::debug!(depth = frames.len(), bytes = text.len(), "response buffer scope finished");
        Ok(text)
    }
}

impl<T: Transport> Drop for FrameGuard<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut frames = self.buffer.frames();
        if let Some(position) = frames.position(self.id) {
            let discarded = frames.len() - position;
            frames.frames.truncate(position);
            tracing::debug!(discarded, depth = frames.len(), "response buffer scope released");
        }
    }
}
