//! The request boundary: where redirect interrupts stop unwinding.

use crate::buffer::ResponseBuffer;
use crate::error::{Abort, PageResult, ResponseResult};
use crate::transport::Transport;

/// How page code ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The page ran to the end; the transport holds the response.
    Finished,
    /// The page asked for a redirect. Body output has been discarded.
    Redirected(String),
}

/// Run page code against `response` and settle how it ended.
///
/// Frames left open by the page are dropped in every case. On redirect the
/// transport's unsent body is discarded so none of the aborted output
/// reaches the client. Failures are returned as-is for the host to report.
pub fn run_page<T, F>(response: &ResponseBuffer<T>, page: F) -> ResponseResult<Completion>
where
    T: Transport,
    F: FnOnce(&ResponseBuffer<T>) -> PageResult,
{
    let outcome = page(response);
    let open = response.clear_frames();

    match outcome {
        Ok(()) => {
            if open > 0 {
                tracing::warn!(open, "page finished with unpopped response buffers; discarding");
            }
            Ok(Completion::Finished)
        }
        Err(Abort::Redirect(redirect)) => {
            response.with_transport(|t| t.discard_output());
            tracing::debug!(location = redirect.target(), open, "page redirected");
            Ok(Completion::Redirected(redirect.into_target()))
        }
        Err(Abort::Failed(err)) => {
            tracing::warn!(error = %err, open, "page failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResponseError;
    use crate::memory::MemoryTransport;

    #[test]
    fn finished_page_keeps_body() {
        let res = ResponseBuffer::new(MemoryTransport::new());
        let completion = run_page(&res, |res| {
            res.write(&["done"])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(completion, Completion::Finished);
        assert_eq!(res.into_transport().body(), b"done");
    }

    #[test]
    fn redirect_discards_output_and_frames() {
        let res = ResponseBuffer::new(MemoryTransport::new());
        let completion = run_page(&res, |res| {
            res.write(&["partial"])?;
            res.push();
            res.push();
            res.write(&["buffered"])?;
            res.redirect("/x")
        })
        .unwrap();
        assert_eq!(completion, Completion::Redirected("/x".to_string()));
        assert_eq!(res.depth(), 0);
        assert!(res.into_transport().body().is_empty());
    }

    #[test]
    fn failure_is_returned_and_frames_cleared() {
        let res = ResponseBuffer::new(MemoryTransport::new());
        let err = run_page(&res, |res| {
            res.push();
            res.pop()?;
            res.pop()?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ResponseError::EmptyStack));
        assert_eq!(res.depth(), 0);
    }

    #[test]
    fn unpopped_frames_are_not_flushed() {
        let res = ResponseBuffer::new(MemoryTransport::new());
        run_page(&res, |res| {
            res.write(&["visible"])?;
            res.push();
            res.write(&["never popped"])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(res.into_transport().body(), b"visible");
    }
}
