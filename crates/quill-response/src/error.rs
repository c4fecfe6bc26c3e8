//! Error and interrupt types for response generation.

use std::fmt;

use thiserror::Error;

/// Result type alias for response operations that can only fail.
pub type ResponseResult<T> = Result<T, ResponseError>;

/// Result type alias for page code, which can fail or redirect.
pub type PageResult<T = ()> = Result<T, Abort>;

/// Errors that can occur while generating a response.
///
/// Everything except [`ResponseError::Transport`] is a precondition
/// violation by the caller and leaves the buffer stack untouched.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("buffer stack is empty: pop() without a matching push()")]
    EmptyStack,

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("expected {expected} as argument {position}, got {found}")]
    ArgumentType {
        /// 1-indexed argument position.
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{class} has no member named {name:?}")]
    UnknownMember { class: &'static str, name: String },

    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
}

impl ResponseError {
    /// Whether this error is a caller mistake rather than a transport failure.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, ResponseError::Transport(_))
    }
}

/// Request to abandon the current response and redirect the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    target: String,
}

impl Redirect {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn into_target(self) -> String {
        self.target
    }
}

/// Reasons page code stops before finishing normally.
///
/// `Redirect` is not a failure. It unwinds through every layer of page
/// code exactly like an error so that `?` carries it to the request
/// boundary, but the boundary answers it with a redirect response.
#[derive(Debug)]
pub enum Abort {
    Redirect(Redirect),
    Failed(ResponseError),
}

impl Abort {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Abort::Redirect(_))
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Abort::Redirect(r) => Some(r.target()),
            Abort::Failed(_) => None,
        }
    }
}

impl From<ResponseError> for Abort {
    fn from(err: ResponseError) -> Self {
        Abort::Failed(err)
    }
}

impl From<Redirect> for Abort {
    fn from(redirect: Redirect) -> Self {
        Abort::Redirect(redirect)
    }
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Abort::Redirect(r) => write!(f, "redirect to {}", r.target()),
            Abort::Failed(e) => write!(f, "{e}"),
        }
    }
}
