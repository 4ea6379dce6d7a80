//! Errors generated by the compiler.
use thiserror::Error as ThisError;

/// Convinience wrapper to represent success or meaningul compiler error.
pub type ForgeResult<T> = std::result::Result<T, Error>;

/// Errors generated by the compiler. The kind is boxed so that results stay
/// small on the happy path.
pub struct Error {
    kind: Box<ErrorKind>,
    post_msg: Option<String>,
}

/// Standard error type for forge errors.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A query was handed a handle that does not belong to the design, or is
    /// of the wrong kind for the query.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The IR graph does not have the shape the analysis requires.
    #[error("Malformed structure: {0}")]
    MalformedStructure(String),
}

impl Error {
    pub fn invalid_argument<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::InvalidArgument(msg.to_string())),
            post_msg: None,
        }
    }

    pub fn malformed_structure<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::MalformedStructure(msg.to_string())),
            post_msg: None,
        }
    }

    /// Attach an additional note that is printed after the main message.
    pub fn with_post_msg(mut self, msg: Option<String>) -> Self {
        self.post_msg = msg;
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(post) = &self.post_msg {
            write!(f, "\n{post}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn display_includes_post_message() {
        let err = Error::invalid_argument("no such component `c7`")
            .with_post_msg(Some("tracker for `main` was deleted".into()));
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));
        assert_eq!(
            err.to_string(),
            "Invalid argument: no such component `c7`\n\
             tracker for `main` was deleted"
        );
    }
}
