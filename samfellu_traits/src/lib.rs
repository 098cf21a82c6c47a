use bincode::Encode;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// The families of failures a samfellu run can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad option, invalid normalization, malformed color or size.
    Configuration,
    /// Missing, unreadable or undecodable input.
    Input,
    /// A pipeline stage was invoked before the one it depends on.
    Sequence,
    /// Writing the image, or the temporary storage between stages, failed.
    Output,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::Input => write!(f, "input error"),
            ErrorKind::Sequence => write!(f, "sequence error"),
            ErrorKind::Output => write!(f, "output error"),
        }
    }
}

/// Common samfellu Error type.
#[derive(Debug)]
pub struct SmfError {
    kind: ErrorKind,
    message: String,
    cause: Option<String>,
}

impl Display for SmfError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(c) => write!(f, "{}\n   cause: {}", self.message, c),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for SmfError {}

/// Plain strings are configuration problems unless said otherwise.
impl From<&str> for SmfError {
    fn from(s: &str) -> SmfError {
        SmfError::configuration(s)
    }
}

impl From<String> for SmfError {
    fn from(s: String) -> SmfError {
        SmfError::configuration(s)
    }
}

impl SmfError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> SmfError {
        SmfError {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> SmfError {
        SmfError::new(ErrorKind::Configuration, message)
    }

    pub fn input(message: impl Into<String>) -> SmfError {
        SmfError::new(ErrorKind::Input, message)
    }

    pub fn sequence(message: impl Into<String>) -> SmfError {
        SmfError::new(ErrorKind::Sequence, message)
    }

    pub fn output(message: impl Into<String>) -> SmfError {
        SmfError::new(ErrorKind::Output, message)
    }

    pub fn new_with_cause<E>(kind: ErrorKind, message: &str, cause: E) -> SmfError
    where
        E: Error,
    {
        SmfError {
            kind,
            message: message.to_string(),
            cause: Some(cause.to_string()),
        }
    }

    pub fn add_cause(mut self, cause: &str) -> SmfError {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// Generic Result type for samfellu.
pub type SmfResult<T> = Result<T, SmfError>;

/// Defines a basic write, append only stream trait to spill serializable objects.
pub trait WriteStream<E: Encode>: Debug {
    fn log(&mut self, obj: &E) -> SmfResult<()>;
    fn flush(&mut self) -> SmfResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_conversion_is_configuration() {
        let err: SmfError = "Wrong color \"#12\"".into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "Wrong color \"#12\"");
    }

    #[test]
    fn test_cause_is_displayed() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SmfError::new_with_cause(ErrorKind::Input, "Unable to open file", io);
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(err.to_string().contains("Unable to open file"));
        assert!(err.to_string().contains("gone"));

        let err = SmfError::sequence("too early").add_cause("parse first");
        assert_eq!(err.kind(), ErrorKind::Sequence);
        assert!(err.to_string().ends_with("parse first"));
    }
}
