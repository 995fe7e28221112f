use std::fmt;
use std::fmt::{Display, Formatter};

use crate::runner::ds::value::JsValue;

/// Errors raised while running code against the realm model.
///
/// The message-carrying variants are engine-raised errors that have not yet been
/// materialised as JS objects. `Exception` carries an arbitrary value thrown by
/// script (which may itself be an error object).
#[derive(Debug)]
pub enum JErrorType {
    ReferenceError(String),
    TypeError(String),
    RangeError(String),
    SyntaxError(String),
    Error(String),
    Exception(JsValue),
}
impl JErrorType {
    /// The error constructor this error materialises as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            JErrorType::ReferenceError(_) => ErrorKind::ReferenceError,
            JErrorType::TypeError(_) => ErrorKind::TypeError,
            JErrorType::RangeError(_) => ErrorKind::RangeError,
            JErrorType::SyntaxError(_) => ErrorKind::SyntaxError,
            JErrorType::Error(_) | JErrorType::Exception(_) => ErrorKind::Error,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m)
            | JErrorType::Error(m) => Some(m),
            JErrorType::Exception(_) => None,
        }
    }
}
impl Display for JErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JErrorType::ReferenceError(m) => write!(f, "Uncaught reference error: {}.", m),
            JErrorType::TypeError(m) => write!(f, "Uncaught type error: {}.", m),
            JErrorType::RangeError(m) => write!(f, "Uncaught range error: {}.", m),
            JErrorType::SyntaxError(m) => write!(f, "Uncaught syntax error: {}.", m),
            JErrorType::Error(m) => write!(f, "Uncaught error: {}.", m),
            JErrorType::Exception(v) => write!(f, "Uncaught {}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
}
impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }
}
