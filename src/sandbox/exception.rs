//! Errors raised while a snippet runs.

use crate::error::Fault;
use std::fmt;

/// Error categories, named the way learners will meet them in other tutorials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorType {
    ImportError,
    NameError,
    UnboundLocalError,
    TypeError,
    ValueError,
    ZeroDivisionError,
    IndexError,
    KeyError,
    AttributeError,
    OverflowError,
    RecursionError,
    MemoryError,
    TimeoutError,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A raised error, tagged with the line of the statement that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Exception {
    pub(crate) kind: ErrorType,
    pub(crate) message: String,
    pub(crate) line: Option<u32>,
}

pub(crate) type Raised<T> = Result<T, Exception>;

impl Exception {
    pub(crate) fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorType::TypeError, message)
    }

    pub(crate) fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorType::ValueError, message)
    }

    pub(crate) fn name_error(name: &str) -> Self {
        Self::new(ErrorType::NameError, format!("name '{name}' is not defined"))
    }

    pub(crate) fn zero_division(message: &str) -> Self {
        Self::new(ErrorType::ZeroDivisionError, message)
    }

    pub(crate) fn overflow() -> Self {
        Self::new(
            ErrorType::OverflowError,
            "integer result does not fit in 64 bits",
        )
    }

    /// Keep the innermost line: a fault inside a function body reports the
    /// body line, not the call site.
    pub(crate) fn at_line(mut self, line: u32) -> Self {
        self.line.get_or_insert(line);
        self
    }

    pub(crate) fn into_fault(self) -> Fault {
        Fault::runtime(self.to_string())
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;

    #[test]
    fn test_display_with_line() {
        let exc = Exception::name_error("eval").at_line(3);
        assert_eq!(exc.to_string(), "NameError: name 'eval' is not defined (line 3)");
    }

    #[test]
    fn test_innermost_line_wins() {
        let exc = Exception::overflow().at_line(5).at_line(1);
        assert_eq!(exc.line, Some(5));
    }

    #[test]
    fn test_into_fault() {
        let fault = Exception::zero_division("division by zero").into_fault();
        assert_eq!(fault.kind, FaultKind::RuntimeFault);
        assert_eq!(fault.message, "ZeroDivisionError: division by zero");
    }
}
