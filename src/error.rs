// src/error.rs - Failures raised by the engine's infrastructure layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// The stores signal business outcomes (unknown id, duplicate email, bad
/// credentials) through `None`/`false` return values and never construct an
/// `Error` for them. Everything here belongs to the layers underneath:
/// storage backends, configuration loading, logging setup and manager
/// lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub severity: ErrorSeverity,
    /// Component that raised the error, when known.
    pub origin: Option<String>,
    /// Stringified underlying failure, when one exists.
    pub cause: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A configuration file could not be read or parsed.
    Configuration { key: Option<String> },
    /// A manager failed during a lifecycle transition.
    Manager {
        manager_name: String,
        operation: ManagerOperation,
    },
    /// The storage backend rejected an operation.
    Storage {
        key: Option<String>,
        operation: StorageOperation,
    },
    /// A value could not be encoded for persistence.
    Serialization,
    Io,
    Application,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagerOperation {
    Initialize,
    Shutdown,
    Operation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOperation {
    Read,
    Write,
    Delete,
    List,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: ErrorSeverity::Medium,
            origin: None,
            cause: None,
            timestamp: Utc::now(),
        }
    }

    /// Configuration failure. Always high severity: the engine cannot start
    /// from a config it cannot read.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration { key: None }, message)
            .severity(ErrorSeverity::High)
    }

    /// Lifecycle failure in the named manager.
    pub fn manager(
        manager_name: impl Into<String>,
        operation: ManagerOperation,
        message: impl Into<String>,
    ) -> Self {
        let name = manager_name.into();
        Self::new(
            ErrorKind::Manager {
                manager_name: name.clone(),
                operation,
            },
            message,
        )
        .severity(ErrorSeverity::High)
        .origin(name)
    }

    /// Backend failure on the given key.
    pub fn storage(
        key: impl Into<String>,
        operation: StorageOperation,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Storage {
                key: Some(key.into()),
                operation,
            },
            message,
        )
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn caused_by(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == ErrorSeverity::Critical
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(origin) = &self.origin {
            write!(f, " (in {})", origin)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string()).severity(ErrorSeverity::High)
    }
}

/// Context helpers for converting foreign errors at the boundary.
pub trait ResultExt<T> {
    /// Wraps the error with a message describing what was being attempted.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Wraps the error, tagging the component it came from.
    fn with_origin(self, origin: impl Into<String>) -> Result<T>;
}

impl<T, E: fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::new(ErrorKind::Application, f()).caused_by(e))
    }

    fn with_origin(self, origin: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            Error::new(ErrorKind::Application, e.to_string())
                .origin(origin)
                .caused_by(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let error = Error::config("unreadable configuration").origin("config");
        assert_eq!(error.severity, ErrorSeverity::High);
        assert!(matches!(error.kind, ErrorKind::Configuration { key: None }));
        assert!(!error.is_critical());
    }

    #[test]
    fn test_storage_error_carries_key_and_operation() {
        let error = Error::storage("allProducts", StorageOperation::Write, "disk full");
        match error.kind {
            ErrorKind::Storage { key, operation } => {
                assert_eq!(key.as_deref(), Some("allProducts"));
                assert_eq!(operation, StorageOperation::Write);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_manager_error_names_its_origin() {
        let error = Error::manager("catalog_manager", ManagerOperation::Initialize, "load failed");
        assert_eq!(error.origin.as_deref(), Some("catalog_manager"));
    }

    #[test]
    fn test_display_includes_origin_and_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = Error::config("cannot read config").origin("config").caused_by(io);
        let rendered = error.to_string();
        assert!(rendered.contains("cannot read config"));
        assert!(rendered.contains("(in config)"));
        assert!(rendered.contains("missing"));
    }

    #[test]
    fn test_with_context_wraps_foreign_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = std::result::Result::<(), _>::Err(io)
            .with_context(|| "reading persisted catalog".to_string())
            .unwrap_err();
        assert!(matches!(error.kind, ErrorKind::Application));
        assert_eq!(error.cause.as_deref(), Some("missing"));
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io.into();
        assert!(matches!(error.kind, ErrorKind::Io));
        assert_eq!(error.severity, ErrorSeverity::High);
    }
}
