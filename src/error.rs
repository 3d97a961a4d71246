//! Error types for the datasource gateway
//!
//! This module defines the error hierarchy for the whole gateway.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Each variant maps one-to-one onto an HTTP status and, for the
//! redirect-based authorization flow, onto a `response_status` code.

use thiserror::Error;

/// Why an authorization state token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// Malformed request input (bad identifier, missing parameter)
    Request,
    /// State token failed signature or structure checks
    InvalidState,
    /// State token is past its expiry
    ExpiredState,
    /// State token was already consumed
    ReplayedState,
}

impl ValidationKind {
    /// Code used in redirect URLs and JSON error bodies
    pub fn code(self) -> &'static str {
        match self {
            ValidationKind::Request => "invalid_request",
            ValidationKind::InvalidState => "invalid_state",
            ValidationKind::ExpiredState => "expired_state",
            ValidationKind::ReplayedState => "replayed_state",
        }
    }
}

/// The main error type for the gateway
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Lookup Errors
    // ============================================================================
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error("Unsupported authentication for datasource '{datasource}': {message}")]
    UnsupportedAuth { datasource: String, message: String },

    #[error("Validation failed: {message}")]
    Validation {
        kind: ValidationKind,
        message: String,
    },

    // ============================================================================
    // Collaborator Errors
    // ============================================================================
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("OAuth2 provider error: {message}")]
    Provider { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a not-found error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an unsupported-auth error
    pub fn unsupported_auth(datasource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedAuth {
            datasource: datasource.into(),
            message: message.into(),
        }
    }

    /// Create a request validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            kind: ValidationKind::Request,
            message: message.into(),
        }
    }

    /// Create a state token validation error
    pub fn state(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::UnsupportedAuth { .. } | Error::Validation { .. } => 400,
            Error::Connection { .. } | Error::Provider { .. } => 502,
            Error::Transport { .. } => 504,
            _ => 500,
        }
    }

    /// Stable machine-readable code, used as the `response_status` of
    /// authorization redirects and in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::UnsupportedAuth { .. } => "unsupported_auth",
            Error::Validation { kind, .. } => kind.code(),
            Error::Connection { .. } => "connection_error",
            Error::Provider { .. } => "provider_error",
            Error::Transport { .. } => "transport_error",
            _ => "internal_error",
        }
    }
}

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
