//! Error types for the mobile end-to-end suite
//!
//! Only [`ConfigError`] and [`DriverInitError`] are meant to abort a scenario.
//! Element and gesture failures are recoverable at the call site, and
//! diagnostic failures are always logged and swallowed by the hooks.

use std::time::Duration;

use thiserror::Error;

use crate::platform::Platform;

// ----------------------------------------------------------------------------
// Transport / protocol errors
// ----------------------------------------------------------------------------

/// Errors raised while talking to the remote automation endpoint
#[derive(Error, Debug)]
pub enum WebDriverError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote endpoint returned {status}: {error}: {message}")]
    Protocol {
        status: u16,
        error: String,
        message: String,
    },

    #[error("No element matches {0}")]
    NoSuchElement(String),

    #[error("Element {0} is no longer attached to the screen")]
    StaleElement(String),

    #[error("Unexpected response payload: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Payload decoding failed: {0}")]
    Decode(String),

    #[error("Session {0} was already closed")]
    SessionClosed(String),
}

impl WebDriverError {
    /// Build from a W3C error object (`{"error": .., "message": ..}`)
    pub fn from_w3c(status: u16, error: &str, message: &str) -> Self {
        match error {
            "no such element" => WebDriverError::NoSuchElement(message.to_string()),
            "stale element reference" => WebDriverError::StaleElement(message.to_string()),
            _ => WebDriverError::Protocol {
                status,
                error: error.to_string(),
                message: message.to_string(),
            },
        }
    }

    pub fn is_no_such_element(&self) -> bool {
        matches!(self, WebDriverError::NoSuchElement(_))
    }
}

impl From<serde_json::Error> for WebDriverError {
    fn from(err: serde_json::Error) -> Self {
        WebDriverError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for WebDriverError {
    fn from(err: base64::DecodeError) -> Self {
        WebDriverError::Decode(err.to_string())
    }
}

// ----------------------------------------------------------------------------
// Configuration errors
// ----------------------------------------------------------------------------

/// Fatal configuration problems, raised before any session is opened
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Platform is not specified: set platformName=android or platformName=ios, \
         or platform_name in the configuration file"
    )]
    MissingPlatform,

    #[error("Unsupported platform '{0}': only 'android' and 'ios' are supported")]
    UnknownPlatform(String),

    #[error("Missing required {platform} capability '{key}'")]
    MissingCapability { platform: Platform, key: &'static str },

    #[error("Invalid configuration value for '{key}': {reason}")]
    Invalid { key: String, reason: String },

    #[error("Failed to load configuration: {0}")]
    Loading(String),

    #[error("App profile '{profile}' has no locator for {element} on {platform}")]
    MissingLocator {
        profile: String,
        element: String,
        platform: Platform,
    },

    #[error("Unknown app profile '{0}'")]
    UnknownProfile(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Loading(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Loading(err.to_string())
    }
}

// ----------------------------------------------------------------------------
// Driver initialisation errors
// ----------------------------------------------------------------------------

/// Failure to bring up a session; fatal for the scenario
#[derive(Error, Debug)]
pub enum DriverInitError {
    #[error("Driver configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not open a {platform} session at {endpoint}: {source}")]
    Connect {
        platform: Platform,
        endpoint: String,
        #[source]
        source: WebDriverError,
    },

    #[error("Session opened but could not be configured: {0}")]
    Configure(#[source] WebDriverError),
}

// ----------------------------------------------------------------------------
// Suite error
// ----------------------------------------------------------------------------

/// Main error type for page objects, hooks and steps
#[derive(Error, Debug)]
pub enum E2eError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DriverInit(#[from] DriverInitError),

    #[error("Failed to {action} {target}: {source}")]
    ElementInteraction {
        action: String,
        target: String,
        #[source]
        source: Box<E2eError>,
    },

    #[error("{gesture} failed after {attempts} attempt(s): {reason}")]
    Gesture {
        gesture: String,
        attempts: u32,
        reason: String,
    },

    #[error("Timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    #[error("Diagnostic capture failed: {0}")]
    Diagnostic(String),

    #[error(transparent)]
    WebDriver(#[from] WebDriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl E2eError {
    /// Wrap an error with the operation and target it happened on
    pub fn interaction(action: impl Into<String>, target: impl Into<String>, source: E2eError) -> Self {
        E2eError::ElementInteraction {
            action: action.into(),
            target: target.into(),
            source: Box::new(source),
        }
    }

    pub fn gesture(gesture: impl Into<String>, attempts: u32, reason: impl Into<String>) -> Self {
        E2eError::Gesture {
            gesture: gesture.into(),
            attempts,
            reason: reason.into(),
        }
    }

    /// True for errors that must abort the running scenario
    pub fn is_fatal(&self) -> bool {
        matches!(self, E2eError::Config(_) | E2eError::DriverInit(_))
    }
}

/// Result type for suite operations
pub type Result<T> = std::result::Result<T, E2eError>;

/// Result type for raw protocol calls
pub type WebDriverResult<T> = std::result::Result<T, WebDriverError>;
