//! Result and error types for probar page objects.

use thiserror::Error;

/// Result type for page object operations
pub type PageResult<T> = Result<T, PageError>;

/// Errors that can occur while driving a page
#[derive(Debug, Error)]
pub enum PageError {
    /// No element matched within the wait window
    #[error("Element not found: {selector} (waited {timeout_ms}ms)")]
    ElementNotFound {
        /// Selector that matched nothing
        selector: String,
        /// How long the locator waited
        timeout_ms: u64,
    },

    /// An element that should be gone was still present
    #[error("Element still present: {selector} (waited {timeout_ms}ms)")]
    ElementStillPresent {
        /// Selector that kept matching
        selector: String,
        /// How long the locator waited
        timeout_ms: u64,
    },

    /// An expanded select had no option with the requested label
    #[error("Option '{label}' not found in select '{field}' (available: {available:?})")]
    OptionNotFound {
        /// Field identifier of the select
        field: String,
        /// Label that was requested
        label: String,
        /// Labels that were present
        available: Vec<String>,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Observed value differs from the expected one
    #[error("Assertion failed: {what}: expected {expected:?}, got {actual:?}")]
    Mismatch {
        /// What was compared
        what: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// The markup no longer encodes state the way the page object expects
    #[error("Protocol violation on '{field}': attribute '{attribute}' = {value:?}")]
    ProtocolViolation {
        /// Field identifier
        field: String,
        /// Attribute that was read
        attribute: String,
        /// Raw value (None if missing)
        value: Option<String>,
    },

    /// The driver cannot evaluate this selector
    #[error("Unsupported selector: {selector}")]
    UnsupportedSelector {
        /// Rendered selector
        selector: String,
    },

    /// Element handle no longer refers to a live element
    #[error("Stale element handle: {id}")]
    StaleElement {
        /// Handle id
        id: String,
    },

    /// Driver-level failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl PageError {
    /// Build a mismatch error from anything printable
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Mismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the failure came from locating an element
    #[must_use]
    pub const fn is_locator_failure(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::ElementStillPresent { .. }
                | Self::OptionNotFound { .. }
        )
    }

    /// Whether the failure is an assertion on observed state
    #[must_use]
    pub const fn is_assertion_failure(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. } | Self::Mismatch { .. })
    }

    /// Whether the failure means the UI contract itself changed
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// Nothing raised by this crate is retried at this layer.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        false
    }
}
