//! Locator abstraction for element selection.
//!
//! # Design Philosophy
//!
//! - **Auto-Waiting**: locators poll the driver until the element shows up
//!   (or goes away) instead of failing on the first miss
//! - **Structured selectors**: selectors are data, so any driver can evaluate
//!   them and render them to CSS for diagnostics
//! - **Fluent API**: chainable methods for building compound selectors

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::driver::{ElementHandle, UiDriver};
use crate::result::{PageError, PageResult};

/// Default timeout for auto-waiting (4 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Raw CSS selector, only understood by real browser drivers
    Css(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// Element id attribute
    Id(String),
    /// Single class name
    Class(String),
    /// Tag name
    Tag(String),
    /// Attribute equality
    Attribute {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
    /// Element must match every part (`h1#users`, `.label[for=x]`)
    All(Vec<Selector>),
    /// Element may match any part (`a, b`)
    Any(Vec<Selector>),
    /// `descendant` somewhere below an element matching `ancestor`
    Descendant {
        /// Ancestor selector
        ancestor: Box<Selector>,
        /// Descendant selector
        descendant: Box<Selector>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create an element id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a class selector
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class(class.into())
    }

    /// Create a tag selector
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// Create an attribute equality selector
    #[must_use]
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Selector for a form field addressed either by test id or element id
    #[must_use]
    pub fn field(field_id: &str) -> Self {
        Self::Any(vec![Self::test_id(field_id), Self::id(field_id)])
    }

    /// Narrow this selector with another condition on the same element
    #[must_use]
    pub fn and(self, other: Selector) -> Self {
        match self {
            Self::All(mut parts) => {
                parts.push(other);
                Self::All(parts)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Match `descendant` below elements matching this selector
    #[must_use]
    pub fn descendant(self, descendant: Selector) -> Self {
        Self::Descendant {
            ancestor: Box::new(self),
            descendant: Box::new(descendant),
        }
    }

    /// Render as a CSS selector string
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Css(s) => s.clone(),
            Self::TestId(id) => format!("[data-testid={}]", quote(id)),
            Self::Id(id) => format!("[id={}]", quote(id)),
            Self::Class(c) => format!(".{c}"),
            Self::Tag(t) => t.clone(),
            Self::Attribute { name, value } => format!("[{name}={}]", quote(value)),
            Self::All(parts) => {
                // Tags must lead a compound selector.
                let mut tags = String::new();
                let mut rest = String::new();
                for part in parts {
                    match part {
                        Self::Tag(t) => tags.push_str(t),
                        other => rest.push_str(&other.to_css()),
                    }
                }
                tags + &rest
            }
            Self::Any(parts) => parts
                .iter()
                .map(Self::to_css)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Descendant {
                ancestor,
                descendant,
            } => format!("{} {}", ancestor.to_css(), descendant.to_css()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Locator options for customizing behavior
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// A locator for finding elements with auto-waiting.
#[derive(Debug, Clone)]
pub struct Locator {
    /// The selector for finding elements
    selector: Selector,
    /// Options for locator behavior
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set a custom polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Replace all options
    #[must_use]
    pub fn with_options(mut self, options: LocatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.options.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Wait until at least one element matches and return all matches.
    ///
    /// # Errors
    ///
    /// `ElementNotFound` once the timeout elapses without a match.
    pub async fn resolve_all<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> PageResult<Vec<ElementHandle>> {
        self.poll_until_found(|| driver.query_all(&self.selector), &self.selector.to_css())
            .await
    }

    /// Wait for the first matching element.
    pub async fn resolve<D: UiDriver + ?Sized>(&self, driver: &D) -> PageResult<ElementHandle> {
        let mut matches = self.resolve_all(driver).await?;
        Ok(matches.swap_remove(0))
    }

    /// Wait until at least one element inside `scope` matches.
    pub async fn resolve_all_within<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        scope: &ElementHandle,
    ) -> PageResult<Vec<ElementHandle>> {
        let described = format!("{} (within {})", self.selector, scope.id);
        self.poll_until_found(|| driver.query_within(scope, &self.selector), &described)
            .await
    }

    /// Current matches without waiting
    pub async fn query_now<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> PageResult<Vec<ElementHandle>> {
        driver.query_all(&self.selector).await
    }

    /// Wait until nothing matches.
    ///
    /// # Errors
    ///
    /// `ElementStillPresent` once the timeout elapses with matches left.
    pub async fn wait_absent<D: UiDriver + ?Sized>(&self, driver: &D) -> PageResult<()> {
        let deadline = Instant::now() + self.options.timeout;
        loop {
            if driver.query_all(&self.selector).await?.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PageError::ElementStillPresent {
                    selector: self.selector.to_css(),
                    timeout_ms: self.timeout_ms(),
                });
            }
            self.pause(deadline).await;
        }
    }

    async fn poll_until_found<F, Fut>(
        &self,
        mut query: F,
        described: &str,
    ) -> PageResult<Vec<ElementHandle>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = PageResult<Vec<ElementHandle>>>,
    {
        let deadline = Instant::now() + self.options.timeout;
        loop {
            let matches = query().await?;
            if !matches.is_empty() {
                return Ok(matches);
            }
            if Instant::now() >= deadline {
                tracing::debug!(selector = %described, "locator timed out");
                return Err(PageError::ElementNotFound {
                    selector: described.to_string(),
                    timeout_ms: self.timeout_ms(),
                });
            }
            self.pause(deadline).await;
        }
    }

    async fn pause(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(self.options.poll_interval.min(remaining)).await;
    }
}
