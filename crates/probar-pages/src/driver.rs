//! UiDriver - Abstract UI automation trait
//!
//! The page objects never talk to a browser directly. They issue primitive
//! actions (query, click, clear, type, read) through [`UiDriver`], so the
//! same page object runs against a CDP-backed browser, a WebDriver bridge or
//! the in-memory [`MockDriver`](crate::MockDriver).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Page object  ──►  FieldController  ──►  Locator (auto-wait) │
//! │                                            │                 │
//! │                                            ▼                 │
//! │                                  UiDriver (this trait)       │
//! │                     ┌──────────────┬──────┴───────┐          │
//! │                     │ CDP driver   │ MockDriver   │          │
//! │                     └──────────────┴──────────────┘          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::Selector;
use crate::result::PageResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Element handle for DOM interactions
///
/// `attributes` is a snapshot taken when the element was located. It is good
/// enough for static facts (class list, ids) but live state must be read
/// through [`UiDriver::attribute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier, stable for the element's lifetime
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Element text content at lookup time
    pub text_content: Option<String>,
    /// Attribute snapshot at lookup time
    pub attributes: BTreeMap<String, String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute to the snapshot
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attribute value from the snapshot
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Class list from the snapshot
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_whitespace()
    }

    /// Check the snapshot class list
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Value of `data-testid`
    #[must_use]
    pub fn test_id(&self) -> Option<&str> {
        self.attribute("data-testid")
    }

    /// Value of the `id` attribute
    #[must_use]
    pub fn dom_id(&self) -> Option<&str> {
        self.attribute("id")
    }
}

/// Primitive UI actions a page object is built from.
///
/// Implementations resolve each call against the live UI. Queries return
/// whatever matches right now; waiting is layered on top by
/// [`Locator`](crate::Locator).
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// All elements currently matching `selector`, in document order
    async fn query_all(&self, selector: &Selector) -> PageResult<Vec<ElementHandle>>;

    /// Matching elements inside `scope`'s subtree, in document order
    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> PageResult<Vec<ElementHandle>>;

    /// Parent element, if any
    async fn parent(&self, element: &ElementHandle) -> PageResult<Option<ElementHandle>>;

    /// Click element
    async fn click(&self, element: &ElementHandle) -> PageResult<()>;

    /// Clear an editable element
    async fn clear(&self, element: &ElementHandle) -> PageResult<()>;

    /// Type text into element
    async fn type_text(&self, element: &ElementHandle, text: &str) -> PageResult<()>;

    /// Live text content
    async fn text(&self, element: &ElementHandle) -> PageResult<String>;

    /// Live value of a form control
    async fn input_value(&self, element: &ElementHandle) -> PageResult<String>;

    /// Live attribute value
    async fn attribute(&self, element: &ElementHandle, name: &str) -> PageResult<Option<String>>;

    /// Whether anything currently matches `selector`
    async fn exists(&self, selector: &Selector) -> PageResult<bool> {
        Ok(!self.query_all(selector).await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new("node-1", "button");
            assert_eq!(elem.id, "node-1");
            assert_eq!(elem.tag_name, "button");
            assert!(elem.text_content.is_none());
            assert!(elem.attributes.is_empty());
        }

        #[test]
        fn test_class_list() {
            let elem = ElementHandle::new("node-2", "button")
                .with_attribute("class", "pf-c-select__toggle  pf-m-typeahead");
            assert!(elem.has_class("pf-c-select__toggle"));
            assert!(elem.has_class("pf-m-typeahead"));
            assert!(!elem.has_class("pf-c-select"));
            assert_eq!(elem.classes().count(), 2);
        }

        #[test]
        fn test_missing_class_attribute() {
            let elem = ElementHandle::new("node-3", "input");
            assert_eq!(elem.classes().count(), 0);
            assert!(!elem.has_class("anything"));
        }

        #[test]
        fn test_identifiers() {
            let elem = ElementHandle::new("node-4", "input")
                .with_attribute("data-testid", "username")
                .with_attribute("id", "kc-username");
            assert_eq!(elem.test_id(), Some("username"));
            assert_eq!(elem.dom_id(), Some("kc-username"));
        }
    }
}
