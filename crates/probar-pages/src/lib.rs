//! Probar Pages: page objects for an admin console's user forms.
//!
//! Tests drive the create/edit user screen through [`CreateUserPage`]. Every
//! field operation works the same on plain inputs and on composite selects
//! (a toggle button plus a menu that only exists while expanded); the select
//! is opened only when it has to be and closed again only if this crate
//! opened it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────────┐   ┌──────────┐   ┌──────────┐
//! │ Test case    │──►│ CreateUserPage  │──►│ Field    │──►│ UiDriver │
//! │ (scenario)   │   │ Masthead, Form  │   │ Control  │   │ (browser │
//! │              │   │ Validation      │   │ + Locator│   │  or mock)│
//! └──────────────┘   └─────────────────┘   └──────────┘   └──────────┘
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Markup, text and timing configuration
pub mod config;

/// Browser driver abstraction
pub mod driver;

/// Notification banners and inline validation messages
pub mod feedback;

/// Selectors and auto-waiting locators
pub mod locator;

/// In-memory driver for tests
pub mod mock;

/// Page Object Model support
pub mod page_object;

/// Concrete page objects
pub mod pages;

/// Error types
pub mod result;

/// Widget classification and the select expansion protocol
pub mod widget;

pub use config::{FormMarkup, NotificationConfig, PageConfig, SelectMarkup, Timeouts};
pub use driver::{ElementHandle, UiDriver};
pub use feedback::{FormValidation, Masthead};
pub use locator::{Locator, LocatorOptions, Selector, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use mock::{ClickEffect, MockDriver};
pub use page_object::PageObject;
pub use pages::CreateUserPage;
pub use result::{PageError, PageResult};
pub use widget::{
    plan_actions, ActionPlan, ExpansionState, FieldController, ResolvedField, SelectIntent,
    WidgetKind,
};
