//! Page Object Model support.
//!
//! A page object exposes one method per user-visible action or assertion on
//! a screen and hides selectors from test cases. Page objects here are
//! stateless: everything they know about the screen is read from the live UI
//! through their driver on each call.
//!
//! # Example
//!
//! ```ignore
//! let page = CreateUserPage::new(driver);
//! page.navigate_to_create()
//!     .await?
//!     .create_user("alice")
//!     .await?
//!     .submit_create()
//!     .await?
//!     .assert_notification_created()
//!     .await?;
//! ```

use crate::config::PageConfig;
use crate::driver::UiDriver;
use crate::widget::FieldController;

/// Trait for page objects representing a screen or component in the UI.
pub trait PageObject {
    /// Driver the page issues its actions through
    type Driver: UiDriver + ?Sized;

    /// The driver
    fn driver(&self) -> &Self::Driver;

    /// The page configuration
    fn config(&self) -> &PageConfig;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// How long element lookups on this page wait (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        self.config().timeouts.element_timeout_ms
    }

    /// Field-level operations bound to this page's driver
    fn fields(&self) -> FieldController<'_, Self::Driver> {
        FieldController::new(self.driver(), self.config())
    }
}
