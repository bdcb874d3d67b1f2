//! Create/edit user screen.

use crate::config::PageConfig;
use crate::driver::UiDriver;
use crate::feedback::{FormValidation, Masthead};
use crate::locator::Selector;
use crate::page_object::PageObject;
use crate::result::{PageError, PageResult};
use crate::widget::ExpansionState;

/// Page object for the "create user" / "user details" form.
///
/// Every action returns `&Self` so steps chain; pure queries return the
/// value instead.
#[derive(Debug)]
pub struct CreateUserPage<D: UiDriver> {
    driver: D,
    config: PageConfig,
    masthead: Masthead,
    validation: FormValidation,
}

impl<D: UiDriver> CreateUserPage<D> {
    /// Empty state shown when the realm has no users
    pub const USERS_EMPTY_STATE: &'static str = "empty-state";
    /// Create action inside the empty state
    pub const EMPTY_STATE_CREATE_USER_BTN: &'static str = "no-users-found-empty-action";
    /// Toolbar "Add user" button
    pub const ADD_USER_BTN: &'static str = "add-user";
    /// Opens the join-groups modal
    pub const JOIN_GROUPS_BTN: &'static str = "join-groups-button";
    /// Confirms the join-groups modal
    pub const JOIN_BTN: &'static str = "join-button";
    /// Submits a new user
    pub const CREATE_BTN: &'static str = "create-user";
    /// Saves an existing user
    pub const SAVE_BTN: &'static str = "save-user";
    /// Leaves the form
    pub const CANCEL_BTN: &'static str = "cancel-create-user";
    /// Username field
    pub const USERNAME_FIELD: &'static str = "username";

    /// Create the page with default configuration
    #[must_use]
    pub fn new(driver: D) -> Self {
        let config = PageConfig::default();
        Self {
            masthead: Masthead::new(&config),
            validation: FormValidation::new(&config),
            driver,
            config,
        }
    }

    /// Create the page with a validated configuration
    pub fn with_config(driver: D, config: PageConfig) -> PageResult<Self> {
        config.validate()?;
        Ok(Self {
            masthead: Masthead::new(&config),
            validation: FormValidation::new(&config),
            driver,
            config,
        })
    }

    /// Give the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }

    async fn click_test_id(&self, test_id: &str) -> PageResult<()> {
        let button = self
            .fields()
            .locator(Selector::test_id(test_id))
            .resolve(&self.driver)
            .await?;
        tracing::debug!(page = self.page_name(), button = test_id, "click");
        self.driver.click(&button).await
    }

    // ------------------------------------------------------------------
    // Navigation and buttons
    // ------------------------------------------------------------------

    /// Open the create form from the user list.
    ///
    /// Uses the toolbar button when it is rendered, otherwise the empty
    /// state's create action.
    pub async fn navigate_to_create(&self) -> PageResult<&Self> {
        let trigger = if self
            .driver
            .exists(&Selector::test_id(Self::ADD_USER_BTN))
            .await?
        {
            Self::ADD_USER_BTN
        } else {
            Self::EMPTY_STATE_CREATE_USER_BTN
        };
        tracing::debug!(button = trigger, "navigate to create");
        self.click_test_id(trigger).await?;
        Ok(self)
    }

    /// Open the join-groups modal
    pub async fn toggle_add_group_modal(&self) -> PageResult<&Self> {
        self.click_test_id(Self::JOIN_GROUPS_BTN).await?;
        Ok(self)
    }

    /// Confirm the join-groups modal
    pub async fn join_groups(&self) -> PageResult<&Self> {
        self.click_test_id(Self::JOIN_BTN).await?;
        Ok(self)
    }

    /// Submit the create form
    pub async fn submit_create(&self) -> PageResult<&Self> {
        self.click_test_id(Self::CREATE_BTN).await?;
        Ok(self)
    }

    /// Save changes to an existing user
    pub async fn submit_update(&self) -> PageResult<&Self> {
        self.click_test_id(Self::SAVE_BTN).await?;
        Ok(self)
    }

    /// Leave the form without saving
    pub async fn cancel(&self) -> PageResult<&Self> {
        self.click_test_id(Self::CANCEL_BTN).await?;
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------

    /// Fill in the username of a new user
    pub async fn create_user(&self, username: &str) -> PageResult<&Self> {
        self.set_username(username).await
    }

    /// Replace the username; an empty value leaves the field cleared
    pub async fn set_username(&self, value: &str) -> PageResult<&Self> {
        self.fields().set_value(Self::USERNAME_FIELD, value).await?;
        Ok(self)
    }

    /// Replace the value of an attribute field
    pub async fn set_attribute_value(&self, attr_name: &str, value: &str) -> PageResult<&Self> {
        self.fields().set_value(attr_name, value).await?;
        Ok(self)
    }

    /// Choose an option of a select attribute
    pub async fn set_attribute_value_on_select(
        &self,
        attr_name: &str,
        value: &str,
    ) -> PageResult<&Self> {
        self.fields().select_option(attr_name, value).await?;
        Ok(self)
    }

    /// Open a select attribute's menu and leave it open
    pub async fn open_attribute_select(&self, attr_name: &str) -> PageResult<&Self> {
        self.fields()
            .set_expanded(attr_name, ExpansionState::Expanded)
            .await?;
        Ok(self)
    }

    /// Close a select attribute's menu
    pub async fn close_attribute_select(&self, attr_name: &str) -> PageResult<&Self> {
        self.fields()
            .set_expanded(attr_name, ExpansionState::Collapsed)
            .await?;
        Ok(self)
    }

    /// Displayed value of an attribute field
    pub async fn read_attribute_value(&self, attr_name: &str) -> PageResult<String> {
        self.fields().read_value(attr_name).await
    }

    // ------------------------------------------------------------------
    // Assertions
    // ------------------------------------------------------------------

    /// Assert an attribute field shows `expected_value`
    pub async fn assert_attribute_value(
        &self,
        attr_name: &str,
        expected_value: &str,
    ) -> PageResult<&Self> {
        self.fields().assert_value(attr_name, expected_value).await?;
        Ok(self)
    }

    /// Assert an attribute field is (or is not) rendered
    pub async fn assert_attribute_field_exists(
        &self,
        attr_name: &str,
        should_exist: bool,
    ) -> PageResult<&Self> {
        self.fields().assert_exists(attr_name, should_exist).await?;
        Ok(self)
    }

    /// Assert a select attribute's current label and its ordered options
    pub async fn assert_attribute_select(
        &self,
        attr_name: &str,
        expected_options: &[&str],
        expected_value: &str,
    ) -> PageResult<&Self> {
        self.fields()
            .assert_options(attr_name, expected_options, expected_value)
            .await?;
        Ok(self)
    }

    /// Assert an attribute's label contains `expected_text`
    pub async fn assert_attribute_label(
        &self,
        attr_name: &str,
        expected_text: &str,
    ) -> PageResult<&Self> {
        self.fields()
            .assert_label_text(attr_name, expected_text)
            .await?;
        Ok(self)
    }

    /// Assert the required-field message is shown for an attribute
    pub async fn assert_validation_error_required(&self, attr_name: &str) -> PageResult<&Self> {
        let field = self.fields().resolve(attr_name).await?;
        let message = self.config.form.required_message_for(attr_name);
        self.validation
            .assert_message(&self.driver, &field.element, &message)
            .await?;
        Ok(self)
    }

    /// Assert the heading of a joined group shows `expected_display_name`
    pub async fn assert_group_display_name(
        &self,
        group: &str,
        expected_display_name: &str,
    ) -> PageResult<&Self> {
        let selector = Selector::tag("h1").and(Selector::id(group.to_lowercase()));
        let heading = self.fields().locator(selector).resolve(&self.driver).await?;
        let text = self.driver.text(&heading).await?;
        if text.trim() != expected_display_name.trim() {
            return Err(PageError::mismatch(
                format!("display name of group '{group}'"),
                expected_display_name,
                text,
            ));
        }
        Ok(self)
    }

    /// Assert the "user created" banner appeared
    pub async fn assert_notification_created(&self) -> PageResult<&Self> {
        self.masthead
            .check_notification_message(&self.driver, &self.config.notifications.user_created)
            .await?;
        Ok(self)
    }

    /// Assert the "user saved" banner appeared
    pub async fn assert_notification_updated(&self) -> PageResult<&Self> {
        self.masthead
            .check_notification_message(&self.driver, &self.config.notifications.user_saved)
            .await?;
        Ok(self)
    }
}

impl<D: UiDriver> PageObject for CreateUserPage<D> {
    type Driver = D;

    fn driver(&self) -> &D {
        &self.driver
    }

    fn config(&self) -> &PageConfig {
        &self.config
    }
}
