//! Screen-level feedback collaborators.
//!
//! [`Masthead`] checks the transient notification banners raised after an
//! action; [`FormValidation`] checks inline messages next to a form field.

use tokio::time::Instant;

use crate::config::PageConfig;
use crate::driver::{ElementHandle, UiDriver};
use crate::locator::{LocatorOptions, Selector};
use crate::result::{PageError, PageResult};

/// Notification banners shown in the page masthead
#[derive(Debug, Clone)]
pub struct Masthead {
    alert_title: Selector,
    options: LocatorOptions,
}

impl Masthead {
    /// Create a masthead for the configured alert markup
    #[must_use]
    pub fn new(config: &PageConfig) -> Self {
        Self {
            alert_title: Selector::class(config.notifications.alert_title_class.clone()),
            options: config.locator_options(),
        }
    }

    /// Wait for a banner whose title contains `expected`.
    pub async fn check_notification_message<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        expected: &str,
    ) -> PageResult<()> {
        let deadline = Instant::now() + self.options.timeout;
        loop {
            let mut seen = Vec::new();
            for title in driver.query_all(&self.alert_title).await? {
                let text = driver.text(&title).await?;
                if text.contains(expected) {
                    tracing::debug!(expected, "notification shown");
                    return Ok(());
                }
                seen.push(text);
            }
            if Instant::now() >= deadline {
                return Err(PageError::AssertionFailed {
                    message: format!(
                        "no notification containing {expected:?} (shown: {seen:?})"
                    ),
                });
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.options.poll_interval.min(remaining)).await;
        }
    }
}

/// Inline validation messages of form fields
#[derive(Debug, Clone)]
pub struct FormValidation {
    group_class: String,
    error: Selector,
    options: LocatorOptions,
}

impl FormValidation {
    /// Create a validator for the configured form markup
    #[must_use]
    pub fn new(config: &PageConfig) -> Self {
        let form = &config.form;
        Self {
            group_class: form.group_class.clone(),
            error: Selector::class(form.helper_text_class.clone())
                .and(Selector::class(form.error_class.clone())),
            options: config.locator_options(),
        }
    }

    /// The form group around `field`, or its parent outside of a group
    async fn scope<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        field: &ElementHandle,
    ) -> PageResult<ElementHandle> {
        let parent = driver.parent(field).await?.ok_or_else(|| PageError::Driver {
            message: format!("field {} has no parent", field.id),
        })?;
        let mut current = Some(parent.clone());
        while let Some(element) = current {
            if element.has_class(&self.group_class) {
                return Ok(element);
            }
            current = driver.parent(&element).await?;
        }
        Ok(parent)
    }

    /// Wait for an error message next to `field` whose text is exactly
    /// `expected`.
    pub async fn assert_message<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        field: &ElementHandle,
        expected: &str,
    ) -> PageResult<()> {
        let scope = self.scope(driver, field).await?;
        let deadline = Instant::now() + self.options.timeout;
        loop {
            let mut seen = Vec::new();
            for message in driver.query_within(&scope, &self.error).await? {
                let text = driver.text(&message).await?;
                if text.trim() == expected {
                    return Ok(());
                }
                seen.push(text);
            }
            if Instant::now() >= deadline {
                return Err(PageError::mismatch(
                    format!("validation message of {}", field.id),
                    expected,
                    seen.join(" | "),
                ));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.options.poll_interval.min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ClickEffect, MockDriver};
    use std::time::Duration;

    fn fast_config() -> PageConfig {
        PageConfig::new()
            .with_element_timeout(Duration::from_millis(40))
            .with_poll_interval(Duration::from_millis(5))
    }

    async fn click(driver: &MockDriver, test_id: &str) {
        let button = driver
            .query_all(&Selector::test_id(test_id))
            .await
            .unwrap()
            .remove(0);
        driver.click(&button).await.unwrap();
    }

    mod masthead_tests {
        use super::*;

        #[tokio::test]
        async fn test_notification_found() {
            let driver = MockDriver::new();
            driver.add_button("save-user", "Save");
            driver
                .on_click("save-user", ClickEffect::Notify("The user has been saved".into()))
                .unwrap();
            click(&driver, "save-user").await;
            let masthead = Masthead::new(&fast_config());
            masthead
                .check_notification_message(&driver, "The user has been saved")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_notification_missing() {
            let driver = MockDriver::new();
            let masthead = Masthead::new(&fast_config());
            let err = masthead
                .check_notification_message(&driver, "The user has been created")
                .await
                .unwrap_err();
            assert!(err.is_assertion_failure());
        }

        #[tokio::test]
        async fn test_other_notification_does_not_match() {
            let driver = MockDriver::new();
            driver.add_button("save-user", "Save");
            driver
                .on_click("save-user", ClickEffect::Notify("Could not save user".into()))
                .unwrap();
            click(&driver, "save-user").await;
            let masthead = Masthead::new(&fast_config());
            let err = masthead
                .check_notification_message(&driver, "The user has been saved")
                .await
                .unwrap_err();
            assert!(err.to_string().contains("Could not save user"));
        }
    }

    mod form_validation_tests {
        use super::*;

        #[tokio::test]
        async fn test_required_message_found() {
            let driver = MockDriver::new();
            driver.add_text_input("username", "Username");
            driver.add_button("create-user", "Create");
            driver
                .on_click("create-user", ClickEffect::ValidateRequired("username".into()))
                .unwrap();
            click(&driver, "create-user").await;
            let field = driver
                .query_all(&Selector::test_id("username"))
                .await
                .unwrap()
                .remove(0);
            FormValidation::new(&fast_config())
                .assert_message(&driver, &field, "Please specify 'username'.")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_message_must_match_exactly() {
            let driver = MockDriver::new();
            driver.add_text_input("username", "Username");
            driver.add_button("create-user", "Create");
            driver
                .on_click("create-user", ClickEffect::ValidateRequired("username".into()))
                .unwrap();
            click(&driver, "create-user").await;
            let field = driver
                .query_all(&Selector::test_id("username"))
                .await
                .unwrap()
                .remove(0);
            let err = FormValidation::new(&fast_config())
                .assert_message(&driver, &field, "Please specify 'username'")
                .await
                .unwrap_err();
            assert!(err.is_assertion_failure());
        }

        #[tokio::test]
        async fn test_other_field_error_is_not_ours() {
            let driver = MockDriver::new();
            driver.add_text_input("username", "Username");
            driver.add_text_input("email", "Email");
            driver.add_button("create-user", "Create");
            driver
                .on_click("create-user", ClickEffect::ValidateRequired("email".into()))
                .unwrap();
            click(&driver, "create-user").await;
            let field = driver
                .query_all(&Selector::test_id("username"))
                .await
                .unwrap()
                .remove(0);
            let err = FormValidation::new(&fast_config())
                .assert_message(&driver, &field, "Please specify 'email'.")
                .await
                .unwrap_err();
            assert!(err.is_assertion_failure());
        }
    }
}
