//! Page object configuration.
//!
//! Every value has a default matching the PatternFly 4 markup of the admin
//! console, so `PageConfig::default()` is usable as-is. Suites that target a
//! different theme or locale load overrides from YAML:
//!
//! ```yaml
//! timeouts:
//!   element_timeout_ms: 10000
//! select:
//!   placeholder: "Select..."
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::locator::{LocatorOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{PageError, PageResult};

/// Placeholder token in [`FormMarkup::required_message`]
pub const FIELD_PLACEHOLDER: &str = "{field}";

/// Root configuration for page objects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Auto-wait timing
    pub timeouts: Timeouts,
    /// Composite select markup contract
    pub select: SelectMarkup,
    /// Form label and validation markup
    pub form: FormMarkup,
    /// Notification banner markup and texts
    pub notifications: NotificationConfig,
}

/// Auto-wait timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// How long a locator waits for an element
    pub element_timeout_ms: u64,
    /// Delay between two polls
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// How a composite select is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectMarkup {
    /// Class carried by the trigger element
    pub toggle_class: String,
    /// Class of the label inside the trigger
    pub toggle_text_class: String,
    /// Class of each option in the open menu
    pub menu_item_class: String,
    /// Attribute on the trigger holding the expansion state
    pub expanded_attribute: String,
    /// Label shown when nothing is selected
    pub placeholder: String,
}

impl Default for SelectMarkup {
    fn default() -> Self {
        Self {
            toggle_class: "pf-c-select__toggle".to_string(),
            toggle_text_class: "pf-c-select__toggle-text".to_string(),
            menu_item_class: "pf-c-select__menu-item".to_string(),
            expanded_attribute: "aria-expanded".to_string(),
            placeholder: "Choose...".to_string(),
        }
    }
}

/// Form labels and inline validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormMarkup {
    /// Class of the group wrapping label, control and helper text
    pub group_class: String,
    /// Class of a field's label element
    pub label_class: String,
    /// Class of the text node inside the label
    pub label_text_class: String,
    /// Class of helper/validation text
    pub helper_text_class: String,
    /// Modifier class marking helper text as an error
    pub error_class: String,
    /// Message shown for an empty required field, `{field}` is substituted
    pub required_message: String,
}

impl Default for FormMarkup {
    fn default() -> Self {
        Self {
            group_class: "pf-c-form__group".to_string(),
            label_class: "pf-c-form__label".to_string(),
            label_text_class: "pf-c-form__label-text".to_string(),
            helper_text_class: "pf-c-form__helper-text".to_string(),
            error_class: "pf-m-error".to_string(),
            required_message: format!("Please specify '{FIELD_PLACEHOLDER}'."),
        }
    }
}

impl FormMarkup {
    /// Required-field message for `field`
    #[must_use]
    pub fn required_message_for(&self, field: &str) -> String {
        self.required_message.replace(FIELD_PLACEHOLDER, field)
    }
}

/// Notification banner markup and texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Class of the banner title
    pub alert_title_class: String,
    /// Text after a user was created
    pub user_created: String,
    /// Text after a user was saved
    pub user_saved: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            alert_title_class: "pf-c-alert__title".to_string(),
            user_created: "The user has been created".to_string(),
            user_saved: "The user has been saved".to_string(),
        }
    }
}

impl PageConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Malformed YAML or a config that fails [`PageConfig::validate`].
    pub fn from_yaml(yaml: &str) -> PageResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> PageResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading page config");
        Self::from_yaml(&yaml)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> PageResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Set the element timeout
    #[must_use]
    pub const fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.element_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.timeouts.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the select placeholder label
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.select.placeholder = placeholder.into();
        self
    }

    /// Set the required-field message template
    #[must_use]
    pub fn with_required_message(mut self, template: impl Into<String>) -> Self {
        self.form.required_message = template.into();
        self
    }

    /// Locator options derived from the timeouts
    #[must_use]
    pub const fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            timeout: Duration::from_millis(self.timeouts.element_timeout_ms),
            poll_interval: Duration::from_millis(self.timeouts.poll_interval_ms),
        }
    }

    /// Check the config for values no page could work with.
    pub fn validate(&self) -> PageResult<()> {
        if self.timeouts.element_timeout_ms == 0 {
            return Err(config_error("timeouts.element_timeout_ms must be > 0"));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(config_error("timeouts.poll_interval_ms must be > 0"));
        }
        let classes = [
            ("select.toggle_class", &self.select.toggle_class),
            ("select.toggle_text_class", &self.select.toggle_text_class),
            ("select.menu_item_class", &self.select.menu_item_class),
            ("select.expanded_attribute", &self.select.expanded_attribute),
            ("form.group_class", &self.form.group_class),
            ("form.label_class", &self.form.label_class),
            ("form.label_text_class", &self.form.label_text_class),
            ("form.helper_text_class", &self.form.helper_text_class),
            ("form.error_class", &self.form.error_class),
            (
                "notifications.alert_title_class",
                &self.notifications.alert_title_class,
            ),
        ];
        for (key, value) in classes {
            if value.trim().is_empty() {
                return Err(config_error(&format!("{key} must not be empty")));
            }
            if value.contains(char::is_whitespace) {
                return Err(config_error(&format!("{key} must be a single token")));
            }
        }
        if self.select.placeholder.is_empty() {
            return Err(config_error("select.placeholder must not be empty"));
        }
        if !self.form.required_message.contains(FIELD_PLACEHOLDER) {
            return Err(config_error(&format!(
                "form.required_message must contain {FIELD_PLACEHOLDER}"
            )));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> PageError {
    PageError::Config {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_default_is_valid() {
            let config = PageConfig::default();
            assert!(config.validate().is_ok());
            assert_eq!(config.select.placeholder, "Choose...");
            assert_eq!(config.select.expanded_attribute, "aria-expanded");
            assert_eq!(config.timeouts.element_timeout_ms, DEFAULT_TIMEOUT_MS);
        }

        #[test]
        fn test_required_message_for() {
            let form = FormMarkup::default();
            assert_eq!(form.required_message_for("email"), "Please specify 'email'.");
        }

        #[test]
        fn test_locator_options() {
            let config = PageConfig::new()
                .with_element_timeout(Duration::from_millis(120))
                .with_poll_interval(Duration::from_millis(5));
            let options = config.locator_options();
            assert_eq!(options.timeout, Duration::from_millis(120));
            assert_eq!(options.poll_interval, Duration::from_millis(5));
        }
    }

    mod yaml_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let yaml = r#"
timeouts:
  element_timeout_ms: 10000
select:
  placeholder: "Select..."
"#;
            let config = PageConfig::from_yaml(yaml).unwrap();
            assert_eq!(config.timeouts.element_timeout_ms, 10000);
            assert_eq!(config.timeouts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
            assert_eq!(config.select.placeholder, "Select...");
            assert_eq!(config.select.toggle_class, "pf-c-select__toggle");
            assert_eq!(config.notifications, NotificationConfig::default());
        }

        #[test]
        fn test_empty_yaml_is_default() {
            let config = PageConfig::from_yaml("{}").unwrap();
            assert_eq!(config, PageConfig::default());
        }

        #[test]
        fn test_yaml_roundtrip() {
            let config = PageConfig::new().with_placeholder("Pick one");
            let yaml = config.to_yaml().unwrap();
            assert_eq!(PageConfig::from_yaml(&yaml).unwrap(), config);
        }

        #[test]
        fn test_malformed_yaml() {
            let err = PageConfig::from_yaml("timeouts: [1, 2").unwrap_err();
            assert!(matches!(err, PageError::Yaml(_)));
        }

        #[test]
        fn test_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("pages.yaml");
            std::fs::write(&path, "form:\n  required_message: \"{field} is required\"\n").unwrap();
            let config = PageConfig::load(&path).unwrap();
            assert_eq!(config.form.required_message_for("email"), "email is required");
        }

        #[test]
        fn test_load_missing_file() {
            let err = PageConfig::load("/nonexistent/pages.yaml").unwrap_err();
            assert!(matches!(err, PageError::Io(_)));
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_zero_timeout_rejected() {
            let err = PageConfig::from_yaml("timeouts:\n  element_timeout_ms: 0\n").unwrap_err();
            assert!(err.to_string().contains("element_timeout_ms"));
        }

        #[test]
        fn test_zero_poll_rejected() {
            let config = PageConfig::new().with_poll_interval(Duration::ZERO);
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_empty_class_rejected() {
            let mut config = PageConfig::default();
            config.select.menu_item_class = "  ".to_string();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("select.menu_item_class"));
        }

        #[test]
        fn test_multi_token_class_rejected() {
            let mut config = PageConfig::default();
            config.form.error_class = "pf-m-error other".to_string();
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_template_without_field_rejected() {
            let config = PageConfig::new().with_required_message("Required.");
            let err = config.validate().unwrap_err();
            assert!(matches!(err, PageError::Config { .. }));
        }

        #[test]
        fn test_empty_placeholder_rejected() {
            let config = PageConfig::new().with_placeholder("");
            assert!(config.validate().is_err());
        }
    }
}
