//! Composite widget controller.
//!
//! Form fields come in two kinds: plain inputs and composite selects that
//! have to be expanded before their options can be read or chosen. The kind
//! and the expansion state are never cached. Both are re-derived from the live
//! UI on every call.
//!
//! The expand/collapse decision is a pure function ([`plan_actions`]) so it
//! can be tested without a driver. [`FieldController`] is the thin adapter
//! that reads the state, executes the plan and restores the widget.

use std::fmt;

use tokio::time::Instant;

use crate::config::PageConfig;
use crate::driver::{ElementHandle, UiDriver};
use crate::locator::{Locator, Selector};
use crate::result::{PageError, PageResult};

/// Kind of a form field, probed from the located element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Text-like input with a value
    PlainInput,
    /// Trigger of a select whose options live in a toggled menu
    CompositeSelect,
}

impl WidgetKind {
    /// Classify an element by its static class list
    #[must_use]
    pub fn classify(element: &ElementHandle, config: &PageConfig) -> Self {
        if element.has_class(&config.select.toggle_class) {
            Self::CompositeSelect
        } else {
            Self::PlainInput
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainInput => write!(f, "plain input"),
            Self::CompositeSelect => write!(f, "composite select"),
        }
    }
}

/// Whether a select's option menu is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpansionState {
    /// Menu closed
    Collapsed,
    /// Menu open, options readable
    Expanded,
}

impl ExpansionState {
    /// Parse the raw expansion attribute; anything but `true`/`false` is None.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") => Some(Self::Expanded),
            Some(v) if v.eq_ignore_ascii_case("false") => Some(Self::Collapsed),
            _ => None,
        }
    }

    /// The state one toggle click leads to
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Collapsed => Self::Expanded,
            Self::Expanded => Self::Collapsed,
        }
    }
}

/// What the caller wants from a select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectIntent {
    /// Read the label/options, leave the widget as found
    Inspect,
    /// Pick an option
    Choose,
    /// Leave the menu open
    Open,
    /// Leave the menu closed
    Close,
}

/// Toggle clicks around a select operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionPlan {
    /// Click the trigger before the operation
    pub open_first: bool,
    /// Click the trigger afterwards if it is still expanded
    pub close_after: bool,
}

impl ActionPlan {
    /// Plan with no clicks
    pub const NONE: Self = Self {
        open_first: false,
        close_after: false,
    };

    /// Upper bound on toggle clicks this plan may issue
    #[must_use]
    pub const fn max_clicks(&self) -> usize {
        self.open_first as usize + self.close_after as usize
    }

    /// Whether the final click should be issued given the state observed
    /// right before it.
    #[must_use]
    pub fn should_close(&self, observed: Option<ExpansionState>) -> bool {
        self.close_after && observed == Some(ExpansionState::Expanded)
    }
}

/// Decide the toggle clicks for `intent` starting from `current`.
#[must_use]
pub const fn plan_actions(current: ExpansionState, intent: SelectIntent) -> ActionPlan {
    match (current, intent) {
        (ExpansionState::Collapsed, SelectIntent::Inspect | SelectIntent::Choose) => ActionPlan {
            open_first: true,
            close_after: true,
        },
        (ExpansionState::Collapsed, SelectIntent::Open) => ActionPlan {
            open_first: true,
            close_after: false,
        },
        (ExpansionState::Expanded, SelectIntent::Close) => ActionPlan {
            open_first: false,
            close_after: true,
        },
        (ExpansionState::Expanded, _) | (ExpansionState::Collapsed, SelectIntent::Close) => {
            ActionPlan::NONE
        }
    }
}

/// A field resolved against the live UI
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// The located element (input or select trigger)
    pub element: ElementHandle,
    /// Its kind at lookup time
    pub kind: WidgetKind,
}

/// Uniform get/set/assert operations over plain and composite fields.
pub struct FieldController<'a, D: UiDriver + ?Sized> {
    driver: &'a D,
    config: &'a PageConfig,
}

impl<D: UiDriver + ?Sized> fmt::Debug for FieldController<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldController")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a, D: UiDriver + ?Sized> FieldController<'a, D> {
    /// Create a controller over a driver
    #[must_use]
    pub const fn new(driver: &'a D, config: &'a PageConfig) -> Self {
        Self { driver, config }
    }

    /// Locator carrying the configured wait options
    #[must_use]
    pub fn locator(&self, selector: Selector) -> Locator {
        Locator::new(selector).with_options(self.config.locator_options())
    }

    fn pick(&self, candidates: Vec<ElementHandle>) -> Option<ResolvedField> {
        let mut fields = candidates.into_iter().map(|element| {
            let kind = WidgetKind::classify(&element, self.config);
            ResolvedField { element, kind }
        });
        let first = fields.next()?;
        if first.kind == WidgetKind::CompositeSelect {
            return Some(first);
        }
        Some(
            fields
                .find(|f| f.kind == WidgetKind::CompositeSelect)
                .unwrap_or(first),
        )
    }

    /// Locate a field by test id or element id, waiting for it to appear.
    ///
    /// A select trigger wins over other matches, so a wrapper that shares the
    /// identifier never shadows the trigger.
    pub async fn resolve(&self, field: &str) -> PageResult<ResolvedField> {
        let candidates = self
            .locator(Selector::field(field))
            .resolve_all(self.driver)
            .await?;
        let resolved = self.pick(candidates).ok_or_else(|| PageError::ElementNotFound {
            selector: Selector::field(field).to_css(),
            timeout_ms: self.config.timeouts.element_timeout_ms,
        })?;
        tracing::trace!(field, kind = %resolved.kind, element = %resolved.element.id, "resolved field");
        Ok(resolved)
    }

    async fn resolve_select(&self, field: &str) -> PageResult<ElementHandle> {
        let resolved = self.resolve(field).await?;
        match resolved.kind {
            WidgetKind::CompositeSelect => Ok(resolved.element),
            WidgetKind::PlainInput => Err(PageError::mismatch(
                format!("widget kind of '{field}'"),
                WidgetKind::CompositeSelect.to_string(),
                WidgetKind::PlainInput.to_string(),
            )),
        }
    }

    /// Read the expansion state from the trigger.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if the attribute is missing or not a boolean.
    pub async fn expansion_state(
        &self,
        field: &str,
        toggle: &ElementHandle,
    ) -> PageResult<ExpansionState> {
        let attribute = &self.config.select.expanded_attribute;
        let raw = self.driver.attribute(toggle, attribute).await?;
        ExpansionState::parse(raw.as_deref()).ok_or_else(|| PageError::ProtocolViolation {
            field: field.to_string(),
            attribute: attribute.clone(),
            value: raw,
        })
    }

    async fn wait_for_state(
        &self,
        field: &str,
        toggle: &ElementHandle,
        desired: ExpansionState,
    ) -> PageResult<()> {
        let options = self.config.locator_options();
        let deadline = Instant::now() + options.timeout;
        loop {
            let state = self.expansion_state(field, toggle).await?;
            if state == desired {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PageError::mismatch(
                    format!("expansion state of '{field}'"),
                    format!("{desired:?}"),
                    format!("{state:?}"),
                ));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(options.poll_interval.min(remaining)).await;
        }
    }

    /// Read the current state, plan the clicks and issue the opening one.
    async fn begin(
        &self,
        field: &str,
        toggle: &ElementHandle,
        intent: SelectIntent,
    ) -> PageResult<ActionPlan> {
        let state = self.expansion_state(field, toggle).await?;
        let plan = plan_actions(state, intent);
        tracing::debug!(field, ?state, ?intent, ?plan, "select plan");
        if plan.open_first {
            self.driver.click(toggle).await?;
            self.wait_for_state(field, toggle, ExpansionState::Expanded)
                .await?;
        }
        Ok(plan)
    }

    /// Issue the closing click if the plan asks for one and the trigger is
    /// still present and expanded.
    async fn finish(&self, field: &str, plan: ActionPlan) -> PageResult<()> {
        if !plan.close_after {
            return Ok(());
        }
        let candidates = self
            .locator(Selector::field(field))
            .query_now(self.driver)
            .await?;
        let toggle = match self.pick(candidates) {
            Some(f) if f.kind == WidgetKind::CompositeSelect => f.element,
            _ => {
                tracing::debug!(field, "select trigger gone, skipping collapse");
                return Ok(());
            }
        };
        let observed = self.expansion_state(field, &toggle).await?;
        if plan.should_close(Some(observed)) {
            self.driver.click(&toggle).await?;
        } else {
            tracing::debug!(field, ?observed, "select already collapsed");
        }
        Ok(())
    }

    async fn select_label(&self, toggle: &ElementHandle) -> PageResult<String> {
        let text_class = Selector::class(self.config.select.toggle_text_class.clone());
        let label = self
            .locator(text_class)
            .resolve_all_within(self.driver, toggle)
            .await?
            .swap_remove(0);
        let text = self.driver.text(&label).await?;
        let text = text.trim();
        Ok(if text.is_empty() {
            self.config.select.placeholder.clone()
        } else {
            text.to_string()
        })
    }

    /// Option elements of an expanded select, in display order
    async fn options(&self, toggle: &ElementHandle) -> PageResult<Vec<(ElementHandle, String)>> {
        let container = self
            .driver
            .parent(toggle)
            .await?
            .ok_or_else(|| PageError::Driver {
                message: format!("select trigger {} has no parent", toggle.id),
            })?;
        let items = self
            .driver
            .query_within(
                &container,
                &Selector::class(self.config.select.menu_item_class.clone()),
            )
            .await?;
        let mut options = Vec::with_capacity(items.len());
        for item in items {
            let text = self.driver.text(&item).await?.trim().to_string();
            options.push((item, text));
        }
        Ok(options)
    }

    /// Current displayed value.
    ///
    /// Inputs report their value; selects report the trigger label, or the
    /// placeholder when nothing is selected.
    pub async fn read_value(&self, field: &str) -> PageResult<String> {
        let resolved = self.resolve(field).await?;
        match resolved.kind {
            WidgetKind::PlainInput => self.driver.input_value(&resolved.element).await,
            WidgetKind::CompositeSelect => self.select_label(&resolved.element).await,
        }
    }

    /// Replace the field's value.
    ///
    /// Inputs are cleared and, unless `text` is empty, typed into. Selects
    /// choose the option labelled `text`.
    pub async fn set_value(&self, field: &str, text: &str) -> PageResult<()> {
        let resolved = self.resolve(field).await?;
        match resolved.kind {
            WidgetKind::PlainInput => {
                self.driver.clear(&resolved.element).await?;
                if !text.is_empty() {
                    self.driver.type_text(&resolved.element, text).await?;
                }
                Ok(())
            }
            WidgetKind::CompositeSelect => self.choose(field, &resolved.element, text).await,
        }
    }

    /// Choose the option whose text equals `label` exactly.
    pub async fn select_option(&self, field: &str, label: &str) -> PageResult<()> {
        let toggle = self.resolve_select(field).await?;
        self.choose(field, &toggle, label).await
    }

    async fn choose(&self, field: &str, toggle: &ElementHandle, label: &str) -> PageResult<()> {
        let plan = self.begin(field, toggle, SelectIntent::Choose).await?;
        let options = self.options(toggle).await?;
        let Some((item, _)) = options.iter().find(|(_, text)| text == label.trim()) else {
            return Err(PageError::OptionNotFound {
                field: field.to_string(),
                label: label.to_string(),
                available: options.into_iter().map(|(_, text)| text).collect(),
            });
        };
        self.driver.click(item).await?;
        tracing::debug!(field, label, "option chosen");
        self.finish(field, plan).await
    }

    /// Assert the selected label and the exact, ordered option list.
    ///
    /// An empty `expected_selected` means the placeholder is shown.
    pub async fn assert_options(
        &self,
        field: &str,
        expected_options: &[&str],
        expected_selected: &str,
    ) -> PageResult<()> {
        let toggle = self.resolve_select(field).await?;
        let expected_label = if expected_selected.is_empty() {
            self.config.select.placeholder.as_str()
        } else {
            expected_selected
        };
        let actual_label = self.select_label(&toggle).await?;
        if actual_label != expected_label {
            return Err(PageError::mismatch(
                format!("selected option of '{field}'"),
                expected_label,
                actual_label,
            ));
        }

        let plan = self.begin(field, &toggle, SelectIntent::Inspect).await?;
        let actual: Vec<String> = self
            .options(&toggle)
            .await?
            .into_iter()
            .map(|(_, text)| text)
            .collect();
        if actual.len() != expected_options.len() {
            return Err(PageError::mismatch(
                format!("option count of '{field}'"),
                expected_options.len().to_string(),
                actual.len().to_string(),
            ));
        }
        for (index, (expected, actual)) in expected_options.iter().zip(&actual).enumerate() {
            if expected != actual {
                return Err(PageError::mismatch(
                    format!("option {index} of '{field}'"),
                    *expected,
                    actual.as_str(),
                ));
            }
        }
        self.finish(field, plan).await
    }

    /// Open or close a select and leave it that way.
    pub async fn set_expanded(&self, field: &str, desired: ExpansionState) -> PageResult<()> {
        let toggle = self.resolve_select(field).await?;
        let intent = match desired {
            ExpansionState::Expanded => SelectIntent::Open,
            ExpansionState::Collapsed => SelectIntent::Close,
        };
        let plan = self.begin(field, &toggle, intent).await?;
        self.finish(field, plan).await
    }

    /// Assert the displayed value equals `expected`
    pub async fn assert_value(&self, field: &str, expected: &str) -> PageResult<()> {
        let actual = self.read_value(field).await?;
        if actual == expected {
            Ok(())
        } else {
            Err(PageError::mismatch(
                format!("value of '{field}'"),
                expected,
                actual,
            ))
        }
    }

    /// Assert the field is (or is not) rendered.
    pub async fn assert_exists(&self, field: &str, should_exist: bool) -> PageResult<()> {
        let locator = self.locator(Selector::field(field));
        let outcome = if should_exist {
            locator.resolve_all(self.driver).await.map(|_| ())
        } else {
            locator.wait_absent(self.driver).await
        };
        outcome.map_err(|err| match err {
            PageError::ElementNotFound { selector, .. } => PageError::AssertionFailed {
                message: format!("expected field '{field}' to exist ({selector})"),
            },
            PageError::ElementStillPresent { selector, .. } => PageError::AssertionFailed {
                message: format!("expected field '{field}' not to exist ({selector})"),
            },
            other => other,
        })
    }

    /// Selector for the text of the label attached to `field`
    #[must_use]
    pub fn label_selector(&self, field: &str) -> Selector {
        let form = &self.config.form;
        Selector::class(form.label_class.clone())
            .and(Selector::attribute("for", field))
            .descendant(Selector::class(form.label_text_class.clone()))
    }

    /// Assert the field's label contains `expected`
    pub async fn assert_label_text(&self, field: &str, expected: &str) -> PageResult<()> {
        let labels = self
            .locator(self.label_selector(field))
            .resolve_all(self.driver)
            .await?;
        let mut seen = Vec::with_capacity(labels.len());
        for label in &labels {
            let text = self.driver.text(label).await?;
            if text.contains(expected) {
                return Ok(());
            }
            seen.push(text);
        }
        Err(PageError::mismatch(
            format!("label of '{field}' containing"),
            expected,
            seen.join(" | "),
        ))
    }
}
