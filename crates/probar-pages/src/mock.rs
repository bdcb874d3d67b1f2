//! In-memory DOM driver for unit and scenario tests.
//!
//! `MockDriver` renders a small PatternFly-shaped document (form groups,
//! composite selects, buttons, alerts) and implements [`UiDriver`] against
//! it. Clicks have the side effects the real widgets have: a select toggle
//! flips `aria-expanded` and mounts/unmounts its menu, a menu item updates
//! the toggle label and (by default) collapses the menu. Every primitive
//! call is recorded in a call history for verification.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::config::PageConfig;
use crate::driver::{ElementHandle, UiDriver};
use crate::locator::Selector;
use crate::result::{PageError, PageResult};

const ROOT: usize = 0;

/// Side effect attached to a button click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    /// Show a notification banner with this title
    Notify(String),
    /// Mount the element with this test id or id
    Reveal(String),
    /// Unmount the element with this test id or id
    Hide(String),
    /// Show the required-field error under `field` if it is empty
    ValidateRequired(String),
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: String,
    parent: Option<usize>,
    children: Vec<usize>,
    rendered: bool,
    visible_from: Option<Instant>,
    hidden_from: Option<Instant>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
            rendered: true,
            visible_from: None,
            hidden_from: None,
        }
    }

    fn attr(mut self, name: &str, value: &str) -> Self {
        let _ = self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    fn label(&self) -> String {
        self.attributes
            .get("data-testid")
            .or_else(|| self.attributes.get("id"))
            .cloned()
            .unwrap_or_else(|| self.tag.clone())
    }
}

#[derive(Debug, Clone)]
struct MockSelect {
    toggle: usize,
    label: usize,
    menu: usize,
    auto_collapse: bool,
}

#[derive(Debug)]
struct MockDom {
    markup: PageConfig,
    nodes: Vec<Node>,
    form: usize,
    selects: Vec<MockSelect>,
    effects: HashMap<usize, Vec<ClickEffect>>,
    history: Vec<String>,
}

impl MockDom {
    fn new(markup: PageConfig) -> Self {
        let mut dom = Self {
            markup,
            nodes: vec![Node::new("body")],
            form: ROOT,
            selects: Vec::new(),
            effects: HashMap::new(),
            history: Vec::new(),
        };
        dom.form = dom.append(ROOT, Node::new("form").attr("class", "pf-c-form"));
        dom
    }

    fn append(&mut self, parent: usize, mut node: Node) -> usize {
        let idx = self.nodes.len();
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(idx);
        idx
    }

    fn form_group(&mut self, field: &str, label: &str) -> usize {
        let form = self.form;
        let group_class = self.markup.form.group_class.clone();
        let group = self.append(form, Node::new("div").attr("class", &group_class));
        let label_wrap = self.append(
            group,
            Node::new("div").attr("class", "pf-c-form__group-label"),
        );
        let label_class = self.markup.form.label_class.clone();
        let label_text_class = self.markup.form.label_text_class.clone();
        let label_node = self.append(
            label_wrap,
            Node::new("label")
                .attr("class", &label_class)
                .attr("for", field),
        );
        let _ = self.append(
            label_node,
            Node::new("span").attr("class", &label_text_class).text(label),
        );
        self.append(
            group,
            Node::new("div").attr("class", "pf-c-form__group-control"),
        )
    }

    fn find(&self, name: &str) -> Option<usize> {
        let by = |key: &str| {
            (0..self.nodes.len())
                .find(|&i| self.nodes[i].attributes.get(key).is_some_and(|v| v == name))
        };
        by("data-testid").or_else(|| by("id"))
    }

    fn find_or_err(&self, name: &str) -> PageResult<usize> {
        self.find(name).ok_or_else(|| PageError::Driver {
            message: format!("mock has no element named '{name}'"),
        })
    }

    fn is_displayed(&self, idx: usize, now: Instant) -> bool {
        let mut current = Some(idx);
        while let Some(i) = current {
            let node = &self.nodes[i];
            if !node.rendered
                || node.visible_from.is_some_and(|t| now < t)
                || node.hidden_from.is_some_and(|t| now >= t)
            {
                return false;
            }
            current = node.parent;
        }
        true
    }

    fn matches(&self, idx: usize, selector: &Selector) -> PageResult<bool> {
        let node = &self.nodes[idx];
        let attr_eq = |name: &str, value: &str| node.attributes.get(name).is_some_and(|v| v == value);
        Ok(match selector {
            Selector::Css(_) => {
                return Err(PageError::UnsupportedSelector {
                    selector: selector.to_css(),
                })
            }
            Selector::TestId(id) => attr_eq("data-testid", id),
            Selector::Id(id) => attr_eq("id", id),
            Selector::Class(class) => node.has_class(class),
            Selector::Tag(tag) => node.tag.eq_ignore_ascii_case(tag),
            Selector::Attribute { name, value } => attr_eq(name, value),
            Selector::All(parts) => {
                for part in parts {
                    if !self.matches(idx, part)? {
                        return Ok(false);
                    }
                }
                true
            }
            Selector::Any(parts) => {
                for part in parts {
                    if self.matches(idx, part)? {
                        return Ok(true);
                    }
                }
                false
            }
            Selector::Descendant {
                ancestor,
                descendant,
            } => {
                if !self.matches(idx, descendant)? {
                    return Ok(false);
                }
                let mut current = node.parent;
                while let Some(i) = current {
                    if self.matches(i, ancestor)? {
                        return Ok(true);
                    }
                    current = self.nodes[i].parent;
                }
                false
            }
        })
    }

    /// Displayed descendants of `scope` in document order
    fn displayed_below(&self, scope: usize, now: Instant) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[scope].children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            if !self.is_displayed(idx, now) {
                continue;
            }
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev());
        }
        out
    }

    fn query(&self, scope: usize, selector: &Selector) -> PageResult<Vec<ElementHandle>> {
        let now = Instant::now();
        let mut found = Vec::new();
        for idx in self.displayed_below(scope, now) {
            if self.matches(idx, selector)? {
                found.push(self.handle(idx));
            }
        }
        Ok(found)
    }

    fn text_of(&self, idx: usize) -> String {
        let now = Instant::now();
        let mut text = self.nodes[idx].text.clone();
        for child in &self.nodes[idx].children {
            if self.is_displayed(*child, now) {
                text.push_str(&self.text_of(*child));
            }
        }
        text
    }

    fn handle(&self, idx: usize) -> ElementHandle {
        let node = &self.nodes[idx];
        ElementHandle {
            id: format!("node-{idx}"),
            tag_name: node.tag.clone(),
            text_content: Some(self.text_of(idx)),
            attributes: node.attributes.clone(),
        }
    }

    fn live(&self, element: &ElementHandle) -> PageResult<usize> {
        let stale = || PageError::StaleElement {
            id: element.id.clone(),
        };
        let idx: usize = element
            .id
            .strip_prefix("node-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(stale)?;
        if idx >= self.nodes.len() || !self.is_displayed(idx, Instant::now()) {
            return Err(stale());
        }
        Ok(idx)
    }

    /// Menu item labelled `option` of the select whose trigger is `field`
    fn option_node(&self, field: &str, option: &str) -> PageResult<usize> {
        let toggle = self.find_or_err(field)?;
        let select = self.select_for(toggle).ok_or_else(|| PageError::Driver {
            message: format!("mock element '{field}' is not a select"),
        })?;
        let menu = select.menu;
        (0..self.nodes.len())
            .find(|&i| {
                self.nodes[i].has_class(&self.markup.select.menu_item_class)
                    && self.nodes[i].text == option
                    && self.select_owning_item(i).is_some_and(|s| s.menu == menu)
            })
            .ok_or_else(|| PageError::Driver {
                message: format!("select '{field}' has no option '{option}'"),
            })
    }

    fn select_for(&self, idx: usize) -> Option<&MockSelect> {
        self.selects.iter().find(|s| s.toggle == idx)
    }

    fn select_owning_item(&self, idx: usize) -> Option<&MockSelect> {
        let mut current = self.nodes[idx].parent;
        while let Some(i) = current {
            if let Some(select) = self.selects.iter().find(|s| s.menu == i) {
                return Some(select);
            }
            current = self.nodes[i].parent;
        }
        None
    }

    fn set_expanded(&mut self, select: &MockSelect, expanded: bool) {
        let attribute = self.markup.select.expanded_attribute.clone();
        let _ = self.nodes[select.toggle]
            .attributes
            .insert(attribute, expanded.to_string());
        self.nodes[select.menu].rendered = expanded;
    }

    fn is_expanded(&self, select: &MockSelect) -> bool {
        self.nodes[select.toggle]
            .attributes
            .get(&self.markup.select.expanded_attribute)
            .is_some_and(|v| v == "true")
    }

    fn click(&mut self, idx: usize) {
        if let Some(select) = self.select_for(idx).cloned() {
            let expanded = self.is_expanded(&select);
            self.set_expanded(&select, !expanded);
            return;
        }
        if self.nodes[idx].has_class(&self.markup.select.menu_item_class) {
            if let Some(select) = self.select_owning_item(idx).cloned() {
                let chosen = self.text_of(idx);
                self.nodes[select.label].text = chosen;
                if select.auto_collapse {
                    self.set_expanded(&select, false);
                }
            }
        }
        let effects = self.effects.get(&idx).cloned().unwrap_or_default();
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: ClickEffect) {
        match effect {
            ClickEffect::Notify(message) => {
                let class = self.markup.notifications.alert_title_class.clone();
                let alert = self.append(
                    ROOT,
                    Node::new("div").attr("class", "pf-c-alert pf-m-success"),
                );
                let _ = self.append(alert, Node::new("h4").attr("class", &class).text(&message));
            }
            ClickEffect::Reveal(name) => {
                if let Some(idx) = self.find(&name) {
                    self.nodes[idx].rendered = true;
                }
            }
            ClickEffect::Hide(name) => {
                if let Some(idx) = self.find(&name) {
                    self.nodes[idx].rendered = false;
                }
            }
            ClickEffect::ValidateRequired(field) => {
                let Some(input) = self.find(&field) else {
                    return;
                };
                if !self.nodes[input].value.is_empty() {
                    return;
                }
                let Some(control) = self.nodes[input].parent else {
                    return;
                };
                let class = format!(
                    "{} {}",
                    self.markup.form.helper_text_class, self.markup.form.error_class
                );
                let message = self.markup.form.required_message_for(&field);
                let _ = self.append(control, Node::new("div").attr("class", &class).text(&message));
            }
        }
    }
}

/// Mock driver backed by an in-memory DOM
#[derive(Debug)]
pub struct MockDriver {
    dom: Mutex<MockDom>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create an empty document with a single form
    #[must_use]
    pub fn new() -> Self {
        Self::with_markup(PageConfig::default())
    }

    /// Create a document rendered with custom markup classes
    #[must_use]
    pub fn with_markup(markup: PageConfig) -> Self {
        Self {
            dom: Mutex::new(MockDom::new(markup)),
        }
    }

    fn dom(&self) -> MutexGuard<'_, MockDom> {
        self.dom.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a labelled text input addressed by `field` (test id and id)
    pub fn add_text_input(&self, field: &str, label: &str) {
        let mut dom = self.dom();
        let control = dom.form_group(field, label);
        let _ = dom.append(
            control,
            Node::new("input")
                .attr("class", "pf-c-form-control")
                .attr("type", "text")
                .attr("data-testid", field)
                .attr("id", field),
        );
    }

    /// Add a labelled composite select whose toggle has id `field`
    pub fn add_select(&self, field: &str, label: &str, options: &[&str], selected: Option<&str>) {
        let mut dom = self.dom();
        let markup = dom.markup.select.clone();
        let control = dom.form_group(field, label);
        let wrapper = dom.append(control, Node::new("div").attr("class", "pf-c-select"));
        let toggle = dom.append(
            wrapper,
            Node::new("button")
                .attr("class", &markup.toggle_class)
                .attr("id", field)
                .attr("type", "button")
                .attr(&markup.expanded_attribute, "false"),
        );
        let label_node = dom.append(
            toggle,
            Node::new("span")
                .attr("class", &markup.toggle_text_class)
                .text(selected.unwrap_or_default()),
        );
        let mut menu_node = Node::new("ul").attr("class", "pf-c-select__menu");
        menu_node.rendered = false;
        let menu = dom.append(wrapper, menu_node);
        for option in options {
            let li = dom.append(menu, Node::new("li"));
            let _ = dom.append(
                li,
                Node::new("button")
                    .attr("class", &markup.menu_item_class)
                    .text(option),
            );
        }
        dom.selects.push(MockSelect {
            toggle,
            label: label_node,
            menu,
            auto_collapse: true,
        });
    }

    /// Add a button addressed by test id
    pub fn add_button(&self, test_id: &str, label: &str) {
        let mut dom = self.dom();
        let _ = dom.append(
            ROOT,
            Node::new("button")
                .attr("class", "pf-c-button")
                .attr("data-testid", test_id)
                .text(label),
        );
    }

    /// Add the "no users" empty state with its create action
    pub fn add_empty_state(&self, container_id: &str, action_id: &str) {
        let mut dom = self.dom();
        let state = dom.append(
            ROOT,
            Node::new("div")
                .attr("class", "pf-c-empty-state")
                .attr("data-testid", container_id),
        );
        let _ = dom.append(
            state,
            Node::new("button")
                .attr("class", "pf-c-button pf-m-primary")
                .attr("data-testid", action_id)
                .text("Create new user"),
        );
    }

    /// Add a heading element
    pub fn add_heading(&self, tag: &str, id: &str, text: &str) {
        let mut dom = self.dom();
        let _ = dom.append(ROOT, Node::new(tag).attr("id", id).text(text));
    }

    /// Attach a side effect to clicks on `name`
    pub fn on_click(&self, name: &str, effect: ClickEffect) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(name)?;
        dom.effects.entry(idx).or_default().push(effect);
        Ok(())
    }

    /// Attach a side effect to choosing `option` in the select `field`
    pub fn on_option_click(&self, field: &str, option: &str, effect: ClickEffect) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.option_node(field, option)?;
        dom.effects.entry(idx).or_default().push(effect);
        Ok(())
    }

    /// Keep `name` out of the document until `delay` has passed
    pub fn show_after(&self, name: &str, delay: Duration) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(name)?;
        dom.nodes[idx].visible_from = Some(Instant::now() + delay);
        Ok(())
    }

    /// Unmount `name` once `delay` has passed
    pub fn hide_after(&self, name: &str, delay: Duration) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(name)?;
        dom.nodes[idx].hidden_from = Some(Instant::now() + delay);
        Ok(())
    }

    /// Mount or unmount `name`
    pub fn set_rendered(&self, name: &str, rendered: bool) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(name)?;
        dom.nodes[idx].rendered = rendered;
        Ok(())
    }

    /// Overwrite an attribute on `name`
    pub fn set_attribute(&self, name: &str, attribute: &str, value: &str) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(name)?;
        let _ = dom.nodes[idx]
            .attributes
            .insert(attribute.to_string(), value.to_string());
        Ok(())
    }

    /// Remove an attribute from `name`
    pub fn remove_attribute(&self, name: &str, attribute: &str) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(name)?;
        let _ = dom.nodes[idx].attributes.remove(attribute);
        Ok(())
    }

    /// Set the value of an input without recording a call
    pub fn set_value(&self, name: &str, value: &str) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(name)?;
        dom.nodes[idx].value = value.to_string();
        Ok(())
    }

    /// Current value of an input
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<String> {
        let dom = self.dom();
        dom.find(name).map(|idx| dom.nodes[idx].value.clone())
    }

    /// Open or close a select without recording a call
    pub fn set_select_expanded(&self, field: &str, expanded: bool) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(field)?;
        let select = dom.select_for(idx).cloned().ok_or_else(|| PageError::Driver {
            message: format!("'{field}' is not a select"),
        })?;
        dom.set_expanded(&select, expanded);
        Ok(())
    }

    /// Keep the menu open after an option is chosen
    pub fn set_auto_collapse(&self, field: &str, auto_collapse: bool) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.find_or_err(field)?;
        let select = dom
            .selects
            .iter_mut()
            .find(|s| s.toggle == idx)
            .ok_or_else(|| PageError::Driver {
                message: format!("'{field}' is not a select"),
            })?;
        select.auto_collapse = auto_collapse;
        Ok(())
    }

    /// Whether the select's menu is open
    #[must_use]
    pub fn is_select_expanded(&self, field: &str) -> Option<bool> {
        let dom = self.dom();
        let idx = dom.find(field)?;
        dom.select_for(idx).map(|s| dom.is_expanded(s))
    }

    /// Label currently shown on the select toggle
    #[must_use]
    pub fn select_label(&self, field: &str) -> Option<String> {
        let dom = self.dom();
        let idx = dom.find(field)?;
        dom.select_for(idx).map(|s| dom.nodes[s.label].text.clone())
    }

    /// Titles of all notification banners shown so far
    #[must_use]
    pub fn notifications(&self) -> Vec<String> {
        let dom = self.dom();
        let class = dom.markup.notifications.alert_title_class.clone();
        (0..dom.nodes.len())
            .filter(|&i| dom.nodes[i].has_class(&class))
            .map(|i| dom.nodes[i].text.clone())
            .collect()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.dom().history.clone()
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.dom().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Number of recorded calls equal to `entry`
    #[must_use]
    pub fn count_calls(&self, entry: &str) -> usize {
        self.dom().history.iter().filter(|c| *c == entry).count()
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.dom().history.clear();
    }
}

#[async_trait]
impl UiDriver for MockDriver {
    async fn query_all(&self, selector: &Selector) -> PageResult<Vec<ElementHandle>> {
        self.dom().query(ROOT, selector)
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &Selector,
    ) -> PageResult<Vec<ElementHandle>> {
        let dom = self.dom();
        let idx = dom.live(scope)?;
        dom.query(idx, selector)
    }

    async fn parent(&self, element: &ElementHandle) -> PageResult<Option<ElementHandle>> {
        let dom = self.dom();
        let idx = dom.live(element)?;
        Ok(dom.nodes[idx].parent.map(|p| dom.handle(p)))
    }

    async fn click(&self, element: &ElementHandle) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.live(element)?;
        let entry = format!("click:{}", dom.nodes[idx].label());
        dom.history.push(entry);
        dom.click(idx);
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.live(element)?;
        if dom.nodes[idx].tag != "input" {
            return Err(PageError::Driver {
                message: format!("{} is not editable", element.id),
            });
        }
        let entry = format!("clear:{}", dom.nodes[idx].label());
        dom.history.push(entry);
        dom.nodes[idx].value.clear();
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> PageResult<()> {
        let mut dom = self.dom();
        let idx = dom.live(element)?;
        if dom.nodes[idx].tag != "input" {
            return Err(PageError::Driver {
                message: format!("{} is not editable", element.id),
            });
        }
        let entry = format!("type:{}:{text}", dom.nodes[idx].label());
        dom.history.push(entry);
        dom.nodes[idx].value.push_str(text);
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> PageResult<String> {
        let dom = self.dom();
        let idx = dom.live(element)?;
        Ok(dom.text_of(idx))
    }

    async fn input_value(&self, element: &ElementHandle) -> PageResult<String> {
        let dom = self.dom();
        let idx = dom.live(element)?;
        Ok(dom.nodes[idx].value.clone())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> PageResult<Option<String>> {
        let dom = self.dom();
        let idx = dom.live(element)?;
        Ok(dom.nodes[idx].attributes.get(name).cloned())
    }
}
