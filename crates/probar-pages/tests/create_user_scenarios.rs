//! End-to-end scenarios for the create user page against the in-memory driver.

use std::time::Duration;

use probar_pages::{ClickEffect, CreateUserPage, MockDriver, PageConfig, PageObject};
use proptest::prelude::*;

type Page = CreateUserPage<MockDriver>;

const ROLES: [&str; 3] = ["Admin", "Viewer", "Editor"];

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_config() -> PageConfig {
    PageConfig::new()
        .with_element_timeout(Duration::from_millis(80))
        .with_poll_interval(Duration::from_millis(5))
}

/// Users list with the toolbar button, followed by the create form.
fn create_user_screen() -> MockDriver {
    let driver = MockDriver::new();
    driver.add_button(Page::ADD_USER_BTN, "Add user");
    driver.add_text_input(Page::USERNAME_FIELD, "Username");
    driver.add_select("role", "Role", &ROLES, Some("Admin"));
    driver.add_button(Page::CREATE_BTN, "Create");
    driver.add_button(Page::CANCEL_BTN, "Cancel");
    driver
        .on_click(
            Page::CREATE_BTN,
            ClickEffect::Notify("The user has been created".to_string()),
        )
        .unwrap();
    driver
}

fn page(driver: MockDriver) -> Page {
    init_test_tracing();
    CreateUserPage::with_config(driver, fast_config()).unwrap()
}

#[tokio::test]
async fn scenario_create_user_raises_created_notification() {
    let page = page(create_user_screen());
    page.navigate_to_create()
        .await
        .unwrap()
        .create_user("alice")
        .await
        .unwrap()
        .submit_create()
        .await
        .unwrap()
        .assert_notification_created()
        .await
        .unwrap();

    let driver = page.driver();
    assert_eq!(driver.value_of(Page::USERNAME_FIELD).as_deref(), Some("alice"));
    assert_eq!(driver.notifications(), vec!["The user has been created".to_string()]);
}

#[tokio::test]
async fn scenario_created_notification_missing_without_submit() {
    let page = page(create_user_screen());
    page.create_user("alice").await.unwrap();
    let err = page.assert_notification_created().await.unwrap_err();
    assert!(err.is_assertion_failure());
}

#[tokio::test]
async fn scenario_select_assertion_is_repeatable() {
    let page = page(create_user_screen());
    for _ in 0..2 {
        page.assert_attribute_select("role", &ROLES, "Admin")
            .await
            .unwrap();
        assert_eq!(page.driver().is_select_expanded("role"), Some(false));
        assert_eq!(page.driver().count_calls("click:role"), 2);
        page.driver().clear_history();
    }
}

#[tokio::test]
async fn scenario_field_removed_while_waiting_for_absence() {
    let driver = create_user_screen();
    driver
        .hide_after(Page::USERNAME_FIELD, Duration::from_millis(20))
        .unwrap();
    let page = CreateUserPage::with_config(
        driver,
        fast_config().with_element_timeout(Duration::from_millis(500)),
    )
    .unwrap();
    page.assert_attribute_field_exists(Page::USERNAME_FIELD, false)
        .await
        .unwrap();
}

#[tokio::test]
async fn scenario_choice_that_closes_the_form_section() {
    let driver = create_user_screen();
    driver.set_auto_collapse("role", false).unwrap();
    driver
        .on_option_click("role", "Editor", ClickEffect::Hide("role".to_string()))
        .unwrap();
    let page = page(driver);
    page.set_attribute_value_on_select("role", "Editor")
        .await
        .unwrap();
    assert_eq!(page.driver().count_calls("click:role"), 1);
}

#[tokio::test]
async fn scenario_select_assertion_leaves_open_menu_open() {
    let driver = create_user_screen();
    driver.set_select_expanded("role", true).unwrap();
    let page = page(driver);
    page.assert_attribute_select("role", &ROLES, "Admin")
        .await
        .unwrap()
        .assert_attribute_select("role", &ROLES, "Admin")
        .await
        .unwrap();
    assert_eq!(page.driver().is_select_expanded("role"), Some(true));
    assert!(!page.driver().was_called("click:role"));
}

#[tokio::test]
async fn scenario_select_order_matters() {
    let page = page(create_user_screen());
    let err = page
        .assert_attribute_select("role", &["Viewer", "Admin", "Editor"], "Admin")
        .await
        .unwrap_err();
    assert!(err.is_assertion_failure());
}

#[tokio::test]
async fn scenario_never_rendered_field() {
    let page = page(create_user_screen());
    page.assert_attribute_field_exists("department", false)
        .await
        .unwrap();
    let err = page
        .assert_attribute_field_exists("department", true)
        .await
        .unwrap_err();
    assert!(err.is_assertion_failure());
    assert!(err.to_string().contains("department"));
}

#[tokio::test]
async fn scenario_choose_option_on_collapsed_select() {
    let page = page(create_user_screen());
    page.set_attribute_value_on_select("role", "Editor")
        .await
        .unwrap();
    assert_eq!(page.driver().select_label("role").as_deref(), Some("Editor"));
    assert_eq!(page.driver().is_select_expanded("role"), Some(false));
    assert_eq!(page.read_attribute_value("role").await.unwrap(), "Editor");
}

#[tokio::test]
async fn scenario_choose_option_without_auto_collapse() {
    let driver = create_user_screen();
    driver.set_auto_collapse("role", false).unwrap();
    let page = page(driver);
    page.set_attribute_value_on_select("role", "Viewer")
        .await
        .unwrap();
    assert_eq!(page.driver().select_label("role").as_deref(), Some("Viewer"));
    assert_eq!(page.driver().is_select_expanded("role"), Some(false));
}

#[tokio::test]
async fn scenario_near_miss_option_fails() {
    let page = page(create_user_screen());
    let err = page
        .set_attribute_value_on_select("role", "editor")
        .await
        .unwrap_err();
    assert!(err.is_locator_failure());
    assert_eq!(page.driver().select_label("role").as_deref(), Some("Admin"));
}

#[tokio::test]
async fn scenario_unset_select_reads_placeholder() {
    let driver = MockDriver::new();
    driver.add_select("locale", "Locale", &["en", "de"], None);
    let page = page(driver);
    assert_eq!(page.read_attribute_value("locale").await.unwrap(), "Choose...");
    page.assert_attribute_select("locale", &["en", "de"], "Choose...")
        .await
        .unwrap();
}

#[tokio::test]
async fn scenario_empty_username_is_cleared_not_typed() {
    let driver = create_user_screen();
    driver.set_value(Page::USERNAME_FIELD, "bob").unwrap();
    let page = page(driver);
    page.set_username("").await.unwrap();
    assert_eq!(page.driver().value_of(Page::USERNAME_FIELD).as_deref(), Some(""));
    assert!(!page.driver().was_called("type:"));
}

#[tokio::test]
async fn scenario_create_form_reached_from_empty_state() {
    let driver = MockDriver::new();
    driver.add_empty_state(Page::USERS_EMPTY_STATE, Page::EMPTY_STATE_CREATE_USER_BTN);
    driver.add_text_input("firstName", "First name");
    driver.add_button(Page::CREATE_BTN, "Create");
    driver
        .on_click(
            Page::CREATE_BTN,
            ClickEffect::ValidateRequired("firstName".to_string()),
        )
        .unwrap();
    let page = page(driver);
    page.navigate_to_create()
        .await
        .unwrap()
        .submit_create()
        .await
        .unwrap()
        .assert_validation_error_required("firstName")
        .await
        .unwrap()
        .assert_attribute_label("firstName", "First")
        .await
        .unwrap();
}

#[tokio::test]
async fn scenario_join_group_and_check_heading() {
    let driver = create_user_screen();
    driver.add_button(Page::JOIN_GROUPS_BTN, "Join groups");
    driver.add_button(Page::JOIN_BTN, "Join");
    driver.add_heading("h1", "mygroup", "My Group");
    driver.set_rendered("mygroup", false).unwrap();
    driver
        .on_click(Page::JOIN_BTN, ClickEffect::Reveal("mygroup".to_string()))
        .unwrap();
    let page = page(driver);
    page.toggle_add_group_modal()
        .await
        .unwrap()
        .join_groups()
        .await
        .unwrap()
        .assert_group_display_name("MyGroup", "My Group")
        .await
        .unwrap();
}

/// One step against the role select: `None` asserts the current state,
/// `Some(i)` chooses `ROLES[i]`.
fn any_step() -> impl Strategy<Value = Option<usize>> {
    prop_oneof![Just(None), (0..ROLES.len()).prop_map(Some)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_select_steps_keep_expansion_state(
        start_open in any::<bool>(),
        auto_collapse in any::<bool>(),
        steps in proptest::collection::vec(any_step(), 1..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let driver = create_user_screen();
            driver.set_select_expanded("role", start_open).unwrap();
            driver.set_auto_collapse("role", auto_collapse).unwrap();
            let page = page(driver);
            for step in steps {
                let before = page.driver().is_select_expanded("role").unwrap();
                match step {
                    None => {
                        let shown = page.driver().select_label("role").unwrap();
                        page.assert_attribute_select("role", &ROLES, &shown)
                            .await
                            .unwrap();
                        let after = page.driver().is_select_expanded("role").unwrap();
                        prop_assert_eq!(after, before);
                    }
                    Some(index) => {
                        page.set_attribute_value_on_select("role", ROLES[index])
                            .await
                            .unwrap();
                        let after = page.driver().is_select_expanded("role").unwrap();
                        prop_assert!(after == before || !after);
                        let label = page.driver().select_label("role");
                        prop_assert_eq!(
                            label.as_deref(),
                            Some(ROLES[index])
                        );
                    }
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
