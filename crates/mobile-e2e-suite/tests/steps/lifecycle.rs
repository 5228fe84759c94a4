//! Driver lifecycle and interaction fallbacks against the in-memory device

use std::sync::Arc;

use cucumber::{given, then, when};
use mobile_e2e_core::{BasePage, ClickStrategy, KeyboardDismissal, UiElement};

use super::world::E2eWorld;

fn base_page(world: &E2eWorld) -> BasePage {
    world.login_page().base().clone()
}

// ----------------------------------------------------------------------------
// Session reuse
// ----------------------------------------------------------------------------

#[given(regex = r"^a live session$")]
async fn live_session(world: &mut E2eWorld) {
    let session = world.session();
    assert!(!session.id().is_empty());
    assert_eq!(world.fake().factory.open_count(), 1);
    world.previous_session = Some(session);
}

#[when(regex = r"^the session is acquired again$")]
async fn acquire_again(world: &mut E2eWorld) {
    let session = world
        .hooks_mut()
        .manager_mut()
        .acquire()
        .await
        .expect("second acquire should succeed");
    world.session = Some(session);
}

#[when(regex = r"^the session is released and acquired again$")]
async fn release_and_acquire(world: &mut E2eWorld) {
    let manager = world.hooks_mut().manager_mut();
    manager.release().await;
    let session = manager.acquire().await.expect("fresh acquire should succeed");
    world.session = Some(session);
}

#[then(regex = r"^the same session is reused$")]
async fn same_session(world: &mut E2eWorld) {
    let previous = world.previous_session.as_ref().expect("no previous session");
    assert!(Arc::ptr_eq(previous, &world.session()));
    assert_eq!(world.fake().factory.open_count(), 1);
}

#[then(regex = r"^a new session is opened$")]
async fn new_session(world: &mut E2eWorld) {
    let previous = world.previous_session.as_ref().expect("no previous session");
    assert_ne!(previous.id(), world.session().id());
    assert_eq!(world.fake().factory.open_count(), 2);
}

// ----------------------------------------------------------------------------
// Resilient click
// ----------------------------------------------------------------------------

#[given(regex = r#"^direct clicks on "([^"]*)" fail$"#)]
async fn direct_clicks_fail(world: &mut E2eWorld, element: String) {
    world.fake().device.fail_on_element(&element, "click");
}

#[when(regex = r#"^I click "([^"]*)" resiliently$"#)]
async fn click_resiliently(world: &mut E2eWorld, element: String) {
    let target: UiElement = element.parse().expect("known element name");
    let page = world.login_page();
    let locator = page
        .profile()
        .locator(target, page.base().platform())
        .expect("element has a locator");
    let strategy = page
        .base()
        .click_resilient(&locator)
        .await
        .expect("one of the click strategies should land");
    world.last_click = Some(strategy);
}

#[then(regex = r#"^the click lands by "([^"]*)"$"#)]
async fn click_landed_by(world: &mut E2eWorld, expected: String) {
    let expected = match expected.as_str() {
        "direct click" => ClickStrategy::Direct,
        "pointer tap" => ClickStrategy::PointerTap,
        "script" => ClickStrategy::Script,
        other => panic!("unknown click strategy: {other}"),
    };
    assert_eq!(world.last_click, Some(expected));
}

// ----------------------------------------------------------------------------
// Keyboard dismissal
// ----------------------------------------------------------------------------

#[given(regex = r"^the native keyboard hide fails$")]
async fn native_hide_fails(world: &mut E2eWorld) {
    world.fake().device.fail_always("hide_keyboard");
}

#[given(regex = r"^the keyboard Done button is missing$")]
async fn done_button_missing(_world: &mut E2eWorld) {
    // the offline screen never contains one
}

#[when(regex = r"^I dismiss the keyboard$")]
async fn dismiss_keyboard(world: &mut E2eWorld) {
    let outcome = base_page(world).dismiss_keyboard().await;
    world.last_dismissal = Some(outcome);
}

#[then(regex = r#"^the keyboard is dismissed by "([^"]*)"$"#)]
async fn keyboard_dismissed_by(world: &mut E2eWorld, expected: String) {
    let expected = match expected.as_str() {
        "native hide" => KeyboardDismissal::NativeHide,
        "back navigation" => KeyboardDismissal::BackNavigation,
        "done button" => KeyboardDismissal::DoneButton,
        "canvas tap" => KeyboardDismissal::CanvasTap,
        other => panic!("unknown dismissal level: {other}"),
    };
    assert_eq!(world.last_dismissal.as_ref(), Some(&expected));
}
