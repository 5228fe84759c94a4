//! Wikipedia search journey

use cucumber::{given, then, when};

use super::world::E2eWorld;

/// Horizontal swipes that reach the last carousel image
const CAROUSEL_SWIPES: u32 = 5;

#[given(regex = r"^the app is launched$")]
async fn app_is_launched(world: &mut E2eWorld) {
    assert!(world.session.is_some(), "driver should be initialised");
    world.search_page().dismiss_onboarding().await;
}

#[when(regex = r"^I scroll to the bottom of the welcome page$")]
async fn scroll_welcome_page(world: &mut E2eWorld) {
    world.search_page().scroll_to_bottom().await;
}

#[when(regex = r"^I swipe through the carousel until the last image$")]
async fn swipe_carousel(world: &mut E2eWorld) {
    world.search_page().swipe_carousel(CAROUSEL_SWIPES).await;
}

#[when(regex = r#"^I search for "([^"]*)"$"#)]
async fn search_for(world: &mut E2eWorld, query: String) {
    let page = world.search_page();
    page.search_for(&query).await.expect("search should open");
    page.select_search_result(&query)
        .await
        .expect("search result should open");
}

#[when(regex = r#"^I scroll until I find the city "([^"]*)" and dismiss the popup$"#)]
async fn scroll_to_city(world: &mut E2eWorld, city: String) {
    let opened = world
        .search_page()
        .scroll_to_text_and_open(&city)
        .await
        .expect("city link should open");
    tracing::info!("City '{}' opened: {}", city, opened);
}

#[when(regex = r"^I change the website language to French$")]
async fn change_language(world: &mut E2eWorld) {
    world
        .search_page()
        .change_language_to_french()
        .await
        .expect("language should switch to French");
}

#[when(regex = r"^I scroll down to the bottom of the page$")]
async fn scroll_to_bottom(world: &mut E2eWorld) {
    world.search_page().scroll_to_bottom().await;
}

#[then(regex = r#"^I click on "([^"]*)" and navigate to the newly opened page$"#)]
async fn open_link(world: &mut E2eWorld, link: String) {
    world
        .search_page()
        .open_link_in_new_tab(&link)
        .await
        .expect("linked page title should be visible after navigation");
}
