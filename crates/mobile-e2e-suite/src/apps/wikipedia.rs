//! Wikipedia (alpha build): search journey through articles and languages

use mobile_e2e_core::{AppProfile, FlowFlags, Locator, LocatorTable, PlatformLocator, UiElement};

pub const NAME: &str = "wikipedia";

const ANDROID_ID_PREFIX: &str = "org.wikipedia.alpha:id/";

fn android_id(name: &str) -> Locator {
    Locator::id(format!("{ANDROID_ID_PREFIX}{name}"))
}

pub fn profile() -> AppProfile {
    AppProfile::new(NAME, FlowFlags::default(), locators())
}

fn locators() -> LocatorTable {
    let mut table = LocatorTable::new()
        .with(
            UiElement::OnboardingSkip,
            android_id("fragment_onboarding_skip_button"),
            Locator::accessibility_id("Skip"),
        )
        .with(
            UiElement::SearchButton,
            android_id("navigation_bar_item_icon_container"),
            Locator::ios_class_chain("**/XCUIElementTypeSearchField"),
        )
        .with(
            UiElement::SearchInput,
            android_id("search_src_text"),
            Locator::ios_class_chain("**/XCUIElementTypeSearchField"),
        )
        .with(
            UiElement::SearchFallbackInput,
            Locator::android_uiautomator("new UiSelector().className(\"android.widget.EditText\")"),
            Locator::ios_class_chain("**/XCUIElementTypeTextField"),
        )
        .with(
            UiElement::PopupClose,
            android_id("closeButton"),
            Locator::accessibility_id("Close"),
        )
        .with(
            UiElement::PopupCloseAlt,
            Locator::accessibility_id("Close"),
            Locator::accessibility_id("Close"),
        )
        .with(
            UiElement::LanguageButton,
            Locator::android_uiautomator("new UiSelector().textContains(\"Lang\")"),
            Locator::accessibility_id("language"),
        )
        .with(
            UiElement::LanguageMenuSearch,
            Locator::android_uiautomator("new UiSelector().textContains(\"Search\")"),
            Locator::ios_class_chain("**/XCUIElementTypeButton"),
        )
        .with(
            UiElement::LanguageMenuSearchField,
            android_id("search_src_text"),
            Locator::ios_class_chain("**/XCUIElementTypeTextField"),
        )
        .with(
            UiElement::LinkPreviewOpen,
            android_id("link_preview_secondary_button"),
            Locator::ios_class_chain("**/XCUIElementTypeButton"),
        )
        .with(
            UiElement::TabsCount,
            android_id("tabsCountText"),
            Locator::ios_class_chain("**/XCUIElementTypeButton"),
        );
    table.insert(UiElement::FrenchOption, PlatformLocator::text_contains("Français"));
    table
}
