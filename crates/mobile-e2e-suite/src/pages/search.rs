//! Search journey through the Wikipedia app

use std::sync::Arc;
use std::time::Duration;

use mobile_e2e_core::config::TimingSettings;
use mobile_e2e_core::{
    AppProfile, BasePage, E2eError, Locator, PlatformLocator, Result, Session, SwipeDirection, UiElement,
    WebDriverError,
};
use tracing::{debug, info};

/// Upward swipes after the onboarding screen
pub const ONBOARDING_SWIPES: u32 = 3;
/// Swipes while looking for a text in an article
pub const TEXT_SCROLL_ATTEMPTS: u32 = 12;
/// Swipes while looking for a link further down an article
pub const LINK_SCROLL_ATTEMPTS: u32 = 70;
/// Swipes while looking for the title of the opened page
pub const TITLE_SCROLL_ATTEMPTS: u32 = 40;
/// Swipes that reach the bottom of the longest pages
pub const BOTTOM_SWIPES: u32 = 35;

const INPUT_TIMEOUT: Duration = Duration::from_secs(10);
const QUICK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SearchJourneyPage {
    base: BasePage,
    profile: AppProfile,
}

impl SearchJourneyPage {
    pub fn new(session: Arc<Session>, timing: &TimingSettings, profile: AppProfile) -> Self {
        Self {
            base: BasePage::new(session, timing),
            profile,
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    fn locator(&self, element: UiElement) -> Result<Locator> {
        Ok(self.profile.locator(element, self.base.platform())?)
    }

    fn text(&self, text: &str) -> Locator {
        PlatformLocator::text_contains(text)
            .for_platform(self.base.platform())
            .clone()
    }

    /// Any text starting like `text`, used when the exact link cannot be clicked
    fn text_fallback(&self, text: &str) -> Locator {
        let prefix: String = text.chars().take(2).collect();
        let fallback = PlatformLocator::new(
            PlatformLocator::text_contains(&prefix).android,
            Locator::ios_class_chain("**/XCUIElementTypeStaticText"),
        );
        fallback.for_platform(self.base.platform()).clone()
    }

    fn quick(&self) -> BasePage {
        self.base.clone().with_timeout(QUICK_TIMEOUT)
    }

    /// Skip the onboarding carousel if shown, then settle the feed
    pub async fn dismiss_onboarding(&self) {
        if let Ok(skip) = self.locator(UiElement::OnboardingSkip) {
            if self.base.tap_first_present(&[skip]).await {
                info!("Onboarding skipped");
            }
        }
        self.base.scroll_to_bottom(ONBOARDING_SWIPES).await;
    }

    /// Open search and type `query`, falling back to any text field
    pub async fn search_for(&self, query: &str) -> Result<()> {
        let button = self.locator(UiElement::SearchButton)?;
        self.base
            .click(&button)
            .await
            .map_err(|e| E2eError::interaction("open", "search", e))?;
        // second tap focuses the field on Android; it may already be gone
        self.quick().try_click(&button).await;

        let input = self.locator(UiElement::SearchInput)?;
        let field = if self.base.is_visible_within(&input, INPUT_TIMEOUT).await {
            input
        } else {
            debug!("Search input not visible, using fallback field");
            self.locator(UiElement::SearchFallbackInput)?
        };
        self.base
            .type_text(&field, query)
            .await
            .map_err(|e| E2eError::interaction("fill", "search field", e))?;
        self.base.dismiss_keyboard().await;
        info!("Searched for '{}'", query);
        Ok(())
    }

    /// Open the result matching `query` and close a popup if one shows up
    pub async fn select_search_result(&self, query: &str) -> Result<()> {
        let result = self.text(query);
        self.base
            .clone()
            .with_timeout(INPUT_TIMEOUT)
            .click(&result)
            .await
            .map_err(|e| E2eError::interaction("open", format!("search result '{query}'"), e))?;

        if self.close_popup().await {
            debug!("Popup closed after opening '{}'", query);
        }
        Ok(())
    }

    async fn close_popup(&self) -> bool {
        let closers: Vec<Locator> = [UiElement::PopupClose, UiElement::PopupCloseAlt]
            .into_iter()
            .filter_map(|element| self.locator(element).ok())
            .collect();
        self.base.tap_first_present(&closers).await
    }

    /// Scroll through the article until `text` shows, then tap it
    ///
    /// `Ok(false)` when the text never appeared.
    pub async fn scroll_to_text_and_open(&self, text: &str) -> Result<bool> {
        let target = self.text(text);
        if !self
            .base
            .scroll_until_present(&target, SwipeDirection::Up, TEXT_SCROLL_ATTEMPTS)
            .await
        {
            info!("'{}' not found after {} swipes", text, TEXT_SCROLL_ATTEMPTS);
            return Ok(false);
        }
        self.base
            .click(&target)
            .await
            .map_err(|e| E2eError::interaction("open", format!("'{text}'"), e))?;
        Ok(true)
    }

    pub async fn change_language_to_french(&self) -> Result<()> {
        let quick = self.quick();
        quick.try_click(&self.locator(UiElement::LanguageButton)?).await;
        quick.try_click(&self.locator(UiElement::LanguageMenuSearch)?).await;

        let field = self.locator(UiElement::LanguageMenuSearchField)?;
        quick
            .type_text(&field, "Français")
            .await
            .map_err(|e| E2eError::interaction("fill", "language search field", e))?;
        self.base.dismiss_keyboard().await;

        let option = self.locator(UiElement::FrenchOption)?;
        self.base
            .clone()
            .with_timeout(INPUT_TIMEOUT)
            .click(&option)
            .await
            .map_err(|e| E2eError::interaction("select", "French language", e))?;
        info!("Language switched to French");
        Ok(())
    }

    pub async fn scroll_to_bottom(&self) {
        self.base.scroll_to_bottom(BOTTOM_SWIPES).await;
    }

    /// Swipe the carousel towards its last image
    pub async fn swipe_carousel(&self, swipes: u32) {
        for swipe in 1..=swipes {
            if let Err(e) = self.base.swipe_screen(SwipeDirection::Left).await {
                debug!("Carousel swipe {} ignored: {}", swipe, e);
            }
        }
    }

    /// Open `link_text` in a new tab and land on its page
    pub async fn open_link_in_new_tab(&self, link_text: &str) -> Result<()> {
        let link = self.text(link_text);
        self.base
            .scroll_until_present(&link, SwipeDirection::Up, LINK_SCROLL_ATTEMPTS)
            .await;

        let fallback = self.text_fallback(link_text);
        match self.base.click_with_fallback(&link, Some(&fallback)).await {
            Some(target) => debug!("Clicked {:?} locator for '{}'", target, link_text),
            None => {
                return Err(E2eError::interaction(
                    "open",
                    format!("link '{link_text}'"),
                    WebDriverError::NoSuchElement(link.to_string()).into(),
                ))
            }
        }

        let quick = self.quick();
        quick.try_click(&self.locator(UiElement::LinkPreviewOpen)?).await;
        quick.try_click(&self.locator(UiElement::TabsCount)?).await;

        self.base
            .scroll_until_present(&link, SwipeDirection::Up, TITLE_SCROLL_ATTEMPTS)
            .await;
        quick.try_click(&link).await;
        self.base
            .clone()
            .with_timeout(INPUT_TIMEOUT)
            .wait_visible(&link)
            .await
            .map_err(|e| E2eError::interaction("find", format!("page title '{link_text}'"), e))?;
        info!("Navigated to '{}'", link_text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::wikipedia;
    use mobile_e2e_core::testing::{fake_session, FakeCommand, FakeDevice, FakeElement};
    use mobile_e2e_core::Platform;

    fn page(device: &FakeDevice, platform: Platform) -> SearchJourneyPage {
        let timing = TimingSettings::default();
        SearchJourneyPage::new(fake_session(device, platform).unwrap(), &timing, wikipedia::profile())
    }

    fn add(device: &FakeDevice, element: UiElement, platform: Platform) {
        let locator = wikipedia::profile().locator(element, platform).unwrap();
        device.add(FakeElement::new(element.to_string(), locator));
    }

    fn text(value: &str, platform: Platform) -> Locator {
        PlatformLocator::text_contains(value).for_platform(platform).clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_onboarding_skips_and_settles() {
        let device = FakeDevice::new();
        add(&device, UiElement::OnboardingSkip, Platform::Android);

        page(&device, Platform::Android).dismiss_onboarding().await;
        assert_eq!(device.clicks("onboarding_skip"), 1);
        assert_eq!(device.gestures(), ONBOARDING_SWIPES);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_onboarding_without_skip_button() {
        let device = FakeDevice::new();
        device.fail_always("perform_actions");

        page(&device, Platform::Android).dismiss_onboarding().await;
        assert_eq!(device.gestures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_falls_back_to_any_text_field() {
        let device = FakeDevice::new();
        add(&device, UiElement::SearchButton, Platform::Android);
        add(&device, UiElement::SearchFallbackInput, Platform::Android);

        page(&device, Platform::Android).search_for("Paris").await.unwrap();

        assert_eq!(device.clicks("search_button"), 2);
        assert_eq!(device.element("search_fallback_input").unwrap().text, "Paris");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_result_then_popup() {
        let device = FakeDevice::new();
        device.add(FakeElement::new("paris", text("Paris", Platform::Ios)));
        add(&device, UiElement::PopupCloseAlt, Platform::Ios);

        page(&device, Platform::Ios).select_search_result("Paris").await.unwrap();
        assert_eq!(device.clicks("paris"), 1);
        // both closers resolve to `~Close` on iOS; the first one wins
        assert_eq!(device.clicks("popup_close_alt"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_to_text_reports_absence() {
        let device = FakeDevice::new();
        device.add(FakeElement::new("lyon", text("Lyon", Platform::Android)).appears_after_gestures(3));
        let page = page(&device, Platform::Android);

        assert!(page.scroll_to_text_and_open("Lyon").await.unwrap());
        assert_eq!(device.gestures(), 3);
        assert_eq!(device.clicks("lyon"), 1);

        assert!(!page.scroll_to_text_and_open("Marseille").await.unwrap());
        assert_eq!(device.gestures(), 3 + TEXT_SCROLL_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_language_to_french() {
        let device = FakeDevice::new();
        for element in [
            UiElement::LanguageButton,
            UiElement::LanguageMenuSearch,
            UiElement::LanguageMenuSearchField,
            UiElement::FrenchOption,
        ] {
            add(&device, element, Platform::Android);
        }

        page(&device, Platform::Android).change_language_to_french().await.unwrap();
        assert_eq!(device.element("language_menu_search_field").unwrap().text, "Français");
        assert_eq!(device.clicks("french_option"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_carousel_swipes_left() {
        let device = FakeDevice::new();
        page(&device, Platform::Android).swipe_carousel(4).await;

        let swipes: Vec<_> = device
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                FakeCommand::PerformActions(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(swipes.len(), 4);
        assert_eq!(device.gestures(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_link_in_new_tab() {
        let device = FakeDevice::new();
        device.add(FakeElement::new("cresus", text("Crésus", Platform::Android)).appears_after_gestures(2));
        add(&device, UiElement::LinkPreviewOpen, Platform::Android);
        add(&device, UiElement::TabsCount, Platform::Android);

        page(&device, Platform::Android).open_link_in_new_tab("Crésus").await.unwrap();
        assert_eq!(device.clicks("link_preview_open"), 1);
        assert_eq!(device.clicks("tabs_count"), 1);
        assert_eq!(device.clicks("cresus"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_missing_link_fails() {
        let device = FakeDevice::new();
        let err = page(&device, Platform::Ios).open_link_in_new_tab("Crésus").await.unwrap_err();
        assert!(err.to_string().contains("Crésus"));
    }
}
