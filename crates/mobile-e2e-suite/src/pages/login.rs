//! Login, language and help screens
//!
//! One page object serves every app with a login screen; the differences
//! between apps live in the [`AppProfile`] locator table and flow flags.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use mobile_e2e_core::config::TimingSettings;
use mobile_e2e_core::{AppProfile, BasePage, E2eError, Locator, Result, Session, UiElement};
use tracing::{debug, info, warn};

/// Attempts at dragging the anchor text up to reveal the language options
pub const REVEAL_ATTEMPTS: u32 = 3;
/// Share of the anchor's distance from the top covered by the reveal drag
pub const REVEAL_LIFT_PERCENT: u32 = 70;
/// Screen share the welcome text is scrolled up by
pub const WELCOME_SCROLL_PERCENT: u32 = 40;

const SHEET_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    French,
    English,
}

impl Language {
    fn option(self) -> UiElement {
        match self {
            Language::French => UiElement::FrenchOption,
            Language::English => UiElement::EnglishOption,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "français" | "francais" | "french" | "fr" => Ok(Language::French),
            "english" | "anglais" | "en" => Ok(Language::English),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::French => write!(f, "Français"),
            Language::English => write!(f, "English"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginPage {
    base: BasePage,
    profile: AppProfile,
    settle: Duration,
}

impl LoginPage {
    pub fn new(session: Arc<Session>, timing: &TimingSettings, profile: AppProfile) -> Self {
        Self {
            base: BasePage::new(session, timing),
            profile,
            settle: timing.settle_delay(),
        }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    pub fn profile(&self) -> &AppProfile {
        &self.profile
    }

    fn locator(&self, element: UiElement) -> Result<Locator> {
        Ok(self.profile.locator(element, self.base.platform())?)
    }

    async fn visible(&self, element: UiElement) -> bool {
        match self.locator(element) {
            Ok(locator) => self.base.is_visible(&locator).await,
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Login
    // ------------------------------------------------------------------

    /// Fill both fields and submit
    ///
    /// The keyboard is dismissed after each field. Submission uses the
    /// resilient click when the profile asks for it.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let submit = self.locator(UiElement::LoginButton)?;
        let email_field = self.locator(UiElement::EmailInput)?;
        let password_field = self.locator(UiElement::PasswordInput)?;
        info!("Logging in to {} as {}", self.profile.name, email);

        if self.profile.flow.open_form_first {
            let strategy = self
                .base
                .click_resilient(&submit)
                .await
                .map_err(|e| E2eError::interaction("open", "login form", e))?;
            debug!("Login form opened after {} attempt(s)", strategy.attempts());
            self.base.pause(self.settle).await;
        }

        self.fill("email field", &email_field, email).await?;
        self.fill("password field", &password_field, password).await?;

        if self.profile.flow.resilient_submit {
            let strategy = self
                .base
                .click_resilient(&submit)
                .await
                .map_err(|e| E2eError::interaction("submit", "login button", e))?;
            info!("Login submitted with {:?} click", strategy);
        } else {
            self.base
                .click(&submit)
                .await
                .map_err(|e| E2eError::interaction("submit", "login button", e))?;
            info!("Login submitted");
        }
        Ok(())
    }

    async fn fill(&self, field: &str, locator: &Locator, value: &str) -> Result<()> {
        self.base
            .type_text(locator, value)
            .await
            .map_err(|e| E2eError::interaction("fill", field, e))?;
        let dismissal = self.base.dismiss_keyboard().await;
        if !dismissal.is_dismissed() {
            warn!("Keyboard may still be open after filling the {}", field);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Language
    // ------------------------------------------------------------------

    /// Open the language toggle and pick `language`
    pub async fn select_language(&self, language: Language) -> Result<()> {
        let toggle = self.locator(UiElement::LanguageToggle)?;
        info!("Selecting language {}", language);
        self.base
            .click(&toggle)
            .await
            .map_err(|e| E2eError::interaction("open", "language toggle", e))?;
        self.base.pause(self.settle).await;

        let option = language.option();
        if self.profile.flow.explicit_language_option && self.profile.has(option) {
            let locator = self.locator(option)?;
            self.base
                .click(&locator)
                .await
                .map_err(|e| E2eError::interaction("select", format!("{language} option"), e))?;
            self.base.pause(self.settle).await;
        }

        if self.profile.has(UiElement::LanguageSheetClose) {
            let close = self.locator(UiElement::LanguageSheetClose)?;
            let closed = self.base.clone().with_timeout(SHEET_CLOSE_TIMEOUT).try_click(&close).await;
            debug!("Language sheet close control clicked: {}", closed);
        }
        Ok(())
    }

    /// Drag the anchor text up; retried only when the gesture command fails
    pub async fn reveal_language_options(&self) -> Result<()> {
        let anchor = self.locator(UiElement::ScrollAnchorText)?;
        let mut last_failure = String::from("no attempt made");

        for attempt in 1..=REVEAL_ATTEMPTS {
            match self.base.lift(&anchor, REVEAL_LIFT_PERCENT).await {
                Ok(()) => {
                    info!("Language options revealed on attempt {}", attempt);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Attempt {} of {} failed: {}", attempt, REVEAL_ATTEMPTS, e);
                    last_failure = e.to_string();
                }
            }
        }
        Err(E2eError::gesture("reveal language options", REVEAL_ATTEMPTS, last_failure))
    }

    pub async fn scroll_welcome_text_up(&self) -> Result<()> {
        let welcome = self.locator(UiElement::WelcomeText)?;
        self.base.scroll_verified(&welcome, WELCOME_SCROLL_PERCENT, 1).await
    }

    // ------------------------------------------------------------------
    // Predicates and values
    // ------------------------------------------------------------------

    pub async fn is_home_displayed(&self) -> bool {
        self.visible(UiElement::CreateAccountText).await
    }

    /// Home screen check bounded by the page timeout
    pub async fn wait_for_home(&self) -> bool {
        match self.locator(UiElement::CreateAccountText) {
            Ok(locator) => self.base.is_visible_within(&locator, self.base.timeout()).await,
            Err(_) => false,
        }
    }

    /// Signed-in home state: the cashback amount shows within the page timeout
    pub async fn wait_for_balances(&self) -> bool {
        match self.locator(UiElement::CashbackAmount) {
            Ok(locator) => self.base.is_visible_within(&locator, self.base.timeout()).await,
            Err(_) => false,
        }
    }

    pub async fn are_language_options_displayed(&self) -> bool {
        self.visible(UiElement::LanguageToggle).await
    }

    pub async fn is_language_french(&self) -> bool {
        self.visible(UiElement::FrenchIndicator).await
    }

    pub async fn cashback_value(&self) -> Option<String> {
        let locator = self.locator(UiElement::CashbackAmount).ok()?;
        self.base.optional_text(&locator).await
    }

    pub async fn crypto_balance_value(&self) -> Option<String> {
        let locator = self.locator(UiElement::CryptoBalance).ok()?;
        self.base.optional_text(&locator).await
    }

    // ------------------------------------------------------------------
    // Help form
    // ------------------------------------------------------------------

    pub async fn open_help(&self) -> Result<()> {
        self.click_element(UiElement::HelpButton, "help button").await
    }

    pub async fn open_connection_problem(&self) -> Result<()> {
        self.click_element(UiElement::ConnectionProblem, "connection problem link").await
    }

    pub async fn enter_phone(&self, phone: &str) -> Result<()> {
        let field = self.locator(UiElement::PhoneInput)?;
        self.base
            .type_text(&field, phone)
            .await
            .map_err(|e| E2eError::interaction("fill", "phone field", e))
    }

    pub async fn enter_help_email(&self, email: &str) -> Result<()> {
        let field = self.locator(UiElement::HelpEmailInput)?;
        self.base
            .type_text(&field, email)
            .await
            .map_err(|e| E2eError::interaction("fill", "help email field", e))
    }

    pub async fn send_help_request(&self) -> Result<()> {
        self.base.dismiss_keyboard().await;
        self.click_element(UiElement::SendButton, "send button").await
    }

    /// Whole connection-problem flow, from the help button to sending
    pub async fn complete_help_form(&self, phone: &str, email: &str) -> Result<()> {
        self.open_help().await?;
        self.open_connection_problem().await?;
        self.enter_phone(phone).await?;
        self.enter_help_email(email).await?;
        self.send_help_request().await
    }

    async fn click_element(&self, element: UiElement, name: &str) -> Result<()> {
        let locator = self.locator(element)?;
        self.base
            .click(&locator)
            .await
            .map_err(|e| E2eError::interaction("click", name, e))?;
        info!("Clicked {}", name);
        Ok(())
    }
}
