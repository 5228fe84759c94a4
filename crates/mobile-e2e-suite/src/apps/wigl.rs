//! Wigl: email/password login, explicit language option

use mobile_e2e_core::{AppProfile, FlowFlags, Locator, LocatorTable, UiElement};

pub const NAME: &str = "wigl";

pub fn profile() -> AppProfile {
    let flow = FlowFlags {
        open_form_first: false,
        resilient_submit: true,
        explicit_language_option: true,
    };
    AppProfile::new(NAME, flow, locators())
}

fn locators() -> LocatorTable {
    LocatorTable::new()
        .with(
            UiElement::EmailInput,
            Locator::xpath("//android.widget.EditText[@resource-id='email-input']"),
            Locator::xpath("//XCUIElementTypeTextField[@name='email-input']"),
        )
        .with(
            UiElement::PasswordInput,
            Locator::xpath("//android.widget.EditText[@resource-id='password-input']"),
            Locator::xpath("//XCUIElementTypeSecureTextField[@name='password-input']"),
        )
        .with(
            UiElement::LoginButton,
            Locator::xpath("//android.widget.Button[@text='Login']"),
            Locator::xpath("//XCUIElementTypeButton[@name='Login']"),
        )
        .with(
            UiElement::CashbackAmount,
            Locator::xpath("//android.widget.TextView[@resource-id='cashback-amount']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name='cashback-amount']"),
        )
        .with(
            UiElement::CryptoBalance,
            Locator::xpath("//android.widget.TextView[@resource-id='crypto-balance']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name='crypto-balance']"),
        )
        .with(
            UiElement::CreateAccountText,
            Locator::xpath("//android.widget.TextView[contains(@text, 'Create your account')]"),
            Locator::xpath("//XCUIElementTypeStaticText[contains(@name, 'Create your account')]"),
        )
        .with(
            UiElement::WelcomeText,
            Locator::xpath("//android.widget.TextView[@text='Welcome|']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name='Welcome|']"),
        )
        .with(
            UiElement::ScrollAnchorText,
            Locator::xpath("//android.widget.TextView[@text=' on Wigl ✨']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name=' on Wigl ✨']"),
        )
        .with(
            UiElement::LanguageToggle,
            Locator::xpath("//android.widget.TextView[contains(@text, '󰅀')]"),
            Locator::xpath("//XCUIElementTypeButton[@name='language-toggle-button']"),
        )
        .with(
            UiElement::LanguageOptionsContainer,
            Locator::xpath("//android.view.ViewGroup[contains(@resource-id, 'language-container')]"),
            Locator::xpath("//XCUIElementTypeOther[contains(@name, 'language-container')]"),
        )
        .with(
            UiElement::FrenchOption,
            Locator::xpath("//android.widget.TextView[@text='FR']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name='FR']"),
        )
        .with(
            UiElement::EnglishOption,
            Locator::xpath("//android.widget.TextView[@text='EN']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name='EN']"),
        )
        .with(
            UiElement::FrenchIndicator,
            Locator::xpath("//android.widget.TextView[@text='FR']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name='FR']"),
        )
}
