//! Lydia: French help form on the login screen, shared home widgets

use mobile_e2e_core::{AppProfile, FlowFlags, Locator, LocatorTable, UiElement};

pub const NAME: &str = "lydia";

pub fn profile() -> AppProfile {
    let flow = FlowFlags {
        open_form_first: true,
        resilient_submit: true,
        explicit_language_option: false,
    };
    AppProfile::new(NAME, flow, locators())
}

fn locators() -> LocatorTable {
    LocatorTable::new()
        // login form
        .with(
            UiElement::EmailInput,
            Locator::xpath("//android.widget.EditText[@resource-id='text-input-flat']"),
            Locator::xpath("//XCUIElementTypeTextField"),
        )
        .with(
            UiElement::PasswordInput,
            Locator::xpath("//android.widget.EditText[@password='true' and @resource-id='text-input-flat']"),
            Locator::xpath("//XCUIElementTypeSecureTextField"),
        )
        .with(
            UiElement::LoginButton,
            Locator::xpath("//android.widget.TextView[@text='Log in']"),
            Locator::xpath(
                "//XCUIElementTypeButton[contains(@label, 'Login') or contains(@label, 'Connexion') or contains(@label, 'Sign in')]",
            ),
        )
        // home screen
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
            Locator::xpath("//XCUIElementTypeStaticText[contains(@label, 'Create') or contains(@label, 'account')]"),
        )
        .with(
            UiElement::WelcomeText,
            Locator::xpath("//android.widget.TextView[@text='Welcome|']"),
            Locator::xpath("//XCUIElementTypeStaticText[@label='Welcome|']"),
        )
        .with(
            UiElement::ScrollAnchorText,
            Locator::xpath("//android.widget.TextView[@text=' on Wigl ✨']"),
            Locator::xpath("//XCUIElementTypeStaticText[@label=' on Wigl ✨']"),
        )
        // language selection
        .with(
            UiElement::LanguageToggle,
            Locator::xpath("//android.widget.TextView[contains(@text, '󰅀')]"),
            Locator::xpath("//XCUIElementTypeButton[@name='language-toggle-button']"),
        )
        .with(
            UiElement::LanguageOptionsContainer,
            Locator::xpath("//android.view.ViewGroup[contains(@resource-id, 'language-container')]"),
            Locator::xpath("//XCUIElementTypeOther[contains(@label, 'language') or contains(@label, 'langue')]"),
        )
        .with(
            UiElement::FrenchOption,
            Locator::xpath("//android.widget.TextView[@text='FR']"),
            Locator::xpath("//XCUIElementTypeStaticText[@label='FR']"),
        )
        .with(
            UiElement::EnglishOption,
            Locator::xpath("//android.widget.TextView[@text='EN']"),
            Locator::xpath("//XCUIElementTypeStaticText[@label='EN']"),
        )
        .with(
            UiElement::FrenchIndicator,
            Locator::xpath("//android.widget.TextView[@text='FR']"),
            Locator::xpath("//XCUIElementTypeStaticText[@name='FR']"),
        )
        .with(
            UiElement::LanguageSheetClose,
            Locator::xpath("(//android.widget.TextView)[12]"),
            Locator::xpath("//XCUIElementTypeButton[@name='Close']"),
        )
        // help form
        .with(
            UiElement::HelpButton,
            Locator::xpath("//android.widget.TextView[@text=\"Besoin d'aide ?\"]"),
            Locator::ios_class_chain("**/XCUIElementTypeButton[`name == \"Besoin d'aide ?\"`]"),
        )
        .with(
            UiElement::ConnectionProblem,
            Locator::xpath("//android.widget.TextView[contains(@text, 'Un problème pour vous connecter')]"),
            Locator::ios_class_chain("**/XCUIElementTypeStaticText[`name == \"Un problème pour vous connecter ?\"`]"),
        )
        .with(
            UiElement::PhoneInput,
            Locator::xpath("//android.widget.EditText[@text='06 12 34 56 78']"),
            Locator::ios_class_chain("**/XCUIElementTypeTextField[`value == \"06 12 34 56 78\"`]"),
        )
        .with(
            UiElement::HelpEmailInput,
            Locator::xpath("//android.widget.EditText[@text='e-mail@exemple.fr']"),
            Locator::ios_class_chain("**/XCUIElementTypeTextField[`value == \"e-mail@exemple.fr\"`]"),
        )
        .with(
            UiElement::AccountAccess,
            Locator::xpath("//android.widget.TextView[contains(@text, \"Je n'arrive pas à accéder à mon compte\")]"),
            Locator::ios_class_chain(
                "**/XCUIElementTypeStaticText[`name == \"Je n'arrive pas à accéder à mon compte\"`]",
            ),
        )
        .with(
            UiElement::CustomerService,
            Locator::xpath("//android.widget.TextView[contains(@text, 'Écrire au service client')]"),
            Locator::ios_class_chain("**/XCUIElementTypeStaticText[`name == \"Écrire au service client\"`]"),
        )
        .with(
            UiElement::SendButton,
            Locator::xpath("//android.widget.Button[contains(@text, 'Envoyer')]"),
            Locator::accessibility_id("arrow orientation up size thic"),
        )
}
