//! Element locators and per-app locator tables
//!
//! Locators serialize to and from the compact selector strings Appium users
//! already know: `//xpath`, `~accessibility id`, `id=...`,
//! `-ios class chain:...`, `-ios predicate string:...` and `android=...`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::Platform;

// ----------------------------------------------------------------------------
// Locator
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    Xpath,
    AccessibilityId,
    Id,
    ClassName,
    IosClassChain,
    IosPredicate,
    AndroidUiAutomator,
}

impl LocatorStrategy {
    /// Value of the `using` member in find-element requests
    pub fn as_w3c(self) -> &'static str {
        match self {
            LocatorStrategy::Xpath => "xpath",
            LocatorStrategy::AccessibilityId => "accessibility id",
            LocatorStrategy::Id => "id",
            LocatorStrategy::ClassName => "class name",
            LocatorStrategy::IosClassChain => "-ios class chain",
            LocatorStrategy::IosPredicate => "-ios predicate string",
            LocatorStrategy::AndroidUiAutomator => "-android uiautomator",
        }
    }
}

/// A `(strategy, value)` query for one element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub value: String,
}

impl Locator {
    pub fn new(strategy: LocatorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Xpath, value)
    }

    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::AccessibilityId, value)
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Id, value)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::ClassName, value)
    }

    pub fn ios_class_chain(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::IosClassChain, value)
    }

    pub fn ios_predicate(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::IosPredicate, value)
    }

    pub fn android_uiautomator(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::AndroidUiAutomator, value)
    }

    /// Parse a compact selector string
    pub fn parse(selector: &str) -> Result<Self, ConfigError> {
        let selector = selector.trim();
        let invalid = |reason: &str| ConfigError::Invalid {
            key: format!("locator '{selector}'"),
            reason: reason.to_string(),
        };

        let locator = if let Some(rest) = selector.strip_prefix("-ios class chain:") {
            Self::ios_class_chain(rest)
        } else if let Some(rest) = selector.strip_prefix("-ios predicate string:") {
            Self::ios_predicate(rest)
        } else if let Some(rest) = selector.strip_prefix("android=") {
            Self::android_uiautomator(rest)
        } else if let Some(rest) = selector.strip_prefix("id=") {
            Self::id(rest)
        } else if let Some(rest) = selector.strip_prefix("class=") {
            Self::class_name(rest)
        } else if let Some(rest) = selector.strip_prefix('~') {
            Self::accessibility_id(rest)
        } else if selector.starts_with('/') || selector.starts_with("(/") {
            Self::xpath(selector)
        } else {
            return Err(invalid("unrecognised selector prefix"));
        };

        if locator.value.is_empty() {
            return Err(invalid("empty selector value"));
        }
        Ok(locator)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            LocatorStrategy::Xpath => write!(f, "{}", self.value),
            LocatorStrategy::AccessibilityId => write!(f, "~{}", self.value),
            LocatorStrategy::Id => write!(f, "id={}", self.value),
            LocatorStrategy::ClassName => write!(f, "class={}", self.value),
            LocatorStrategy::IosClassChain => write!(f, "-ios class chain:{}", self.value),
            LocatorStrategy::IosPredicate => write!(f, "-ios predicate string:{}", self.value),
            LocatorStrategy::AndroidUiAutomator => write!(f, "android={}", self.value),
        }
    }
}

impl TryFrom<String> for Locator {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Locator::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

/// Android and iOS locators for the same semantic element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformLocator {
    pub android: Locator,
    pub ios: Locator,
}

impl PlatformLocator {
    pub fn new(android: Locator, ios: Locator) -> Self {
        Self { android, ios }
    }

    pub fn for_platform(&self, platform: Platform) -> &Locator {
        platform.select(&self.android, &self.ios)
    }

    /// Visible text containing `text`, on either platform
    pub fn text_contains(text: &str) -> Self {
        Self {
            android: Locator::android_uiautomator(format!("new UiSelector().textContains(\"{text}\")")),
            ios: Locator::ios_predicate(format!(
                "type == \"XCUIElementTypeStaticText\" AND name CONTAINS \"{text}\""
            )),
        }
    }
}

// ----------------------------------------------------------------------------
// Semantic elements and tables
// ----------------------------------------------------------------------------

/// Semantic UI elements referenced by page objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiElement {
    // login form
    EmailInput,
    PasswordInput,
    LoginButton,
    // home screen
    CashbackAmount,
    CryptoBalance,
    CreateAccountText,
    WelcomeText,
    ScrollAnchorText,
    // language selection
    LanguageToggle,
    LanguageOptionsContainer,
    FrenchOption,
    EnglishOption,
    FrenchIndicator,
    LanguageSheetClose,
    // help form
    HelpButton,
    ConnectionProblem,
    PhoneInput,
    HelpEmailInput,
    AccountAccess,
    CustomerService,
    SendButton,
    // search journey
    OnboardingSkip,
    SearchButton,
    SearchInput,
    SearchFallbackInput,
    PopupClose,
    PopupCloseAlt,
    LanguageButton,
    LanguageMenuSearch,
    LanguageMenuSearchField,
    LinkPreviewOpen,
    TabsCount,
}

impl fmt::Display for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // snake_case, as used in locator files
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{self:?}"));
        f.write_str(&name)
    }
}

impl FromStr for UiElement {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_string())).map_err(|_| ConfigError::Invalid {
            key: "element".to_string(),
            reason: format!("unknown UI element '{s}'"),
        })
    }
}

/// Locator data for one app, keyed by semantic element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorTable {
    entries: BTreeMap<UiElement, PlatformLocator>,
}

impl LocatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, element: UiElement, android: Locator, ios: Locator) -> Self {
        self.insert(element, PlatformLocator::new(android, ios));
        self
    }

    pub fn insert(&mut self, element: UiElement, locator: PlatformLocator) {
        self.entries.insert(element, locator);
    }

    pub fn get(&self, element: UiElement) -> Option<&PlatformLocator> {
        self.entries.get(&element)
    }

    pub fn contains(&self, element: UiElement) -> bool {
        self.entries.contains_key(&element)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UiElement, &PlatformLocator)> {
        self.entries.iter().map(|(element, locator)| (*element, locator))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of `other` replace entries of `self`
    pub fn merge(&mut self, other: LocatorTable) {
        self.entries.extend(other.entries);
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::Loading(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

// ----------------------------------------------------------------------------
// App profile
// ----------------------------------------------------------------------------

/// Flow switches that differ between apps sharing the same page object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowFlags {
    /// Tap the submit control once before filling the form
    pub open_form_first: bool,
    /// Submit with the three-strategy resilient click
    pub resilient_submit: bool,
    /// Pick an explicit language option after opening the toggle
    pub explicit_language_option: bool,
}

/// Everything a parameterised page object needs to drive one app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProfile {
    pub name: String,
    #[serde(default)]
    pub flow: FlowFlags,
    #[serde(default)]
    pub locators: LocatorTable,
}

impl AppProfile {
    pub fn new(name: impl Into<String>, flow: FlowFlags, locators: LocatorTable) -> Self {
        Self {
            name: name.into(),
            flow,
            locators,
        }
    }

    /// Locator for `element` on `platform`, or a `MissingLocator` error
    pub fn locator(&self, element: UiElement, platform: Platform) -> Result<Locator, ConfigError> {
        self.locators
            .get(element)
            .map(|entry| entry.for_platform(platform).clone())
            .ok_or_else(|| ConfigError::MissingLocator {
                profile: self.name.clone(),
                element: element.to_string(),
                platform,
            })
    }

    pub fn has(&self, element: UiElement) -> bool {
        self.locators.contains(element)
    }

    /// Replace locators with the entries of a TOML file
    pub fn with_overrides_from<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        self.locators.merge(LocatorTable::load(path)?);
        Ok(self)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
