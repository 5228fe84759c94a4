//! Built-in app profiles
//!
//! Each profile pairs a locator table with the flow switches its login and
//! language screens need. A locator file next to the suite configuration can
//! replace individual entries (see [`profile_for`]).

use std::path::Path;

use mobile_e2e_core::{AppProfile, ConfigError, SuiteConfig};
use tracing::info;

pub mod lydia;
pub mod wigl;
pub mod wikipedia;

/// Names accepted by [`profile_by_name`]
pub const PROFILE_NAMES: [&str; 3] = [lydia::NAME, wigl::NAME, wikipedia::NAME];

/// Optional per-app locator overrides, looked up as `locators/<app>.toml`
pub const LOCATOR_OVERRIDES_DIR: &str = "locators";

/// Built-in profile for `name` (case-insensitive)
pub fn profile_by_name(name: &str) -> Result<AppProfile, ConfigError> {
    match name.trim().to_lowercase().as_str() {
        lydia::NAME => Ok(lydia::profile()),
        wigl::NAME => Ok(wigl::profile()),
        wikipedia::NAME => Ok(wikipedia::profile()),
        other => Err(ConfigError::UnknownProfile(other.to_string())),
    }
}

/// Profile named by `config.app`, with on-disk overrides applied when present
pub fn profile_for(config: &SuiteConfig) -> Result<AppProfile, ConfigError> {
    let profile = profile_by_name(&config.app)?;
    let overrides = Path::new(LOCATOR_OVERRIDES_DIR).join(format!("{}.toml", profile.name));
    if overrides.exists() {
        info!("Applying locator overrides from {}", overrides.display());
        return profile.with_overrides_from(&overrides);
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mobile_e2e_core::{Platform, UiElement};

    #[test]
    fn test_every_name_resolves() {
        for name in PROFILE_NAMES {
            assert_eq!(profile_by_name(name).unwrap().name, name);
        }
        assert_eq!(profile_by_name(" Wigl ").unwrap().name, "wigl");
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let err = profile_by_name("revolut").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(name) if name == "revolut"));
    }

    #[test]
    fn test_login_profiles_cover_login_screen() {
        let login = [
            UiElement::EmailInput,
            UiElement::PasswordInput,
            UiElement::LoginButton,
            UiElement::CashbackAmount,
            UiElement::CryptoBalance,
            UiElement::CreateAccountText,
            UiElement::LanguageToggle,
            UiElement::FrenchIndicator,
        ];
        for profile in [lydia::profile(), wigl::profile()] {
            for element in login {
                for platform in [Platform::Android, Platform::Ios] {
                    assert!(
                        profile.locator(element, platform).is_ok(),
                        "{} lacks {} on {}",
                        profile.name,
                        element,
                        platform
                    );
                }
            }
        }
    }

    #[test]
    fn test_profile_for_uses_configured_app() {
        let mut config = SuiteConfig::default();
        config.app = "wikipedia".to_string();
        let profile = profile_for(&config).unwrap();
        assert!(profile.has(UiElement::SearchButton));

        config.app = "unknown".to_string();
        assert!(profile_for(&config).is_err());
    }
}
