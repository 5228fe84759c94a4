//! Target platform selection
//!
//! The platform is resolved once per process (or per resolver) from an override
//! value and a configuration default, then cached. Every locator branch and the
//! capability builder read the cached value.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable carrying the runtime platform override.
pub const PLATFORM_ENV: &str = "platformName";

/// Mobile platform under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn is_android(self) -> bool {
        matches!(self, Platform::Android)
    }

    pub fn is_ios(self) -> bool {
        matches!(self, Platform::Ios)
    }

    /// Lower-case selector value (`android` / `ios`)
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Upper-case label used in log banners
    pub fn label(self) -> &'static str {
        match self {
            Platform::Android => "ANDROID",
            Platform::Ios => "IOS",
        }
    }

    /// Pick the value matching this platform
    pub fn select<T>(self, android: T, ios: T) -> T {
        match self {
            Platform::Android => android,
            Platform::Ios => ios,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Android => write!(f, "Android"),
            Platform::Ios => write!(f, "iOS"),
        }
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(ConfigError::UnknownPlatform(other.to_string())),
        }
    }
}

// ----------------------------------------------------------------------------
// Resolver
// ----------------------------------------------------------------------------

/// Resolves the platform from an override and a configured default
///
/// An override that is present always wins, including when it is not a
/// recognised platform. The first successful resolution is cached.
#[derive(Debug, Default, Clone)]
pub struct PlatformResolver {
    override_value: Option<String>,
    default_value: Option<String>,
    resolved: OnceLock<Platform>,
}

impl PlatformResolver {
    pub fn new(override_value: Option<String>, default_value: Option<String>) -> Self {
        Self {
            override_value: non_blank(override_value),
            default_value: non_blank(default_value),
            resolved: OnceLock::new(),
        }
    }

    /// Resolver using the `platformName` environment variable as override
    pub fn from_env(default_value: Option<String>) -> Self {
        Self::new(std::env::var(PLATFORM_ENV).ok(), default_value)
    }

    /// Resolver pinned to a known platform
    pub fn fixed(platform: Platform) -> Self {
        let resolver = Self::new(Some(platform.as_str().to_string()), None);
        let _ = resolver.resolved.set(platform);
        resolver
    }

    pub fn resolve(&self) -> Result<Platform, ConfigError> {
        if let Some(platform) = self.resolved.get() {
            return Ok(*platform);
        }

        let raw = self
            .override_value
            .as_deref()
            .or(self.default_value.as_deref())
            .ok_or(ConfigError::MissingPlatform)?;
        let platform = raw.parse::<Platform>()?;

        // A concurrent resolution can only have produced the same value.
        let _ = self.resolved.set(platform);
        Ok(platform)
    }

    /// Cached value, if resolution already happened
    pub fn cached(&self) -> Option<Platform> {
        self.resolved.get().copied()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!(" IOS ".parse::<Platform>().unwrap(), Platform::Ios);
        assert!(matches!(
            "windows".parse::<Platform>(),
            Err(ConfigError::UnknownPlatform(v)) if v == "windows"
        ));
    }

    #[test]
    fn test_override_wins_over_default() {
        let resolver = PlatformResolver::new(Some("ios".into()), Some("android".into()));
        assert_eq!(resolver.resolve().unwrap(), Platform::Ios);
    }

    #[test]
    fn test_default_used_when_override_blank() {
        let resolver = PlatformResolver::new(Some("  ".into()), Some("ANDROID".into()));
        assert_eq!(resolver.resolve().unwrap(), Platform::Android);
    }

    #[test]
    fn test_missing_selector_is_config_error() {
        let resolver = PlatformResolver::new(None, None);
        assert!(matches!(resolver.resolve(), Err(ConfigError::MissingPlatform)));
        assert_eq!(resolver.cached(), None);
    }

    #[test]
    fn test_unknown_override_does_not_fall_back() {
        let resolver = PlatformResolver::new(Some("web".into()), Some("android".into()));
        assert!(matches!(resolver.resolve(), Err(ConfigError::UnknownPlatform(_))));
    }

    #[test]
    fn test_resolution_is_cached() {
        let resolver = PlatformResolver::new(Some("android".into()), None);
        let first = resolver.resolve().unwrap();
        for _ in 0..10 {
            assert_eq!(resolver.resolve().unwrap(), first);
        }
        assert_eq!(resolver.cached(), Some(Platform::Android));
    }

    #[test]
    fn test_select_branches_on_platform() {
        assert_eq!(Platform::Android.select("a", "i"), "a");
        assert_eq!(Platform::Ios.select("a", "i"), "i");
        assert_eq!(Platform::Ios.to_string(), "iOS");
    }
}
