//! Suite configuration management
//!
//! Configuration is layered with figment, lowest priority first:
//! 1. Built-in defaults
//! 2. `mobile-e2e.toml` in the working directory (or `E2E_CONFIG_PATH`)
//! 3. Environment variables prefixed with `E2E_` (`__` separates sections,
//!    e.g. `E2E_APPIUM__SERVER_URL`)
//! 4. Explicit overrides passed by the caller
//!
//! The platform selector has its own override, the `platformName` environment
//! variable, which always beats `platform_name` from the layers above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::{Platform, PlatformResolver};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "mobile-e2e.toml";

/// Environment variable pointing at an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "E2E_CONFIG_PATH";

// ----------------------------------------------------------------------------
// Configuration sections
// ----------------------------------------------------------------------------

/// Complete configuration for a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Default platform selector, used when no `platformName` override is set
    pub platform_name: Option<String>,

    /// App profile the page objects are driven by (`lydia`, `wigl`, `wikipedia`)
    pub app: String,

    pub appium: AppiumSettings,
    pub android: AndroidSettings,
    pub ios: IosSettings,
    pub timing: TimingSettings,
    pub reporting: ReportingSettings,

    #[serde(skip)]
    resolver: PlatformResolver,
}

/// Remote automation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppiumSettings {
    /// Appium server URL
    pub server_url: String,
    /// Implicit element wait applied to every new session
    pub implicit_wait_secs: u64,
    /// Idle time before the server drops the session
    pub new_command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndroidSettings {
    pub platform_name: String,
    pub device_name: String,
    pub platform_version: String,
    pub automation_name: String,
    pub udid: Option<String>,
    pub app_package: String,
    pub app_activity: String,
    pub no_reset: bool,
    pub auto_grant_permissions: bool,
    /// Timeout for every adb invocation, server side and for local force-stop
    pub adb_exec_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IosSettings {
    pub platform_name: String,
    pub platform_version: String,
    pub device_name: String,
    pub udid: Option<String>,
    pub automation_name: String,
    pub bundle_id: String,
    pub no_reset: bool,
    pub use_prebuilt_wda: bool,
    pub wda_startup_retries: u32,
    pub wda_startup_retry_interval_ms: u64,
}

/// Waits and fixed pauses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Bounded wait for element presence/visibility
    pub element_timeout_secs: u64,
    /// Poll interval of bounded waits
    pub poll_interval_ms: u64,
    /// Pause after a gesture, where the protocol gives no completion signal
    pub settle_delay_ms: u64,
    /// Pause around keyboard dismissal
    pub keyboard_settle_ms: u64,
    /// Pause after app termination and session teardown
    pub teardown_pause_ms: u64,
    /// Pause after a session comes up, before the first step
    pub app_ready_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingSettings {
    pub allure_results_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub record_video: bool,
    pub attach_logcat: bool,
}

// ----------------------------------------------------------------------------
// Default Implementations
// ----------------------------------------------------------------------------

impl Default for AppiumSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4723".to_string(),
            implicit_wait_secs: 10,
            new_command_timeout_secs: 300,
        }
    }
}

impl Default for AndroidSettings {
    fn default() -> Self {
        Self {
            platform_name: "Android".to_string(),
            device_name: "emulator-5554".to_string(),
            platform_version: "13".to_string(),
            automation_name: "UiAutomator2".to_string(),
            udid: Some("emulator-5554".to_string()),
            app_package: "com.lydia.lydia_app".to_string(),
            app_activity: "com.lydia.lydia_app.MainActivity".to_string(),
            no_reset: true,
            auto_grant_permissions: true,
            adb_exec_timeout_ms: 20_000,
        }
    }
}

impl Default for IosSettings {
    fn default() -> Self {
        Self {
            platform_name: "iOS".to_string(),
            platform_version: "17.0".to_string(),
            device_name: "iPhone 15".to_string(),
            udid: None,
            automation_name: "XCUITest".to_string(),
            bundle_id: "com.lydia-app".to_string(),
            no_reset: true,
            use_prebuilt_wda: true,
            wda_startup_retries: 4,
            wda_startup_retry_interval_ms: 20_000,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            element_timeout_secs: 15,
            poll_interval_ms: 250,
            settle_delay_ms: 1000,
            keyboard_settle_ms: 500,
            teardown_pause_ms: 2000,
            app_ready_ms: 3000,
        }
    }
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            allure_results_dir: PathBuf::from("target/allure-results"),
            videos_dir: PathBuf::from("target/videos"),
            record_video: false,
            attach_logcat: true,
        }
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            platform_name: None,
            app: "lydia".to_string(),
            appium: AppiumSettings::default(),
            android: AndroidSettings::default(),
            ios: IosSettings::default(),
            timing: TimingSettings::default(),
            reporting: ReportingSettings::default(),
            resolver: PlatformResolver::default(),
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

impl SuiteConfig {
    /// Load with the standard priority order and the `platformName` override
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::base_figment(), std::env::var(crate::platform::PLATFORM_ENV).ok())
    }

    /// Load from a specific file, still honouring environment layers
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("E2E_").split("__"));
        Self::from_figment(figment, std::env::var(crate::platform::PLATFORM_ENV).ok())
    }

    /// Load with an explicit platform override (e.g. a CLI flag)
    ///
    /// A `Some` override takes precedence over the `platformName` variable.
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        platform: Option<Platform>,
        server_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut figment = match config_path {
            Some(path) => Figment::new()
                .merge(Serialized::defaults(Self::default()))
                .merge(Toml::file(path))
                .merge(Env::prefixed("E2E_").split("__")),
            None => Self::base_figment(),
        };
        if let Some(url) = server_url {
            figment = figment.merge(("appium.server_url", url));
        }

        let platform_override = platform
            .map(|p| p.as_str().to_string())
            .or_else(|| std::env::var(crate::platform::PLATFORM_ENV).ok());
        Self::from_figment(figment, platform_override)
    }

    /// Build from a TOML string; used by tests and embedded profiles
    pub fn from_toml_str(content: &str, platform_override: Option<String>) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(content));
        Self::from_figment(figment, platform_override)
    }

    fn base_figment() -> Figment {
        let file = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("E2E_").split("__"))
    }

    fn from_figment(figment: Figment, platform_override: Option<String>) -> Result<Self, ConfigError> {
        let mut config: SuiteConfig = figment.extract()?;
        config.resolver = PlatformResolver::new(platform_override, config.platform_name.clone());
        config.validate()?;
        Ok(config)
    }

    /// Replace the platform resolver, e.g. to pin a platform in tests
    pub fn with_platform_resolver(mut self, resolver: PlatformResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Pin the platform, bypassing the environment
    pub fn with_platform(self, platform: Platform) -> Self {
        self.with_platform_resolver(PlatformResolver::fixed(platform))
    }

    /// Resolved platform; cached after the first call
    pub fn platform(&self) -> Result<Platform, ConfigError> {
        self.resolver.resolve()
    }

    /// Validate values that would otherwise fail late at session creation
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.appium.server_url).map_err(|e| ConfigError::Invalid {
            key: "appium.server_url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "appium.server_url".to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.timing.element_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timing.element_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "timing.poll_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.android.adb_exec_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "android.adb_exec_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl TimingSettings {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn keyboard_settle(&self) -> Duration {
        Duration::from_millis(self.keyboard_settle_ms)
    }

    pub fn teardown_pause(&self) -> Duration {
        Duration::from_millis(self.teardown_pause_ms)
    }

    pub fn app_ready(&self) -> Duration {
        Duration::from_millis(self.app_ready_ms)
    }
}

impl AppiumSettings {
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_secs)
    }
}

impl AndroidSettings {
    pub fn adb_exec_timeout(&self) -> Duration {
        Duration::from_millis(self.adb_exec_timeout_ms)
    }
}
