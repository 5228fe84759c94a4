//! Platform capability sets sent with `POST /session`
//!
//! Vendor keys carry the `appium:` prefix required by W3C-compliant servers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::SuiteConfig;
use crate::error::ConfigError;
use crate::platform::Platform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndroidCapabilities {
    #[serde(rename = "platformName")]
    pub platform_name: String,
    #[serde(rename = "appium:deviceName")]
    pub device_name: String,
    #[serde(rename = "appium:platformVersion", skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(rename = "appium:automationName")]
    pub automation_name: String,
    #[serde(rename = "appium:udid", skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,
    #[serde(rename = "appium:appPackage")]
    pub app_package: String,
    #[serde(rename = "appium:appActivity")]
    pub app_activity: String,
    #[serde(rename = "appium:noReset")]
    pub no_reset: bool,
    #[serde(rename = "appium:autoGrantPermissions")]
    pub auto_grant_permissions: bool,
    #[serde(rename = "appium:adbExecTimeout")]
    pub adb_exec_timeout: u64,
    #[serde(rename = "appium:newCommandTimeout")]
    pub new_command_timeout: u64,
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IosCapabilities {
    #[serde(rename = "platformName")]
    pub platform_name: String,
    #[serde(rename = "appium:platformVersion", skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(rename = "appium:deviceName")]
    pub device_name: String,
    #[serde(rename = "appium:udid", skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,
    #[serde(rename = "appium:automationName")]
    pub automation_name: String,
    #[serde(rename = "appium:bundleId")]
    pub bundle_id: String,
    #[serde(rename = "appium:noReset")]
    pub no_reset: bool,
    #[serde(rename = "appium:usePrebuiltWDA")]
    pub use_prebuilt_wda: bool,
    #[serde(rename = "appium:wdaStartupRetries")]
    pub wda_startup_retries: u32,
    #[serde(rename = "appium:wdaStartupRetryInterval")]
    pub wda_startup_retry_interval: u64,
    #[serde(rename = "appium:newCommandTimeout")]
    pub new_command_timeout: u64,
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

/// Capability set for exactly one platform
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilitySet {
    Android(AndroidCapabilities),
    Ios(IosCapabilities),
}

impl CapabilitySet {
    /// Build and validate the capability set for `platform` from configuration
    pub fn build(platform: Platform, config: &SuiteConfig) -> Result<Self, ConfigError> {
        let set = match platform {
            Platform::Android => {
                let android = &config.android;
                CapabilitySet::Android(AndroidCapabilities {
                    platform_name: android.platform_name.clone(),
                    device_name: android.device_name.clone(),
                    platform_version: non_empty(&android.platform_version),
                    automation_name: android.automation_name.clone(),
                    udid: android.udid.as_deref().and_then(non_empty),
                    app_package: android.app_package.clone(),
                    app_activity: android.app_activity.clone(),
                    no_reset: android.no_reset,
                    auto_grant_permissions: android.auto_grant_permissions,
                    adb_exec_timeout: android.adb_exec_timeout_ms,
                    new_command_timeout: config.appium.new_command_timeout_secs,
                    additional: HashMap::new(),
                })
            }
            Platform::Ios => {
                let ios = &config.ios;
                CapabilitySet::Ios(IosCapabilities {
                    platform_name: ios.platform_name.clone(),
                    platform_version: non_empty(&ios.platform_version),
                    device_name: ios.device_name.clone(),
                    udid: ios.udid.as_deref().and_then(non_empty),
                    automation_name: ios.automation_name.clone(),
                    bundle_id: ios.bundle_id.clone(),
                    no_reset: ios.no_reset,
                    use_prebuilt_wda: ios.use_prebuilt_wda,
                    wda_startup_retries: ios.wda_startup_retries,
                    wda_startup_retry_interval: ios.wda_startup_retry_interval_ms,
                    new_command_timeout: config.appium.new_command_timeout_secs,
                    additional: HashMap::new(),
                })
            }
        };
        set.validate()?;
        Ok(set)
    }

    pub fn platform(&self) -> Platform {
        match self {
            CapabilitySet::Android(_) => Platform::Android,
            CapabilitySet::Ios(_) => Platform::Ios,
        }
    }

    /// Application identifier: package on Android, bundle id on iOS
    pub fn app_id(&self) -> &str {
        match self {
            CapabilitySet::Android(caps) => &caps.app_package,
            CapabilitySet::Ios(caps) => &caps.bundle_id,
        }
    }

    pub fn device_name(&self) -> &str {
        match self {
            CapabilitySet::Android(caps) => &caps.device_name,
            CapabilitySet::Ios(caps) => &caps.device_name,
        }
    }

    pub fn platform_version(&self) -> Option<&str> {
        match self {
            CapabilitySet::Android(caps) => caps.platform_version.as_deref(),
            CapabilitySet::Ios(caps) => caps.platform_version.as_deref(),
        }
    }

    pub fn automation_name(&self) -> &str {
        match self {
            CapabilitySet::Android(caps) => &caps.automation_name,
            CapabilitySet::Ios(caps) => &caps.automation_name,
        }
    }

    /// Add a vendor capability that has no dedicated field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        match &mut self {
            CapabilitySet::Android(caps) => caps.additional.insert(key.into(), value),
            CapabilitySet::Ios(caps) => caps.additional.insert(key.into(), value),
        };
        self
    }

    /// Capability object as a JSON value (the `alwaysMatch` member)
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            CapabilitySet::Android(caps) => serde_json::to_value(caps),
            CapabilitySet::Ios(caps) => serde_json::to_value(caps),
        }
    }

    /// Full new-session request body
    pub fn session_payload(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "capabilities": {
                "alwaysMatch": self.to_value()?,
                "firstMatch": [{}]
            }
        }))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let platform = self.platform();
        let required: Vec<(&'static str, &str)> = match self {
            CapabilitySet::Android(caps) => vec![
                ("platformName", caps.platform_name.as_str()),
                ("appium:deviceName", caps.device_name.as_str()),
                ("appium:automationName", caps.automation_name.as_str()),
                ("appium:appPackage", caps.app_package.as_str()),
                ("appium:appActivity", caps.app_activity.as_str()),
            ],
            CapabilitySet::Ios(caps) => vec![
                ("platformName", caps.platform_name.as_str()),
                ("appium:deviceName", caps.device_name.as_str()),
                ("appium:automationName", caps.automation_name.as_str()),
                ("appium:bundleId", caps.bundle_id.as_str()),
            ],
        };

        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((key, _)) => Err(ConfigError::MissingCapability { platform, key }),
            None => Ok(()),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
