//! Local device tooling: app termination, logcat and device info
//!
//! Android goes through `adb`, discovered from `ANDROID_HOME`, the usual SDK
//! locations or `PATH`. iOS termination is not available from the host and
//! is reported as skipped.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{E2eError, Result};
use crate::platform::Platform;

/// Logcat lines attached to failed Android scenarios
pub const LOGCAT_LINES: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceStop {
    Stopped,
    /// Nothing to do on this platform
    Skipped,
}

/// Host-side control of the device under test
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// Force-terminate the app under test
    async fn force_stop(&self, platform: Platform, app_id: &str) -> Result<ForceStop>;

    /// Last `lines` lines of the Android system log
    async fn logcat(&self, lines: u32) -> Result<String>;

    /// Human-readable device description
    async fn device_info(&self, platform: Platform) -> Result<String>;
}

// ----------------------------------------------------------------------------
// Tool discovery
// ----------------------------------------------------------------------------

/// Android SDK root from `ANDROID_HOME`, `ANDROID_SDK_ROOT` or common paths
pub fn detect_android_home() -> Option<PathBuf> {
    for var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
        if let Ok(value) = std::env::var(var) {
            let path = PathBuf::from(value);
            if path.exists() {
                return Some(path);
            }
        }
    }

    let home = std::env::var("HOME").ok()?;
    let candidates = [
        format!("{home}/Library/Android/sdk"),
        format!("{home}/Android/Sdk"),
        "/usr/local/android-sdk".to_string(),
    ];
    candidates.into_iter().map(PathBuf::from).find(|path| {
        let found = path.exists();
        if found {
            info!("Auto-detected ANDROID_HOME at: {}", path.display());
        }
        found
    })
}

/// Path of an Android SDK tool, falling back to a `PATH` lookup
pub fn android_tool_path(tool: &str) -> PathBuf {
    if let Some(sdk) = detect_android_home() {
        let path = match tool {
            "adb" => sdk.join("platform-tools").join("adb"),
            "emulator" => sdk.join("emulator").join("emulator"),
            "avdmanager" => sdk.join("cmdline-tools").join("latest").join("bin").join("avdmanager"),
            _ => sdk.join(tool),
        };
        if path.exists() {
            return path;
        }
    }
    which::which(tool).unwrap_or_else(|_| PathBuf::from(tool))
}

// ----------------------------------------------------------------------------
// adb-backed implementation
// ----------------------------------------------------------------------------

/// [`DeviceControl`] over `adb`, each call bounded by the adb timeout
#[derive(Debug, Clone)]
pub struct AdbShell {
    adb: PathBuf,
    serial: Option<String>,
    timeout: Duration,
}

impl AdbShell {
    pub fn new(adb: PathBuf, serial: Option<String>, timeout: Duration) -> Self {
        Self { adb, serial, timeout }
    }

    /// Discover `adb` on this host
    pub fn discover(serial: Option<String>, timeout: Duration) -> Self {
        Self::new(android_tool_path("adb"), serial, timeout)
    }

    pub fn adb_path(&self) -> &Path {
        &self.adb
    }

    async fn adb(&self, args: &[&str]) -> Result<Output> {
        let mut command = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            command.args(["-s", serial.as_str()]);
        }
        command.args(args).kill_on_drop(true);
        debug!("adb {}", args.join(" "));

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => Ok(output?),
            Err(_) => Err(E2eError::Timeout {
                what: format!("adb {}", args.join(" ")),
                waited: self.timeout,
            }),
        }
    }

    async fn adb_stdout(&self, args: &[&str]) -> Result<String> {
        let output = self.adb(args).await?;
        if !output.status.success() {
            return Err(E2eError::Diagnostic(format!(
                "adb {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl DeviceControl for AdbShell {
    async fn force_stop(&self, platform: Platform, app_id: &str) -> Result<ForceStop> {
        if platform.is_ios() {
            info!("Force-stop of iOS app {} is not available from the host; skipping", app_id);
            return Ok(ForceStop::Skipped);
        }

        info!("Force-stopping Android app: {}", app_id);
        let output = self.adb(&["shell", "am", "force-stop", app_id]).await?;
        if output.status.success() {
            info!("Android app stopped via adb");
            Ok(ForceStop::Stopped)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            for line in stderr.lines() {
                warn!("adb error: {}", line);
            }
            Err(E2eError::Diagnostic(format!(
                "adb force-stop {app_id} exited with {}",
                output.status
            )))
        }
    }

    async fn logcat(&self, lines: u32) -> Result<String> {
        let lines = lines.to_string();
        self.adb_stdout(&["logcat", "-d", "-t", &lines]).await
    }

    async fn device_info(&self, platform: Platform) -> Result<String> {
        if platform.is_ios() {
            return Ok("Platform: IOS\nDevice info is reported by the Appium session".to_string());
        }

        let mut info = vec![format!("Platform: {}", platform.label())];
        for (label, prop) in [
            ("Model", "ro.product.model"),
            ("Manufacturer", "ro.product.manufacturer"),
            ("Android version", "ro.build.version.release"),
            ("SDK", "ro.build.version.sdk"),
        ] {
            let value = self
                .adb_stdout(&["shell", "getprop", prop])
                .await
                .unwrap_or_else(|e| format!("unavailable ({e})"));
            info.push(format!("{label}: {value}"));
        }
        Ok(info.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ios_force_stop_is_skipped_without_adb() {
        let shell = AdbShell::new(PathBuf::from("/nonexistent/adb"), None, Duration::from_secs(1));
        let outcome = shell.force_stop(Platform::Ios, "com.lydia-app").await.unwrap();
        assert_eq!(outcome, ForceStop::Skipped);
    }

    #[tokio::test]
    async fn test_missing_adb_is_an_error() {
        let shell = AdbShell::new(PathBuf::from("/nonexistent/adb"), None, Duration::from_secs(1));
        let err = shell.force_stop(Platform::Android, "com.lydia.lydia_app").await.unwrap_err();
        assert!(matches!(err, E2eError::Io(_)));
    }

    #[test]
    fn test_unknown_tool_falls_back_to_name() {
        let path = android_tool_path("definitely-not-a-real-tool-xyz");
        assert!(path.ends_with("definitely-not-a-real-tool-xyz"));
    }
}
