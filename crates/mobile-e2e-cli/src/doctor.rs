//! Toolchain and endpoint checks

use anyhow::bail;
use mobile_e2e_core::device::{android_tool_path, detect_android_home};
use mobile_e2e_core::{AppiumConnector, Platform, SuiteConfig};
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, PartialEq, Eq)]
enum Check {
    Ok(String),
    Warn(String),
    Fail(String),
}

impl Check {
    fn print(&self, name: &str) {
        match self {
            Check::Ok(detail) => println!("  [ok]   {name}: {detail}"),
            Check::Warn(detail) => println!("  [warn] {name}: {detail}"),
            Check::Fail(detail) => println!("  [FAIL] {name}: {detail}"),
        }
    }
}

/// Run every check for the resolved platform; fails if a required one failed
pub async fn run(config: &SuiteConfig) -> anyhow::Result<()> {
    let platform = config.platform()?;
    info!("Checking prerequisites for {}...", platform);
    println!("Platform: {platform}");

    let mut checks = vec![
        ("node", binary("node", "Node.js required for Appium")),
        ("appium", binary("appium", "run 'npm install -g appium'")),
    ];
    match platform {
        Platform::Android => {
            checks.push(("ANDROID_HOME", android_home()));
            checks.push(("adb", adb()));
        }
        Platform::Ios => checks.push(("xcrun simctl", simctl().await)),
    }
    checks.push(("Appium server", server(&config.appium.server_url).await));

    for (name, check) in &checks {
        check.print(name);
    }
    let failed = checks.iter().filter(|(_, c)| matches!(c, Check::Fail(_))).count();
    if failed > 0 {
        bail!("{failed} required check(s) failed");
    }
    println!("All prerequisites checked successfully");
    Ok(())
}

fn binary(name: &str, hint: &str) -> Check {
    match which::which(name) {
        Ok(path) => Check::Ok(path.display().to_string()),
        Err(_) => Check::Fail(format!("{name} not found - {hint}")),
    }
}

fn android_home() -> Check {
    match detect_android_home() {
        Some(path) => Check::Ok(path.display().to_string()),
        None => {
            warn!("Set ANDROID_HOME manually if the Android SDK is installed elsewhere");
            Check::Warn("not found in ANDROID_HOME, ANDROID_SDK_ROOT or the usual SDK paths".to_string())
        }
    }
}

fn adb() -> Check {
    let path = android_tool_path("adb");
    if path.is_absolute() && path.exists() {
        Check::Ok(path.display().to_string())
    } else {
        Check::Fail("adb not found - Android SDK platform-tools required".to_string())
    }
}

async fn simctl() -> Check {
    if cfg!(not(target_os = "macos")) {
        return Check::Fail("iOS simulators need macOS with Xcode".to_string());
    }
    match Command::new("xcrun").args(["simctl", "help"]).output().await {
        Ok(output) if output.status.success() => Check::Ok("available".to_string()),
        Ok(_) => Check::Fail("simctl not available via xcrun - iOS Simulator required".to_string()),
        Err(_) => Check::Fail("xcrun not found - Xcode command line tools required".to_string()),
    }
}

async fn server(endpoint: &str) -> Check {
    match AppiumConnector::new().status(endpoint).await {
        Ok(status) => {
            let ready = status
                .get("ready")
                .and_then(|ready| ready.as_bool())
                .unwrap_or(true);
            let version = status
                .pointer("/build/version")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown version");
            if ready {
                Check::Ok(format!("{endpoint} ({version})"))
            } else {
                Check::Warn(format!("{endpoint} reachable but not ready"))
            }
        }
        Err(e) => Check::Fail(format!("{endpoint} unreachable: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_fails_with_hint() {
        match binary("definitely-not-a-real-tool-e2e", "install it") {
            Check::Fail(detail) => assert!(detail.contains("install it")),
            other => panic!("unexpected check: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_fails() {
        let check = server("not a url").await;
        assert!(matches!(check, Check::Fail(_)));
    }
}
