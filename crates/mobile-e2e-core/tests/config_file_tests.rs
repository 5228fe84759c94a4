//! Configuration and locator files loaded from disk

use std::fs;
use std::time::Duration;

use mobile_e2e_core::capabilities::CapabilitySet;
use mobile_e2e_core::{AppProfile, ConfigError, FlowFlags, Locator, LocatorTable, Platform, SuiteConfig, UiElement};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ----------------------------------------------------------------------------
// Suite configuration
// ----------------------------------------------------------------------------

#[test]
fn test_file_values_reach_capabilities() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "mobile-e2e.toml",
        r#"
        app = "wigl"

        [appium]
        server_url = "http://10.0.0.5:4723"

        [android]
        device_name = "Pixel_7"
        app_package = "com.wigl.app"
        app_activity = "com.wigl.app.MainActivity"

        [timing]
        element_timeout_secs = 20
        "#,
    );

    let config = SuiteConfig::load_with_overrides(Some(&path), Some(Platform::Android), None).unwrap();
    assert_eq!(config.app, "wigl");
    assert_eq!(config.appium.server_url, "http://10.0.0.5:4723");
    assert_eq!(config.timing.element_timeout(), Duration::from_secs(20));
    assert_eq!(config.platform().unwrap(), Platform::Android);

    let capabilities = CapabilitySet::build(Platform::Android, &config).unwrap();
    assert_eq!(capabilities.app_id(), "com.wigl.app");
    assert_eq!(capabilities.device_name(), "Pixel_7");

    let payload = capabilities.session_payload().unwrap();
    assert_eq!(payload["capabilities"]["alwaysMatch"]["appium:appPackage"], "com.wigl.app");
}

#[test]
fn test_explicit_overrides_beat_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "e2e.toml",
        r#"
        platform_name = "android"

        [appium]
        server_url = "http://10.0.0.5:4723"
        "#,
    );

    let config = SuiteConfig::load_with_overrides(
        Some(&path),
        Some(Platform::Ios),
        Some("http://127.0.0.1:4724".to_string()),
    )
    .unwrap();
    assert_eq!(config.platform().unwrap(), Platform::Ios);
    assert_eq!(config.appium.server_url, "http://127.0.0.1:4724");
}

#[test]
fn test_invalid_file_is_a_loading_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "broken.toml", "[timing]\nelement_timeout_secs = \"soon\"\n");

    let err = SuiteConfig::load_with_overrides(Some(&path), Some(Platform::Android), None).unwrap_err();
    assert!(matches!(err, ConfigError::Loading(_)));
}

#[test]
fn test_zero_poll_interval_rejected_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "zero.toml", "[timing]\npoll_interval_ms = 0\n");

    let err = SuiteConfig::load_with_overrides(Some(&path), Some(Platform::Android), None).unwrap_err();
    match err {
        ConfigError::Invalid { key, .. } => assert_eq!(key, "timing.poll_interval_ms"),
        other => panic!("unexpected error: {other}"),
    }
}

// ----------------------------------------------------------------------------
// Locator overrides
// ----------------------------------------------------------------------------

#[test]
fn test_profile_locator_overrides_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "locators.toml",
        r#"
        [login_button]
        android = "id=com.wigl.app:id/login"
        ios = "~Sign in"
        "#,
    );

    let base = LocatorTable::new()
        .with(
            UiElement::LoginButton,
            Locator::xpath("//android.widget.Button[@text='Login']"),
            Locator::accessibility_id("Login"),
        )
        .with(
            UiElement::EmailInput,
            Locator::accessibility_id("email-input"),
            Locator::accessibility_id("email-input"),
        );
    let profile = AppProfile::new("wigl", FlowFlags::default(), base)
        .with_overrides_from(&path)
        .unwrap();

    assert_eq!(
        profile.locator(UiElement::LoginButton, Platform::Android).unwrap(),
        Locator::id("com.wigl.app:id/login")
    );
    assert_eq!(
        profile.locator(UiElement::LoginButton, Platform::Ios).unwrap(),
        Locator::accessibility_id("Sign in")
    );
    assert!(profile.has(UiElement::EmailInput));
}

#[test]
fn test_missing_locator_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = LocatorTable::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Loading(_))));
}
