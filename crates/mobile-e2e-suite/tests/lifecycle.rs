//! Offline scenarios: the full hook lifecycle against an in-memory device

mod steps;

use std::sync::Arc;

use cucumber::{writer, World as _, WriterExt as _};
use futures::FutureExt as _;
use mobile_e2e_core::config::TimingSettings;
use mobile_e2e_core::page::application_canvas;
use mobile_e2e_core::testing::{FakeDevice, FakeElement, FakeFactory, FakeShell, RecordingSink};
use mobile_e2e_core::{AppProfile, DriverManager, Platform, ScenarioHooks, SuiteConfig, UiElement};
use mobile_e2e_suite::apps::lydia;

use steps::world::{scenario_info, tagged_profile, E2eWorld, FakeBackend};

fn fast_timing() -> TimingSettings {
    TimingSettings {
        element_timeout_secs: 2,
        poll_interval_ms: 50,
        settle_delay_ms: 10,
        keyboard_settle_ms: 10,
        teardown_pause_ms: 10,
        app_ready_ms: 10,
    }
}

/// Every element of the profile on screen, keyed by its snake_case name
fn scripted_device(profile: &AppProfile, platform: Platform) -> FakeDevice {
    let device = FakeDevice::new();
    for (element, locator) in profile.locators.iter() {
        let mut fake = FakeElement::new(element.to_string(), locator.for_platform(platform).clone());
        fake = match element {
            UiElement::CashbackAmount => fake.text("12,50 €"),
            UiElement::CryptoBalance => fake.text("0.00042 BTC"),
            _ => fake,
        };
        device.add(fake);
    }
    if platform.is_ios() {
        device.add(FakeElement::new("application_canvas", application_canvas()));
    }
    device
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_test_writer()
        .try_init();

    E2eWorld::cucumber()
        .before(|feature, _rule, scenario, world| {
            async move {
                let info = scenario_info(feature, scenario);
                let platform = if info.tags.iter().any(|t| t == "ios") {
                    Platform::Ios
                } else {
                    Platform::Android
                };
                let profile = tagged_profile(&info).unwrap_or_else(lydia::profile);

                let mut config = SuiteConfig::default().with_platform(platform);
                config.app = profile.name.clone();
                config.timing = fast_timing();
                config.reporting.attach_logcat = false;

                let device = scripted_device(&profile, platform);
                let factory = FakeFactory::new(device.clone());
                let manager = DriverManager::new(Arc::new(config), Arc::new(factory.clone()));
                let hooks = ScenarioHooks::new(manager, Arc::new(FakeShell::new()), Box::new(RecordingSink::new()));

                world.fake = Some(FakeBackend { device, factory });
                world.begin(hooks, info, profile).await;
            }
            .boxed_local()
        })
        .after(|_feature, _rule, _scenario, event, world| {
            async move {
                if let Some(world) = world {
                    world.finish(event).await;
                }
            }
            .boxed_local()
        })
        .with_writer(writer::Basic::stdout().summarized().assert_normalized())
        .filter_run_and_exit("tests/features", |feature, _rule, _scenario| {
            feature.tags.iter().any(|t| t == "offline")
        })
        .await;
}
