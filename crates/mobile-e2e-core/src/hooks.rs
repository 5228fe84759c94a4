//! Per-scenario setup and teardown
//!
//! `before` gives every scenario a fresh app process and a fresh session.
//! `after` collects diagnostics and tears everything down; it never fails.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::SuiteConfig;
use crate::device::{DeviceControl, LOGCAT_LINES};
use crate::driver::{DriverManager, Session};
use crate::error::Result;
use crate::platform::Platform;
use crate::reporting::{environment_entries, ReportSink, ScenarioInfo, Status, MIME_MP4, MIME_PNG, MIME_TEXT};
use crate::session::RecordingOptions;

/// Result of a scenario as seen by the after hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub status: Status,
    pub message: Option<String>,
}

impl ScenarioOutcome {
    pub fn passed() -> Self {
        Self {
            status: Status::Passed,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            message: Some(message.into()),
        }
    }

    /// Setup or infrastructure failure rather than an assertion
    pub fn broken(message: impl Into<String>) -> Self {
        Self {
            status: Status::Broken,
            message: Some(message.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        !self.status.is_success()
    }
}

/// Identifier of the app under test on `platform`
pub fn app_id(config: &SuiteConfig, platform: Platform) -> &str {
    platform.select(config.android.app_package.as_str(), config.ios.bundle_id.as_str())
}

pub struct ScenarioHooks {
    manager: DriverManager,
    device: Arc<dyn DeviceControl>,
    sink: Box<dyn ReportSink>,
    recording: bool,
}

impl ScenarioHooks {
    pub fn new(manager: DriverManager, device: Arc<dyn DeviceControl>, sink: Box<dyn ReportSink>) -> Self {
        Self {
            manager,
            device,
            sink,
            recording: false,
        }
    }

    pub fn config(&self) -> &Arc<SuiteConfig> {
        self.manager.config()
    }

    pub fn manager(&self) -> &DriverManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut DriverManager {
        &mut self.manager
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.manager.current()
    }

    /// Sink for step-level reporting
    pub fn sink(&mut self) -> &mut dyn ReportSink {
        self.sink.as_mut()
    }

    /// Fresh app process and session for `scenario`
    ///
    /// Only a configuration or driver initialisation failure is returned.
    pub async fn before(&mut self, scenario: &ScenarioInfo) -> Result<Arc<Session>> {
        let config = Arc::clone(self.manager.config());
        let platform = config.platform()?;
        let title = scenario.label(platform);

        self.sink.start_scenario(scenario, &title);
        self.sink.label("platform", &platform.to_string());
        self.sink.label("app", &config.app);
        self.sink
            .description(&format!("Scenario '{}' running on {}", scenario.name, platform));
        self.sink.log(&format!("Starting scenario: {title}"));

        self.force_stop(&config, platform).await;
        self.manager.release().await;
        sleep(config.timing.teardown_pause()).await;

        let session = match self.manager.acquire().await {
            Ok(session) => session,
            Err(e) => {
                error!("Driver could not be created for '{}': {}", title, e);
                self.sink.log(&format!("Driver initialisation failed: {e}"));
                return Err(e.into());
            }
        };
        sleep(config.timing.app_ready()).await;

        self.attach_environment(&config, platform).await;
        if config.reporting.record_video {
            self.start_recording(&session).await;
        }

        info!("Scenario '{}' ready on session {}", title, session.id());
        Ok(session)
    }

    /// Diagnostics and teardown; runs whatever the scenario outcome
    pub async fn after(&mut self, scenario: &ScenarioInfo, outcome: &ScenarioOutcome) {
        let config = Arc::clone(self.manager.config());
        let platform = config.platform().ok();
        let session = self.manager.current();

        if let Some(session) = &session {
            if self.recording {
                self.stop_recording(&config, session, scenario).await;
            }
            if outcome.is_failure() {
                self.capture_failure(&config, session).await;
            }
        }
        self.recording = false;

        match (&outcome.status, &outcome.message) {
            (Status::Passed, _) => self.sink.log(&format!("Scenario passed: {}", scenario.name)),
            (status, Some(message)) => {
                self.sink
                    .log(&format!("Scenario {}: {}: {}", status, scenario.name, message))
            }
            (status, None) => self.sink.log(&format!("Scenario {}: {}", status, scenario.name)),
        }
        if let Err(e) = self.sink.finish(outcome.status, outcome.message.as_deref()) {
            warn!("Could not finish scenario report: {}", e);
        }

        if let Some(platform) = platform {
            self.force_stop(&config, platform).await;
        }
        self.manager.release().await;
        sleep(config.timing.teardown_pause()).await;
    }

    async fn force_stop(&self, config: &SuiteConfig, platform: Platform) {
        let app = app_id(config, platform);
        match self.device.force_stop(platform, app).await {
            Ok(outcome) => debug!("Force-stop of {}: {:?}", app, outcome),
            Err(e) => warn!("Could not force-stop {}: {}", app, e),
        }
    }

    async fn attach_environment(&mut self, config: &SuiteConfig, platform: Platform) {
        let environment = environment_entries(config, platform)
            .into_iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        if let Err(e) = self.sink.attach("Environment", MIME_TEXT, environment.as_bytes()) {
            warn!("Could not attach environment: {}", e);
        }

        match self.device.device_info(platform).await {
            Ok(info) => {
                if let Err(e) = self.sink.attach("Device info", MIME_TEXT, info.as_bytes()) {
                    warn!("Could not attach device info: {}", e);
                }
            }
            Err(e) => warn!("Device information could not be collected: {}", e),
        }
    }

    async fn start_recording(&mut self, session: &Session) {
        match session.remote().start_recording(&RecordingOptions::default()).await {
            Ok(()) => {
                info!("Screen recording started");
                self.recording = true;
            }
            Err(e) => warn!("Could not start screen recording: {}", e),
        }
    }

    async fn stop_recording(&mut self, config: &SuiteConfig, session: &Session, scenario: &ScenarioInfo) {
        let video = match session.remote().stop_recording().await {
            Ok(video) => video,
            Err(e) => {
                warn!("Could not stop screen recording: {}", e);
                return;
            }
        };
        if video.is_empty() {
            debug!("Screen recording was empty");
            return;
        }

        match save_video(&config.reporting.videos_dir, &scenario.name, &video) {
            Ok(path) => info!("Video saved: {}", path.display()),
            Err(e) => warn!("Could not save video: {}", e),
        }
        if let Err(e) = self.sink.attach("Screen recording", MIME_MP4, &video) {
            warn!("Could not attach video: {}", e);
        }
    }

    async fn capture_failure(&mut self, config: &SuiteConfig, session: &Session) {
        match session.remote().screenshot().await {
            Ok(png) => {
                if let Err(e) = self.sink.attach("Failure screenshot", MIME_PNG, &png) {
                    warn!("Could not attach screenshot: {}", e);
                }
            }
            Err(e) => warn!("Could not capture screenshot: {}", e),
        }

        if session.platform().is_android() && config.reporting.attach_logcat {
            match self.device.logcat(LOGCAT_LINES).await {
                Ok(log) => {
                    if let Err(e) = self.sink.attach("Logcat", MIME_TEXT, log.as_bytes()) {
                        warn!("Could not attach logcat: {}", e);
                    }
                }
                Err(e) => warn!("Logcat could not be collected: {}", e),
            }
        }
    }
}

/// Write `video` as `<scenario>_<timestamp>.mp4` under `dir`
fn save_video(dir: &std::path::Path, scenario: &str, video: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stem: String = scenario
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let path = dir.join(format!("{stem}_{timestamp}.mp4"));
    std::fs::write(&path, video)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverState;
    use crate::error::{ConfigError, E2eError};
    use crate::platform::PlatformResolver;
    use crate::testing::{FakeCommand, FakeDevice, FakeFactory, FakeShell, RecordingSink};

    struct Rig {
        hooks: ScenarioHooks,
        device: FakeDevice,
        factory: FakeFactory,
        shell: FakeShell,
        sink: RecordingSink,
    }

    fn rig(config: SuiteConfig) -> Rig {
        let device = FakeDevice::new();
        let factory = FakeFactory::new(device.clone());
        let shell = FakeShell::new();
        let sink = RecordingSink::new();
        let manager = DriverManager::new(Arc::new(config), Arc::new(factory.clone()));
        let hooks = ScenarioHooks::new(manager, Arc::new(shell.clone()), Box::new(sink.clone()));
        Rig {
            hooks,
            device,
            factory,
            shell,
            sink,
        }
    }

    fn scenario() -> ScenarioInfo {
        ScenarioInfo::new("Login", "Authentication")
    }

    // ------------------------------------------------------------------------
    // Before
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_before_force_stops_then_opens_session() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Android));

        let session = rig.hooks.before(&scenario()).await.unwrap();

        assert_eq!(session.platform(), Platform::Android);
        assert_eq!(rig.factory.open_count(), 1);
        assert_eq!(rig.shell.calls()[0], "force_stop android com.lydia.lydia_app");
        assert!(rig.sink.contains("start Login - Android"));
        assert!(rig.sink.contains("label platform=Android"));
        assert!(rig.sink.contains("attach Environment"));
        assert!(rig.sink.contains("attach Device info"));
        assert_eq!(rig.hooks.manager().state(), DriverState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_before_titles_ios_scenario() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Ios));

        let session = rig.hooks.before(&scenario()).await.unwrap();

        assert_eq!(session.platform(), Platform::Ios);
        assert!(rig.sink.contains("start Login - iOS"));
        assert!(rig.sink.contains("label platform=iOS"));
        assert!(!rig.sink.contains("start Login - IOS"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_before_tolerates_device_tool_failures() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Ios));
        rig.shell.set_failing(true);

        rig.hooks.before(&scenario()).await.unwrap();
        assert!(!rig.sink.contains("attach Device info"));
        assert_eq!(rig.factory.open_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_before_without_platform_fails_fast() {
        let config = SuiteConfig::default().with_platform_resolver(PlatformResolver::new(None, None));
        let mut rig = rig(config);

        let err = rig.hooks.before(&scenario()).await.unwrap_err();
        assert!(matches!(err, E2eError::Config(ConfigError::MissingPlatform)));
        assert!(err.is_fatal());
        assert_eq!(rig.factory.open_count(), 0);
        assert!(rig.shell.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_before_replaces_leftover_session() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Android));

        let first = rig.hooks.before(&scenario()).await.unwrap();
        let second = rig.hooks.before(&scenario()).await.unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(rig.device.count(|c| matches!(c, FakeCommand::Quit)), 1);
    }

    // ------------------------------------------------------------------------
    // After
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_after_failure_attaches_diagnostics() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Android));
        rig.hooks.before(&scenario()).await.unwrap();

        rig.hooks
            .after(&scenario(), &ScenarioOutcome::failed("assertion failed"))
            .await;

        assert!(rig.sink.contains("attach Failure screenshot image/png"));
        assert!(rig.sink.contains("attach Logcat"));
        assert!(rig.sink.contains("finish failed"));
        assert!(rig.shell.calls().contains(&"logcat 500".to_string()));
        assert_eq!(rig.device.count(|c| matches!(c, FakeCommand::Quit)), 1);
        assert_eq!(rig.hooks.manager().state(), DriverState::Absent);

        let force_stops = rig.shell.calls().iter().filter(|c| c.starts_with("force_stop")).count();
        assert_eq!(force_stops, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_success_skips_screenshot() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Android));
        rig.hooks.before(&scenario()).await.unwrap();

        rig.hooks.after(&scenario(), &ScenarioOutcome::passed()).await;

        assert_eq!(rig.device.count(|c| matches!(c, FakeCommand::Screenshot)), 0);
        assert!(rig.sink.contains("finish passed"));
        assert!(rig.hooks.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_releases_even_when_diagnostics_fail() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Ios));
        rig.hooks.before(&scenario()).await.unwrap();
        rig.device.fail_always("screenshot");
        rig.shell.set_failing(true);

        rig.hooks.after(&scenario(), &ScenarioOutcome::broken("driver lost")).await;

        assert!(!rig.sink.contains("attach Failure screenshot"));
        assert!(!rig.sink.contains("attach Logcat"));
        assert!(rig.sink.contains("finish broken"));
        assert_eq!(rig.hooks.manager().state(), DriverState::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_without_session_still_finishes_report() {
        let mut rig = rig(SuiteConfig::default().with_platform(Platform::Android));
        rig.factory.set_unreachable(true);
        assert!(rig.hooks.before(&scenario()).await.is_err());

        rig.hooks.after(&scenario(), &ScenarioOutcome::broken("no driver")).await;
        assert!(rig.sink.contains("finish broken"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recording_saved_and_attached() {
        let videos = tempfile::tempdir().unwrap();
        let mut config = SuiteConfig::default().with_platform(Platform::Android);
        config.reporting.record_video = true;
        config.reporting.videos_dir = videos.path().to_path_buf();
        let mut rig = rig(config);

        rig.hooks.before(&scenario()).await.unwrap();
        assert!(rig.device.is_recording());

        rig.hooks.after(&scenario(), &ScenarioOutcome::passed()).await;
        assert!(!rig.device.is_recording());
        assert!(rig.sink.contains("attach Screen recording video/mp4"));

        let files: Vec<_> = std::fs::read_dir(videos.path()).unwrap().filter_map(|e| e.ok()).collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().to_string_lossy().to_string();
        assert!(name.starts_with("Login_") && name.ends_with(".mp4"));
    }
}
