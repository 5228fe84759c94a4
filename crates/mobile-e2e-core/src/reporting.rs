//! Scenario reporting: tracing sink and Allure 2 results writer

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SuiteConfig;
use crate::error::{E2eError, Result};
use crate::platform::Platform;

pub const MIME_PNG: &str = "image/png";
pub const MIME_MP4: &str = "video/mp4";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_JSON: &str = "application/json";

/// Allure result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Broken,
    Skipped,
}

impl Status {
    pub fn is_success(self) -> bool {
        matches!(self, Status::Passed | Status::Skipped)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Broken => "broken",
            Status::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Identity of the scenario being reported
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenarioInfo {
    pub name: String,
    pub feature: String,
    pub tags: Vec<String>,
}

impl ScenarioInfo {
    pub fn new(name: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feature: feature.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Report title, e.g. `Login - Android`
    pub fn label(&self, platform: Platform) -> String {
        format!("{} - {}", self.name, platform)
    }
}

/// Destination of scenario metadata, steps and attachments
pub trait ReportSink: Send + Sync {
    fn start_scenario(&mut self, scenario: &ScenarioInfo, title: &str);

    fn label(&mut self, name: &str, value: &str);

    fn description(&mut self, text: &str);

    fn log(&mut self, line: &str);

    fn step(&mut self, name: &str, status: Status);

    fn attach(&mut self, name: &str, mime: &str, data: &[u8]) -> Result<()>;

    fn finish(&mut self, status: Status, message: Option<&str>) -> Result<()>;
}

// ----------------------------------------------------------------------------
// Tracing sink
// ----------------------------------------------------------------------------

/// Sink that only emits tracing events
#[derive(Debug, Default)]
pub struct TracingSink {
    title: Option<String>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for TracingSink {
    fn start_scenario(&mut self, scenario: &ScenarioInfo, title: &str) {
        info!("Scenario started: {} ({})", title, scenario.feature);
        self.title = Some(title.to_string());
    }

    fn label(&mut self, name: &str, value: &str) {
        debug!("Label {}={}", name, value);
    }

    fn description(&mut self, text: &str) {
        debug!("Description: {}", text);
    }

    fn log(&mut self, line: &str) {
        info!("{}", line);
    }

    fn step(&mut self, name: &str, status: Status) {
        info!("Step {}: {}", status, name);
    }

    fn attach(&mut self, name: &str, mime: &str, data: &[u8]) -> Result<()> {
        debug!("Attachment {} ({}, {} bytes) not persisted", name, mime, data.len());
        Ok(())
    }

    fn finish(&mut self, status: Status, message: Option<&str>) -> Result<()> {
        let title = self.title.take().unwrap_or_default();
        match (status.is_success(), message) {
            (true, _) => info!("Scenario {}: {}", status, title),
            (false, Some(message)) => warn!("Scenario {}: {}: {}", status, title, message),
            (false, None) => warn!("Scenario {}: {}", status, title),
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Allure results
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllureLabel {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllureAttachment {
    pub name: String,
    pub source: String,
    #[serde(rename = "type")]
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllureStep {
    pub name: String,
    pub status: Status,
    pub stage: String,
    pub start: u64,
    pub stop: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    pub message: String,
}

/// One `<uuid>-result.json` document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllureResult {
    pub uuid: String,
    pub history_id: String,
    pub name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub labels: Vec<AllureLabel>,
    pub steps: Vec<AllureStep>,
    pub attachments: Vec<AllureAttachment>,
    pub start: u64,
    pub stop: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        MIME_PNG => "png",
        MIME_MP4 => "mp4",
        MIME_TEXT => "txt",
        MIME_JSON => "json",
        _ => "bin",
    }
}

/// Writes Allure 2 result files into a results directory
#[derive(Debug)]
pub struct AllureSink {
    results_dir: PathBuf,
    current: Option<AllureResult>,
    log_lines: Vec<String>,
}

impl AllureSink {
    /// Create the sink, creating `results_dir` if needed
    pub fn new(results_dir: impl Into<PathBuf>) -> Result<Self> {
        let results_dir = results_dir.into();
        fs::create_dir_all(&results_dir)?;
        Ok(Self {
            results_dir,
            current: None,
            log_lines: Vec::new(),
        })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    fn current(&mut self) -> Result<&mut AllureResult> {
        self.current
            .as_mut()
            .ok_or_else(|| E2eError::Diagnostic("no scenario in progress".to_string()))
    }

    fn write_attachment(&self, data: &[u8], mime: &str) -> Result<String> {
        let source = format!("{}-attachment.{}", Uuid::new_v4(), extension_for(mime));
        fs::write(self.results_dir.join(&source), data)?;
        Ok(source)
    }
}

impl ReportSink for AllureSink {
    fn start_scenario(&mut self, scenario: &ScenarioInfo, title: &str) {
        if let Some(unfinished) = self.current.take() {
            warn!("Scenario '{}' was never finished; dropping its result", unfinished.name);
        }
        self.log_lines.clear();

        let full_name = format!("{}: {}", scenario.feature, scenario.name);
        let mut labels = vec![
            AllureLabel {
                name: "feature".to_string(),
                value: scenario.feature.clone(),
            },
            AllureLabel {
                name: "framework".to_string(),
                value: "cucumber".to_string(),
            },
        ];
        labels.extend(scenario.tags.iter().map(|tag| AllureLabel {
            name: "tag".to_string(),
            value: tag.trim_start_matches('@').to_string(),
        }));

        self.current = Some(AllureResult {
            uuid: Uuid::new_v4().to_string(),
            history_id: full_name.clone(),
            name: title.to_string(),
            full_name,
            status: None,
            status_details: None,
            stage: "running".to_string(),
            description: None,
            labels,
            steps: Vec::new(),
            attachments: Vec::new(),
            start: now_millis(),
            stop: 0,
        });
    }

    fn label(&mut self, name: &str, value: &str) {
        if let Ok(result) = self.current() {
            result.labels.push(AllureLabel {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn description(&mut self, text: &str) {
        if let Ok(result) = self.current() {
            result.description = Some(text.to_string());
        }
    }

    fn log(&mut self, line: &str) {
        info!("{}", line);
        self.log_lines.push(line.to_string());
    }

    fn step(&mut self, name: &str, status: Status) {
        let now = now_millis();
        if let Ok(result) = self.current() {
            result.steps.push(AllureStep {
                name: name.to_string(),
                status,
                stage: "finished".to_string(),
                start: now,
                stop: now,
            });
        }
    }

    fn attach(&mut self, name: &str, mime: &str, data: &[u8]) -> Result<()> {
        self.current()?;
        let source = self.write_attachment(data, mime)?;
        debug!("Attached {} as {}", name, source);
        self.current()?.attachments.push(AllureAttachment {
            name: name.to_string(),
            source,
            mime: mime.to_string(),
        });
        Ok(())
    }

    fn finish(&mut self, status: Status, message: Option<&str>) -> Result<()> {
        if !self.log_lines.is_empty() {
            let log = self.log_lines.join("\n");
            self.attach("Scenario log", MIME_TEXT, log.as_bytes())?;
            self.log_lines.clear();
        }

        let mut result = self
            .current
            .take()
            .ok_or_else(|| E2eError::Diagnostic("no scenario in progress".to_string()))?;
        result.status = Some(status);
        result.status_details = message.map(|m| StatusDetails { message: m.to_string() });
        result.stage = "finished".to_string();
        result.stop = now_millis();

        let path = self.results_dir.join(format!("{}-result.json", result.uuid));
        fs::write(&path, serde_json::to_string_pretty(&result)?)?;
        info!("Allure result written to {}", path.display());
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Environment, categories, executor
// ----------------------------------------------------------------------------

/// Key/value pairs for `environment.properties`
pub fn environment_entries(config: &SuiteConfig, platform: Platform) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    entries.insert("Platform".to_string(), platform.to_string());
    match platform {
        Platform::Android => {
            let android = &config.android;
            entries.insert("OS Version".to_string(), android.platform_version.clone());
            entries.insert("Device Model".to_string(), android.device_name.clone());
            entries.insert("App Package".to_string(), android.app_package.clone());
            entries.insert("App Activity".to_string(), android.app_activity.clone());
            entries.insert("Automation Name".to_string(), android.automation_name.clone());
        }
        Platform::Ios => {
            let ios = &config.ios;
            entries.insert("OS Version".to_string(), ios.platform_version.clone());
            entries.insert("Device Model".to_string(), ios.device_name.clone());
            entries.insert("Bundle Id".to_string(), ios.bundle_id.clone());
            entries.insert("Automation Name".to_string(), ios.automation_name.clone());
        }
    }
    entries.insert("App Profile".to_string(), config.app.clone());
    entries.insert("Appium Server".to_string(), config.appium.server_url.clone());
    entries.insert(
        "Test Environment".to_string(),
        std::env::var("TEST_ENV").unwrap_or_else(|_| "LOCAL".to_string()),
    );
    entries
}

/// Write `environment.properties` (`key=value` per line)
pub fn write_environment_properties(dir: &Path, entries: &BTreeMap<String, String>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let content = entries
        .iter()
        .map(|(key, value)| format!("{}={}", key.replace(' ', "\\ "), value))
        .collect::<Vec<_>>()
        .join("\n");
    let path = dir.join("environment.properties");
    fs::write(&path, content)?;
    Ok(path)
}

/// Failure classification rule in `categories.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub matched_statuses: Vec<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_regex: Option<String>,
}

impl Category {
    fn new(name: &str, statuses: &[Status], message_regex: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            matched_statuses: statuses.to_vec(),
            message_regex: message_regex.map(str::to_string),
        }
    }
}

pub fn default_categories() -> Vec<Category> {
    use Status::*;
    vec![
        Category::new("Product Defects", &[Failed], Some(".*(assert|Expected|Actual).*")),
        Category::new(
            "Test Defects",
            &[Failed, Broken],
            Some(".*(No element matches|no longer attached|Failed to).*"),
        ),
        Category::new("Known Issues", &[Failed], Some(".*(KNOWN|BUG|JIRA).*")),
        Category::new("Flaky Tests", &[Failed, Broken], Some(".*(flaky|intermittent|random).*")),
        Category::new("Timeout Issues", &[Broken], Some(".*(timeout|Timed out).*")),
        Category::new(
            "Device/Driver Issues",
            &[Broken],
            Some(".*(driver|device|connection|session).*"),
        ),
        Category::new("Passed Tests", &[Passed], None),
        Category::new("Skipped Tests", &[Skipped], None),
    ]
}

pub fn write_categories(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("categories.json");
    fs::write(&path, serde_json::to_string_pretty(&default_categories())?)?;
    Ok(path)
}

/// Contents of `executor.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub build_order: u64,
    pub build_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    pub report_name: String,
}

impl ExecutorInfo {
    /// Describe the current run from `CI`, `BUILD_NUMBER`, `BUILD_URL`,
    /// `REPORT_URL` and `USER`
    pub fn from_env(app: &str, platform: Platform) -> Self {
        let build_order = std::env::var("BUILD_NUMBER")
            .ok()
            .and_then(|n| n.parse().ok())
            .unwrap_or_else(now_millis);
        let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
        let ci = std::env::var_os("CI").is_some();

        let mut executor = Self::local(&user, build_order, app, platform);
        if ci {
            executor.name = "CI/CD Pipeline".to_string();
            executor.kind = "jenkins".to_string();
        }
        executor.build_url = std::env::var("BUILD_URL").ok();
        executor.report_url = std::env::var("REPORT_URL").ok();
        executor
    }

    pub fn local(user: &str, build_order: u64, app: &str, platform: Platform) -> Self {
        let mut app_name = app.to_string();
        if let Some(first) = app_name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        Self {
            name: format!("Local - {user}"),
            kind: "local".to_string(),
            build_order,
            build_name: format!("Build #{build_order}"),
            build_url: None,
            report_url: None,
            report_name: format!("{} Mobile Tests - {}", app_name, platform.as_str().to_uppercase()),
        }
    }
}

pub fn write_executor(dir: &Path, executor: &ExecutorInfo) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("executor.json");
    fs::write(&path, serde_json::to_string_pretty(executor)?)?;
    Ok(path)
}

/// Write environment, categories and executor files for one run
pub fn write_run_metadata(dir: &Path, config: &SuiteConfig, platform: Platform) -> Result<Vec<PathBuf>> {
    let paths = vec![
        write_environment_properties(dir, &environment_entries(config, platform))?,
        write_categories(dir)?,
        write_executor(dir, &ExecutorInfo::from_env(&config.app, platform))?,
    ];
    info!("Allure run metadata written to {}", dir.display());
    Ok(paths)
}
