//! In-memory test doubles (feature `testing`)
//!
//! [`FakeDevice`] implements [`RemoteSession`] over a scripted element list
//! and records every command it receives. Clones share state, so a test can
//! keep one handle while the driver manager owns another.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::capabilities::CapabilitySet;
use crate::config::SuiteConfig;
use crate::device::{DeviceControl, ForceStop};
use crate::driver::Session;
use crate::error::{ConfigError, E2eError, Result, WebDriverError, WebDriverResult};
use crate::gesture::{PointerOrigin, PointerAction, PointerSequence, Rect, Size};
use crate::locator::Locator;
use crate::platform::Platform;
use crate::reporting::{ReportSink, ScenarioInfo, Status};
use crate::session::{ElementId, RecordingOptions, RemoteSession, SessionFactory};

/// Fake PNG header returned by screenshots
pub const FAKE_SCREENSHOT: &[u8] = b"\x89PNG\r\n\x1a\nfake";
/// Bytes returned when a recording stops
pub const FAKE_VIDEO: &[u8] = b"fake-mp4";

// ----------------------------------------------------------------------------
// Elements
// ----------------------------------------------------------------------------

/// One scripted on-screen element
#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    pub id: String,
    pub locators: Vec<Locator>,
    pub text: String,
    pub displayed: bool,
    pub enabled: bool,
    pub rect: Rect,
    pub attributes: HashMap<String, String>,
    /// Vertical shift applied to `rect` by every drag gesture
    pub gesture_shift: i64,
    /// Number of drag gestures before the element can be found
    pub appears_after_gestures: u32,
}

impl FakeElement {
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locators: vec![locator],
            text: String::new(),
            displayed: true,
            enabled: true,
            rect: Rect::new(0, 0, 100, 50),
            attributes: HashMap::new(),
            gesture_shift: 0,
            appears_after_gestures: 0,
        }
    }

    pub fn also_matches(mut self, locator: Locator) -> Self {
        self.locators.push(locator);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn moves_on_gesture(mut self, dy: i64) -> Self {
        self.gesture_shift = dy;
        self
    }

    pub fn appears_after_gestures(mut self, gestures: u32) -> Self {
        self.appears_after_gestures = gestures;
        self
    }
}

/// Commands received by the fake, in order
#[derive(Debug, Clone, PartialEq)]
pub enum FakeCommand {
    SetImplicitWait(Duration),
    FindElement(Locator),
    FindElements(Locator),
    Click(String),
    Clear(String),
    SendKeys(String, String),
    Text(String),
    Displayed(String),
    Enabled(String),
    Rect(String),
    Attribute(String, String),
    WindowSize,
    PerformActions(Vec<PointerSequence>),
    ExecuteScript(String, Vec<Value>),
    Back,
    HideKeyboard,
    Screenshot,
    PageSource,
    StartRecording,
    StopRecording,
    Quit,
}

impl FakeCommand {
    /// Name used by the failure-injection API
    pub fn name(&self) -> &'static str {
        match self {
            FakeCommand::SetImplicitWait(_) => "set_implicit_wait",
            FakeCommand::FindElement(_) => "find_element",
            FakeCommand::FindElements(_) => "find_elements",
            FakeCommand::Click(_) => "click",
            FakeCommand::Clear(_) => "clear",
            FakeCommand::SendKeys(..) => "send_keys",
            FakeCommand::Text(_) => "text",
            FakeCommand::Displayed(_) => "is_displayed",
            FakeCommand::Enabled(_) => "is_enabled",
            FakeCommand::Rect(_) => "rect",
            FakeCommand::Attribute(..) => "attribute",
            FakeCommand::WindowSize => "window_size",
            FakeCommand::PerformActions(_) => "perform_actions",
            FakeCommand::ExecuteScript(..) => "execute_script",
            FakeCommand::Back => "back",
            FakeCommand::HideKeyboard => "hide_keyboard",
            FakeCommand::Screenshot => "screenshot",
            FakeCommand::PageSource => "page_source",
            FakeCommand::StartRecording => "start_recording",
            FakeCommand::StopRecording => "stop_recording",
            FakeCommand::Quit => "quit",
        }
    }

    fn element(&self) -> Option<&str> {
        match self {
            FakeCommand::Click(id)
            | FakeCommand::Clear(id)
            | FakeCommand::SendKeys(id, _)
            | FakeCommand::Text(id)
            | FakeCommand::Displayed(id)
            | FakeCommand::Enabled(id)
            | FakeCommand::Rect(id)
            | FakeCommand::Attribute(id, _) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct FailRule {
    command: &'static str,
    element: Option<String>,
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct FakeState {
    elements: Vec<FakeElement>,
    window: Size,
    commands: Vec<FakeCommand>,
    rules: Vec<FailRule>,
    gestures: u32,
    closed: HashSet<String>,
    recording: bool,
}

// ----------------------------------------------------------------------------
// Fake device
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeDevice {
    id: String,
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            id: "fake-session-0".to_string(),
            state: Arc::new(Mutex::new(FakeState {
                window: Size::new(1080, 2000),
                ..FakeState::default()
            })),
        }
    }

    /// Handle sharing this device's screen under another session id
    pub fn with_session_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Arc::clone(&self.state),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_window(self, size: Size) -> Self {
        self.state().window = size;
        self
    }

    pub fn add(&self, element: FakeElement) -> &Self {
        self.state().elements.push(element);
        self
    }

    pub fn remove(&self, id: &str) {
        self.state().elements.retain(|e| e.id != id);
    }

    /// Current copy of a scripted element
    pub fn element(&self, id: &str) -> Option<FakeElement> {
        self.state().elements.iter().find(|e| e.id == id).cloned()
    }

    /// Every call of `command` fails
    pub fn fail_always(&self, command: &'static str) {
        self.push_rule(command, None, None);
    }

    /// The next `times` calls of `command` fail
    pub fn fail_times(&self, command: &'static str, times: u32) {
        self.push_rule(command, None, Some(times));
    }

    /// Every call of `command` on element `id` fails
    pub fn fail_on_element(&self, id: &str, command: &'static str) {
        self.push_rule(command, Some(id.to_string()), None);
    }

    fn push_rule(&self, command: &'static str, element: Option<String>, remaining: Option<u32>) {
        self.state().rules.push(FailRule {
            command,
            element,
            remaining,
        });
    }

    pub fn commands(&self) -> Vec<FakeCommand> {
        self.state().commands.clone()
    }

    pub fn count(&self, predicate: impl Fn(&FakeCommand) -> bool) -> usize {
        self.state().commands.iter().filter(|c| predicate(c)).count()
    }

    /// Clicks received by element `id`, direct clicks only
    pub fn clicks(&self, id: &str) -> usize {
        self.count(|c| matches!(c, FakeCommand::Click(e) if e == id))
    }

    pub fn gestures(&self) -> u32 {
        self.state().gestures
    }

    pub fn is_recording(&self) -> bool {
        self.state().recording
    }

    pub fn clear_log(&self) {
        self.state().commands.clear();
    }

    /// Record `command` and apply failure rules
    fn record(&self, command: FakeCommand) -> WebDriverResult<()> {
        let mut state = self.state();
        if state.closed.contains(&self.id) {
            return Err(WebDriverError::SessionClosed(self.id.clone()));
        }

        let name = command.name();
        let element = command.element().map(str::to_string);
        state.commands.push(command);

        let hit = state.rules.iter_mut().find(|rule| {
            rule.command == name
                && rule.element.as_deref().map_or(true, |id| element.as_deref() == Some(id))
                && rule.remaining.map_or(true, |n| n > 0)
        });
        match hit {
            Some(rule) => {
                if let Some(n) = rule.remaining.as_mut() {
                    *n -= 1;
                }
                Err(WebDriverError::Protocol {
                    status: 500,
                    error: "unknown error".to_string(),
                    message: format!("injected failure: {name}"),
                })
            }
            None => Ok(()),
        }
    }

    fn with_element<T>(&self, id: &ElementId, f: impl FnOnce(&mut FakeElement) -> T) -> WebDriverResult<T> {
        let mut state = self.state();
        let gestures = state.gestures;
        state
            .elements
            .iter_mut()
            .find(|e| e.id == id.as_str() && gestures >= e.appears_after_gestures)
            .map(f)
            .ok_or_else(|| WebDriverError::StaleElement(id.to_string()))
    }

    fn matching(&self, locator: &Locator) -> Vec<ElementId> {
        let state = self.state();
        state
            .elements
            .iter()
            .filter(|e| state.gestures >= e.appears_after_gestures && e.locators.contains(locator))
            .map(|e| ElementId::new(e.id.clone()))
            .collect()
    }

    fn apply_gesture(&self) {
        let mut state = self.state();
        state.gestures += 1;
        for element in state.elements.iter_mut() {
            element.rect.y += element.gesture_shift;
        }
    }
}

#[async_trait]
impl RemoteSession for FakeDevice {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn set_implicit_wait(&self, timeout: Duration) -> WebDriverResult<()> {
        self.record(FakeCommand::SetImplicitWait(timeout))
    }

    async fn find_element(&self, locator: &Locator) -> WebDriverResult<ElementId> {
        self.record(FakeCommand::FindElement(locator.clone()))?;
        self.matching(locator)
            .into_iter()
            .next()
            .ok_or_else(|| WebDriverError::NoSuchElement(locator.to_string()))
    }

    async fn find_elements(&self, locator: &Locator) -> WebDriverResult<Vec<ElementId>> {
        self.record(FakeCommand::FindElements(locator.clone()))?;
        Ok(self.matching(locator))
    }

    async fn click(&self, element: &ElementId) -> WebDriverResult<()> {
        self.record(FakeCommand::Click(element.to_string()))?;
        self.with_element(element, |_| ())
    }

    async fn clear(&self, element: &ElementId) -> WebDriverResult<()> {
        self.record(FakeCommand::Clear(element.to_string()))?;
        self.with_element(element, |e| e.text.clear())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> WebDriverResult<()> {
        self.record(FakeCommand::SendKeys(element.to_string(), text.to_string()))?;
        self.with_element(element, |e| e.text.push_str(text))
    }

    async fn text(&self, element: &ElementId) -> WebDriverResult<String> {
        self.record(FakeCommand::Text(element.to_string()))?;
        self.with_element(element, |e| e.text.clone())
    }

    async fn is_displayed(&self, element: &ElementId) -> WebDriverResult<bool> {
        self.record(FakeCommand::Displayed(element.to_string()))?;
        self.with_element(element, |e| e.displayed)
    }

    async fn is_enabled(&self, element: &ElementId) -> WebDriverResult<bool> {
        self.record(FakeCommand::Enabled(element.to_string()))?;
        self.with_element(element, |e| e.enabled)
    }

    async fn rect(&self, element: &ElementId) -> WebDriverResult<Rect> {
        self.record(FakeCommand::Rect(element.to_string()))?;
        self.with_element(element, |e| e.rect)
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> WebDriverResult<Option<String>> {
        self.record(FakeCommand::Attribute(element.to_string(), name.to_string()))?;
        self.with_element(element, |e| e.attributes.get(name).cloned())
    }

    async fn window_size(&self) -> WebDriverResult<Size> {
        self.record(FakeCommand::WindowSize)?;
        Ok(self.state().window)
    }

    async fn perform_actions(&self, sequences: &[PointerSequence]) -> WebDriverResult<()> {
        self.record(FakeCommand::PerformActions(sequences.to_vec()))?;
        let is_drag = sequences.iter().flat_map(|s| s.actions.iter()).any(|a| {
            matches!(a, PointerAction::Move { duration, origin: PointerOrigin::Viewport, .. } if *duration > 0)
        });
        if is_drag {
            self.apply_gesture();
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> WebDriverResult<Value> {
        self.record(FakeCommand::ExecuteScript(script.to_string(), args.clone()))?;
        if script == "mobile: dragFromToForDuration" {
            self.apply_gesture();
        } else if script.contains("arguments[0].click()") {
            let target = args
                .first()
                .and_then(ElementId::from_reference)
                .ok_or_else(|| WebDriverError::UnexpectedResponse("script click without element".to_string()))?;
            self.with_element(&target, |_| ())?;
        }
        Ok(Value::Null)
    }

    async fn back(&self) -> WebDriverResult<()> {
        self.record(FakeCommand::Back)
    }

    async fn hide_keyboard(&self) -> WebDriverResult<()> {
        self.record(FakeCommand::HideKeyboard)
    }

    async fn screenshot(&self) -> WebDriverResult<Vec<u8>> {
        self.record(FakeCommand::Screenshot)?;
        Ok(FAKE_SCREENSHOT.to_vec())
    }

    async fn page_source(&self) -> WebDriverResult<String> {
        self.record(FakeCommand::PageSource)?;
        Ok("<hierarchy/>".to_string())
    }

    async fn start_recording(&self, _options: &RecordingOptions) -> WebDriverResult<()> {
        self.record(FakeCommand::StartRecording)?;
        self.state().recording = true;
        Ok(())
    }

    async fn stop_recording(&self) -> WebDriverResult<Vec<u8>> {
        self.record(FakeCommand::StopRecording)?;
        self.state().recording = false;
        Ok(FAKE_VIDEO.to_vec())
    }

    async fn quit(&self) -> WebDriverResult<()> {
        self.record(FakeCommand::Quit)?;
        self.state().closed.insert(self.id.clone());
        Ok(())
    }
}

/// Ready-made session over `device` with default capabilities
pub fn fake_session(device: &FakeDevice, platform: Platform) -> std::result::Result<Arc<Session>, ConfigError> {
    let config = SuiteConfig::default().with_platform(platform);
    let capabilities = CapabilitySet::build(platform, &config)?;
    Ok(Arc::new(Session::new(
        platform,
        capabilities,
        config.appium.implicit_wait(),
        Box::new(device.clone()),
    )))
}

// ----------------------------------------------------------------------------
// Fake factory
// ----------------------------------------------------------------------------

/// Hands out [`FakeDevice`] sessions and counts `open` calls
#[derive(Debug, Clone)]
pub struct FakeFactory {
    device: FakeDevice,
    opens: Arc<AtomicU32>,
    unreachable: Arc<AtomicBool>,
    last_capabilities: Arc<Mutex<Option<CapabilitySet>>>,
}

impl FakeFactory {
    pub fn new(device: FakeDevice) -> Self {
        Self {
            device,
            opens: Arc::new(AtomicU32::new(0)),
            unreachable: Arc::new(AtomicBool::new(false)),
            last_capabilities: Arc::new(Mutex::new(None)),
        }
    }

    pub fn device(&self) -> &FakeDevice {
        &self.device
    }

    pub fn open_count(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn last_capabilities(&self) -> Option<CapabilitySet> {
        self.last_capabilities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(
        &self,
        endpoint: &str,
        capabilities: &CapabilitySet,
    ) -> WebDriverResult<Box<dyn RemoteSession>> {
        let n = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(WebDriverError::InvalidEndpoint(format!("{endpoint}: connection refused")));
        }
        *self.last_capabilities.lock().unwrap_or_else(PoisonError::into_inner) = Some(capabilities.clone());
        Ok(Box::new(self.device.with_session_id(format!("fake-session-{n}"))))
    }
}

// ----------------------------------------------------------------------------
// Fake device shell
// ----------------------------------------------------------------------------

/// Records force-stop, logcat and device-info requests
#[derive(Debug, Clone, Default)]
pub struct FakeShell {
    calls: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(E2eError::Diagnostic(format!("injected failure: {call}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceControl for FakeShell {
    async fn force_stop(&self, platform: Platform, app_id: &str) -> Result<ForceStop> {
        self.record(format!("force_stop {} {}", platform.as_str(), app_id))?;
        Ok(platform.select(ForceStop::Stopped, ForceStop::Skipped))
    }

    async fn logcat(&self, lines: u32) -> Result<String> {
        self.record(format!("logcat {lines}"))?;
        Ok("I/ActivityManager: fake logcat".to_string())
    }

    async fn device_info(&self, platform: Platform) -> Result<String> {
        self.record(format!("device_info {}", platform.as_str()))?;
        Ok(format!("Platform: {}\nModel: Fake Device", platform.label()))
    }
}

// ----------------------------------------------------------------------------
// Recording sink
// ----------------------------------------------------------------------------

/// [`ReportSink`] that keeps one line per call, e.g. `attach Screenshot image/png`
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.events().iter().any(|e| e.starts_with(prefix))
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

impl ReportSink for RecordingSink {
    fn start_scenario(&mut self, _scenario: &ScenarioInfo, title: &str) {
        self.push(format!("start {title}"));
    }

    fn label(&mut self, name: &str, value: &str) {
        self.push(format!("label {name}={value}"));
    }

    fn description(&mut self, text: &str) {
        self.push(format!("description {text}"));
    }

    fn log(&mut self, line: &str) {
        self.push(format!("log {line}"));
    }

    fn step(&mut self, name: &str, status: Status) {
        self.push(format!("step {status} {name}"));
    }

    fn attach(&mut self, name: &str, mime: &str, data: &[u8]) -> Result<()> {
        self.push(format!("attach {name} {mime} {}", data.len()));
        Ok(())
    }

    fn finish(&mut self, status: Status, _message: Option<&str>) -> Result<()> {
        self.push(format!("finish {status}"));
        Ok(())
    }
}
