//! Remote session abstraction
//!
//! [`RemoteSession`] is the command surface page objects use; the Appium HTTP
//! client implements it, and so does the in-memory fake used by tests.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::capabilities::CapabilitySet;
use crate::error::WebDriverResult;
use crate::gesture::{PointerSequence, Rect, Size};
use crate::locator::Locator;

/// Key of element references in W3C payloads
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Remote element handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element reference usable as a script argument
    pub fn to_reference(&self) -> Value {
        json!({ W3C_ELEMENT_KEY: self.0, "ELEMENT": self.0 })
    }

    /// Parse `{"element-6066-...": id}` or the legacy `{"ELEMENT": id}`
    pub fn from_reference(value: &Value) -> Option<Self> {
        value
            .get(W3C_ELEMENT_KEY)
            .or_else(|| value.get("ELEMENT"))
            .and_then(Value::as_str)
            .map(ElementId::new)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options of `appium/start_recording_screen`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingOptions {
    #[serde(rename = "videoQuality")]
    pub video_quality: String,
    #[serde(rename = "videoFps")]
    pub video_fps: u32,
    #[serde(rename = "timeLimit")]
    pub time_limit: String,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            video_quality: "medium".to_string(),
            video_fps: 10,
            time_limit: "180".to_string(),
        }
    }
}

/// Commands available on one live remote session
#[async_trait]
pub trait RemoteSession: Send + Sync {
    fn session_id(&self) -> &str;

    async fn set_implicit_wait(&self, timeout: Duration) -> WebDriverResult<()>;

    async fn find_element(&self, locator: &Locator) -> WebDriverResult<ElementId>;
    async fn find_elements(&self, locator: &Locator) -> WebDriverResult<Vec<ElementId>>;

    async fn click(&self, element: &ElementId) -> WebDriverResult<()>;
    async fn clear(&self, element: &ElementId) -> WebDriverResult<()>;
    async fn send_keys(&self, element: &ElementId, text: &str) -> WebDriverResult<()>;
    async fn text(&self, element: &ElementId) -> WebDriverResult<String>;
    async fn is_displayed(&self, element: &ElementId) -> WebDriverResult<bool>;
    async fn is_enabled(&self, element: &ElementId) -> WebDriverResult<bool>;
    async fn rect(&self, element: &ElementId) -> WebDriverResult<Rect>;
    async fn attribute(&self, element: &ElementId, name: &str) -> WebDriverResult<Option<String>>;

    async fn window_size(&self) -> WebDriverResult<Size>;
    async fn perform_actions(&self, sequences: &[PointerSequence]) -> WebDriverResult<()>;
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> WebDriverResult<Value>;
    async fn back(&self) -> WebDriverResult<()>;
    async fn hide_keyboard(&self) -> WebDriverResult<()>;

    async fn screenshot(&self) -> WebDriverResult<Vec<u8>>;
    async fn page_source(&self) -> WebDriverResult<String>;
    async fn start_recording(&self, options: &RecordingOptions) -> WebDriverResult<()>;
    async fn stop_recording(&self) -> WebDriverResult<Vec<u8>>;

    /// Delete the remote session
    async fn quit(&self) -> WebDriverResult<()>;
}

/// Opens remote sessions at an endpoint
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(
        &self,
        endpoint: &str,
        capabilities: &CapabilitySet,
    ) -> WebDriverResult<Box<dyn RemoteSession>>;
}
