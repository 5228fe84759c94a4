//! Appium / W3C WebDriver HTTP client

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::capabilities::CapabilitySet;
use crate::error::{WebDriverError, WebDriverResult};
use crate::gesture::{PointerSequence, Rect, Size};
use crate::locator::Locator;
use crate::session::{ElementId, RecordingOptions, RemoteSession, SessionFactory};

/// Opens sessions against an Appium server over HTTP
#[derive(Debug, Clone)]
pub struct AppiumConnector {
    client: Client,
}

impl AppiumConnector {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// `GET /status` on the server
    pub async fn status(&self, endpoint: &str) -> WebDriverResult<Value> {
        let base = normalize_endpoint(endpoint)?;
        let response = self.client.get(format!("{base}/status")).send().await?;
        unwrap_value(response).await
    }
}

impl Default for AppiumConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionFactory for AppiumConnector {
    async fn open(
        &self,
        endpoint: &str,
        capabilities: &CapabilitySet,
    ) -> WebDriverResult<Box<dyn RemoteSession>> {
        let base = normalize_endpoint(endpoint)?;
        info!("Starting Appium session for {} platform at {}", capabilities.platform(), base);

        let response = self
            .client
            .post(format!("{base}/session"))
            .json(&capabilities.session_payload()?)
            .send()
            .await?;

        let value = unwrap_value(response).await?;
        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| WebDriverError::UnexpectedResponse("no sessionId in response".to_string()))?
            .to_string();

        info!("Started Appium session: {}", session_id);
        Ok(Box::new(AppiumSession {
            client: self.client.clone(),
            base,
            session_id,
        }))
    }
}

/// One live Appium session
#[derive(Debug)]
pub struct AppiumSession {
    client: Client,
    base: String,
    session_id: String,
}

impl AppiumSession {
    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/session/{}", self.base, self.session_id)
        } else {
            format!("{}/session/{}/{}", self.base, self.session_id, path)
        }
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> WebDriverResult<Value> {
        debug!("{} {}", method, path);
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        unwrap_value(response).await
    }

    async fn get(&self, path: &str) -> WebDriverResult<Value> {
        self.command(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> WebDriverResult<Value> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn element_get(&self, element: &ElementId, what: &str) -> WebDriverResult<Value> {
        self.get(&format!("element/{}/{}", element.as_str(), what)).await
    }
}

#[async_trait]
impl RemoteSession for AppiumSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn set_implicit_wait(&self, timeout: Duration) -> WebDriverResult<()> {
        self.post("timeouts", json!({ "implicit": timeout.as_millis() as u64 }))
            .await
            .map(drop)
    }

    async fn find_element(&self, locator: &Locator) -> WebDriverResult<ElementId> {
        let value = self
            .post(
                "element",
                json!({ "using": locator.strategy.as_w3c(), "value": locator.value }),
            )
            .await?;
        let element = ElementId::from_reference(&value)
            .ok_or_else(|| WebDriverError::UnexpectedResponse("no element id in response".to_string()))?;
        debug!("Found element {} for {}", element, locator);
        Ok(element)
    }

    async fn find_elements(&self, locator: &Locator) -> WebDriverResult<Vec<ElementId>> {
        let value = self
            .post(
                "elements",
                json!({ "using": locator.strategy.as_w3c(), "value": locator.value }),
            )
            .await?;
        let items = value
            .as_array()
            .ok_or_else(|| WebDriverError::UnexpectedResponse("elements response is not a list".to_string()))?;
        Ok(items.iter().filter_map(ElementId::from_reference).collect())
    }

    async fn click(&self, element: &ElementId) -> WebDriverResult<()> {
        self.post(&format!("element/{}/click", element.as_str()), json!({}))
            .await
            .map(drop)
    }

    async fn clear(&self, element: &ElementId) -> WebDriverResult<()> {
        self.post(&format!("element/{}/clear", element.as_str()), json!({}))
            .await
            .map(drop)
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> WebDriverResult<()> {
        self.post(
            &format!("element/{}/value", element.as_str()),
            json!({ "text": text, "value": text.chars().map(|c| c.to_string()).collect::<Vec<_>>() }),
        )
        .await
        .map(drop)
    }

    async fn text(&self, element: &ElementId) -> WebDriverResult<String> {
        let value = self.element_get(element, "text").await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WebDriverError::UnexpectedResponse("no text in response".to_string()))
    }

    async fn is_displayed(&self, element: &ElementId) -> WebDriverResult<bool> {
        let value = self.element_get(element, "displayed").await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementId) -> WebDriverResult<bool> {
        let value = self.element_get(element, "enabled").await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn rect(&self, element: &ElementId) -> WebDriverResult<Rect> {
        let value = self.element_get(element, "rect").await?;
        let coord = |key: &str| value[key].as_f64().map(|v| v as i64).unwrap_or(0);
        Ok(Rect::new(coord("x"), coord("y"), coord("width"), coord("height")))
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> WebDriverResult<Option<String>> {
        let value = self.element_get(element, &format!("attribute/{name}")).await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn window_size(&self) -> WebDriverResult<Size> {
        let value = self.get("window/rect").await?;
        let dim = |key: &str| value[key].as_f64().map(|v| v as i64).unwrap_or(0);
        Ok(Size::new(dim("width"), dim("height")))
    }

    async fn perform_actions(&self, sequences: &[PointerSequence]) -> WebDriverResult<()> {
        self.post("actions", json!({ "actions": sequences })).await.map(drop)
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> WebDriverResult<Value> {
        self.post("execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    async fn back(&self) -> WebDriverResult<()> {
        self.post("back", json!({})).await.map(drop)
    }

    async fn hide_keyboard(&self) -> WebDriverResult<()> {
        self.post("appium/device/hide_keyboard", json!({})).await.map(drop)
    }

    async fn screenshot(&self) -> WebDriverResult<Vec<u8>> {
        let value = self.get("screenshot").await?;
        let data = value
            .as_str()
            .ok_or_else(|| WebDriverError::UnexpectedResponse("no screenshot data in response".to_string()))?;
        Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
    }

    async fn page_source(&self) -> WebDriverResult<String> {
        let value = self.get("source").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn start_recording(&self, options: &RecordingOptions) -> WebDriverResult<()> {
        self.post(
            "appium/start_recording_screen",
            json!({ "options": serde_json::to_value(options)? }),
        )
        .await
        .map(drop)
    }

    async fn stop_recording(&self) -> WebDriverResult<Vec<u8>> {
        let value = self.post("appium/stop_recording_screen", json!({})).await?;
        let data = value.as_str().unwrap_or_default();
        Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
    }

    async fn quit(&self) -> WebDriverResult<()> {
        info!("Ending Appium session: {}", self.session_id);
        let response = self.client.delete(self.url("")).send().await?;
        if !response.status().is_success() {
            warn!("Failed to end Appium session {} cleanly", self.session_id);
        }
        unwrap_value(response).await.map(drop)
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Validate the endpoint and strip any trailing slash
pub fn normalize_endpoint(endpoint: &str) -> WebDriverResult<String> {
    let url = url::Url::parse(endpoint).map_err(|e| WebDriverError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(WebDriverError::InvalidEndpoint(format!(
            "{endpoint}: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Extract `value` from a W3C response, mapping error objects
async fn unwrap_value(response: reqwest::Response) -> WebDriverResult<Value> {
    let status = response.status();
    let body = response.text().await?;
    let parsed: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body)
            .map_err(|e| WebDriverError::UnexpectedResponse(format!("{e}: {body}")))?
    };
    parse_response(status.as_u16(), parsed)
}

pub(crate) fn parse_response(status: u16, body: Value) -> WebDriverResult<Value> {
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
        return Err(WebDriverError::from_w3c(status, error, message));
    }
    if !(200..300).contains(&status) {
        return Err(WebDriverError::Protocol {
            status,
            error: "unknown error".to_string(),
            message: body.to_string(),
        });
    }
    Ok(value)
}
