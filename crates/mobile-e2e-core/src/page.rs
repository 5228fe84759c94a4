//! Page abstraction shared by every page object
//!
//! Propagating helpers return [`Result`]; predicates and advisory helpers
//! (`is_present`, `is_visible`, `text_or_empty`, `dismiss_keyboard`,
//! `tap_first_present`) absorb every failure and report through their return
//! value instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::TimingSettings;
use crate::driver::Session;
use crate::error::{E2eError, Result, WebDriverResult};
use crate::gesture::{GesturePlan, Point, PointerSequence, Rect, ScrollDirection, SwipeDirection};
use crate::locator::Locator;
use crate::platform::Platform;
use crate::session::{ElementId, RemoteSession};
use crate::wait::Wait;

/// iOS keyboard accessory button
pub fn keyboard_done_button() -> Locator {
    Locator::xpath("//XCUIElementTypeButton[@name='Done']")
}

/// iOS application root, tapped to drop focus from a text field
pub fn application_canvas() -> Locator {
    Locator::xpath("//XCUIElementTypeApplication")
}

/// Strategy that made a resilient click land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickStrategy {
    Direct,
    PointerTap,
    Script,
}

impl ClickStrategy {
    /// Number of strategies tried, this one included
    pub fn attempts(self) -> u32 {
        match self {
            ClickStrategy::Direct => 1,
            ClickStrategy::PointerTap => 2,
            ClickStrategy::Script => 3,
        }
    }
}

/// Which of two candidate locators received the click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Primary,
    Fallback,
}

/// Outcome of a keyboard dismissal; never an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardDismissal {
    NativeHide,
    BackNavigation,
    DoneButton,
    CanvasTap,
    /// Every level failed; one reason per level
    Exhausted(Vec<String>),
}

impl KeyboardDismissal {
    pub fn is_dismissed(&self) -> bool {
        !matches!(self, KeyboardDismissal::Exhausted(_))
    }
}

// ----------------------------------------------------------------------------
// Base page
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BasePage {
    session: Arc<Session>,
    wait: Wait,
    settle_delay: Duration,
    keyboard_settle: Duration,
}

impl BasePage {
    pub fn new(session: Arc<Session>, timing: &TimingSettings) -> Self {
        Self {
            session,
            wait: Wait::new(timing.element_timeout(), timing.poll_interval()),
            settle_delay: timing.settle_delay(),
            keyboard_settle: timing.keyboard_settle(),
        }
    }

    /// Override the element wait (15 s by default)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.wait = self.wait.with_timeout(timeout);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn platform(&self) -> Platform {
        self.session.platform()
    }

    pub fn timeout(&self) -> Duration {
        self.wait.timeout()
    }

    fn remote(&self) -> &dyn RemoteSession {
        self.session.remote()
    }

    pub async fn pause(&self, duration: Duration) {
        sleep(duration).await;
    }

    // ------------------------------------------------------------------
    // Waits
    // ------------------------------------------------------------------

    pub async fn wait_present(&self, locator: &Locator) -> Result<ElementId> {
        let remote = self.remote();
        self.wait
            .until(&format!("presence of {locator}"), || async move { first_present(remote, locator).await })
            .await
    }

    pub async fn wait_visible(&self, locator: &Locator) -> Result<ElementId> {
        let remote = self.remote();
        self.wait
            .until(&format!("visibility of {locator}"), || async move { first_visible(remote, locator).await })
            .await
    }

    pub async fn wait_clickable(&self, locator: &Locator) -> Result<ElementId> {
        let remote = self.remote();
        self.wait
            .until(&format!("clickability of {locator}"), || async move {
                first_clickable(remote, locator).await
            })
            .await
    }

    /// Visibility check bounded by `timeout` instead of the page timeout
    pub async fn is_visible_within(&self, locator: &Locator, timeout: Duration) -> bool {
        let remote = self.remote();
        self.wait
            .with_timeout(timeout)
            .until(&format!("visibility of {locator}"), || async move { first_visible(remote, locator).await })
            .await
            .is_ok()
    }

    // ------------------------------------------------------------------
    // Element commands
    // ------------------------------------------------------------------

    /// Single immediate lookup
    pub async fn find(&self, locator: &Locator) -> Result<ElementId> {
        self.remote()
            .find_element(locator)
            .await
            .map_err(|e| E2eError::interaction("find", locator.to_string(), e.into()))
    }

    pub async fn click(&self, locator: &Locator) -> Result<()> {
        let element = self
            .wait_clickable(locator)
            .await
            .map_err(|e| E2eError::interaction("click", locator.to_string(), e))?;
        self.remote()
            .click(&element)
            .await
            .map_err(|e| E2eError::interaction("click", locator.to_string(), e.into()))?;
        debug!("Clicked {}", locator);
        Ok(())
    }

    /// Click, logging instead of failing
    pub async fn try_click(&self, locator: &Locator) -> bool {
        match self.click(locator).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Optional click skipped: {}", e);
                false
            }
        }
    }

    /// Focus the field, clear it and type `text`
    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let fail = |e: E2eError| E2eError::interaction("type into", locator.to_string(), e);
        let element = self.wait_clickable(locator).await.map_err(fail)?;
        let remote = self.remote();
        remote.click(&element).await.map_err(|e| fail(e.into()))?;
        remote.clear(&element).await.map_err(|e| fail(e.into()))?;
        remote.send_keys(&element, text).await.map_err(|e| fail(e.into()))?;
        debug!("Typed {} character(s) into {}", text.chars().count(), locator);
        Ok(())
    }

    pub async fn text(&self, locator: &Locator) -> Result<String> {
        let element = self
            .wait_present(locator)
            .await
            .map_err(|e| E2eError::interaction("read text of", locator.to_string(), e))?;
        self.remote()
            .text(&element)
            .await
            .map_err(|e| E2eError::interaction("read text of", locator.to_string(), e.into()))
    }

    /// Text of the element if it is on screen right now
    pub async fn optional_text(&self, locator: &Locator) -> Option<String> {
        let remote = self.remote();
        let element = first_present(remote, locator).await.ok().flatten()?;
        remote.text(&element).await.ok()
    }

    /// Text of the element, or `""` when it cannot be read
    pub async fn text_or_empty(&self, locator: &Locator) -> String {
        self.optional_text(locator).await.unwrap_or_default()
    }

    pub async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let element = self
            .wait_present(locator)
            .await
            .map_err(|e| E2eError::interaction("read attribute of", locator.to_string(), e))?;
        self.remote()
            .attribute(&element, name)
            .await
            .map_err(|e| E2eError::interaction("read attribute of", locator.to_string(), e.into()))
    }

    pub async fn rect(&self, locator: &Locator) -> Result<Rect> {
        let element = self.wait_present(locator).await?;
        Ok(self.remote().rect(&element).await?)
    }

    pub async fn is_present(&self, locator: &Locator) -> bool {
        matches!(first_present(self.remote(), locator).await, Ok(Some(_)))
    }

    pub async fn is_visible(&self, locator: &Locator) -> bool {
        matches!(first_visible(self.remote(), locator).await, Ok(Some(_)))
    }

    // ------------------------------------------------------------------
    // Resilient clicks
    // ------------------------------------------------------------------

    /// Direct click, then pointer tap on the element, then a script click
    pub async fn click_resilient(&self, locator: &Locator) -> Result<ClickStrategy> {
        let element = self
            .wait_present(locator)
            .await
            .map_err(|e| E2eError::interaction("click", locator.to_string(), e))?;
        let remote = self.remote();
        let mut failures = Vec::with_capacity(3);

        match remote.click(&element).await {
            Ok(()) => return Ok(ClickStrategy::Direct),
            Err(e) => {
                warn!("Direct click on {} failed: {}", locator, e);
                failures.push(format!("direct click: {e}"));
            }
        }

        match remote.perform_actions(&[PointerSequence::tap_element(&element)]).await {
            Ok(()) => return Ok(ClickStrategy::PointerTap),
            Err(e) => {
                warn!("Pointer tap on {} failed: {}", locator, e);
                failures.push(format!("pointer tap: {e}"));
            }
        }

        match remote
            .execute_script("arguments[0].click();", vec![element.to_reference()])
            .await
        {
            Ok(_) => Ok(ClickStrategy::Script),
            Err(e) => {
                warn!("Script click on {} failed: {}", locator, e);
                failures.push(format!("script click: {e}"));
                Err(E2eError::interaction(
                    "click",
                    locator.to_string(),
                    E2eError::gesture("click", 3, failures.join("; ")),
                ))
            }
        }
    }

    /// Click `primary`, or `fallback` when the primary never becomes clickable
    pub async fn click_with_fallback(&self, primary: &Locator, fallback: Option<&Locator>) -> Option<ClickTarget> {
        if self.try_click(primary).await {
            return Some(ClickTarget::Primary);
        }
        match fallback {
            Some(fallback) if self.try_click(fallback).await => {
                info!("Clicked fallback {} instead of {}", fallback, primary);
                Some(ClickTarget::Fallback)
            }
            _ => None,
        }
    }

    /// Click the first displayed candidate; `false` when none is on screen
    pub async fn tap_first_present(&self, candidates: &[Locator]) -> bool {
        let remote = self.remote();
        for locator in candidates {
            if let Ok(Some(element)) = first_visible(remote, locator).await {
                match remote.click(&element).await {
                    Ok(()) => {
                        debug!("Tapped {}", locator);
                        return true;
                    }
                    Err(e) => debug!("Tap on {} failed: {}", locator, e),
                }
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    /// Hide the soft keyboard with the platform's fallback chain
    ///
    /// Android: native hide, then back navigation. iOS: native hide, then the
    /// `Done` button, then a tap on the application canvas.
    pub async fn dismiss_keyboard(&self) -> KeyboardDismissal {
        sleep(self.keyboard_settle).await;
        let remote = self.remote();
        let mut reasons = Vec::new();

        let outcome = 'levels: {
            match remote.hide_keyboard().await {
                Ok(()) => break 'levels KeyboardDismissal::NativeHide,
                Err(e) => {
                    debug!("Native keyboard hide failed: {}", e);
                    reasons.push(format!("native hide: {e}"));
                }
            }

            match self.platform() {
                Platform::Android => match remote.back().await {
                    Ok(()) => KeyboardDismissal::BackNavigation,
                    Err(e) => {
                        warn!("Could not hide keyboard via back navigation: {}", e);
                        reasons.push(format!("back navigation: {e}"));
                        KeyboardDismissal::Exhausted(std::mem::take(&mut reasons))
                    }
                },
                Platform::Ios => {
                    match tap(remote, &keyboard_done_button()).await {
                        Ok(()) => break 'levels KeyboardDismissal::DoneButton,
                        Err(e) => {
                            debug!("Done button tap failed: {}", e);
                            reasons.push(format!("done button: {e}"));
                        }
                    }
                    match tap(remote, &application_canvas()).await {
                        Ok(()) => KeyboardDismissal::CanvasTap,
                        Err(e) => {
                            warn!("Could not hide iOS keyboard: {}", e);
                            reasons.push(format!("canvas tap: {e}"));
                            KeyboardDismissal::Exhausted(std::mem::take(&mut reasons))
                        }
                    }
                }
            }
        };

        sleep(self.keyboard_settle).await;
        debug!("Keyboard dismissal outcome: {:?}", outcome);
        outcome
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    /// Execute one drag and wait the settle delay
    pub async fn perform_gesture(&self, plan: &GesturePlan) -> Result<()> {
        let remote = self.remote();
        let result = match self.platform() {
            Platform::Android => remote.perform_actions(&[plan.to_pointer_sequence()]).await,
            Platform::Ios => remote
                .execute_script("mobile: dragFromToForDuration", vec![plan.to_ios_drag_args()])
                .await
                .map(drop),
        };
        result.map_err(|e| {
            E2eError::gesture(
                format!("drag ({},{}) -> ({},{})", plan.from.x, plan.from.y, plan.to.x, plan.to.y),
                1,
                e.to_string(),
            )
        })?;
        sleep(self.settle_delay).await;
        Ok(())
    }

    /// Scroll from the element centre to 30 % (up) or 70 % (down) of the screen
    pub async fn scroll(&self, locator: &Locator, direction: ScrollDirection) -> Result<()> {
        let element = self.wait_present(locator).await?;
        let rect = self.remote().rect(&element).await?;
        let screen = self.remote().window_size().await?;
        self.perform_gesture(&GesturePlan::scroll(rect, screen, direction)).await
    }

    /// Scroll the element up by `percent` of the screen height
    pub async fn scroll_by(&self, locator: &Locator, percent: u32) -> Result<()> {
        let element = self.wait_present(locator).await?;
        let rect = self.remote().rect(&element).await?;
        let screen = self.remote().window_size().await?;
        self.perform_gesture(&GesturePlan::scroll_by(rect, screen, percent)).await
    }

    /// Drag the element up by `percent` of its distance from the top edge
    pub async fn lift(&self, locator: &Locator, percent: u32) -> Result<()> {
        let rect = self.rect(locator).await?;
        self.perform_gesture(&GesturePlan::lift(rect, percent)).await
    }

    pub async fn swipe_screen(&self, direction: SwipeDirection) -> Result<()> {
        let screen = self.remote().window_size().await?;
        self.perform_gesture(&GesturePlan::swipe(screen, direction)).await
    }

    pub async fn drag(&self, from: Point, to: Point) -> Result<()> {
        self.perform_gesture(&GesturePlan::drag(from, to)).await
    }

    /// Swipe until `locator` is present; `false` after `attempts` swipes
    pub async fn scroll_until_present(&self, locator: &Locator, direction: SwipeDirection, attempts: u32) -> bool {
        for attempt in 0..attempts {
            if self.is_present(locator).await {
                return true;
            }
            if let Err(e) = self.swipe_screen(direction).await {
                warn!("Swipe {} of {} failed: {}", attempt + 1, attempts, e);
            }
        }
        self.is_present(locator).await
    }

    /// Scroll the element up by `percent` and confirm it moved
    ///
    /// Retries up to `attempts` times, then fails with a gesture error.
    pub async fn scroll_verified(&self, locator: &Locator, percent: u32, attempts: u32) -> Result<()> {
        let mut last_failure = String::from("no attempt made");
        for attempt in 1..=attempts {
            match self.scroll_once_verified(locator, percent).await {
                Ok((before, after)) => {
                    info!("Scrolled {} up from y={} to y={}", locator, before, after);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Attempt {} of {} failed: {}", attempt, attempts, e);
                    last_failure = e.to_string();
                }
            }
        }
        Err(E2eError::gesture(
            format!("scroll {locator} up by {percent}%"),
            attempts,
            last_failure,
        ))
    }

    async fn scroll_once_verified(&self, locator: &Locator, percent: u32) -> Result<(i64, i64)> {
        let before = self.rect(locator).await?.y;
        self.scroll_by(locator, percent).await?;
        let element = self.remote().find_element(locator).await?;
        let after = self.remote().rect(&element).await?.y;
        if after < before {
            Ok((before, after))
        } else {
            Err(E2eError::gesture(
                format!("scroll {locator}"),
                1,
                format!("element did not move up (y={before} -> y={after})"),
            ))
        }
    }

    /// Repeated upward swipes; individual failures are ignored
    pub async fn scroll_to_bottom(&self, swipes: u32) {
        for _ in 0..swipes {
            if let Err(e) = self.swipe_screen(SwipeDirection::Up).await {
                debug!("Swipe ignored: {}", e);
            }
        }
    }

    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.remote()
            .screenshot()
            .await
            .map_err(|e| E2eError::Diagnostic(format!("screenshot: {e}")))
    }
}

// ----------------------------------------------------------------------------
// Probes
// ----------------------------------------------------------------------------

async fn first_present(remote: &dyn RemoteSession, locator: &Locator) -> WebDriverResult<Option<ElementId>> {
    Ok(remote.find_elements(locator).await?.into_iter().next())
}

async fn first_visible(remote: &dyn RemoteSession, locator: &Locator) -> WebDriverResult<Option<ElementId>> {
    for element in remote.find_elements(locator).await? {
        if remote.is_displayed(&element).await? {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

async fn first_clickable(remote: &dyn RemoteSession, locator: &Locator) -> WebDriverResult<Option<ElementId>> {
    for element in remote.find_elements(locator).await? {
        if remote.is_displayed(&element).await? && remote.is_enabled(&element).await? {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

async fn tap(remote: &dyn RemoteSession, locator: &Locator) -> WebDriverResult<()> {
    let element = remote.find_element(locator).await?;
    remote.click(&element).await
}
