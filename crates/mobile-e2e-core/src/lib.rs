//! Mobile end-to-end core
//!
//! Platform resolution, capability building, the W3C/Appium session client,
//! the per-scenario driver lifecycle and the page helpers the suite's page
//! objects are built on.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod appium;
pub mod capabilities;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod gesture;
pub mod hooks;
pub mod locator;
pub mod page;
pub mod platform;
pub mod reporting;
pub mod session;
pub mod wait;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use appium::{AppiumConnector, AppiumSession};
pub use capabilities::CapabilitySet;
pub use config::SuiteConfig;
pub use device::{AdbShell, DeviceControl, ForceStop};
pub use driver::{DriverManager, DriverState, Session};
pub use error::{ConfigError, DriverInitError, E2eError, Result, WebDriverError};
pub use gesture::{GesturePlan, Point, Rect, ScrollDirection, Size, SwipeDirection};
pub use hooks::{ScenarioHooks, ScenarioOutcome};
pub use locator::{AppProfile, FlowFlags, Locator, LocatorTable, PlatformLocator, UiElement};
pub use page::{BasePage, ClickStrategy, ClickTarget, KeyboardDismissal};
pub use platform::{Platform, PlatformResolver};
pub use reporting::{AllureSink, ReportSink, ScenarioInfo, Status, TracingSink};
pub use session::{ElementId, RemoteSession, SessionFactory};
pub use wait::Wait;
