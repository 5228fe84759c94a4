//! Driver lifecycle management
//!
//! A [`DriverManager`] owns at most one live [`Session`]. It is owned by a
//! scenario world, so parallel scenarios never share a session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::capabilities::CapabilitySet;
use crate::config::SuiteConfig;
use crate::error::DriverInitError;
use crate::platform::Platform;
use crate::session::{RemoteSession, SessionFactory};

/// One live connection to the remote automation endpoint
pub struct Session {
    platform: Platform,
    capabilities: CapabilitySet,
    implicit_wait: Duration,
    remote: Box<dyn RemoteSession>,
}

impl Session {
    pub fn new(
        platform: Platform,
        capabilities: CapabilitySet,
        implicit_wait: Duration,
        remote: Box<dyn RemoteSession>,
    ) -> Self {
        Self {
            platform,
            capabilities,
            implicit_wait,
            remote,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn implicit_wait(&self) -> Duration {
        self.implicit_wait
    }

    pub fn id(&self) -> &str {
        self.remote.session_id()
    }

    /// Raw command surface of the session
    pub fn remote(&self) -> &dyn RemoteSession {
        self.remote.as_ref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("platform", &self.platform)
            .field("implicit_wait", &self.implicit_wait)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Absent,
    Initializing,
    Ready,
}

/// Lazily creates and tears down the scenario's session
pub struct DriverManager {
    config: Arc<SuiteConfig>,
    factory: Arc<dyn SessionFactory>,
    slot: Option<Arc<Session>>,
    initializing: bool,
}

impl DriverManager {
    pub fn new(config: Arc<SuiteConfig>, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            config,
            factory,
            slot: None,
            initializing: false,
        }
    }

    pub fn config(&self) -> &Arc<SuiteConfig> {
        &self.config
    }

    pub fn state(&self) -> DriverState {
        match (&self.slot, self.initializing) {
            (Some(_), _) => DriverState::Ready,
            (None, true) => DriverState::Initializing,
            (None, false) => DriverState::Absent,
        }
    }

    /// Live session, if one exists
    pub fn current(&self) -> Option<Arc<Session>> {
        self.slot.clone()
    }

    /// Return the live session, creating it on first use
    ///
    /// Failures are not retried and leave the slot empty.
    pub async fn acquire(&mut self) -> Result<Arc<Session>, DriverInitError> {
        if let Some(session) = &self.slot {
            return Ok(Arc::clone(session));
        }

        self.initializing = true;
        let result = self.open().await;
        self.initializing = false;

        match result {
            Ok(session) => {
                let session = Arc::new(session);
                info!("{} driver created successfully (session {})", session.platform().label(), session.id());
                self.slot = Some(Arc::clone(&session));
                Ok(session)
            }
            Err(e) => {
                error!("Error creating driver: {}", e);
                Err(e)
            }
        }
    }

    async fn open(&self) -> Result<Session, DriverInitError> {
        let platform = self.config.platform()?;
        let capabilities = CapabilitySet::build(platform, &self.config)?;
        let endpoint = self.config.appium.server_url.clone();
        info!("Starting {} driver...", platform);

        let remote = self
            .factory
            .open(&endpoint, &capabilities)
            .await
            .map_err(|source| DriverInitError::Connect {
                platform,
                endpoint: endpoint.clone(),
                source,
            })?;

        let implicit_wait = self.config.appium.implicit_wait();
        if let Err(e) = remote.set_implicit_wait(implicit_wait).await {
            // half-open session: delete it before reporting
            if let Err(quit_err) = remote.quit().await {
                warn!("Could not delete half-open session {}: {}", remote.session_id(), quit_err);
            }
            return Err(DriverInitError::Configure(e));
        }

        Ok(Session::new(platform, capabilities, implicit_wait, remote))
    }

    /// Delete the live session, if any; the slot is cleared even on error
    pub async fn release(&mut self) {
        let Some(session) = self.slot.take() else {
            debug!("No session to release");
            return;
        };

        match session.remote().quit().await {
            Ok(()) => info!("Driver closed successfully"),
            Err(e) => warn!("Error while closing driver: {}", e),
        }
    }
}

/// A session still held on drop is not deleted; the server reclaims it after
/// `appium.new_command_timeout_secs`. Call [`DriverManager::release`] first.
impl Drop for DriverManager {
    fn drop(&mut self) {
        if let Some(session) = self.slot.take() {
            warn!(
                "Session {} dropped without release; left to the server's command timeout",
                session.id()
            );
        }
    }
}
