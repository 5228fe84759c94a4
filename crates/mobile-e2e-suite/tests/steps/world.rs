//! Cucumber world: one driver lifecycle per scenario

use std::fmt;
use std::sync::Arc;

use cucumber::event::ScenarioFinished;
use cucumber::gherkin::{Feature, Scenario};
use cucumber::World;
use mobile_e2e_core::config::TimingSettings;
use mobile_e2e_core::reporting::Status;
use mobile_e2e_core::testing::{FakeDevice, FakeFactory};
use mobile_e2e_core::{
    AppProfile, ClickStrategy, KeyboardDismissal, ScenarioHooks, ScenarioInfo, ScenarioOutcome, Session,
};
use mobile_e2e_suite::{profile_by_name, LoginPage, SearchJourneyPage, PROFILE_NAMES};

/// In-memory device behind an offline scenario
#[derive(Debug, Clone)]
pub struct FakeBackend {
    pub device: FakeDevice,
    pub factory: FakeFactory,
}

#[derive(World)]
#[world(init = Self::new)]
pub struct E2eWorld {
    pub hooks: Option<ScenarioHooks>,
    pub session: Option<Arc<Session>>,
    pub profile: Option<AppProfile>,
    pub scenario: Option<ScenarioInfo>,
    pub fake: Option<FakeBackend>,
    pub previous_session: Option<Arc<Session>>,
    pub last_click: Option<ClickStrategy>,
    pub last_dismissal: Option<KeyboardDismissal>,
}

impl fmt::Debug for E2eWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("E2eWorld")
            .field("scenario", &self.scenario)
            .field("profile", &self.profile.as_ref().map(|p| p.name.as_str()))
            .field("session", &self.session.as_ref().map(|s| s.id().to_string()))
            .field("offline", &self.fake.is_some())
            .finish()
    }
}

impl E2eWorld {
    fn new() -> Self {
        Self {
            hooks: None,
            session: None,
            profile: None,
            scenario: None,
            fake: None,
            previous_session: None,
            last_click: None,
            last_dismissal: None,
        }
    }

    /// Run the before hook; a failure panics so the scenario is reported broken
    pub async fn begin(&mut self, mut hooks: ScenarioHooks, info: ScenarioInfo, profile: AppProfile) {
        let session = match hooks.before(&info).await {
            Ok(session) => session,
            Err(e) => {
                self.hooks = Some(hooks);
                self.scenario = Some(info);
                panic!("Scenario setup failed: {e}");
            }
        };
        self.session = Some(session);
        self.hooks = Some(hooks);
        self.profile = Some(profile);
        self.scenario = Some(info);
    }

    /// Run the after hook with the outcome cucumber reports
    pub async fn finish(&mut self, event: &ScenarioFinished) {
        let outcome = outcome_of(event);
        if let (Some(hooks), Some(info)) = (self.hooks.as_mut(), self.scenario.as_ref()) {
            hooks.after(info, &outcome).await;
        }
        self.session = None;
        self.previous_session = None;
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(self.session.as_ref().expect("no live session"))
    }

    pub fn hooks_mut(&mut self) -> &mut ScenarioHooks {
        self.hooks.as_mut().expect("scenario hooks not installed")
    }

    pub fn fake(&self) -> &FakeBackend {
        self.fake.as_ref().expect("scenario is not running offline")
    }

    fn timing(&self) -> TimingSettings {
        self.hooks
            .as_ref()
            .map(|hooks| hooks.config().timing.clone())
            .unwrap_or_default()
    }

    fn profile(&self) -> AppProfile {
        self.profile.clone().expect("no app profile selected")
    }

    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(self.session(), &self.timing(), self.profile())
    }

    pub fn search_page(&self) -> SearchJourneyPage {
        SearchJourneyPage::new(self.session(), &self.timing(), self.profile())
    }
}

/// Scenario metadata with feature and scenario tags merged
pub fn scenario_info(feature: &Feature, scenario: &Scenario) -> ScenarioInfo {
    ScenarioInfo::new(scenario.name.clone(), feature.name.clone())
        .with_tags(feature.tags.iter().chain(scenario.tags.iter()).cloned())
}

/// Profile named by an app tag (`@lydia`, `@wigl`, `@wikipedia`), if any
pub fn tagged_profile(info: &ScenarioInfo) -> Option<AppProfile> {
    info.tags
        .iter()
        .find(|tag| PROFILE_NAMES.contains(&tag.as_str()))
        .and_then(|tag| profile_by_name(tag).ok())
}

pub fn outcome_of(event: &ScenarioFinished) -> ScenarioOutcome {
    match event {
        ScenarioFinished::StepPassed => ScenarioOutcome::passed(),
        ScenarioFinished::StepSkipped => ScenarioOutcome {
            status: Status::Skipped,
            message: None,
        },
        ScenarioFinished::BeforeHookFailed(..) => ScenarioOutcome::broken("scenario setup failed"),
        ScenarioFinished::StepFailed(..) => ScenarioOutcome::failed("step failed"),
    }
}
