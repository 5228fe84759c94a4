//! Mobile end-to-end suite
//!
//! Locator tables for the apps under test and the page objects the Cucumber
//! steps drive. Scenarios and step definitions live under `tests/`.

pub mod apps;
pub mod pages;

pub use apps::{profile_by_name, profile_for, PROFILE_NAMES};
pub use pages::{Language, LoginPage, SearchJourneyPage};
