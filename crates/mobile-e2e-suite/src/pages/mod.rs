//! Page objects driven by an app profile

pub mod login;
pub mod search;

pub use login::{Language, LoginPage};
pub use search::SearchJourneyPage;
