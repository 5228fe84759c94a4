//! Step definitions shared by the offline and on-device runners

pub mod lifecycle;
pub mod lydia;
pub mod wigl;
pub mod wikipedia;
pub mod world;
