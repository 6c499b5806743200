//! Productivity Coach — personalized daily planning over a text-generation
//! API.
//!
//! Onboarding collects a profile, the synthesizer turns it into a persona,
//! and the planner generates time-blocked daily plans and weekly reviews
//! that are validated before they are persisted in a local SQLite database.

pub mod config;
pub mod error;
pub mod llm;
pub mod onboarding;
pub mod planner;
pub mod store;

pub use error::{Error, Result};
