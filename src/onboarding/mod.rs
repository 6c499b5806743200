//! Onboarding — the question flow that builds a `UserProfile`.
//!
//! The collector walks a fixed question sequence and validates answers into
//! a `DraftProfile`; the synthesizer then turns the draft into persona text
//! (template substitution, optionally rewritten by the model). Persistence
//! is the caller's responsibility.

pub mod collector;
pub mod model;
pub mod questions;
pub mod synthesizer;

pub use collector::{AnswerSet, Collector};
pub use model::{
    CoachingStyle, DraftProfile, MotivationStyle, SynthesisStrategy, UserProfile, UserRole,
};
pub use questions::{Question, QuestionKind, QUESTIONS};
pub use synthesizer::Synthesizer;
