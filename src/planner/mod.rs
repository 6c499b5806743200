//! Plan and review generation — prompt assembly, the generation state
//! machine, and tolerant response parsing.

pub mod generator;
pub mod model;
pub mod parser;
pub mod prompts;

pub use generator::{GenerationPhase, Generator};
pub use model::{DailyPlan, Priority, TimeBlock, WeeklyReview};
