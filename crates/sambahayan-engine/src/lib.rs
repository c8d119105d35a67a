//! Household candidate matching and adaptive suggestion engine.
//!
//! [`Engine`] ties the pieces together:
//!
//! 1. [`generate`] queries every registry for probable family members of the
//!    head and spouse;
//! 2. the core ranker scores them against the learned-pattern snapshot
//!    (stage one, always complete on its own);
//! 3. [`Engine::refine`] optionally narrows that list through an external
//!    semantic filter under a timeout (stage two);
//! 4. [`Engine::save_family`] commits a household and hands the user's
//!    accept/reject feedback to the [`FeedbackRecorder`].

pub mod config;
pub mod error;
pub mod feedback;
pub mod generate;
pub mod pipeline;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use feedback::{FeedbackRecorder, FeedbackReport};
pub use generate::{Seeds, SpouseSeed, generate};
pub use pipeline::{
  Backend, Engine, Refined, SaveOutcome, SaveRequest, SpouseInput, SuggestRequest,
  Suggestions,
};
