//! Storyboard generation: explicit state transitions plus the run orchestrator

pub mod orchestrator;
pub mod state;

pub use orchestrator::{settle_images, GenerateError, StartedRun, StoryboardOrchestrator};
pub use state::{reduce, Rejection, StoryboardEvent, StoryboardState};
