//! Conversation orchestration for the FitCoach assistant.

pub mod coordinator;
pub mod session;

pub use coordinator::{AgentError, AgentResult, CoachAgent};
pub use session::{ProfileValue, Session};
