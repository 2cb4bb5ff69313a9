//! Conversation agent
//!
//! Drives a scam engagement turn by turn:
//! - [`DecisionEngine`] scores the intelligence gathered so far and decides
//!   whether to keep engaging
//! - [`ConversationStateMachine`] tracks the conversation lifecycle
//! - [`TurnProcessor`] runs classify, extract, merge, decide and transition for
//!   one turn without side effects
//! - [`SessionRegistry`] serializes turns per session, calls the external
//!   reply generator and commits each turn as a whole

pub mod decision;
pub mod orchestrator;
pub mod reply;
pub mod session;
pub mod state_machine;

pub use decision::{ConversationQuality, DecisionEngine, EngagementLevel};
pub use orchestrator::{TurnInput, TurnOutcome, TurnProcessor};
pub use reply::{
    clean_reply, generate_with_timeout, pick_fallback, EngagementPhase, ReplyGenerator,
    ReplyRequest, StallOnlyGenerator, FALLBACK_PHRASES,
};
pub use session::{InMemorySessionStore, SessionRegistry, SessionState, SessionStore, TurnReply};
pub use state_machine::ConversationStateMachine;
