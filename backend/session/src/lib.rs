//! Session-scoped state: one uploaded document and one question table per
//! session, no sharing between sessions.

pub mod registry;
pub mod session;
pub mod workflow;

pub use registry::{SessionHandle, SessionRegistry};
pub use session::{GenerationGuard, Session, SessionSummary};
pub use workflow::generate_for_session;
