//! Query lifecycle domain module

mod session;
mod status;

pub use session::{InvalidStateTransition, QueryId, QueryOutcome, QuerySession, QueryState};
pub use status::StatusMessage;
