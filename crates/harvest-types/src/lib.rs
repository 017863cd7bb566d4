//! Shared data model for the OAI-PMH endpoint.
//!
//! These types cross the seams between the protocol engine, the external
//! record repository, and the resumption-token store, so they live in a
//! dependency-light crate both sides can name. The protocol engine itself
//! lives in `harvest-protocol`.

mod record;
mod token;
mod verb;

pub use record::{CallerId, Record, RecordFilter, Set};
pub use token::ResumptionToken;
pub use verb::Verb;
