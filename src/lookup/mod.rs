//! Request validation and orchestration.

mod outcome;
mod service;
mod validate;

pub use outcome::{BatchItem, BatchOutcome, LookupOutcome};
pub use service::{LookupService, MAX_BATCH_SIZE};
pub use validate::{validate_ip, InvalidIp};
