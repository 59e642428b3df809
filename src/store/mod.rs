mod jobs;
mod transitions;

pub use jobs::{Anomaly, JobAction, JobStore, MutationKind, StoreError};
pub use transitions::{is_terminal, is_valid_transition};
