//! Data model for mined scenarios.
//!
//! - [`scenario`] — scenario kinds, candidates, drafts, and emitted records.

pub mod scenario;

pub use scenario::{
    RefPosition, RepoState, RevId, ScenarioCandidate, ScenarioDraft, ScenarioKind, ScenarioRecord,
};
