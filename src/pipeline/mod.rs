//! The development pipeline: candidates, selection, validation and persistence.

mod candidate;
mod developer;
mod generator;
mod sink;
mod validator;

pub use candidate::{select_best, Candidate, ScoredCandidate};
pub use developer::{Developer, DevelopmentResult, Plan, RunSummary};
pub use generator::{
    AutocoderCandidates, CandidateBackend, CandidateGenerator, Generation, GenerationFailure,
    HuggingFaceCandidates, LlmCandidates, HUGGINGFACE_PRIOR, LLM_PRIOR,
};
pub use sink::{DevLog, FeatureStore, ResultArchive, SavedFeature, SinkError};
pub use validator::{
    validate, ValidationReport, LUA_MARKERS, MIN_CODE_LEN, REASON_MISSING, REASON_NOT_LUA,
    REASON_TOO_SHORT,
};
