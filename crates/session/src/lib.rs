//! Catalog edit-session orchestration.
//!
//! One [`EditSession`] owns one in-progress product edit: it routes commands
//! to the catalog/media/size-guide components, reconciles previously
//! persisted state with what the operator staged, and hands the final
//! snapshot to a [`PersistenceGateway`]. The gateway is the authoritative
//! re-validator; everything in-session is a fast-fail pre-check
//! (optimistic concurrency, no locks).

pub mod gateway;
pub mod session;

pub use gateway::{
    CommitSnapshot, InMemoryGateway, MediaReconcilePayload, NewMediaFile, PersistenceGateway,
    SizeGuideRowPayload, VariantPayload,
};
pub use session::{EditSession, SessionCommand, SessionState};
