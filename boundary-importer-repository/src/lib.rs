//! # Boundary Importer Repository
//! This crate provides the seam between the import pipeline and the remote
//! boundary store. It includes definitions for errors, the store interface,
//! the PostgREST-backed implementation, an in-memory mock, and the generated
//! code helper.
pub mod codes;
pub mod errors;
pub mod interfaces;
pub mod mock;
pub mod rest;

pub use codes::next_code;
pub use errors::RemoteWriteError;
pub use interfaces::{BoundaryStore, UpsertOutcome};
pub use mock::MockBoundaryStore;
pub use rest::RestBoundaryStore;
