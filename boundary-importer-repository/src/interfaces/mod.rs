mod store;

pub use store::{BoundaryStore, UpsertOutcome};
