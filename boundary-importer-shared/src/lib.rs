//! # Boundary Importer Shared
//! This crate defines shared data structures and types used across the boundary
//! importer ecosystem. It includes common definitions for hierarchy levels,
//! boundary features, geometry footprints, stored records, and export rows.
pub mod types;
