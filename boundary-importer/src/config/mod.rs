//! Configuration module for the boundary importer.
//! Defines and manages application-wide settings and dependencies.
mod dependencies;

pub use dependencies::Dependencies;
