//! Music library edition reconciliation - shared modules for the CLI.

pub mod catalog;
pub mod discovery;
pub mod ignore;
pub mod library;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod prune;
pub mod reconcile;
pub mod safety;
