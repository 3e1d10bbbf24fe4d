//! Screening Results Console
//!
//! Backend-for-frontend over an external AML transaction-screening
//! pipeline:
//! - Normalizes raw verdict records into display statuses and scores
//! - Aggregates per-run summaries into dashboard-wide totals
//! - Strips echoed prompts out of model reasoning narratives
//! - Serves the normalized views over HTTP

pub mod api;
pub mod classifier;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reasoning;
pub mod summary;

pub use error::Result;

// Re-export common types
pub use classifier::{VerificationClassifier, VerificationStatus};
pub use models::*;
