//! # CMMC Common Library
//!
//! Shared code for the CMMC assessment services including:
//! - Practice catalog model and input-shape normalization
//! - Catalog loading over HTTP
//! - Merge engine (L2 catalog, L1 catalog, mined practices)
//! - Scoring (completion percentages, SPRS)
//! - Versioned persistence of the mutable assessment state
//! - Configuration loading and error types

pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod persistence;
pub mod poam;
pub mod practice;
pub mod records;
pub mod scoring;
pub mod state;

pub use engine::AssessmentEngine;
pub use error::{Error, Result};
pub use practice::{is_level_one, Practice, PracticeLevel};
pub use records::{ObjectiveStatus, PracticeStatus};
