// src/lib.rs

pub mod alignments;
pub mod config;
pub mod core;
pub mod error;
pub mod families;
pub mod learning;
pub mod logging;
pub mod persistence;
pub mod report;
pub mod sound_groups;

pub use crate::core::projection::FormProjectionModel;
pub use crate::core::tree::LanguageTree;
pub use crate::error::{ProjectionError, Result};
pub use crate::learning::ProjectionLearner;
