// File: src/config.rs
//! Command-line configuration for the `sound_shift` binary.

use crate::core::types::{LanguagePair, Segment};
use crate::error::{ProjectionError, Result};
use clap::Parser;
use std::path::PathBuf;

/// A request to project a segment sequence from one language into another.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRequest {
    pub pair: LanguagePair,
    pub segments: Vec<Segment>,
}

/// Parses `FROM:TO:seg seg seg`.
pub fn parse_sample_request(value: &str) -> std::result::Result<SampleRequest, String> {
    let mut parts = value.splitn(3, ':');
    let (Some(from), Some(to), Some(segments)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected FROM:TO:SEGMENTS, got '{}'", value));
    };
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        return Err("language codes must not be empty".to_string());
    }
    let segments: Vec<Segment> = segments.split_whitespace().map(str::to_string).collect();
    if segments.is_empty() {
        return Err("no segments to sample for".to_string());
    }
    Ok(SampleRequest { pair: LanguagePair::new(from, to), segments })
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sound_shift",
    version,
    about = "Sound correspondence stability and form projection across related languages"
)]
pub struct Config {
    /// Newick tree file, one tree per line
    #[arg(long)]
    pub tree: PathBuf,

    /// Tab-separated alignments: from, to, upper segments, lower segments, weights
    #[arg(long)]
    pub alignments: PathBuf,

    /// Sound-group definitions (TSV with header)
    #[arg(long)]
    pub sound_groups: Option<PathBuf>,

    /// Pairs lighter than this are pruned when finalizing
    #[arg(long, default_value_t = 5.0)]
    pub min_count: f64,

    /// Use sound classes instead of identity when computing pair stability
    #[arg(long)]
    pub class_stability: bool,

    /// Seed for sampling; entropy when absent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Project a form, e.g. --sample 'deu:nld:h a u s'
    #[arg(long = "sample", value_parser = parse_sample_request)]
    pub samples: Vec<SampleRequest>,

    /// Draws per sample request
    #[arg(long, default_value_t = 1)]
    pub draws: usize,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Save finalized models to this path
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tree.is_file() {
            return Err(ProjectionError::Config {
                message: format!("tree file not found: {}", self.tree.display()),
            });
        }
        if !self.alignments.is_file() {
            return Err(ProjectionError::Config {
                message: format!("alignment file not found: {}", self.alignments.display()),
            });
        }
        if let Some(path) = &self.sound_groups {
            if !path.is_file() {
                return Err(ProjectionError::Config {
                    message: format!("sound-group file not found: {}", path.display()),
                });
            }
        }
        if self.class_stability && self.sound_groups.is_none() {
            return Err(ProjectionError::Config {
                message: "--class-stability needs --sound-groups".to_string(),
            });
        }
        if !self.min_count.is_finite() || self.min_count < 0.0 {
            return Err(ProjectionError::Config {
                message: format!("min-count must be a non-negative number, got {}", self.min_count),
            });
        }
        if self.draws == 0 {
            return Err(ProjectionError::Config {
                message: "draws must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
