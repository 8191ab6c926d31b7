// File: src/sound_groups.rs
//! Sound-group definitions and the weighted shift tally built on them.

use crate::core::types::{AlignedPair, Segment, GAP};
use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Named groups of sounds. A sound may belong to several groups; the first
/// group listed for it is its class for class-based stability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundGroups {
    groups: BTreeMap<String, BTreeSet<Segment>>,
    primary_class: BTreeMap<Segment, String>,
}

impl SoundGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tsv_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_tsv(&text)
    }

    /// Reads the definitions table. The first line is a header. Column 0 is
    /// the sound, columns 2 up to (excluding) the last two carry group ids.
    pub fn from_tsv(text: &str) -> Result<Self> {
        let mut groups = Self::new();
        for (idx, line) in text.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let sound = fields[0].trim();
            if sound.is_empty() {
                return Err(ProjectionError::invalid_data(idx + 1, "missing sound in first column"));
            }
            let class_columns = fields.len().saturating_sub(2);
            let mut assigned = false;
            for group in fields.iter().take(class_columns).skip(2).map(|f| f.trim()) {
                if !group.is_empty() {
                    groups.insert(group, sound);
                    assigned = true;
                }
            }
            if !assigned {
                debug!(line = idx + 1, sound, "sound without any group");
            }
        }
        Ok(groups)
    }

    pub fn insert(&mut self, group: &str, sound: &str) {
        self.groups.entry(group.to_string()).or_default().insert(sound.to_string());
        self.primary_class
            .entry(sound.to_string())
            .or_insert_with(|| group.to_string());
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeSet<Segment>> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&BTreeSet<Segment>> {
        self.groups.get(name)
    }

    /// Sound -> class map for `FormProjectionModel::recompute_stability`.
    pub fn sound_to_class(&self) -> &BTreeMap<Segment, String> {
        &self.primary_class
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One row of the sound-group shift report. Fractions are of
/// `weighted_alignments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundGroupShift {
    pub group: String,
    pub weighted_alignments: f64,
    pub stable: f64,
    pub shift_in_group: f64,
    pub shift_out_of_group: f64,
    pub loss_or_gain: f64,
}

/// Weighted upper -> lower counts collected across all language pairs.
#[derive(Debug, Clone, Default)]
pub struct ShiftTally {
    instances: BTreeMap<Segment, f64>,
    shifts: BTreeMap<Segment, BTreeMap<Segment, f64>>,
}

impl ShiftTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, upper: &str, lower: &str, weight: f64) {
        *self.instances.entry(upper.to_string()).or_insert(0.0) += weight;
        *self
            .shifts
            .entry(upper.to_string())
            .or_default()
            .entry(lower.to_string())
            .or_insert(0.0) += weight;
    }

    /// Columns from a pair with high stability say little about change, so
    /// each column counts `(1 - pair_stability) * weight`.
    pub fn record_alignment(&mut self, columns: &[AlignedPair], pair_stability: f64) {
        for column in columns {
            self.record(&column.upper, &column.lower, (1.0 - pair_stability) * column.weight);
        }
    }

    pub fn instances(&self) -> &BTreeMap<Segment, f64> {
        &self.instances
    }

    /// One row per group that received any weight, in group-name order.
    pub fn summarize(&self, groups: &SoundGroups) -> Vec<SoundGroupShift> {
        let mut rows = Vec::new();
        for (name, members) in groups.groups() {
            let mut total = 0.0;
            let (mut stable, mut inside, mut outside, mut lost) = (0.0, 0.0, 0.0, 0.0);
            for sound in members {
                let Some(&count) = self.instances.get(sound) else {
                    continue;
                };
                total += count;
                for (lower, &weight) in self.shifts.get(sound).into_iter().flatten() {
                    if lower == sound {
                        stable += weight;
                    } else if lower == GAP {
                        lost += weight;
                    } else if members.contains(lower) {
                        inside += weight;
                    } else {
                        outside += weight;
                    }
                }
            }
            if total <= 0.0 {
                debug!(group = %name, "no weighted alignments for sound group");
                continue;
            }
            rows.push(SoundGroupShift {
                group: name.clone(),
                weighted_alignments: total,
                stable: stable / total,
                shift_in_group: inside / total,
                shift_out_of_group: outside / total,
                loss_or_gain: lost / total,
            });
        }
        rows
    }
}
