// File: src/learning.rs
use crate::core::projection::FormProjectionModel;
use crate::core::types::{AlignedPair, GappyBigram, LanguagePair, Segment};
use crate::error::{ProjectionError, Result};
use crate::families::FamilyIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Owns one projection model per ordered language pair and feeds aligned
/// word pairs into the matching model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionLearner {
    models: BTreeMap<LanguagePair, FormProjectionModel>,
}

impl ProjectionLearner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty model for every ordered pair within a family.
    pub fn for_families(families: &FamilyIndex) -> Self {
        let mut learner = Self::new();
        for pair in families.same_family_pairs() {
            learner.add_pair(pair);
        }
        learner
    }

    pub fn add_pair(&mut self, pair: LanguagePair) -> &mut FormProjectionModel {
        self.models
            .entry(pair.clone())
            .or_insert_with(|| FormProjectionModel::new(pair))
    }

    pub fn model(&self, from: &str, to: &str) -> Result<&FormProjectionModel> {
        self.models
            .get(&LanguagePair::new(from, to))
            .ok_or_else(|| ProjectionError::not_found(format!("model {} -> {}", from, to)))
    }

    pub fn model_mut(&mut self, from: &str, to: &str) -> Result<&mut FormProjectionModel> {
        self.models
            .get_mut(&LanguagePair::new(from, to))
            .ok_or_else(|| ProjectionError::not_found(format!("model {} -> {}", from, to)))
    }

    pub fn models(&self) -> impl Iterator<Item = (&LanguagePair, &FormProjectionModel)> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Records one alignment of a `from` form against a `to` form.
    pub fn record_alignment(&mut self, from: &str, to: &str, columns: &[AlignedPair]) -> Result<()> {
        let model = self.model_mut(from, to)?;
        record_columns(model, columns);
        Ok(())
    }

    /// Finalizes every pair in parallel and returns how many succeeded.
    /// Pairs without observations are skipped and stay unfinalized.
    pub fn finalize_all(&mut self, min_count: f64) -> usize {
        self.models
            .par_iter_mut()
            .map(|(pair, model)| match model.finalize(min_count) {
                Ok(_) => 1,
                Err(e) => {
                    warn!(%pair, error = %e, "skipping language pair without observations");
                    0
                }
            })
            .sum()
    }

    /// Class-based stability for every finalized pair. Returns the union of
    /// symbols the class map could not resolve.
    pub fn recompute_stabilities(&mut self, sound_to_class: &BTreeMap<Segment, String>) -> BTreeSet<Segment> {
        let mut unresolved = BTreeSet::new();
        for model in self.models.values_mut().filter(|m| m.is_finalized()) {
            if let Ok(result) = model.recompute_stability(sound_to_class) {
                unresolved.extend(result.unresolved);
            }
        }
        unresolved
    }

    /// Stability of every finalized pair.
    pub fn stabilities(&self) -> BTreeMap<LanguagePair, f64> {
        self.models
            .iter()
            .filter_map(|(pair, model)| model.stability().map(|s| (pair.clone(), s)))
            .collect()
    }
}

/// Stores each column as a weighted pair, and as a context observation keyed
/// by the upper symbols of its neighbouring columns (gaps included).
pub fn record_columns(model: &mut FormProjectionModel, columns: &[AlignedPair]) {
    let uppers: Vec<&str> = columns.iter().map(|c| c.upper.as_str()).collect();
    for (i, column) in columns.iter().enumerate() {
        model.store_pair_with_weight(&column.upper, &column.lower, column.weight);
        model.store_context_with_weight(GappyBigram::at(&uppers, i), &column.lower, column.weight);
    }
}
