// File: src/core/projection.rs
use crate::core::types::{GappyBigram, LanguagePair, Segment};
use crate::error::{ProjectionError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Weighted segment correspondences from one language to another.
///
/// Tables are ordered maps so that sampling walks candidates in ascending
/// symbol order, which makes draws reproducible under a seeded RNG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormProjectionModel {
    pair: LanguagePair,
    upper_counts: BTreeMap<Segment, f64>,
    lower_counts: BTreeMap<Segment, f64>,
    /// Maps upper segment -> lower segment -> weight.
    pair_counts: BTreeMap<Segment, BTreeMap<Segment, f64>>,
    /// Maps upper context -> lower segment -> weight.
    context_counts: BTreeMap<GappyBigram, BTreeMap<Segment, f64>>,
    context_totals: BTreeMap<GappyBigram, f64>,
    total_weight: f64,
    stability: Option<f64>,
}

/// Result of a class-based stability recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassStability {
    pub stability: f64,
    /// Symbols missing from the class map; their pairs were left out of the
    /// stable weight.
    pub unresolved: BTreeSet<Segment>,
}

impl FormProjectionModel {
    pub fn new(pair: LanguagePair) -> Self {
        Self {
            pair,
            upper_counts: BTreeMap::new(),
            lower_counts: BTreeMap::new(),
            pair_counts: BTreeMap::new(),
            context_counts: BTreeMap::new(),
            context_totals: BTreeMap::new(),
            total_weight: 0.0,
            stability: None,
        }
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn store_pair(&mut self, upper: &str, lower: &str) {
        self.store_pair_with_weight(upper, lower, 1.0);
    }

    pub fn store_pair_with_weight(&mut self, upper: &str, lower: &str, weight: f64) {
        self.total_weight += weight;
        *self.upper_counts.entry(upper.to_string()).or_insert(0.0) += weight;
        *self.lower_counts.entry(lower.to_string()).or_insert(0.0) += weight;
        *self
            .pair_counts
            .entry(upper.to_string())
            .or_default()
            .entry(lower.to_string())
            .or_insert(0.0) += weight;
    }

    pub fn store_context(&mut self, context: GappyBigram, lower: &str) {
        self.store_context_with_weight(context, lower, 1.0);
    }

    pub fn store_context_with_weight(&mut self, context: GappyBigram, lower: &str, weight: f64) {
        *self
            .context_counts
            .entry(context)
            .or_default()
            .entry(lower.to_string())
            .or_insert(0.0) += weight;
    }

    /// Prunes pairs lighter than `min_count`, rebuilds the upper marginals
    /// from what survives, totals the context tables and computes stability.
    ///
    /// Pruned entries are set to zero, not removed. `total_weight` is left
    /// untouched, so pruning can only lower stability.
    pub fn finalize(&mut self, min_count: f64) -> Result<f64> {
        if self.total_weight <= 0.0 {
            return Err(ProjectionError::DivideByZero { pair: self.pair.clone() });
        }

        for (upper, lowers) in self.pair_counts.iter_mut() {
            let mut kept = 0.0;
            for count in lowers.values_mut() {
                if *count < min_count {
                    *count = 0.0;
                } else {
                    kept += *count;
                }
            }
            self.upper_counts.insert(upper.clone(), kept);
        }

        self.context_totals = self
            .context_counts
            .iter()
            .map(|(context, lowers)| (context.clone(), lowers.values().sum::<f64>()))
            .collect();

        let unchanged: f64 = self
            .pair_counts
            .iter()
            .filter_map(|(upper, lowers)| lowers.get(upper))
            .sum();
        let stability = unchanged / self.total_weight;
        self.stability = Some(stability);
        info!(pair = %self.pair, stability, "overall stability for language pair");
        Ok(stability)
    }

    /// Redefines stable as "same sound class" and recomputes stability over
    /// the pruned tables, so the model must be finalized first.
    /// Unresolved symbols are logged and skipped, never fatal.
    pub fn recompute_stability(&mut self, sound_to_class: &BTreeMap<Segment, String>) -> Result<ClassStability> {
        if !self.is_finalized() {
            return Err(ProjectionError::NotFinalized { pair: self.pair.clone() });
        }
        if self.total_weight <= 0.0 {
            return Err(ProjectionError::DivideByZero { pair: self.pair.clone() });
        }

        let mut unresolved = BTreeSet::new();
        let mut stable = 0.0;
        for (upper, lowers) in &self.pair_counts {
            let upper_class = sound_to_class.get(upper);
            if upper_class.is_none() {
                unresolved.insert(upper.clone());
            }
            for (lower, count) in lowers {
                let lower_class = sound_to_class.get(lower);
                if lower_class.is_none() {
                    unresolved.insert(lower.clone());
                }
                if let (Some(a), Some(b)) = (upper_class, lower_class) {
                    if a == b {
                        stable += count;
                    }
                }
            }
        }

        for symbol in &unresolved {
            let condition = ProjectionError::UnresolvedClass { symbol: symbol.clone() };
            warn!(pair = %self.pair, "{}", condition);
        }

        let stability = stable / self.total_weight;
        self.stability = Some(stability);
        info!(pair = %self.pair, stability, "class-based stability for language pair");
        Ok(ClassStability { stability, unresolved })
    }

    /// `None` until the model has been finalized.
    pub fn stability(&self) -> Option<f64> {
        self.stability
    }

    pub fn is_finalized(&self) -> bool {
        self.stability.is_some()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn upper_counts(&self) -> &BTreeMap<Segment, f64> {
        &self.upper_counts
    }

    pub fn lower_counts(&self) -> &BTreeMap<Segment, f64> {
        &self.lower_counts
    }

    pub fn pair_counts(&self) -> &BTreeMap<Segment, BTreeMap<Segment, f64>> {
        &self.pair_counts
    }

    pub fn pair_count(&self, upper: &str, lower: &str) -> Option<f64> {
        self.pair_counts.get(upper).and_then(|l| l.get(lower)).copied()
    }

    pub fn context_counts(&self) -> &BTreeMap<GappyBigram, BTreeMap<Segment, f64>> {
        &self.context_counts
    }

    /// Per-context totals; filled in by `finalize`.
    pub fn context_totals(&self) -> &BTreeMap<GappyBigram, f64> {
        &self.context_totals
    }

    /// Draws a plausible counterpart for every segment of `input`.
    ///
    /// Per position: the segment's full context if it was observed, else the
    /// bare segment, else the global distribution of lower segments. Pruned
    /// pairs are never drawn and a tier without live weight is skipped.
    pub fn sample_mapping<S, R>(&self, input: &[S], rng: &mut R) -> Result<Vec<Segment>>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        if self.total_weight <= 0.0 {
            return Err(ProjectionError::EmptyModel { pair: self.pair.clone() });
        }
        (0..input.len()).map(|i| self.sample_position(input, i, rng)).collect()
    }

    fn sample_position<S, R>(&self, input: &[S], i: usize, rng: &mut R) -> Result<Segment>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let context = GappyBigram::at(input, i);
        if let Some(options) = self.context_counts.get(&context) {
            if let Some(lower) = draw(options, rng) {
                return Ok(lower);
            }
        }
        if let Some(options) = self.pair_counts.get(input[i].as_ref()) {
            if let Some(lower) = draw(options, rng) {
                return Ok(lower);
            }
        }
        draw(&self.lower_counts, rng).ok_or_else(|| ProjectionError::EmptyModel { pair: self.pair.clone() })
    }
}

/// Inverse-CDF draw in ascending key order over the positive entries of
/// `options`. `None` when nothing carries weight.
fn draw<R: Rng + ?Sized>(options: &BTreeMap<Segment, f64>, rng: &mut R) -> Option<Segment> {
    let total: f64 = options.values().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let cutoff = rng.gen::<f64>() * total;
    let mut pos = 0.0;
    let mut last = None;
    for (lower, &weight) in options.iter().filter(|(_, w)| **w > 0.0) {
        pos += weight;
        if pos >= cutoff {
            return Some(lower.clone());
        }
        last = Some(lower);
    }
    // Rounding can leave `pos` a hair under `cutoff`.
    last.cloned()
}
