// File: src/alignments.rs
//! Reader for pre-computed alignments.
//!
//! One aligned word pair per line, tab-separated:
//! `from  to  upper-segments  lower-segments  [weights]`, where the segment
//! and weight columns are space-separated and of equal length. Missing
//! weights default to 1.0. Blank lines and lines starting with `#` are ignored.

use crate::core::types::{AlignedPair, LanguagePair};
use crate::error::{ProjectionError, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub pair: LanguagePair,
    pub columns: Vec<AlignedPair>,
}

pub fn read_alignments(path: &Path) -> Result<Vec<AlignmentRecord>> {
    let text = std::fs::read_to_string(path)?;
    parse_alignments(&text)
}

pub fn parse_alignments(text: &str) -> Result<Vec<AlignmentRecord>> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(ProjectionError::invalid_data(
                line_no,
                format!("expected at least 4 tab-separated fields, found {}", fields.len()),
            ));
        }

        let upper: Vec<&str> = fields[2].split_whitespace().collect();
        let lower: Vec<&str> = fields[3].split_whitespace().collect();
        if upper.len() != lower.len() {
            return Err(ProjectionError::invalid_data(
                line_no,
                format!("{} upper segments but {} lower segments", upper.len(), lower.len()),
            ));
        }

        let weights = match fields.get(4).map(|f| f.trim()).filter(|f| !f.is_empty()) {
            Some(column) => parse_weights(column, upper.len(), line_no)?,
            None => vec![1.0; upper.len()],
        };

        let columns = upper
            .iter()
            .zip(&lower)
            .zip(weights)
            .map(|((u, l), w)| AlignedPair::new(*u, *l, w))
            .collect();
        records.push(AlignmentRecord {
            pair: LanguagePair::new(fields[0].trim(), fields[1].trim()),
            columns,
        });
    }
    Ok(records)
}

fn parse_weights(column: &str, expected: usize, line_no: usize) -> Result<Vec<f64>> {
    let weights = column
        .split_whitespace()
        .map(|w| match w.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(ProjectionError::invalid_data(line_no, format!("invalid weight '{}'", w))),
        })
        .collect::<Result<Vec<f64>>>()?;
    if weights.len() != expected {
        return Err(ProjectionError::invalid_data(
            line_no,
            format!("{} weights for {} columns", weights.len(), expected),
        ));
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weighted_and_unweighted_lines() {
        let text = "# from\tto\tupper\tlower\tweights\n\
                    deu\tnld\th a - s\th ɔ n s\t0.5 0.25 1 0.75\n\
                    \n\
                    fra\tita\tp a\tb a\n";
        let records = parse_alignments(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pair, LanguagePair::new("deu", "nld"));
        assert_eq!(records[0].columns[2], AlignedPair::new("-", "n", 1.0));
        assert_eq!(records[0].columns[3].weight, 0.75);
        assert!(records[1].columns.iter().all(|c| c.weight == 1.0));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = parse_alignments("deu\tnld\ta b\ta\n").unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidData { line: 1, .. }));
    }

    #[test]
    fn rejects_negative_weights() {
        let err = parse_alignments("deu\tnld\ta\ta\t-1\n").unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidData { line: 1, .. }));
    }

    #[test]
    fn rejects_short_lines() {
        assert!(parse_alignments("deu\tnld\n").is_err());
    }
}
