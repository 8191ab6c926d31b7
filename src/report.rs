// File: src/report.rs
use crate::core::types::Segment;
use crate::error::Result;
use crate::learning::ProjectionLearner;
use crate::sound_groups::SoundGroupShift;
use crossterm::style::Stylize;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairStability {
    pub from: String,
    pub to: String,
    pub total_weight: f64,
    pub stability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionSample {
    pub from: String,
    pub to: String,
    pub input: Vec<Segment>,
    pub outputs: Vec<Vec<Segment>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub pairs: Vec<PairStability>,
    pub sound_groups: Vec<SoundGroupShift>,
    pub samples: Vec<ProjectionSample>,
}

impl Report {
    /// One row per finalized pair.
    pub fn pair_rows(learner: &ProjectionLearner) -> Vec<PairStability> {
        learner
            .models()
            .filter_map(|(pair, model)| {
                model.stability().map(|stability| PairStability {
                    from: pair.from.clone(),
                    to: pair.to.clone(),
                    total_weight: model.total_weight(),
                    stability,
                })
            })
            .collect()
    }
}

pub fn write_json<W: Write>(out: &mut W, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_text<W: Write>(out: &mut W, report: &Report) -> io::Result<()> {
    writeln!(out, "{}", "Pair stability".bold().cyan())?;
    writeln!(out, "{}", "From\tTo\tWeight\tStability".bold())?;
    for row in &report.pairs {
        writeln!(out, "{}\t{}\t{:.3}\t{:.4}", row.from, row.to, row.total_weight, row.stability)?;
    }

    if !report.sound_groups.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Sound groups".bold().cyan())?;
        writeln!(
            out,
            "{}",
            "SoundGroup\tWeightedNumAlignments\tStable\tShiftInGroup\tShiftOutOfGroup\tLossOrGain".bold()
        )?;
        for row in &report.sound_groups {
            writeln!(
                out,
                "{}\t{:.3}\t{:.4}\t{:.4}\t{:.4}\t{:.4}",
                row.group,
                row.weighted_alignments,
                row.stable,
                row.shift_in_group,
                row.shift_out_of_group,
                row.loss_or_gain
            )?;
        }
    }

    if !report.samples.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Projections".bold().cyan())?;
        for sample in &report.samples {
            let input = sample.input.join(" ");
            for output in &sample.outputs {
                writeln!(
                    out,
                    "{} -> {}\t{}\t{}",
                    sample.from,
                    sample.to,
                    input,
                    output.join(" ").green()
                )?;
            }
        }
    }
    Ok(())
}
