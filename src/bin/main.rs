use projection_core::alignments::read_alignments;
use projection_core::config::Config;
use projection_core::families::FamilyIndex;
use projection_core::logging::init_tracing;
use projection_core::persistence::save_to_disk;
use projection_core::report::{write_json, write_text, ProjectionSample, Report};
use projection_core::sound_groups::{ShiftTally, SoundGroups};
use projection_core::{LanguageTree, ProjectionLearner, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use std::io::{stdout, Write};
use tracing::{debug, info};

fn main() {
    if let Err(e) = run() {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::parse_and_validate()?;
    init_tracing(&config.log_level);

    let tree = LanguageTree::from_newick_file(&config.tree)?;
    info!(nodes = tree.len(), families = tree.top_level().len(), "loaded language tree");

    let records = read_alignments(&config.alignments)?;
    let languages: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| [r.pair.from.as_str(), r.pair.to.as_str()])
        .collect();
    let families = FamilyIndex::from_tree(&tree, languages);

    // 1. Accumulate same-family alignments into per-pair models
    let mut learner = ProjectionLearner::for_families(&families);
    let mut skipped = 0;
    for record in &records {
        if !families.same_family(&record.pair.from, &record.pair.to) {
            debug!(pair = %record.pair, "skipping cross-family alignment");
            skipped += 1;
            continue;
        }
        learner.record_alignment(&record.pair.from, &record.pair.to, &record.columns)?;
    }
    info!(alignments = records.len() - skipped, skipped, pairs = learner.len(), "recorded alignments");

    // 2. Finalize, optionally switching to class-based stability
    let finalized = learner.finalize_all(config.min_count);
    info!(finalized, min_count = config.min_count, "finalized projection models");

    let sound_groups = match &config.sound_groups {
        Some(path) => Some(SoundGroups::from_tsv_file(path)?),
        None => None,
    };
    if config.class_stability {
        if let Some(groups) = &sound_groups {
            let unresolved = learner.recompute_stabilities(groups.sound_to_class());
            if !unresolved.is_empty() {
                info!(count = unresolved.len(), "symbols without a sound class");
            }
        }
    }

    let mut report = Report {
        pairs: Report::pair_rows(&learner),
        ..Report::default()
    };

    // 3. Weighted shift tally per sound group
    if let Some(groups) = &sound_groups {
        let stabilities = learner.stabilities();
        let mut tally = ShiftTally::new();
        for record in &records {
            if let Some(&stability) = stabilities.get(&record.pair) {
                tally.record_alignment(&record.columns, stability);
            }
        }
        report.sound_groups = tally.summarize(groups);
    }

    // 4. Projections
    if !config.samples.is_empty() {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        for request in &config.samples {
            let model = learner.model(&request.pair.from, &request.pair.to)?;
            let outputs = (0..config.draws)
                .map(|_| model.sample_mapping(&request.segments, &mut rng))
                .collect::<Result<Vec<_>>>()?;
            report.samples.push(ProjectionSample {
                from: request.pair.from.clone(),
                to: request.pair.to.clone(),
                input: request.segments.clone(),
                outputs,
            });
        }
    }

    let mut out = stdout().lock();
    if config.json {
        write_json(&mut out, &report)?;
    } else {
        write_text(&mut out, &report)?;
    }
    out.flush()?;

    if let Some(path) = &config.save {
        save_to_disk(&learner, path)?;
    }
    Ok(())
}
