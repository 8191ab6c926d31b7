// File: src/persistence.rs
use crate::error::Result;
use crate::learning::ProjectionLearner;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

const SNAPSHOT_VERSION: u32 = 1;

/// The serializable state of a learner run.
#[derive(serde::Serialize, serde::Deserialize)]
struct SerializableState {
    version: u32,
    learner: ProjectionLearner,
}

#[derive(serde::Serialize)]
struct SerializableStateRef<'a> {
    version: u32,
    learner: &'a ProjectionLearner,
}

/// Writes the learner next to `path` and atomically moves it into place.
pub fn save_to_disk(learner: &ProjectionLearner, path: &Path) -> Result<()> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let state = SerializableStateRef { version: SNAPSHOT_VERSION, learner };
    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, &state)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    info!(path = %path.display(), pairs = learner.len(), "saved projection models");
    Ok(())
}

pub fn load_from_disk(path: &Path) -> Result<ProjectionLearner> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let state: SerializableState = bincode::deserialize_from(reader)?;
    if state.version != SNAPSHOT_VERSION {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unsupported snapshot version {}", state.version),
        )
        .into());
    }
    Ok(state.learner)
}
