//! Loading shots and profiles from JSON files.

use serde::Deserialize;
use shot_core::{ProfileRecord, ShotRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// An input file could not be used.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A profile file holds either one profile or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileFile {
    Many(Vec<ProfileRecord>),
    One(Box<ProfileRecord>),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_shot(path: &Path) -> eyre::Result<ShotRecord> {
    let shot: ShotRecord = read_json(path).map_err(eyre::Report::new)?;
    tracing::debug!(
        path = %path.display(),
        samples = shot.samples.len(),
        phases = shot.phase_transitions.len(),
        "shot loaded"
    );
    Ok(shot)
}

/// All profiles from `paths`, in file order.
pub fn load_profiles(paths: &[PathBuf]) -> eyre::Result<Vec<ProfileRecord>> {
    let mut out = Vec::new();
    for path in paths {
        match read_json::<ProfileFile>(path).map_err(eyre::Report::new)? {
            ProfileFile::Many(list) => out.extend(list),
            ProfileFile::One(p) => out.push(*p),
        }
    }
    tracing::debug!(count = out.len(), "profiles loaded");
    Ok(out)
}

/// With exactly one profile it applies as is; otherwise match on the shot's label.
pub fn select_profile<'p>(
    shot: &ShotRecord,
    profiles: &'p [ProfileRecord],
) -> Option<&'p ProfileRecord> {
    match profiles {
        [] => None,
        [only] => Some(only),
        many => {
            let found = shot_core::find_profile_for_shot(shot, many);
            if found.is_none() {
                tracing::warn!(
                    candidates = many.len(),
                    "no profile matches the shot; analysing without one"
                );
            }
            found
        }
    }
}
