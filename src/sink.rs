//! Persisting verification results as JSON.
use crate::aggregate::{VerificationHistory, VerificationMatrix, VerificationRun};
use crate::settings::Settings;
use eyre::WrapErr;
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// ISO date of the run.
    pub date: String,
    /// Library versions used in the run, keyed by library id.
    pub versions: BTreeMap<String, String>,
}

/// The contents of the verification output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub metadata: Metadata,
    pub verification: VerificationMatrix,
}

impl VerificationRecord {
    pub fn from_run(run: &VerificationRun) -> Self {
        Self {
            metadata: Metadata {
                date: run.date.clone(),
                versions: run.versions.clone(),
            },
            verification: run.matrix.clone(),
        }
    }
}

/// Reads and writes the verification output and the history file next to it.
#[derive(Debug, Clone)]
pub struct JsonSink {
    verification_json: PathBuf,
    history_json: PathBuf,
}

impl JsonSink {
    pub fn new(verification_json: impl Into<PathBuf>, history_json: impl Into<PathBuf>) -> Self {
        Self {
            verification_json: verification_json.into(),
            history_json: history_json.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.verification_json.clone(),
            settings.verification_history_json(),
        )
    }

    pub fn verification_json(&self) -> &Path {
        &self.verification_json
    }

    pub fn history_json(&self) -> &Path {
        &self.history_json
    }

    /// The last persisted record; an empty record if nothing was persisted yet.
    pub fn load_record(&self) -> eyre::Result<VerificationRecord> {
        read_or_default(&self.verification_json)
    }

    pub fn load_matrix(&self) -> eyre::Result<VerificationMatrix> {
        Ok(self.load_record()?.verification)
    }

    pub fn load_history(&self) -> eyre::Result<VerificationHistory> {
        read_or_default(&self.history_json)
    }

    /// Writes both files. Each file is replaced atomically.
    pub fn persist(
        &self,
        record: VerificationRecord,
        history: VerificationHistory,
    ) -> eyre::Result<()> {
        write_json(&self.verification_json, &record)?;
        write_json(&self.history_json, &history)?;
        info!(
            "wrote verification results to {} and {}",
            self.verification_json.display(),
            self.history_json.display()
        );
        Ok(())
    }
}

fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> eyre::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let json = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> eyre::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)
        .wrap_err_with(|| format!("failed to create {}", directory.display()))?;
    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    writeln!(file)?;
    file.persist(path)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
