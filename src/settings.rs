//! Run configuration.
//!
//! Settings can be built in code, starting from [`Settings::new`], or read from a JSON file
//! with [`Settings::from_json_file`]. Missing fields in the file take their default values.
use eyre::{eyre, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// An external command that answers construction requests for a library.
///
/// The command reads a single JSON request from stdin and writes a single JSON response to
/// stdout, see [`bridge`](crate::implementations::bridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Version of the bridged library, used for caching and reported in the metadata.
    #[serde(default)]
    pub version: Option<String>,
}

impl BridgeCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            version: None,
        }
    }

    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Directory holding the element descriptors (`*.json`).
    pub element_path: PathBuf,
    /// Directory for cached tabulations.
    pub cache_path: PathBuf,
    /// Output file for the verification matrix. The history is written next to it.
    pub verification_json: PathBuf,
    /// Number of worker threads used to verify triples in parallel.
    pub processes: usize,
    /// Whether tabulations are cached on disk between runs.
    pub caching: bool,
    /// Time limit for each (element, library, example) triple, in seconds.
    pub timeout: f64,
    /// Relative tolerance used to determine numerical rank.
    pub tolerance: f64,
    /// Lattice size for sample points on cells of dimension one and two.
    pub lattice_size: usize,
    /// Lattice size for sample points on cells of dimension three.
    pub lattice_size_3d: usize,
    /// External commands for bridged libraries, by library id.
    pub bridges: BTreeMap<String, BridgeCommand>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Settings {
    /// Default settings for a DefElement checkout rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            element_path: root.join("elements"),
            cache_path: root.join(".cache"),
            verification_json: root.join("verification.json"),
            processes: 1,
            caching: true,
            timeout: 600.0,
            tolerance: 1e-8,
            lattice_size: 10,
            lattice_size_3d: 6,
            bridges: BTreeMap::new(),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to open settings file {}", path.display()))?;
        let settings: Self = serde_json::from_reader(std::io::BufReader::new(file))
            .wrap_err_with(|| format!("failed to parse settings file {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.verification_json.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(eyre!(
                "verification output {} must be a .json file",
                self.verification_json.display()
            ));
        }
        if self.processes == 0 {
            return Err(eyre!("at least one process is required"));
        }
        if !(self.timeout > 0.0) {
            return Err(eyre!("timeout must be positive, got {}", self.timeout));
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(eyre!("rank tolerance must be in (0, 1), got {}", self.tolerance));
        }
        if self.lattice_size == 0 || self.lattice_size_3d == 0 {
            return Err(eyre!("lattice sizes must be positive"));
        }
        Ok(())
    }

    /// Sets the output file for the verification matrix.
    pub fn with_verification_json(mut self, path: impl Into<PathBuf>) -> eyre::Result<Self> {
        self.verification_json = path.into();
        self.validate()?;
        Ok(self)
    }

    /// The history file, which sits next to the verification output: `x.json` gives
    /// `x-history.json`.
    pub fn verification_history_json(&self) -> PathBuf {
        let stem = self
            .verification_json
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.verification_json
            .with_file_name(format!("{stem}-history.json"))
    }

    pub fn with_element_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.element_path = path.into();
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_processes(mut self, processes: usize) -> Self {
        self.processes = processes.max(1);
        self
    }

    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.as_secs_f64();
        self
    }

    pub fn with_bridge(mut self, library: impl Into<String>, command: BridgeCommand) -> Self {
        self.bridges.insert(library.into(), command);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    /// Lattice size used for sample points on a cell of the given dimension.
    pub fn lattice_size(&self, tdim: usize) -> usize {
        if tdim >= 3 {
            self.lattice_size_3d
        } else {
            self.lattice_size
        }
    }

    pub fn bridge(&self, library: &str) -> Option<&BridgeCommand> {
        self.bridges.get(library)
    }
}
