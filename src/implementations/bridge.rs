//! Construction of elements in external libraries through a bridge command.
//!
//! A bridge is a small program, typically a Python script, that constructs an element in the
//! library it wraps. It reads one JSON request from stdin:
//!
//! ```json
//! {"name": "P", "cell": "triangle", "degree": 2, "params": {"lagrange_variant": "equispaced"},
//!  "kwargs": {}, "points": [[0.0, 0.0], [0.5, 0.5]]}
//! ```
//!
//! and writes one JSON response to stdout:
//!
//! ```json
//! {"entity_dofs": [[[0], [1], [2]], [[3], [4], [5]], [[]]], "value_size": 1,
//!  "table": [[[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]], [[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]]]}
//! ```
//!
//! `points` is omitted when only the entity map is needed, in which case `table` may be
//! omitted from the response. `table` is indexed `[point][component][dof]`.
//!
//! The bridge is killed if it does not finish within the configured timeout.
use super::ConstructionRequest;
use crate::error::{NotImplementedReason, VerificationError};
use crate::example::ParamValue;
use crate::settings::{BridgeCommand, Settings};
use crate::tabulation::{EntityDofMap, Tabulation, VerificationData};
use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeRequest<'a> {
    pub name: &'a str,
    pub cell: &'a str,
    pub degree: usize,
    pub params: &'a BTreeMap<String, String>,
    pub kwargs: &'a BTreeMap<String, ParamValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeResponse {
    pub entity_dofs: Vec<Vec<Vec<usize>>>,
    #[serde(default)]
    pub value_size: Option<usize>,
    #[serde(default)]
    pub table: Option<Vec<Vec<Vec<f64>>>>,
    /// Set by the bridge when the library does not support the construction.
    #[serde(default)]
    pub not_implemented: Option<String>,
}

impl BridgeResponse {
    pub fn entity_dof_map(&self) -> EntityDofMap {
        EntityDofMap::new(self.entity_dofs.clone())
    }

    /// The tabulation contained in the response.
    pub fn tabulation(&self) -> Result<Tabulation, VerificationError> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| VerificationError::malformed("bridge response has no table"))?;
        let tabulation = Tabulation::from_nested(table)?;
        match self.value_size {
            Some(value_size) if value_size != tabulation.value_size() && !table.is_empty() => {
                Err(VerificationError::malformed(format!(
                    "bridge reported value size {value_size}, but the table has {}",
                    tabulation.value_size()
                )))
            }
            _ => Ok(tabulation),
        }
    }
}

/// Converts points stored one per row into nested lists.
pub fn points_to_rows(points: &DMatrix<f64>) -> Vec<Vec<f64>> {
    points
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

/// Looks up the bridge command configured for a library.
pub fn command_for<'a>(
    library: &str,
    settings: &'a Settings,
) -> Result<&'a BridgeCommand, VerificationError> {
    settings.bridge(library).ok_or_else(|| {
        VerificationError::NotImplemented(NotImplementedReason::Unavailable(library.to_string()))
    })
}

/// Runs the bridge once and parses its response.
pub fn run(
    command: &BridgeCommand,
    request: &BridgeRequest<'_>,
    timeout: Duration,
) -> Result<BridgeResponse, VerificationError> {
    let input = serde_json::to_vec(request)
        .map_err(|e| VerificationError::Library(format!("failed to encode request: {e}")))?;
    let spawn_error =
        |e: std::io::Error| VerificationError::Library(format!("bridge {}: {e}", command.program));

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;
    debug!(
        "started bridge {} for {} on {}",
        command.program, request.name, request.cell
    );

    // Pipes are served on separate threads so that neither side blocks on a full buffer
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    if let Some(mut stdin) = child.stdin.take() {
        // A bridge that exits without reading its input is diagnosed by its exit status
        thread::spawn(move || {
            let _ = stdin.write_all(&input);
        });
    }

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait().map_err(spawn_error)? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                debug!("killed bridge {} after {:?}", command.program, timeout);
                return Err(VerificationError::Timeout(timeout));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    let stdout = stdout.map(join_output).unwrap_or_default();
    let stderr = stderr.map(join_output).unwrap_or_default();
    if !status.success() {
        return Err(VerificationError::Library(format!(
            "bridge {} exited with {status}: {}",
            command.program,
            stderr.trim()
        )));
    }

    let response: BridgeResponse = serde_json::from_str(&stdout).map_err(|e| {
        VerificationError::Library(format!("invalid response from {}: {e}", command.program))
    })?;
    if let Some(message) = &response.not_implemented {
        return Err(VerificationError::NotImplemented(NotImplementedReason::Unsupported(
            message.clone(),
        )));
    }
    Ok(response)
}

/// Corrections applied to what a bridge reports, to bring it into reference numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjustment {
    /// Sub-entity renumbering tables, see [`EntityDofMap::reindexed`].
    pub tables: Vec<&'static [usize]>,
    /// Number of leading DOFs that belong to the element; the rest are dropped.
    pub ndofs: Option<usize>,
}

/// Constructs an element through the bridge of `library`.
///
/// The bridge is called once to obtain the entity map, and again each time the element is
/// tabulated. `adjust` receives the entity map as reported by the bridge.
pub fn verification_data(
    library: &str,
    request: &ConstructionRequest<'_>,
    settings: &Settings,
    adjust: impl Fn(&EntityDofMap) -> Adjustment,
) -> Result<VerificationData, VerificationError> {
    let command = command_for(library, settings)?.clone();
    let timeout = settings.timeout();
    let name = request.implementation.name.clone();
    let cell = request.cell.name();
    let degree = request.implementation.degree;
    let params = request.implementation.params.clone();
    let kwargs = request.example.kwargs().clone();

    let response = run(
        &command,
        &BridgeRequest {
            name: &name,
            cell,
            degree,
            params: &params,
            kwargs: &kwargs,
            points: None,
        },
        timeout,
    )?;
    let reported = response.entity_dof_map();
    let adjustment = adjust(&reported);
    let mut entity_dofs = reported.reindexed(&adjustment.tables);
    if let Some(ndofs) = adjustment.ndofs {
        entity_dofs = entity_dofs.truncated(ndofs);
    }

    let tabulator = move |points: &DMatrix<f64>| -> Result<Tabulation, VerificationError> {
        let request = BridgeRequest {
            name: &name,
            cell,
            degree,
            params: &params,
            kwargs: &kwargs,
            points: Some(points_to_rows(points)),
        };
        let tabulation = run(&command, &request, timeout)?.tabulation()?;
        if tabulation.npoints() != points.nrows() {
            return Err(VerificationError::malformed(format!(
                "bridge tabulated {} points, {} were requested",
                tabulation.npoints(),
                points.nrows()
            )));
        }
        Ok(match adjustment.ndofs {
            Some(ndofs) => tabulation.truncated(ndofs),
            None => tabulation,
        })
    };
    Ok(VerificationData::new(entity_dofs, tabulator))
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = reader.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn join_output(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}
