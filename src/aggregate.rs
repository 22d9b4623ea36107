//! Running the verification over the whole catalogue and collecting the results.
//!
//! A run visits every (element, example, library) triple, where the libraries are those that
//! are verified against the reference and have an implementation entry for the element.
//! Triples are independent: they are fanned out over a thread pool and the results are
//! assembled into a [`VerificationMatrix`] by the caller thread once all of them completed.
use crate::cache::{CacheKey, CachedTabulation, TabulationCache};
use crate::element::{ElementDescriptor, ElementStore};
use crate::error::{NotImplementedReason, VerificationError};
use crate::example::Example;
use crate::implementations::{self, Implementation};
use crate::points::sample_points;
use crate::settings::Settings;
use crate::util::is_iso_date;
use crate::verification::{verify, Verdict};
use defelement_reference::ReferenceCell;
use eyre::eyre;
use itertools::Itertools;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// The examples of one element in one library, grouped by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleResults {
    #[serde(default)]
    pub pass: Vec<String>,
    #[serde(default)]
    pub fail: Vec<String>,
    #[serde(default, rename = "not implemented")]
    pub not_implemented: Vec<String>,
}

/// The terminal state of a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pass,
    Fail,
    NotImplemented,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::NotImplemented => write!(f, "not implemented"),
        }
    }
}

/// Counts of examples per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub pass: usize,
    pub fail: usize,
    #[serde(rename = "not implemented")]
    pub not_implemented: usize,
    /// The number of examples that were actually compared, `pass + fail`.
    pub total: usize,
}

/// Per element and library, the examples grouped by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationMatrix(BTreeMap<String, BTreeMap<String, ExampleResults>>);

impl VerificationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the status of an example. Examples are kept in the order they are recorded.
    pub fn record(&mut self, element: &str, library: &str, example: &str, status: Status) {
        let results = self
            .0
            .entry(element.to_string())
            .or_default()
            .entry(library.to_string())
            .or_default();
        let list = match status {
            Status::Pass => &mut results.pass,
            Status::Fail => &mut results.fail,
            Status::NotImplemented => &mut results.not_implemented,
        };
        list.push(example.to_string());
    }

    pub fn get(&self, element: &str, library: &str) -> Option<&ExampleResults> {
        self.0.get(element).and_then(|libraries| libraries.get(library))
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The status of an element in a library summarised over its examples, as used for
    /// badges: `None` if nothing is recorded, otherwise the worst status of any compared
    /// example, or not-implemented if no example was compared.
    pub fn element_status(&self, element: &str, library: &str) -> Option<Status> {
        let results = self.get(element, library)?;
        if !results.fail.is_empty() {
            Some(Status::Fail)
        } else if !results.pass.is_empty() {
            Some(Status::Pass)
        } else {
            Some(Status::NotImplemented)
        }
    }

    /// Example counts of a library across all elements.
    pub fn summary(&self, library: &str) -> Summary {
        let mut summary = Summary::default();
        for results in self.0.values().filter_map(|libraries| libraries.get(library)) {
            summary.pass += results.pass.len();
            summary.fail += results.fail.len();
            summary.not_implemented += results.not_implemented.len();
        }
        summary.total = summary.pass + summary.fail;
        summary
    }
}

/// Why a comparison failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The elements were constructed, but span different spaces.
    Mismatch(Verdict),
    Timeout(Duration),
    /// The library raised an error while constructing or tabulating.
    Library(String),
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch(verdict) => {
                let mismatches = verdict.mismatches();
                match mismatches.first() {
                    Some(first) if mismatches.len() > 1 => {
                        write!(f, "{first} (and {} more)", mismatches.len() - 1)
                    }
                    Some(first) => write!(f, "{first}"),
                    None => write!(f, "elements differ"),
                }
            }
            Self::Timeout(timeout) => write!(f, "timed out after {:.1} s", timeout.as_secs_f64()),
            Self::Library(message) => write!(f, "{message}"),
        }
    }
}

/// The outcome of one triple.
#[derive(Debug, Clone, PartialEq)]
pub enum TripleOutcome {
    Pass,
    Fail(Failure),
    NotImplemented(NotImplementedReason),
    /// An adapter produced structurally invalid data. Defects are reported separately and
    /// contribute neither a pass nor a fail.
    Defect(String),
}

impl TripleOutcome {
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Pass => Some(Status::Pass),
            Self::Fail(_) => Some(Status::Fail),
            Self::NotImplemented(_) => Some(Status::NotImplemented),
            Self::Defect(_) => None,
        }
    }

    fn from_library_error(error: VerificationError) -> Self {
        match error {
            VerificationError::NotImplemented(reason) => Self::NotImplemented(reason),
            VerificationError::Timeout(timeout) => Self::Fail(Failure::Timeout(timeout)),
            VerificationError::Library(message) => Self::Fail(Failure::Library(message)),
            VerificationError::MalformedInput(message) => Self::Defect(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripleResult {
    pub element: String,
    pub example: String,
    pub library: String,
    pub outcome: TripleOutcome,
}

/// Everything produced by one verification run.
#[derive(Debug, Clone)]
pub struct VerificationRun {
    /// ISO date of the run.
    pub date: String,
    /// Versions of the libraries that were available, keyed by library id.
    pub versions: BTreeMap<String, String>,
    /// The verified libraries, in registry order.
    pub libraries: Vec<String>,
    pub matrix: VerificationMatrix,
    /// Individual results, in catalogue order.
    pub results: Vec<TripleResult>,
}

impl VerificationRun {
    pub fn defects(&self) -> impl Iterator<Item = &TripleResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, TripleOutcome::Defect(_)))
    }
}

/// Runs the verification of a catalogue.
pub struct Verifier {
    settings: Arc<Settings>,
    store: ElementStore,
    cache: Arc<TabulationCache>,
    reference: &'static dyn Implementation,
    libraries: Vec<&'static dyn Implementation>,
}

impl Verifier {
    pub fn new(settings: Settings, store: ElementStore) -> Self {
        let cache = TabulationCache::new(&settings);
        Self {
            settings: Arc::new(settings),
            store,
            cache: Arc::new(cache),
            reference: implementations::reference(),
            libraries: implementations::verified().collect(),
        }
    }

    /// Replaces the reference library and the libraries verified against it.
    pub fn with_libraries(
        mut self,
        reference: &'static dyn Implementation,
        libraries: impl IntoIterator<Item = &'static dyn Implementation>,
    ) -> Self {
        self.reference = reference;
        self.libraries = libraries.into_iter().collect();
        self
    }

    pub fn with_cache(mut self, cache: TabulationCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &TabulationCache {
        &self.cache
    }

    /// The versions of all libraries that are available.
    pub fn versions(&self) -> BTreeMap<String, String> {
        std::iter::once(self.reference)
            .chain(self.libraries.iter().copied())
            .filter_map(|library| {
                library
                    .version(&self.settings)
                    .map(|version| (library.id().to_string(), version))
            })
            .collect()
    }

    /// Verifies every example of every element in every applicable library.
    pub fn run(&self, date: &str) -> eyre::Result<VerificationRun> {
        if !is_iso_date(date) {
            return Err(eyre!("invalid run date \"{date}\", expected YYYY-MM-DD"));
        }
        let versions = Arc::new(self.versions());
        info!(
            "verifying {} elements against {} in {}",
            self.store.len(),
            self.reference.id(),
            self.libraries.iter().map(|l| l.id()).join(", ")
        );

        let mut jobs = Vec::new();
        let mut results = Vec::new();
        for element in self.store.iter() {
            let examples = match element.parsed_examples() {
                Ok(examples) => examples,
                Err(e) => {
                    error!("skipping element {}: {e:#}", element.id);
                    for library in self.libraries_for(element) {
                        results.push(TripleResult {
                            element: element.id.clone(),
                            example: String::new(),
                            library: library.id().to_string(),
                            outcome: TripleOutcome::Defect(format!("{e:#}")),
                        });
                    }
                    continue;
                }
            };
            for example in examples {
                for library in self.libraries_for(element) {
                    jobs.push(Job {
                        settings: Arc::clone(&self.settings),
                        cache: Arc::clone(&self.cache),
                        versions: Arc::clone(&versions),
                        element: Arc::clone(element),
                        example: example.clone(),
                        library,
                        reference: self.reference,
                    });
                }
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.processes.max(1))
            .build()?;
        let timeout = self.settings.timeout();
        let completed: Vec<TripleResult> =
            pool.install(|| jobs.into_par_iter().map(|job| job.run(timeout)).collect());
        results.extend(completed);

        let mut matrix = VerificationMatrix::new();
        for result in &results {
            match &result.outcome {
                TripleOutcome::Defect(message) => error!(
                    "adapter defect for {} in {} ({}): {message}",
                    result.element, result.library, result.example
                ),
                outcome => {
                    if let Some(status) = outcome.status() {
                        matrix.record(&result.element, &result.library, &result.example, status);
                    }
                }
            }
        }

        let libraries: Vec<String> = self.libraries.iter().map(|l| l.id().to_string()).collect();
        for library in &libraries {
            let summary = matrix.summary(library);
            info!(
                "{library}: {} passed, {} failed, {} not implemented",
                summary.pass, summary.fail, summary.not_implemented
            );
        }

        let versions = Arc::try_unwrap(versions).unwrap_or_else(|shared| (*shared).clone());
        Ok(VerificationRun {
            date: date.to_string(),
            versions,
            libraries,
            matrix,
            results,
        })
    }

    /// Verifies a single example of an element in one library, without a timeout.
    pub fn verify_example(
        &self,
        element: &Arc<ElementDescriptor>,
        example: &Example,
        library: &'static dyn Implementation,
    ) -> TripleOutcome {
        let job = Job {
            settings: Arc::clone(&self.settings),
            cache: Arc::clone(&self.cache),
            versions: Arc::new(self.versions()),
            element: Arc::clone(element),
            example: example.clone(),
            library,
            reference: self.reference,
        };
        job.outcome(&AtomicBool::new(false))
    }

    fn libraries_for<'a>(
        &'a self,
        element: &'a ElementDescriptor,
    ) -> impl Iterator<Item = &'static dyn Implementation> + 'a {
        self.libraries
            .iter()
            .copied()
            .filter(move |library| library.implemented(element))
    }
}

/// One triple, with everything it needs to run on its own thread.
struct Job {
    settings: Arc<Settings>,
    cache: Arc<TabulationCache>,
    versions: Arc<BTreeMap<String, String>>,
    element: Arc<ElementDescriptor>,
    example: Example,
    library: &'static dyn Implementation,
    reference: &'static dyn Implementation,
}

impl Job {
    fn run(self, timeout: Duration) -> TripleResult {
        let element = self.element.id.clone();
        let example = self.example.raw().to_string();
        let library = self.library.id().to_string();
        debug!("verifying {element} ({example}) in {library}");

        let cancelled = Arc::new(AtomicBool::new(false));
        let outcome = {
            let cancelled = Arc::clone(&cancelled);
            run_with_timeout(timeout, move || self.outcome(&cancelled))
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                cancelled.store(true, Ordering::SeqCst);
                TripleOutcome::from_library_error(error)
            }
        };
        debug!("{element} ({example}) in {library}: {outcome:?}");
        TripleResult {
            element,
            example,
            library,
            outcome,
        }
    }

    fn outcome(&self, cancelled: &AtomicBool) -> TripleOutcome {
        let cell = match ReferenceCell::from_name(self.example.cell()) {
            Ok(cell) => cell,
            Err(_) => {
                let reason = NotImplementedReason::Cell(self.example.cell().to_string());
                return TripleOutcome::NotImplemented(reason);
            }
        };
        let points = sample_points(cell, &self.settings);

        // The library goes first, so that examples it cannot construct never touch the
        // reference
        let tested = match self.tabulate(self.library, &points, cancelled) {
            Ok(tested) => tested,
            Err(e) => return TripleOutcome::from_library_error(e),
        };
        let reference = match self.tabulate(self.reference, &points, cancelled) {
            Ok(reference) => reference,
            Err(VerificationError::MalformedInput(message)) => {
                return TripleOutcome::Defect(message)
            }
            Err(e) => {
                warn!(
                    "reference cannot construct {} ({}): {e}",
                    self.element.id,
                    self.example.raw()
                );
                return TripleOutcome::NotImplemented(NotImplementedReason::Reference(
                    e.to_string(),
                ));
            }
        };

        let verdict = verify(
            cell,
            (&tested.entity_dofs, &tested.tabulation),
            (&reference.entity_dofs, &reference.tabulation),
            self.settings.tolerance,
        );
        match verdict {
            Ok(verdict) if verdict.passed() => TripleOutcome::Pass,
            Ok(verdict) => TripleOutcome::Fail(Failure::Mismatch(verdict)),
            Err(e) => TripleOutcome::from_library_error(e),
        }
    }

    fn tabulate(
        &self,
        library: &dyn Implementation,
        points: &nalgebra::DMatrix<f64>,
        cancelled: &AtomicBool,
    ) -> Result<Arc<CachedTabulation>, VerificationError> {
        let resolved = implementations::resolve(library, &self.element, &self.example)?;
        let recipe = resolved.to_string();
        let version = self.versions.get(library.id());
        let key = version.map(|version| CacheKey {
            library: library.id(),
            library_version: version,
            element: &self.element.id,
            example: self.example.raw(),
            recipe: &recipe,
            points,
        });
        if let Some(hit) = key.as_ref().and_then(|key| self.cache.load(key)) {
            return Ok(hit);
        }

        let data = implementations::construct_resolved(
            library,
            &self.element,
            &self.example,
            &resolved,
            &self.settings,
        )?;
        let content = CachedTabulation {
            tabulation: data.tabulate(points)?,
            entity_dofs: data.entity_dofs,
        };
        match key {
            // Results of a triple that was given up on are never stored
            Some(key) if !cancelled.load(Ordering::SeqCst) => Ok(self.cache.save(&key, content)),
            _ => Ok(Arc::new(content)),
        }
    }
}

/// Runs `job` on its own thread and waits at most `timeout` for it to finish.
///
/// A job that times out keeps running in the background; its result is dropped.
fn run_with_timeout<T, F>(timeout: Duration, job: F) -> Result<T, VerificationError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("defelement-triple".to_string())
        .spawn(move || {
            // The receiver is gone if the job timed out
            let _ = sender.send(job());
        })
        .map_err(|e| VerificationError::Library(format!("failed to spawn worker: {e}")))?;
    match receiver.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(VerificationError::Timeout(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(VerificationError::Library("construction panicked".to_string()))
        }
    }
}

/// One snapshot of the verification results of a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub pass: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    InvalidDate(String),
    /// More passes than comparisons.
    InvalidCounts { pass: usize, total: usize },
    /// The snapshot is older than the last snapshot of the library.
    OutOfOrder {
        library: String,
        last: String,
        date: String,
    },
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate(date) => write!(f, "invalid history date \"{date}\""),
            Self::InvalidCounts { pass, total } => {
                write!(f, "pass count {pass} exceeds total count {total}")
            }
            Self::OutOfOrder {
                library,
                last,
                date,
            } => write!(
                f,
                "snapshot for {library} dated {date} precedes the last snapshot ({last})"
            ),
        }
    }
}

impl std::error::Error for HistoryError {}

/// Pass counts of each library over time, ordered by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationHistory(BTreeMap<String, Vec<HistoryEntry>>);

impl VerificationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, library: &str) -> &[HistoryEntry] {
        self.0.get(library).map_or(&[], Vec::as_slice)
    }

    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Appends a snapshot. A snapshot with the same date as the last one replaces it, so
    /// that repeating a run on the same day does not add entries.
    pub fn append(&mut self, library: &str, entry: HistoryEntry) -> Result<(), HistoryError> {
        if !is_iso_date(&entry.date) {
            return Err(HistoryError::InvalidDate(entry.date));
        }
        if entry.pass > entry.total {
            return Err(HistoryError::InvalidCounts {
                pass: entry.pass,
                total: entry.total,
            });
        }
        let entries = self.0.entry(library.to_string()).or_default();
        match entries.last_mut() {
            // ISO dates order lexicographically
            Some(last) if last.date == entry.date => *last = entry,
            Some(last) if last.date > entry.date => {
                return Err(HistoryError::OutOfOrder {
                    library: library.to_string(),
                    last: last.date.clone(),
                    date: entry.date,
                })
            }
            _ => entries.push(entry),
        }
        Ok(())
    }

    /// Appends one snapshot per verified library of a run.
    ///
    /// Either every snapshot is appended or, if any of them is rejected, none is.
    pub fn record_run(&mut self, run: &VerificationRun) -> Result<(), HistoryError> {
        let mut updated = self.clone();
        for library in &run.libraries {
            let summary = run.matrix.summary(library);
            let entry = HistoryEntry {
                date: run.date.clone(),
                pass: summary.pass,
                total: summary.total,
            };
            updated.append(library, entry)?;
        }
        *self = updated;
        Ok(())
    }
}
