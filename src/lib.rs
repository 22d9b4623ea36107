//! Cross-library verification of finite element definitions.
//!
//! For every element in a catalogue of [element descriptors](element::ElementDescriptor),
//! `defelement` constructs the element in several finite element libraries, tabulates the
//! basis functions on a common set of points and checks that every library produces the same
//! space, sub-entity by sub-entity, as the reference library. Results are collected into a
//! [verification matrix](aggregate::VerificationMatrix) together with a history of pass
//! counts per library.
//!
//! The comparison is deliberately insensitive to the choice of basis: two elements agree on
//! a sub-entity when the basis functions associated with it span the same space, see
//! [`verification::verify`].

pub mod aggregate;
pub mod cache;
pub mod element;
pub mod error;
pub mod example;
pub mod implementations;
pub mod points;
pub mod settings;
pub mod sink;
pub mod tabulation;
pub mod util;
pub mod verification;

pub use defelement_reference::ReferenceCell;
pub use error::{NotImplementedReason, VerificationError};
pub use settings::Settings;

pub extern crate nalgebra;

/// Runs the verification for the whole catalogue and persists the results.
///
/// The run is dated today (UTC). Returns the record that was written.
pub fn run_verification(settings: Settings) -> eyre::Result<sink::VerificationRecord> {
    settings.validate()?;
    let store = element::ElementStore::load_dir(&settings.element_path)?;
    if let Err(problems) = store.validate() {
        log::warn!("{problems:#}");
    }
    let sink = sink::JsonSink::from_settings(&settings);
    let mut history = sink.load_history()?;

    let verifier = aggregate::Verifier::new(settings, store);
    verifier.cache().tidy(&verifier.versions())?;
    let run = verifier.run(&util::today())?;
    // The results of the run are kept even if the history refuses them
    if let Err(e) = history.record_run(&run) {
        log::error!("verification history not updated: {e}");
    }

    let record = sink::VerificationRecord::from_run(&run);
    sink.persist(record.clone(), history)?;
    Ok(record)
}
