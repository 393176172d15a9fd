#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_precision_loss: molecule/read counts never approach 2^53
// - missing_*_doc: error and panic docs are provided where they add signal
#![allow(
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # duplexqc - Duplex Sequencing Yield QC Library
//!
//! This library quantifies duplex sequencing yield: the fraction of molecules
//! observed from both strands of the source DNA fragment and therefore
//! independently confirmable. Inputs are alignment records already tagged
//! upstream with a UMI sequence and a strand-of-origin symbol (`CC`, `TT`,
//! or `NN`).
//!
//! ## Pipeline
//!
//! 1. **[`tags`]** - typed duplex tags and per-record tag extraction
//! 2. **[`molecule`]** - molecule keys (run-level and locus-aware),
//!    per-molecule tag counts, and the single-pass tag aggregator
//! 3. **[`summary`]** - run-level duplex classification with cross-checked
//!    summary counters and the two run reports
//! 4. **[`primer`]** - the molecule→primer join and the per-primer report
//!
//! ## Support modules
//!
//! - **[`bam_io`]** - BAM reader construction
//! - **[`errors`]** - structured error types
//! - **[`validation`]** - input file and tag-name validation
//! - **[`logging`]** - formatting helpers and run-summary logging
//! - **[`progress`]** - interval progress logging
//!
//! ## Quick start
//!
//! ```
//! use duplexqc_lib::molecule::MoleculeTagCounts;
//! use duplexqc_lib::summary::DuplexSummaryMetrics;
//!
//! # fn main() -> duplexqc_lib::errors::Result<()> {
//! let molecules = vec![
//!     MoleculeTagCounts::new(4, 4, 0), // duplex-confirmed
//!     MoleculeTagCounts::new(2, 0, 0), // singleton CC
//!     MoleculeTagCounts::new(0, 0, 3), // NN only
//! ];
//! let metrics = DuplexSummaryMetrics::collect(molecules)?;
//! assert_eq!(metrics.duplex_molecules, 1);
//! # Ok(())
//! # }
//! ```

pub mod bam_io;
pub mod errors;
pub mod logging;
pub mod molecule;
pub mod primer;
pub mod progress;
pub mod summary;
pub mod tags;
pub mod validation;

// Re-export the types most callers need
pub use errors::{DuplexQcError, Result};
pub use molecule::{DuplexCategory, LocusKey, MoleculeTagCounts, TagAggregator, UmiKey};
pub use summary::DuplexSummaryMetrics;
pub use tags::{DuplexTag, Strand, TaggedRead};
