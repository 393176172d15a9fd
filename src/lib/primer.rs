//! Per-primer duplex metrics: the molecule→primer join.
//!
//! The assignment feed supplies one pipe-delimited row per molecule, carrying
//! the locus-aware molecule key together with the primer the molecule was
//! assigned to. Joining each row against the locus-aware tag counts yields
//! per-primer duplex evidence.

use crate::errors::{DuplexQcError, Result};
use crate::molecule::{LocusKey, MoleculeTagCounts};
use crate::tags::Strand;
use serde::Serialize;
use std::collections::HashMap;

/// Field count of one assignment feed row.
pub const ASSIGNMENT_FIELD_COUNT: usize = 11;

/// One row of the molecule→primer assignment feed.
///
/// Fields, in feed order: chromosome, strand (`0` = forward, else reverse),
/// UMI start position, UMI sequence, read count, alignment count, read index,
/// resample flag, fragment length, primer identity, primer 5′ coordinate.
/// The read index and resample flag are upstream-defined opaque values and
/// are carried verbatim.
#[derive(Debug, Clone)]
pub struct PrimerAssignment {
    /// Chromosome of the molecule
    pub chrom: String,
    /// Strand of the molecule and its primer
    pub strand: Strand,
    /// 1-based UMI start position
    pub umi_start: i64,
    /// UMI sequence
    pub umi: String,
    /// Reads attributed to the molecule by the upstream marker
    pub read_count: u64,
    /// Alignments attributed to the molecule
    pub alignment_count: u64,
    /// Molecule/read index, carried verbatim
    pub read_index: String,
    /// Resample flag, carried verbatim
    pub is_resample: String,
    /// Fragment length
    pub fragment_length: i64,
    /// Primer identity (its sequence)
    pub primer: String,
    /// Primer 5′ coordinate
    pub primer_start: i64,
}

impl PrimerAssignment {
    /// Parses one feed row.
    ///
    /// # Errors
    ///
    /// Returns [`DuplexQcError::MalformedAssignment`] naming `line_number`
    /// when the row does not have exactly [`ASSIGNMENT_FIELD_COUNT`] fields
    /// or a numeric field does not parse.
    pub fn parse(line: &str, line_number: u64) -> Result<Self> {
        let fields: Vec<&str> = line.trim().split('|').collect();
        if fields.len() != ASSIGNMENT_FIELD_COUNT {
            return Err(DuplexQcError::MalformedAssignment {
                line: line_number,
                reason: format!(
                    "expected {ASSIGNMENT_FIELD_COUNT} fields, found {}",
                    fields.len()
                ),
            });
        }

        let int_field = |name: &str, value: &str| -> Result<i64> {
            value.parse().map_err(|_| DuplexQcError::MalformedAssignment {
                line: line_number,
                reason: format!("field '{name}' is not an integer: '{value}'"),
            })
        };
        let count_field = |name: &str, value: &str| -> Result<u64> {
            value.parse().map_err(|_| DuplexQcError::MalformedAssignment {
                line: line_number,
                reason: format!("field '{name}' is not a non-negative integer: '{value}'"),
            })
        };

        Ok(Self {
            chrom: fields[0].to_string(),
            strand: Strand::from_feed_field(fields[1]),
            umi_start: int_field("UMI start", fields[2])?,
            umi: fields[3].to_string(),
            read_count: count_field("read count", fields[4])?,
            alignment_count: count_field("alignment count", fields[5])?,
            read_index: fields[6].to_string(),
            is_resample: fields[7].to_string(),
            fragment_length: int_field("fragment length", fields[8])?,
            primer: fields[9].to_string(),
            primer_start: int_field("primer 5' coordinate", fields[10])?,
        })
    }

    /// The locus-aware molecule key of this row.
    #[must_use]
    pub fn locus_key(&self) -> LocusKey {
        LocusKey {
            chrom: self.chrom.clone(),
            strand: self.strand,
            start: self.umi_start,
            umi: self.umi.clone(),
        }
    }

    /// The primer's 3′ coordinate, derived from its 5′ coordinate, strand,
    /// and sequence length.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn primer_end(&self) -> i64 {
        let len = self.primer.len() as i64;
        match self.strand {
            Strand::Forward => self.primer_start + len - 1,
            Strand::Reverse => self.primer_start - len + 1,
        }
    }
}

/// One output row of the per-primer report.
///
/// Serialized pipe-delimited; the field renames are the report header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimerDuplexMetric {
    /// Run identifier
    #[serde(rename = "read set")]
    pub read_set: String,
    /// Primer identity
    #[serde(rename = "primer")]
    pub primer: String,
    /// Primer strand (`0` forward, `1` reverse)
    #[serde(rename = "strand")]
    pub strand: String,
    /// Chromosome
    #[serde(rename = "chrom")]
    pub chrom: String,
    /// Primer 5′ coordinate
    #[serde(rename = "loc5")]
    pub loc5: i64,
    /// Primer 3′ coordinate
    #[serde(rename = "loc3")]
    pub loc3: i64,
    /// Molecules assigned to the primer
    #[serde(rename = "Total unique UMIs")]
    pub total_molecules: u64,
    /// Reads assigned to the primer (from the feed's read-count field)
    #[serde(rename = "Total reads")]
    pub total_reads: u64,
    /// Dominant-CC molecules
    #[serde(rename = "Total CC-UMIs")]
    pub cc_molecules: u64,
    /// Raw CC read total
    #[serde(rename = "Total reads for CC-UMIs")]
    pub cc_reads: u64,
    /// Dominant-TT molecules
    #[serde(rename = "Total TT-UMIs")]
    pub tt_molecules: u64,
    /// Raw TT read total
    #[serde(rename = "Total reads for TT-UMIs")]
    pub tt_reads: u64,
    /// Dominant-NN molecules
    #[serde(rename = "Total NN-UMIs")]
    pub nn_molecules: u64,
    /// Raw NN read total
    #[serde(rename = "Total reads for NN-UMIs")]
    pub nn_reads: u64,
    /// Molecules with NN evidence only
    #[serde(rename = "Only NN-UMIs")]
    pub nn_only_molecules: u64,
    /// Duplex molecule count per the adjustment formula; may be negative
    #[serde(rename = "Duplex-UMIs")]
    pub duplex_molecules: i64,
}

/// Running per-primer accumulation; the span is fixed by the first observed
/// row for the primer.
#[derive(Debug)]
struct PrimerAccumulator {
    strand: Strand,
    chrom: String,
    loc5: i64,
    loc3: i64,
    molecules: u64,
    reads: u64,
    cc_molecules: u64,
    tt_molecules: u64,
    nn_molecules: u64,
    nn_only_molecules: u64,
    cc_reads: u64,
    tt_reads: u64,
    nn_reads: u64,
}

impl PrimerAccumulator {
    fn from_first_row(assignment: &PrimerAssignment) -> Self {
        Self {
            strand: assignment.strand,
            chrom: assignment.chrom.clone(),
            loc5: assignment.primer_start,
            loc3: assignment.primer_end(),
            molecules: 0,
            reads: 0,
            cc_molecules: 0,
            tt_molecules: 0,
            nn_molecules: 0,
            nn_only_molecules: 0,
            cc_reads: 0,
            tt_reads: 0,
            nn_reads: 0,
        }
    }
}

/// Joins assignment rows against locus-aware tag counts and accumulates
/// per-primer duplex metrics.
#[derive(Debug)]
pub struct PrimerDuplexAggregator {
    read_set: String,
    primers: HashMap<String, PrimerAccumulator>,
}

impl PrimerDuplexAggregator {
    /// Creates an empty aggregator for the given run identifier.
    #[must_use]
    pub fn new(read_set: impl Into<String>) -> Self {
        Self { read_set: read_set.into(), primers: HashMap::new() }
    }

    /// Folds one assignment row and its molecule's tag counts into the
    /// primer's accumulator. `counts` is all-zero for molecules never seen in
    /// the alignment feed.
    pub fn observe(&mut self, assignment: &PrimerAssignment, counts: MoleculeTagCounts) {
        let entry = self
            .primers
            .entry(assignment.primer.clone())
            .or_insert_with(|| PrimerAccumulator::from_first_row(assignment));

        entry.molecules += 1;
        entry.reads += assignment.read_count;

        // Dominant classification is an ordered tie-break: first match wins
        if counts.cc > 0 {
            entry.cc_molecules += 1;
        } else if counts.tt > 0 {
            entry.tt_molecules += 1;
        } else if counts.nn > 0 {
            entry.nn_molecules += 1;
        }

        if counts.is_nn_only() {
            entry.nn_only_molecules += 1;
        }

        entry.cc_reads += counts.cc;
        entry.tt_reads += counts.tt;
        entry.nn_reads += counts.nn;
    }

    /// Number of distinct primers seen so far.
    #[must_use]
    pub fn primer_count(&self) -> usize {
        self.primers.len()
    }

    /// Finishes the pass, producing one metric row per primer sorted by
    /// primer identity.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn finish(self) -> Vec<PrimerDuplexMetric> {
        let read_set = self.read_set;
        let mut metrics: Vec<PrimerDuplexMetric> = self
            .primers
            .into_iter()
            .map(|(primer, acc)| {
                // The duplex count is an adjustment, not an intersection: the
                // residual molecules outside both dominant buckets and the
                // NN-only bucket are subtracted, so the result can go negative.
                let duplex = (acc.cc_molecules + acc.tt_molecules) as i64
                    - (acc.molecules - acc.nn_only_molecules) as i64;
                PrimerDuplexMetric {
                    read_set: read_set.clone(),
                    primer,
                    strand: acc.strand.to_string(),
                    chrom: acc.chrom,
                    loc5: acc.loc5,
                    loc3: acc.loc3,
                    total_molecules: acc.molecules,
                    total_reads: acc.reads,
                    cc_molecules: acc.cc_molecules,
                    cc_reads: acc.cc_reads,
                    tt_molecules: acc.tt_molecules,
                    tt_reads: acc.tt_reads,
                    nn_molecules: acc.nn_molecules,
                    nn_reads: acc.nn_reads,
                    nn_only_molecules: acc.nn_only_molecules,
                    duplex_molecules: duplex,
                }
            })
            .collect();
        metrics.sort_by(|a, b| a.primer.cmp(&b.primer));
        metrics
    }
}
