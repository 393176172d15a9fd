//! Molecule keys, per-molecule tag counts, and the tag aggregator.
//!
//! Reads are grouped into molecules under one of two key granularities:
//!
//! - [`UmiKey`] - the UMI sequence alone, used for run-wide yield estimation.
//!   UMIs recurring at different loci collapse into one molecule; accepted
//!   approximation at this granularity.
//! - [`LocusKey`] - (chromosome, strand, UMI start, UMI sequence), used for
//!   per-primer reporting where cross-locus collisions must stay distinct.
//!
//! The two granularities are deliberately distinct types so a mapping built
//! at one granularity cannot be consumed at the other.

use crate::errors::{DuplexQcError, Result};
use crate::tags::{DuplexTag, Strand, TaggedRead};
use std::collections::HashMap;
use std::hash::Hash;

/// Reads contributed by one independently-sequenced paired-end fragment.
pub const READS_PER_FRAGMENT: u64 = 2;

/// Raw per-strand read count equivalent to two read fragments; a strand at or
/// above this level is considered independently confirmed.
pub const TWO_FRAGMENT_READS: u64 = 2 * READS_PER_FRAGMENT;

/// Raw per-strand read count equivalent to three read fragments.
pub const THREE_FRAGMENT_READS: u64 = 3 * READS_PER_FRAGMENT;

/// Raw read counts for one molecule, one field per duplex tag symbol.
///
/// A fixed three-field record rather than a map keyed by tag symbol: every
/// read lands in exactly one field and absent evidence is an explicit zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoleculeTagCounts {
    /// Reads tagged `CC`
    pub cc: u64,
    /// Reads tagged `TT`
    pub tt: u64,
    /// Reads tagged `NN`
    pub nn: u64,
}

impl MoleculeTagCounts {
    /// Creates counts from explicit values.
    #[must_use]
    pub fn new(cc: u64, tt: u64, nn: u64) -> Self {
        Self { cc, tt, nn }
    }

    /// Adds one read of the given tag.
    pub fn record(&mut self, tag: DuplexTag) {
        match tag {
            DuplexTag::Cc => self.cc += 1,
            DuplexTag::Tt => self.tt += 1,
            DuplexTag::Nn => self.nn += 1,
        }
    }

    /// Total strand-resolved reads (`CC` + `TT`); `NN` reads are excluded.
    #[must_use]
    pub fn strand_reads(&self) -> u64 {
        self.cc + self.tt
    }

    /// True when the molecule has `NN` evidence only.
    #[must_use]
    pub fn is_nn_only(&self) -> bool {
        self.cc == 0 && self.tt == 0 && self.nn > 0
    }

    /// Classifies the molecule into its duplex-support category.
    ///
    /// Returns `None` for counts that cannot arise from whole paired-end
    /// fragments (a strand-read total with an odd count of 3 on the larger
    /// strand): such molecules have no category and are later rejected by the
    /// classifier's accounting checks.
    #[must_use]
    pub fn category(&self) -> Option<DuplexCategory> {
        let Self { cc, tt, nn } = *self;
        if cc == 0 && tt == 0 {
            return (nn > 0).then_some(DuplexCategory::NnOnly);
        }
        if cc <= READS_PER_FRAGMENT && tt <= READS_PER_FRAGMENT {
            // At most one fragment on each strand
            return Some(if tt == 0 {
                DuplexCategory::SingletonCc
            } else if cc == 0 {
                DuplexCategory::SingletonTt
            } else {
                DuplexCategory::SingletonMixed
            });
        }
        if cc >= TWO_FRAGMENT_READS && tt >= TWO_FRAGMENT_READS {
            Some(DuplexCategory::DuplexConfirmed)
        } else if cc >= TWO_FRAGMENT_READS {
            Some(DuplexCategory::CcDominantWeakTt)
        } else if tt >= TWO_FRAGMENT_READS {
            Some(DuplexCategory::TtDominantWeakCc)
        } else {
            None
        }
    }
}

/// Duplex-support category of a molecule. Derived from [`MoleculeTagCounts`]
/// on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplexCategory {
    /// Only `NN` reads observed
    NnOnly,
    /// A single fragment, all `CC`
    SingletonCc,
    /// A single fragment, all `TT`
    SingletonTt,
    /// One `CC` fragment and one `TT` fragment
    SingletonMixed,
    /// Two or more `CC` fragments with at most one `TT` fragment
    CcDominantWeakTt,
    /// Two or more `TT` fragments with at most one `CC` fragment
    TtDominantWeakCc,
    /// Two or more fragments on both strands
    DuplexConfirmed,
}

/// A grouping key derivable from a tagged read.
pub trait MoleculeKey: Eq + Hash + Sized {
    /// Derives the key for a read.
    ///
    /// # Errors
    ///
    /// Returns an error when the read lacks the context this granularity
    /// requires (e.g. alignment coordinates for locus-aware keys).
    fn from_read(read: &TaggedRead) -> Result<Self>;
}

/// Run-level molecule key: the UMI sequence alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UmiKey(pub String);

impl MoleculeKey for UmiKey {
    fn from_read(read: &TaggedRead) -> Result<Self> {
        Ok(Self(read.umi.clone()))
    }
}

/// Locus-aware molecule key: chromosome, strand, UMI start position, and UMI
/// sequence. Distinguishes molecules that share a UMI at different loci.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocusKey {
    /// Reference sequence name
    pub chrom: String,
    /// Strand of the molecule
    pub strand: Strand,
    /// 1-based UMI start position
    pub start: i64,
    /// UMI sequence
    pub umi: String,
}

impl MoleculeKey for LocusKey {
    fn from_read(read: &TaggedRead) -> Result<Self> {
        let chrom = read
            .chrom
            .clone()
            .ok_or_else(|| DuplexQcError::UnalignedRecord { name: read.name.clone() })?;
        let start =
            read.start.ok_or_else(|| DuplexQcError::UnalignedRecord { name: read.name.clone() })?;
        Ok(Self { chrom, strand: read.strand, start, umi: read.umi.clone() })
    }
}

/// Accumulates per-molecule tag counts over a single pass of tagged reads.
///
/// Generic over the key granularity. The aggregator is exclusively owned by
/// the running pass; consumers take the finished mapping by value.
#[derive(Debug)]
pub struct TagAggregator<K> {
    counts: HashMap<K, MoleculeTagCounts>,
}

impl<K: MoleculeKey> TagAggregator<K> {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self { counts: HashMap::new() }
    }

    /// Records one read under its derived key. A previously unseen key starts
    /// from all-zero counts.
    ///
    /// # Errors
    ///
    /// Propagates key-derivation failures; no read is ever skipped silently.
    pub fn observe(&mut self, read: &TaggedRead) -> Result<()> {
        let key = K::from_read(read)?;
        self.counts.entry(key).or_default().record(read.duplex);
        Ok(())
    }

    /// Number of distinct molecules seen so far.
    #[must_use]
    pub fn molecule_count(&self) -> usize {
        self.counts.len()
    }

    /// Counts for a key; a key never observed yields all-zero counts, the
    /// convention the primer join relies on.
    #[must_use]
    pub fn get(&self, key: &K) -> MoleculeTagCounts {
        self.counts.get(key).copied().unwrap_or_default()
    }

    /// Consumes the aggregator, returning the finished mapping.
    #[must_use]
    pub fn into_counts(self) -> HashMap<K, MoleculeTagCounts> {
        self.counts
    }
}

impl<K: MoleculeKey> Default for TagAggregator<K> {
    fn default() -> Self {
        Self::new()
    }
}
