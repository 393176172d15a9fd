//! Run-level duplex classification and summary counters.
//!
//! One pass over the run-level molecule counts accumulates a fixed table of
//! counters, cross-validates them, and renders the two run reports: a compact
//! four-line summary and a wide single-row detail table.

use crate::errors::{DuplexQcError, Result};
use crate::molecule::{
    DuplexCategory, MoleculeTagCounts, READS_PER_FRAGMENT, THREE_FRAGMENT_READS,
    TWO_FRAGMENT_READS,
};

/// Decimal places used for rates and fractions in the reports.
pub const RATE_PRECISION: usize = 2;

/// Rounds a fraction to [`RATE_PRECISION`] decimal places.
#[must_use]
pub fn round_rate(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The fixed table of run-level summary counters.
///
/// Counters accumulate monotonically over one pass via [`observe`]; derived
/// rates are filled in by [`finalize`], which first cross-validates the
/// counter table and rejects the run on any inconsistency.
///
/// [`observe`]: DuplexSummaryMetrics::observe
/// [`finalize`]: DuplexSummaryMetrics::finalize
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplexSummaryMetrics {
    /// Total distinct molecules (UMIs) observed
    pub total_molecules: u64,
    /// Molecules with NN evidence only
    pub nn_only_molecules: u64,
    /// NN reads, tallied for every molecule and excluded from fragment tallies
    pub nn_reads: u64,
    /// Molecules with exactly 1 strand-resolved read fragment
    pub molecules_with_1_fragment: u64,
    /// Molecules with exactly 2 strand-resolved read fragments
    pub molecules_with_2_fragments: u64,
    /// Molecules with exactly 3 strand-resolved read fragments
    pub molecules_with_3_fragments: u64,
    /// Single-fragment molecules, all CC
    pub singleton_cc: u64,
    /// Single-fragment molecules, all TT
    pub singleton_tt: u64,
    /// Molecules with one CC fragment and one TT fragment
    pub singleton_mixed: u64,
    /// Molecules with fewer than 2 fragments on both strands
    pub below_two_fragments_both_strands: u64,
    /// Molecules with >= 2 fragments on CC or TT
    pub two_plus_fragments_either_strand: u64,
    /// Molecules with >= 3 fragments on CC or TT
    pub three_plus_fragments_either_strand: u64,
    /// Molecules with >= 2 CC fragments and <= 1 TT fragment (thresholded view)
    pub cc_dominant_weak_tt: u64,
    /// Molecules with >= 2 TT fragments and <= 1 CC fragment (thresholded view)
    pub tt_dominant_weak_cc: u64,
    /// Molecules with >= 2 CC fragments and zero TT reads (strict view)
    pub cc_dominant_no_tt: u64,
    /// Molecules with >= 2 TT fragments and zero CC reads (strict view)
    pub tt_dominant_no_cc: u64,
    /// Duplex-confirmed molecules (>= 2 fragments on both strands)
    pub duplex_molecules: u64,
    /// Duplex molecules / total molecules, rounded
    pub duplex_rate: f64,
    /// Fraction of molecules with exactly 1 fragment, rounded
    pub fraction_with_1_fragment: f64,
    /// Fraction of molecules with exactly 2 fragments, rounded
    pub fraction_with_2_fragments: f64,
    /// Fraction of molecules with exactly 3 fragments, rounded
    pub fraction_with_3_fragments: f64,
}

impl DuplexSummaryMetrics {
    /// Creates a zeroed counter table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one molecule into the counter table.
    ///
    /// NN-only molecules contribute to the total, the NN-only counter, and
    /// the NN-read tally, nothing else. Molecules whose counts cannot come
    /// from whole paired fragments contribute to the total only and are
    /// caught by [`finalize`]'s accounting checks.
    ///
    /// [`finalize`]: DuplexSummaryMetrics::finalize
    pub fn observe(&mut self, counts: &MoleculeTagCounts) {
        self.total_molecules += 1;
        self.nn_reads += counts.nn;

        let Some(category) = counts.category() else {
            return;
        };
        if category == DuplexCategory::NnOnly {
            self.nn_only_molecules += 1;
            return;
        }

        // Strand-resolved fragment tally; NN reads are excluded here
        match counts.strand_reads() {
            n if n == READS_PER_FRAGMENT => self.molecules_with_1_fragment += 1,
            n if n == TWO_FRAGMENT_READS => self.molecules_with_2_fragments += 1,
            n if n == THREE_FRAGMENT_READS => self.molecules_with_3_fragments += 1,
            _ => {}
        }

        match category {
            DuplexCategory::SingletonCc => {
                self.singleton_cc += 1;
                self.below_two_fragments_both_strands += 1;
            }
            DuplexCategory::SingletonTt => {
                self.singleton_tt += 1;
                self.below_two_fragments_both_strands += 1;
            }
            DuplexCategory::SingletonMixed => {
                self.singleton_mixed += 1;
                self.below_two_fragments_both_strands += 1;
            }
            DuplexCategory::CcDominantWeakTt
            | DuplexCategory::TtDominantWeakCc
            | DuplexCategory::DuplexConfirmed => {
                if counts.cc >= TWO_FRAGMENT_READS || counts.tt >= TWO_FRAGMENT_READS {
                    self.two_plus_fragments_either_strand += 1;
                }
                if counts.cc >= THREE_FRAGMENT_READS || counts.tt >= THREE_FRAGMENT_READS {
                    self.three_plus_fragments_either_strand += 1;
                }
                match category {
                    DuplexCategory::DuplexConfirmed => self.duplex_molecules += 1,
                    DuplexCategory::CcDominantWeakTt => self.cc_dominant_weak_tt += 1,
                    DuplexCategory::TtDominantWeakCc => self.tt_dominant_weak_cc += 1,
                    _ => unreachable!(),
                }
                // Strict view: only exact zeros on the opposite strand count
                if counts.cc > 0 && counts.tt == 0 {
                    self.cc_dominant_no_tt += 1;
                } else if counts.tt > 0 && counts.cc == 0 {
                    self.tt_dominant_no_cc += 1;
                }
            }
            DuplexCategory::NnOnly => unreachable!(),
        }
    }

    /// Accumulates an entire run of molecule counts into a finished table.
    ///
    /// # Errors
    ///
    /// Returns the first accounting failure, or [`DuplexQcError::NoDuplexMolecules`]
    /// for a run without a single duplex-confirmed molecule.
    pub fn collect(counts: impl IntoIterator<Item = MoleculeTagCounts>) -> Result<Self> {
        let mut metrics = Self::new();
        for molecule in counts {
            metrics.observe(&molecule);
        }
        metrics.finalize()?;
        Ok(metrics)
    }

    /// Validates the counter table and fills in the derived rates.
    ///
    /// # Errors
    ///
    /// See [`collect`](DuplexSummaryMetrics::collect).
    pub fn finalize(&mut self) -> Result<()> {
        self.validate()?;
        #[allow(clippy::cast_precision_loss)]
        let total = self.total_molecules as f64;
        self.duplex_rate = round_rate(self.duplex_molecules as f64 / total);
        self.fraction_with_1_fragment = round_rate(self.molecules_with_1_fragment as f64 / total);
        self.fraction_with_2_fragments = round_rate(self.molecules_with_2_fragments as f64 / total);
        self.fraction_with_3_fragments = round_rate(self.molecules_with_3_fragments as f64 / total);
        Ok(())
    }

    /// Cross-checks the accumulated counters.
    fn validate(&self) -> Result<()> {
        let by_category = self.singleton_cc
            + self.singleton_tt
            + self.singleton_mixed
            + self.cc_dominant_weak_tt
            + self.tt_dominant_weak_cc
            + self.duplex_molecules
            + self.nn_only_molecules;
        if self.total_molecules != by_category {
            return Err(DuplexQcError::Accounting {
                check: "category counts",
                detail: format!(
                    "total {} != category sum {} (cc {} + tt {} + mixed {} + weak-tt {} + weak-cc {} + duplex {} + nn-only {})",
                    self.total_molecules,
                    by_category,
                    self.singleton_cc,
                    self.singleton_tt,
                    self.singleton_mixed,
                    self.cc_dominant_weak_tt,
                    self.tt_dominant_weak_cc,
                    self.duplex_molecules,
                    self.nn_only_molecules,
                ),
            });
        }

        let by_support = self.two_plus_fragments_either_strand
            + self.below_two_fragments_both_strands
            + self.nn_only_molecules;
        if self.total_molecules != by_support {
            return Err(DuplexQcError::Accounting {
                check: "fragment-support counts",
                detail: format!(
                    "total {} != support sum {} (>=2 frags {} + <2 frags {} + nn-only {})",
                    self.total_molecules,
                    by_support,
                    self.two_plus_fragments_either_strand,
                    self.below_two_fragments_both_strands,
                    self.nn_only_molecules,
                ),
            });
        }

        // duplex == two_plus - weak-tt - weak-cc, rearranged to avoid underflow
        let dominant_sum =
            self.duplex_molecules + self.cc_dominant_weak_tt + self.tt_dominant_weak_cc;
        if dominant_sum != self.two_plus_fragments_either_strand {
            return Err(DuplexQcError::Accounting {
                check: "duplex counts",
                detail: format!(
                    "duplex {} + weak-tt {} + weak-cc {} != >=2-fragment count {}",
                    self.duplex_molecules,
                    self.cc_dominant_weak_tt,
                    self.tt_dominant_weak_cc,
                    self.two_plus_fragments_either_strand,
                ),
            });
        }

        if self.duplex_molecules == 0 {
            return Err(DuplexQcError::NoDuplexMolecules { total: self.total_molecules });
        }

        Ok(())
    }

    /// The four `value<TAB>label` rows of the compact summary report.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("{}\tNo. of NN only UMIs", self.nn_only_molecules),
            format!(
                "{}\tNo. of UMIs with both CC and TT (1 read frag each CC and TT)",
                self.singleton_mixed
            ),
            format!(
                "{}\tNo. of Duplex UMIs (>= 2 read frags each CC and TT)",
                self.duplex_molecules
            ),
            format!("{:.RATE_PRECISION$}\tDuplex Rate (Duplex UMIs/Total UMI)", self.duplex_rate),
        ]
    }

    /// The detail report: a tab-joined header row of counter labels and the
    /// matching values row.
    #[must_use]
    pub fn detail_lines(&self, read_set: &str) -> Vec<String> {
        let columns = self.detail_columns(read_set);
        let header = columns.iter().map(|(label, _)| *label).collect::<Vec<_>>().join("\t");
        let values = columns.into_iter().map(|(_, value)| value).collect::<Vec<_>>().join("\t");
        vec![header, values]
    }

    /// Ordered (label, value) pairs of the detail report.
    fn detail_columns(&self, read_set: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Read Set", read_set.to_string()),
            ("Total UMI Count", self.total_molecules.to_string()),
            ("No. of UMIs with only NN", self.nn_only_molecules.to_string()),
            ("No. of NN reads excluded in analysis metrics", self.nn_reads.to_string()),
            (
                "Fraction of UMIs with 1 read frag",
                format!("{:.RATE_PRECISION$}", self.fraction_with_1_fragment),
            ),
            (
                "Fraction of UMIs with 2 read frag",
                format!("{:.RATE_PRECISION$}", self.fraction_with_2_fragments),
            ),
            (
                "Fraction of UMIs with 3 read frag",
                format!("{:.RATE_PRECISION$}", self.fraction_with_3_fragments),
            ),
            (
                "No. of UMIs with >= 2 read frags CC AND 0 read frag TT",
                self.cc_dominant_no_tt.to_string(),
            ),
            (
                "No. of UMIs with >= 2 read frags TT AND 0 read frag CC",
                self.tt_dominant_no_cc.to_string(),
            ),
            (
                "No. of UMIs with >= 2 read frags CC AND <= 1 read frag TT",
                self.cc_dominant_weak_tt.to_string(),
            ),
            (
                "No. of UMIs with >= 2 read frags TT AND <= 1 read frag CC",
                self.tt_dominant_weak_cc.to_string(),
            ),
            (
                "No. of UMIs with >= 2 read frags CC OR TT",
                self.two_plus_fragments_either_strand.to_string(),
            ),
            (
                "No. of UMIs with >= 3 read frags CC OR TT",
                self.three_plus_fragments_either_strand.to_string(),
            ),
            (
                "No. of UMIs with < 2 read frags CC AND TT",
                self.below_two_fragments_both_strands.to_string(),
            ),
            (
                "No. of Duplex UMIs (>= 2 read frags CC AND TT)",
                self.duplex_molecules.to_string(),
            ),
            (
                "Duplex Rate (Duplex UMIs/Total UMI)",
                format!("{:.RATE_PRECISION$}", self.duplex_rate),
            ),
            ("No. of UMIs with all CC (1 read frag UMIs)", self.singleton_cc.to_string()),
            ("No. of UMIs with all TT (1 read frag UMIs)", self.singleton_tt.to_string()),
            (
                "No. of UMIs with both CC and TT (1 read frag CC AND TT)",
                self.singleton_mixed.to_string(),
            ),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::cast_precision_loss)]
mod tests {
    use super::*;

    fn counts(cc: u64, tt: u64, nn: u64) -> MoleculeTagCounts {
        MoleculeTagCounts::new(cc, tt, nn)
    }

    /// A minimal valid run: one duplex molecule plus whatever else the test adds.
    fn collect_ok(molecules: Vec<MoleculeTagCounts>) -> DuplexSummaryMetrics {
        DuplexSummaryMetrics::collect(molecules).unwrap()
    }

    #[test]
    fn test_nn_only_molecule() {
        // cc=0, tt=0, nn=5: NN-only, 5 NN reads, no fragment tallies
        let metrics = collect_ok(vec![counts(0, 0, 5), counts(4, 4, 0)]);
        assert_eq!(metrics.nn_only_molecules, 1);
        assert_eq!(metrics.nn_reads, 5);
        // The NN-only molecule lands in no fragment tally; the duplex molecule
        // has 4 fragments, beyond the tracked 1/2/3 tallies.
        assert_eq!(metrics.molecules_with_1_fragment, 0);
        assert_eq!(metrics.molecules_with_2_fragments, 0);
        assert_eq!(metrics.molecules_with_3_fragments, 0);
    }

    #[test]
    fn test_singleton_classification() {
        let metrics = collect_ok(vec![
            counts(2, 0, 0), // singleton CC
            counts(0, 2, 0), // singleton TT
            counts(2, 2, 0), // one fragment each
            counts(4, 4, 0), // duplex so the run is valid
        ]);
        assert_eq!(metrics.singleton_cc, 1);
        assert_eq!(metrics.singleton_tt, 1);
        assert_eq!(metrics.singleton_mixed, 1);
        assert_eq!(metrics.below_two_fragments_both_strands, 3);
        assert_eq!(metrics.molecules_with_1_fragment, 2);
        assert_eq!(metrics.molecules_with_2_fragments, 1); // the 2+2 molecule
    }

    #[test]
    fn test_duplex_confirmed_molecule() {
        // cc=6, tt=4: duplex, counted in >=2 and >=3 tallies, no weak counters
        let metrics = collect_ok(vec![counts(6, 4, 0)]);
        assert_eq!(metrics.duplex_molecules, 1);
        assert_eq!(metrics.two_plus_fragments_either_strand, 1);
        assert_eq!(metrics.three_plus_fragments_either_strand, 1);
        assert_eq!(metrics.cc_dominant_weak_tt, 0);
        assert_eq!(metrics.tt_dominant_weak_cc, 0);
        assert_eq!(metrics.cc_dominant_no_tt, 0);
        assert_eq!(metrics.tt_dominant_no_cc, 0);
    }

    #[test]
    fn test_cc_dominant_with_weak_tt() {
        // cc=4, tt=2: thresholded view zeroes the TT side, strict view does not
        let metrics = collect_ok(vec![counts(4, 2, 0), counts(4, 4, 0)]);
        assert_eq!(metrics.cc_dominant_weak_tt, 1);
        assert_eq!(metrics.cc_dominant_no_tt, 0); // tt reads are present
        assert_eq!(metrics.tt_dominant_weak_cc, 0);
    }

    #[test]
    fn test_cc_dominant_with_no_tt() {
        // cc=4, tt=0: both the thresholded and strict views fire
        let metrics = collect_ok(vec![counts(4, 0, 0), counts(4, 4, 0)]);
        assert_eq!(metrics.cc_dominant_weak_tt, 1);
        assert_eq!(metrics.cc_dominant_no_tt, 1);
    }

    #[test]
    fn test_tt_dominant_counters_mirror_cc() {
        let metrics = collect_ok(vec![counts(2, 4, 0), counts(0, 6, 0), counts(4, 4, 0)]);
        assert_eq!(metrics.tt_dominant_weak_cc, 2);
        assert_eq!(metrics.tt_dominant_no_cc, 1);
        assert_eq!(metrics.three_plus_fragments_either_strand, 1); // the 0/6 molecule
    }

    #[test]
    fn test_nn_reads_tallied_for_mixed_molecules() {
        let metrics = collect_ok(vec![counts(2, 2, 3), counts(4, 4, 0), counts(0, 0, 2)]);
        assert_eq!(metrics.nn_reads, 5);
        // NN reads do not move the fragment tally: 2+2 strand reads = 2 fragments
        assert_eq!(metrics.molecules_with_2_fragments, 1);
    }

    #[test]
    fn test_category_counters_sum_to_total() {
        let molecules = vec![
            counts(0, 0, 1),
            counts(2, 0, 0),
            counts(0, 2, 0),
            counts(2, 2, 0),
            counts(4, 2, 0),
            counts(2, 4, 0),
            counts(4, 4, 0),
            counts(8, 6, 2),
            counts(6, 0, 0),
        ];
        let total = molecules.len() as u64;
        let metrics = collect_ok(molecules);
        assert_eq!(metrics.total_molecules, total);
        let by_category = metrics.singleton_cc
            + metrics.singleton_tt
            + metrics.singleton_mixed
            + metrics.cc_dominant_weak_tt
            + metrics.tt_dominant_weak_cc
            + metrics.duplex_molecules
            + metrics.nn_only_molecules;
        assert_eq!(by_category, total);
        // duplex == >=2-fragment count - weak counters
        assert_eq!(
            metrics.duplex_molecules,
            metrics.two_plus_fragments_either_strand
                - metrics.cc_dominant_weak_tt
                - metrics.tt_dominant_weak_cc
        );
    }

    #[test]
    fn test_rates_rounded_to_two_decimals() {
        // 1 duplex of 3 molecules: 0.333... -> 0.33
        let metrics = collect_ok(vec![counts(4, 4, 0), counts(2, 0, 0), counts(0, 2, 0)]);
        assert!((metrics.duplex_rate - 0.33).abs() < f64::EPSILON);
        assert!((metrics.fraction_with_1_fragment - 0.67).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_duplex_run_is_fatal() {
        let err = DuplexSummaryMetrics::collect(vec![counts(2, 0, 0), counts(0, 0, 3)])
            .unwrap_err();
        assert!(matches!(err, DuplexQcError::NoDuplexMolecules { total: 2 }));
    }

    #[test]
    fn test_unclassifiable_counts_fail_accounting() {
        // cc=3, tt=3 cannot come from whole paired fragments
        let err =
            DuplexSummaryMetrics::collect(vec![counts(3, 3, 0), counts(4, 4, 0)]).unwrap_err();
        assert!(matches!(err, DuplexQcError::Accounting { check: "category counts", .. }));
    }

    #[test]
    fn test_determinism_across_passes() {
        let molecules =
            vec![counts(4, 4, 1), counts(2, 0, 0), counts(0, 0, 7), counts(6, 2, 0)];
        let first = collect_ok(molecules.clone());
        let second = collect_ok(molecules);
        assert_eq!(first, second);
        assert_eq!(first.summary_lines(), second.summary_lines());
        assert_eq!(first.detail_lines("rs1"), second.detail_lines("rs1"));
    }

    #[test]
    fn test_summary_lines_shape() {
        let metrics = collect_ok(vec![counts(4, 4, 0), counts(0, 0, 2), counts(2, 2, 0)]);
        let lines = metrics.summary_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "1\tNo. of NN only UMIs");
        assert_eq!(
            lines[1],
            "1\tNo. of UMIs with both CC and TT (1 read frag each CC and TT)"
        );
        assert_eq!(lines[2], "1\tNo. of Duplex UMIs (>= 2 read frags each CC and TT)");
        assert_eq!(lines[3], "0.33\tDuplex Rate (Duplex UMIs/Total UMI)");
    }

    #[test]
    fn test_detail_lines_header_matches_values() {
        let metrics = collect_ok(vec![counts(4, 4, 0)]);
        let lines = metrics.detail_lines("sampleA");
        assert_eq!(lines.len(), 2);
        let header: Vec<&str> = lines[0].split('\t').collect();
        let values: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(header.len(), values.len());
        assert_eq!(header[0], "Read Set");
        assert_eq!(values[0], "sampleA");
        assert_eq!(header[1], "Total UMI Count");
        assert_eq!(values[1], "1");
        // duplex rate column
        let rate_idx =
            header.iter().position(|h| *h == "Duplex Rate (Duplex UMIs/Total UMI)").unwrap();
        assert_eq!(values[rate_idx], "1.00");
    }

    #[test]
    fn test_round_rate() {
        assert!((round_rate(0.333_333) - 0.33).abs() < f64::EPSILON);
        assert!((round_rate(0.335) - 0.34).abs() < f64::EPSILON);
        assert!((round_rate(0.0) - 0.0).abs() < f64::EPSILON);
    }
}
