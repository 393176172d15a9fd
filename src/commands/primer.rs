//! Per-primer duplex metrics.

use anyhow::{Context, Result};
use clap::Parser;
use fgoxide::io::DelimFile;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use duplexqc_lib::bam_io::create_bam_reader;
use duplexqc_lib::logging::{OperationTimer, format_count};
use duplexqc_lib::molecule::{LocusKey, TagAggregator};
use duplexqc_lib::primer::{PrimerAssignment, PrimerDuplexAggregator};
use duplexqc_lib::progress::ProgressTracker;
use duplexqc_lib::tags::TaggedRead;
use duplexqc_lib::validation::validate_file_exists;

use super::command::Command;
use super::common::{TagOptions, ThreadingOptions};

/// Collects per-primer duplex metrics
#[derive(Parser, Debug)]
#[command(
    name = "primer",
    author,
    version,
    about = "Collect per-primer duplex metrics",
    long_about = r#"
Joins molecule-level duplex evidence against the molecule->primer assignment
feed and reports duplex yield per primer.

## Inputs

1. A BAM file with UMI and duplex-origin tags (as for `summary`). Records
   are grouped at locus-aware granularity (chromosome, strand, UMI start,
   UMI sequence), so every record must be aligned.
2. The molecule assignment feed: pipe-delimited text, one row per molecule,
   with fields chrom|strand|UMI start|UMI|read count|alignment count|read
   index|resample flag|fragment length|primer|primer 5' coordinate. Strand
   is 0 for forward, anything else for reverse.

Molecules in the feed that never appear in the BAM count as zero-evidence
molecules. Each molecule is classified into a dominant strand bucket by an
ordered rule (CC first, then TT, then NN).

## Output

A pipe-delimited report with one row per primer: the primer's span, its
molecule and read totals, the per-strand dominant molecule counts and read
totals, NN-only molecules, and the derived duplex molecule count. Rows are
sorted by primer so repeated runs are byte-identical.
"#
)]
pub struct SumPrimerDuplex {
    /// Input BAM file with UMI and duplex tags
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Molecule assignment feed (pipe-delimited, one row per molecule)
    #[arg(short = 'm', long = "molecule-assignments")]
    pub assignments: PathBuf,

    /// Output report file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Run identifier written into the report (default: output file stem)
    #[arg(long = "read-set")]
    pub read_set: Option<String>,

    /// Tag name options
    #[command(flatten)]
    pub tags: TagOptions,

    /// Threading options for parallel BAM decompression
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Command for SumPrimerDuplex {
    fn execute(&self, _command_line: &str) -> Result<()> {
        info!("SumPrimerDuplex");
        info!("  Input: {}", self.input.display());
        info!("  Assignments: {}", self.assignments.display());
        info!("  Output: {}", self.output.display());
        info!("  UMI tag: {}", self.tags.umi_tag);
        info!("  Duplex tag: {}", self.tags.duplex_tag);
        info!("  Threads: {}", self.threading.num_threads());

        let timer = OperationTimer::new("Computing per-primer duplex metrics");

        validate_file_exists(&self.input, "input BAM file")?;
        validate_file_exists(&self.assignments, "molecule assignment file")?;
        let (umi_tag, duplex_tag) = self.tags.validate()?;

        // Pass 1: locus-aware tag counts from the BAM
        let (mut reader, header) = create_bam_reader(&self.input, self.threading.num_threads())?;
        let mut tag_counts = TagAggregator::<LocusKey>::new();
        let mut progress = ProgressTracker::new("Processed records").with_interval(1_000_000);

        for result in reader.record_bufs(&header) {
            let record = result?;
            let read = TaggedRead::from_record(&record, &header, umi_tag, duplex_tag)?;
            tag_counts.observe(&read)?;
            progress.record(1);
        }
        progress.log_final();
        info!("Aggregated {} molecules", format_count(tag_counts.molecule_count() as u64));

        // Pass 2: stream the assignment feed and join against the tag counts
        let mut joiner = PrimerDuplexAggregator::new(self.read_set());
        let feed = File::open(&self.assignments).with_context(|| {
            format!("Failed to open molecule assignment file: {}", self.assignments.display())
        })?;
        let mut assignment_count: u64 = 0;

        for (index, line) in BufReader::new(feed).lines().enumerate() {
            let line = line.with_context(|| {
                format!("Failed to read molecule assignment file: {}", self.assignments.display())
            })?;
            let assignment = PrimerAssignment::parse(&line, index as u64 + 1)?;
            let counts = tag_counts.get(&assignment.locus_key());
            joiner.observe(&assignment, counts);
            assignment_count += 1;
        }

        info!(
            "Joined {} assignments across {} primers",
            format_count(assignment_count),
            format_count(joiner.primer_count() as u64)
        );

        let metrics = joiner.finish();
        DelimFile::default()
            .write(&self.output, metrics, b'|', true)
            .with_context(|| format!("Failed to write primer report: {}", self.output.display()))?;
        info!("Wrote primer report to {}", self.output.display());

        timer.log_completion(assignment_count);
        Ok(())
    }
}

impl SumPrimerDuplex {
    /// The run identifier: `--read-set` when given, else the output file stem.
    fn read_set(&self) -> String {
        self.read_set.clone().unwrap_or_else(|| {
            self.output
                .file_stem()
                .map_or_else(|| self.output.display().to_string(), |n| n.to_string_lossy().into_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(output: &str, read_set: Option<&str>) -> SumPrimerDuplex {
        SumPrimerDuplex {
            input: PathBuf::from("in.bam"),
            assignments: PathBuf::from("marks.txt"),
            output: PathBuf::from(output),
            read_set: read_set.map(String::from),
            tags: TagOptions::default(),
            threading: ThreadingOptions::none(),
        }
    }

    #[test]
    fn test_read_set_defaults_to_output_stem() {
        assert_eq!(command("/out/sampleA.sum_primer_duplex.txt", None).read_set(), "sampleA.sum_primer_duplex");
    }

    #[test]
    fn test_read_set_override() {
        assert_eq!(command("/out/report.txt", Some("run7")).read_set(), "run7");
    }
}
