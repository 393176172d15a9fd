//! Run-level duplex yield summary.

use anyhow::{Context, Result};
use clap::Parser;
use fgoxide::io::Io;
use log::info;
use std::path::PathBuf;

use duplexqc_lib::bam_io::create_bam_reader;
use duplexqc_lib::logging::{OperationTimer, format_count, log_duplex_summary};
use duplexqc_lib::molecule::{TagAggregator, UmiKey};
use duplexqc_lib::progress::ProgressTracker;
use duplexqc_lib::summary::DuplexSummaryMetrics;
use duplexqc_lib::tags::TaggedRead;
use duplexqc_lib::validation::validate_file_exists;

use super::command::Command;
use super::common::{TagOptions, ThreadingOptions};

/// Summarizes duplex sequencing yield across a read set
#[derive(Parser, Debug)]
#[command(
    name = "summary",
    author,
    version,
    about = "Summarize duplex yield across a read set",
    long_about = r#"
Classifies every UMI in a strand-tagged BAM into a duplex-support category
and reports run-level yield.

## Inputs

The input BAM must carry two tags on every record: the UMI sequence
(--umi-tag, default MI) and the strand-of-origin symbol CC/TT/NN
(--duplex-tag, default DU), as written by the upstream trimmer/tagger.
Reads are grouped by UMI sequence alone; UMIs recurring at different loci
are merged, an accepted approximation for run-wide yield.

A molecule is duplex-confirmed when both strands carry at least two read
fragments (a fragment is one R1+R2 pair, i.e. two reads). A run with zero
duplex-confirmed molecules fails: that indicates broken upstream tagging,
not a valid empty result.

## Outputs

1. <output>.duplex.summary.txt: four value/label rows (NN-only UMIs,
   single-fragment mixed UMIs, duplex UMIs, duplex rate)
2. <output>.duplex.summary.detail.txt: one header row of all counter
   labels and the matching values row

Reports are only written after the full pass and all internal accounting
checks succeed.
"#
)]
pub struct DuplexSummary {
    /// Input BAM file with UMI and duplex tags
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output prefix for the summary and detail reports
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Run identifier written into the detail report (default: output file name)
    #[arg(long = "read-set")]
    pub read_set: Option<String>,

    /// Tag name options
    #[command(flatten)]
    pub tags: TagOptions,

    /// Threading options for parallel BAM decompression
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Command for DuplexSummary {
    fn execute(&self, _command_line: &str) -> Result<()> {
        info!("DuplexSummary");
        info!("  Input: {}", self.input.display());
        info!("  Output prefix: {}", self.output.display());
        info!("  UMI tag: {}", self.tags.umi_tag);
        info!("  Duplex tag: {}", self.tags.duplex_tag);
        info!("  Threads: {}", self.threading.num_threads());

        let timer = OperationTimer::new("Computing duplex summary");

        validate_file_exists(&self.input, "input BAM file")?;
        let (umi_tag, duplex_tag) = self.tags.validate()?;

        let (mut reader, header) = create_bam_reader(&self.input, self.threading.num_threads())?;

        let mut aggregator = TagAggregator::<UmiKey>::new();
        let mut progress = ProgressTracker::new("Processed records").with_interval(1_000_000);
        let mut record_count: u64 = 0;

        for result in reader.record_bufs(&header) {
            let record = result?;
            let read = TaggedRead::from_record(&record, &header, umi_tag, duplex_tag)?;
            aggregator.observe(&read)?;
            progress.record(1);
            record_count += 1;
        }
        progress.log_final();

        info!(
            "Classifying {} UMIs from {} records",
            format_count(aggregator.molecule_count() as u64),
            format_count(record_count)
        );

        let metrics = DuplexSummaryMetrics::collect(aggregator.into_counts().into_values())?;
        log_duplex_summary(&metrics);

        let read_set = self.read_set();
        let io = Io::default();

        let summary_path = format!("{}.duplex.summary.txt", self.output.display());
        io.write_lines(&summary_path, metrics.summary_lines())
            .with_context(|| format!("Failed to write summary report: {summary_path}"))?;
        info!("Wrote summary report to {summary_path}");

        let detail_path = format!("{}.duplex.summary.detail.txt", self.output.display());
        io.write_lines(&detail_path, metrics.detail_lines(&read_set))
            .with_context(|| format!("Failed to write detail report: {detail_path}"))?;
        info!("Wrote detail report to {detail_path}");

        timer.log_completion(record_count);
        Ok(())
    }
}

impl DuplexSummary {
    /// The run identifier: `--read-set` when given, else the output file name.
    fn read_set(&self) -> String {
        self.read_set.clone().unwrap_or_else(|| {
            self.output
                .file_name()
                .map_or_else(|| self.output.display().to_string(), |n| n.to_string_lossy().into_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(output: &str, read_set: Option<&str>) -> DuplexSummary {
        DuplexSummary {
            input: PathBuf::from("in.bam"),
            output: PathBuf::from(output),
            read_set: read_set.map(String::from),
            tags: TagOptions::default(),
            threading: ThreadingOptions::none(),
        }
    }

    #[test]
    fn test_read_set_defaults_to_output_name() {
        assert_eq!(command("/data/runs/sampleA", None).read_set(), "sampleA");
    }

    #[test]
    fn test_read_set_override() {
        assert_eq!(command("/data/runs/sampleA", Some("run7")).read_set(), "run7");
    }
}
