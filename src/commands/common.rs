//! Common CLI options shared across commands.
//!
//! Shared argument structures composed into command structs with
//! `#[command(flatten)]`.

use clap::Args;
use noodles::sam::alignment::record::data::field::Tag;

use duplexqc_lib::validation::string_to_tag;

/// SAM tag names for the UMI and duplex-origin tags.
///
/// Defaults match the tags written by the upstream trimmer/tagger; both are
/// configurable because tag names are a pipeline-level choice.
#[derive(Debug, Clone, Args)]
pub struct TagOptions {
    /// SAM tag holding the UMI sequence
    #[arg(long = "umi-tag", default_value = "MI")]
    pub umi_tag: String,

    /// SAM tag holding the duplex-origin symbol (CC/TT/NN)
    #[arg(long = "duplex-tag", default_value = "DU")]
    pub duplex_tag: String,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self { umi_tag: "MI".to_string(), duplex_tag: "DU".to_string() }
    }
}

impl TagOptions {
    /// Validates both tag names and converts them to noodles tags.
    ///
    /// # Errors
    ///
    /// Returns an error if either tag name is not exactly 2 characters.
    pub fn validate(&self) -> anyhow::Result<(Tag, Tag)> {
        let umi_tag = string_to_tag(&self.umi_tag, "umi-tag")?;
        let duplex_tag = string_to_tag(&self.duplex_tag, "duplex-tag")?;
        Ok((umi_tag, duplex_tag))
    }
}

/// Threading options for parallel BGZF decompression.
///
/// Decompression threads affect throughput only; the classification pass
/// itself is single-threaded and order-insensitive.
#[derive(Debug, Clone, Default, Args)]
pub struct ThreadingOptions {
    /// Number of BAM decompression threads (default: single-threaded)
    #[arg(long = "threads")]
    pub threads: Option<usize>,
}

impl ThreadingOptions {
    /// Creates options with N decompression threads.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        Self { threads: Some(threads) }
    }

    /// Creates options for the single-threaded reader.
    #[must_use]
    pub fn none() -> Self {
        Self { threads: None }
    }

    /// The effective thread count (at least 1).
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.threads.unwrap_or(1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_options_defaults_validate() {
        let opts = TagOptions::default();
        let (umi_tag, duplex_tag) = opts.validate().unwrap();
        assert_eq!(umi_tag, Tag::from([b'M', b'I']));
        assert_eq!(duplex_tag, Tag::from([b'D', b'U']));
    }

    #[test]
    fn test_tag_options_rejects_bad_length() {
        let opts = TagOptions { umi_tag: "MID".to_string(), ..TagOptions::default() };
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().contains("umi-tag"));
    }

    #[test]
    fn test_threading_defaults_to_single() {
        assert_eq!(ThreadingOptions::none().num_threads(), 1);
        assert_eq!(ThreadingOptions::default().num_threads(), 1);
        assert_eq!(ThreadingOptions::new(0).num_threads(), 1);
        assert_eq!(ThreadingOptions::new(8).num_threads(), 8);
    }
}
