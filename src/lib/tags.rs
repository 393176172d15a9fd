//! Duplex strand tags and per-record tag extraction.
//!
//! Every input record carries two SAM tags: a UMI sequence and a duplex-origin
//! symbol describing which strand of the source molecule the read was observed
//! from. This module provides the typed forms of those tags and the extraction
//! of a [`TaggedRead`] from a noodles `RecordBuf`.

use crate::errors::{DuplexQcError, Result};
use noodles::sam::Header;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;
use std::fmt;

/// Strand of origin reported by the upstream duplex tagger.
///
/// `Cc` and `Tt` are the two strands of the source molecule; `Nn` means the
/// strand could not be determined. Modeled as a closed enum so an unexpected
/// tag value is an error rather than a silently-counted extra category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplexTag {
    /// Read observed from strand 1 (`CC`)
    Cc,
    /// Read observed from strand 2 (`TT`)
    Tt,
    /// Strand of origin indeterminate (`NN`)
    Nn,
}

impl DuplexTag {
    /// Parses a duplex tag symbol, returning `None` for anything other than
    /// the three recognized values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CC" => Some(Self::Cc),
            "TT" => Some(Self::Tt),
            "NN" => Some(Self::Nn),
            _ => None,
        }
    }

    /// The two-character symbol as written in the BAM tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cc => "CC",
            Self::Tt => "TT",
            Self::Nn => "NN",
        }
    }
}

impl fmt::Display for DuplexTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Genomic strand of an aligned read or a primer.
///
/// The assignment feed encodes strand as `0` for forward and any other value
/// for reverse; reports render it back as `0`/`1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// Forward (plus) strand
    Forward,
    /// Reverse (minus) strand
    Reverse,
}

impl Strand {
    /// Parses the strand field of an assignment feed row.
    #[must_use]
    pub fn from_feed_field(field: &str) -> Self {
        if field == "0" { Self::Forward } else { Self::Reverse }
    }

    /// Returns true for the reverse strand.
    #[must_use]
    pub fn is_reverse(&self) -> bool {
        matches!(self, Self::Reverse)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "0",
            Self::Reverse => "1",
        })
    }
}

/// The per-record view this tool operates on: the two required tags plus the
/// alignment context needed for locus-aware grouping.
///
/// Alignment context is optional because run-level grouping (UMI only) does
/// not need it; locus-aware grouping errors on records without it.
#[derive(Debug, Clone)]
pub struct TaggedRead {
    /// Read name, carried for error messages
    pub name: String,
    /// UMI sequence from the configured UMI tag
    pub umi: String,
    /// Duplex-origin symbol from the configured duplex tag
    pub duplex: DuplexTag,
    /// Reference sequence name, when aligned
    pub chrom: Option<String>,
    /// Strand from the record flags
    pub strand: Strand,
    /// 1-based alignment start position, when aligned
    pub start: Option<i64>,
}

impl TaggedRead {
    /// Extracts the tagged view of a record.
    ///
    /// # Errors
    ///
    /// Returns an error if either required tag is absent or not a string
    /// value, or if the duplex tag value is not one of `CC`/`TT`/`NN`.
    pub fn from_record(
        record: &RecordBuf,
        header: &Header,
        umi_tag: Tag,
        duplex_tag: Tag,
    ) -> Result<Self> {
        let name = record
            .name()
            .map_or_else(|| "<unnamed>".to_string(), |n| String::from_utf8_lossy(n.as_ref()).into_owned());

        let umi = string_tag(record, umi_tag).ok_or_else(|| DuplexQcError::MissingTag {
            name: name.clone(),
            tag: tag_to_string(umi_tag),
        })?;

        let duplex_value =
            string_tag(record, duplex_tag).ok_or_else(|| DuplexQcError::MissingTag {
                name: name.clone(),
                tag: tag_to_string(duplex_tag),
            })?;
        let duplex = DuplexTag::parse(&duplex_value).ok_or_else(|| {
            DuplexQcError::InvalidDuplexTag { name: name.clone(), value: duplex_value.clone() }
        })?;

        let chrom = record.reference_sequence_id().and_then(|id| {
            header.reference_sequences().get_index(id).map(|(name, _)| name.to_string())
        });

        let strand = if record.flags().is_reverse_complemented() {
            Strand::Reverse
        } else {
            Strand::Forward
        };

        let start = record.alignment_start().map(|p| usize::from(p) as i64);

        Ok(Self { name, umi, duplex, chrom, strand, start })
    }
}

/// Reads a string-valued tag from a record, if present.
fn string_tag(record: &RecordBuf, tag: Tag) -> Option<String> {
    match record.data().get(&tag) {
        Some(Value::String(s)) => Some(String::from_utf8_lossy(s.as_ref()).into_owned()),
        _ => None,
    }
}

/// Renders a SAM tag as its two-character name.
fn tag_to_string(tag: Tag) -> String {
    let bytes = [tag.as_ref()[0], tag.as_ref()[1]];
    String::from_utf8_lossy(&bytes).into_owned()
}
