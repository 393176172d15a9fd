//! Custom error types for duplexqc operations.

use thiserror::Error;

/// Result type alias for duplexqc operations
pub type Result<T> = std::result::Result<T, DuplexQcError>;

/// Error type for duplexqc operations
#[derive(Error, Debug)]
pub enum DuplexQcError {
    /// Alignment record is missing a required SAM tag
    #[error("Record '{name}' is missing required tag '{tag}'")]
    MissingTag {
        /// The read name
        name: String,
        /// The tag that was expected
        tag: String,
    },

    /// Duplex-origin tag carries a value outside CC/TT/NN
    #[error("Record '{name}' has invalid duplex tag value '{value}' (expected CC, TT, or NN)")]
    InvalidDuplexTag {
        /// The read name
        name: String,
        /// The offending tag value
        value: String,
    },

    /// Record has no alignment coordinates and cannot be grouped by locus
    #[error("Record '{name}' is unaligned and cannot be keyed by locus")]
    UnalignedRecord {
        /// The read name
        name: String,
    },

    /// Molecule assignment feed row could not be parsed
    #[error("Malformed molecule assignment at line {line}: {reason}")]
    MalformedAssignment {
        /// 1-based line number within the feed
        line: u64,
        /// Explanation of the problem
        reason: String,
    },

    /// A cross-check over the summary counters failed
    #[error("UMI accounting failed [{check}]: {detail}")]
    Accounting {
        /// Name of the failed cross-check
        check: &'static str,
        /// The offending counter values
        detail: String,
    },

    /// A full pass produced no duplex-confirmed molecules
    #[error(
        "No duplex UMIs found among {total} total UMIs; upstream duplex tagging likely failed"
    )]
    NoDuplexMolecules {
        /// Total molecules seen in the pass
        total: u64,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "assignment feed")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tag() {
        let error = DuplexQcError::MissingTag { name: "read1".to_string(), tag: "MI".to_string() };
        let msg = format!("{error}");
        assert!(msg.contains("read1"));
        assert!(msg.contains("'MI'"));
    }

    #[test]
    fn test_invalid_duplex_tag() {
        let error =
            DuplexQcError::InvalidDuplexTag { name: "read1".to_string(), value: "XX".to_string() };
        let msg = format!("{error}");
        assert!(msg.contains("'XX'"));
        assert!(msg.contains("CC, TT, or NN"));
    }

    #[test]
    fn test_malformed_assignment() {
        let error = DuplexQcError::MalformedAssignment {
            line: 42,
            reason: "expected 11 fields, found 3".to_string(),
        };
        let msg = format!("{error}");
        assert!(msg.contains("line 42"));
        assert!(msg.contains("expected 11 fields"));
    }

    #[test]
    fn test_accounting() {
        let error = DuplexQcError::Accounting {
            check: "category counts",
            detail: "total 10 != category sum 9".to_string(),
        };
        let msg = format!("{error}");
        assert!(msg.contains("category counts"));
        assert!(msg.contains("total 10"));
    }

    #[test]
    fn test_no_duplex_molecules() {
        let error = DuplexQcError::NoDuplexMolecules { total: 123 };
        let msg = format!("{error}");
        assert!(msg.contains("123 total UMIs"));
    }

    #[test]
    fn test_invalid_file_format() {
        let error = DuplexQcError::InvalidFileFormat {
            file_type: "BAM".to_string(),
            path: "/path/to/file.bam".to_string(),
            reason: "File does not exist".to_string(),
        };
        let msg = format!("{error}");
        assert!(msg.contains("Invalid BAM file"));
        assert!(msg.contains("does not exist"));
    }
}
