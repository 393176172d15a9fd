//! Input validation utilities.
//!
//! Validation of file paths and SAM tag names, with structured errors from
//! [`crate::errors`] so failures abort before any pass starts.

use crate::errors::{DuplexQcError, Result};
use noodles::sam::alignment::record::data::field::Tag;
use std::path::Path;

/// Validates that a file exists.
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g. "input BAM")
///
/// # Errors
/// Returns an error if the file does not exist.
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(DuplexQcError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validates that a SAM tag name is exactly 2 characters.
///
/// # Arguments
/// * `tag` - Tag string to validate
/// * `name` - Parameter name for error messages
///
/// # Errors
/// Returns an error if the tag is not exactly 2 characters.
pub fn validate_tag(tag: &str, name: &str) -> Result<[u8; 2]> {
    if tag.len() != 2 {
        return Err(DuplexQcError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("Tag must be exactly 2 characters, got: '{tag}'"),
        });
    }
    let bytes = tag.as_bytes();
    Ok([bytes[0], bytes[1]])
}

/// Validates a tag name and converts it to a noodles `Tag`.
///
/// # Errors
/// Returns an error if the tag is not exactly 2 characters.
pub fn string_to_tag(tag: &str, name: &str) -> Result<Tag> {
    let tag_array = validate_tag(tag, name)?;
    Ok(Tag::from(tag_array))
}
