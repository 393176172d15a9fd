//! BAM input utilities.
//!
//! The alignment feed arrives as a BAM file. BGZF decompression may be
//! parallelized with `--threads`; this affects throughput only, never the
//! order of the record stream the aggregation pass consumes.

use anyhow::{Context, Result};
use noodles::bgzf::{MultithreadedReader, Reader as BgzfReader};
use noodles::sam::Header;
use std::fs::File;
use std::io::{self, BufRead, Read};
use std::num::NonZero;
use std::path::Path;

/// BGZF reader over the input file, single- or multi-threaded.
pub enum BgzfReaderEnum {
    /// Single-threaded decompression (lower overhead for small files)
    SingleThreaded(BgzfReader<File>),
    /// Multi-threaded decompression (higher throughput for large files)
    MultiThreaded(MultithreadedReader<File>),
}

impl Read for BgzfReaderEnum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.read(buf),
            BgzfReaderEnum::MultiThreaded(r) => r.read(buf),
        }
    }
}

impl BufRead for BgzfReaderEnum {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.fill_buf(),
            BgzfReaderEnum::MultiThreaded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.consume(amt),
            BgzfReaderEnum::MultiThreaded(r) => r.consume(amt),
        }
    }
}

/// Type alias for the BAM reader over either BGZF reader.
pub type BamReader = noodles::bam::io::Reader<BgzfReaderEnum>;

/// Opens a BAM file and reads its header.
///
/// # Arguments
/// * `path` - Path to the input BAM file
/// * `threads` - Number of decompression threads (<= 1 means single-threaded)
///
/// # Returns
/// A tuple of (BAM reader, header).
///
/// # Errors
/// Returns an error if the file cannot be opened or the header cannot be read.
///
/// # Panics
/// Panics if `threads > 1` but `NonZero::new` fails (cannot happen).
pub fn create_bam_reader<P: AsRef<Path>>(path: P, threads: usize) -> Result<(BamReader, Header)> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open input BAM: {}", path_ref.display()))?;

    let bgzf_reader = if threads > 1 {
        let worker_count = NonZero::new(threads).expect("threads > 1 checked above");
        BgzfReaderEnum::MultiThreaded(MultithreadedReader::with_worker_count(worker_count, file))
    } else {
        BgzfReaderEnum::SingleThreaded(BgzfReader::new(file))
    };

    let mut reader = noodles::bam::io::Reader::from(bgzf_reader);
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;

    Ok((reader, header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;
    use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
    use std::num::NonZeroUsize;
    use tempfile::NamedTempFile;

    fn write_empty_bam(path: &Path) {
        use noodles::bam;
        use noodles::sam;

        let header = sam::Header::builder()
            .add_reference_sequence(
                BString::from("chr1"),
                Map::<ReferenceSequence>::new(NonZeroUsize::new(1000).unwrap()),
            )
            .build();

        let mut writer = bam::io::writer::Builder.build_from_path(path).unwrap();
        writer.write_header(&header).unwrap();
    }

    #[test]
    fn test_create_bam_reader_nonexistent_file() {
        let result = create_bam_reader("/nonexistent/file.bam", 1);
        assert!(result.is_err());
        let err_msg = result.err().unwrap().to_string();
        assert!(err_msg.contains("Failed to open input BAM"));
    }

    #[test]
    fn test_read_header_single_threaded() {
        let temp = NamedTempFile::new().unwrap();
        write_empty_bam(temp.path());

        let (mut reader, header) = create_bam_reader(temp.path(), 1).unwrap();
        assert_eq!(header.reference_sequences().len(), 1);
        assert_eq!(reader.record_bufs(&header).count(), 0);
    }

    #[test]
    fn test_read_header_multithreaded() {
        let temp = NamedTempFile::new().unwrap();
        write_empty_bam(temp.path());

        let (mut reader, header) = create_bam_reader(temp.path(), 4).unwrap();
        assert_eq!(header.reference_sequences().len(), 1);
        assert_eq!(reader.record_bufs(&header).count(), 0);
    }
}
