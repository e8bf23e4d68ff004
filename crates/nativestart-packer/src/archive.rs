//! Tar packaging and compression of artifacts.
//!
//! Handles tar.zstd and tar.xz. Directories are written as tar streams
//! using the same traversal and naming as [`crate::hashing`], so an
//! unpacked archive hashes to the checksum recorded before compression.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use nativestart_schema::CompressionAlgorithm;
use tar::{EntryType, Header, HeaderMode};
use xz2::write::XzEncoder;

use crate::error::{PackError, Result};
use crate::hashing::{EntryKind, walk_tree};

/// Compress a file or directory into `target`.
///
/// Files are streamed through the compressor as-is; directories are
/// packed into a tar stream first. Returns the size of the compressed
/// output.
///
/// # Errors
///
/// Returns [`PackError::Unsupported`] if `source` is neither a file nor a
/// directory and an I/O error if reading or writing fails.
pub fn compress(
    source: &Path,
    target: &Path,
    algorithm: CompressionAlgorithm,
    level: i32,
) -> Result<u64> {
    let metadata = fs::metadata(source)?;
    let is_dir = metadata.is_dir();
    if !is_dir && !metadata.is_file() {
        return Err(PackError::Unsupported(source.to_path_buf()));
    }

    let output = BufWriter::new(File::create(target)?);
    match algorithm {
        CompressionAlgorithm::Xz => {
            let mut encoder = XzEncoder::new(output, level.clamp(0, 9) as u32);
            write_payload(source, is_dir, &mut encoder)?;
            encoder.finish()?.flush()?;
        }
        CompressionAlgorithm::Zstd => {
            let mut encoder = zstd::stream::Encoder::new(output, level)?;
            write_payload(source, is_dir, &mut encoder)?;
            encoder.finish()?.flush()?;
        }
    }

    let size = fs::metadata(target)?.len();
    tracing::debug!(
        "compressed {} -> {} ({size} bytes, {algorithm} level {level})",
        source.display(),
        target.display()
    );
    Ok(size)
}

/// File name for a compressed artifact: `name` with the algorithm's
/// extension appended unless it is already there.
pub fn compressed_file_name(name: &str, algorithm: CompressionAlgorithm) -> String {
    let extension = algorithm.file_extension();
    if name.ends_with(extension) {
        name.to_string()
    } else {
        format!("{name}{extension}")
    }
}

fn write_payload<W: Write>(source: &Path, is_dir: bool, out: &mut W) -> Result<()> {
    if is_dir {
        write_tar(source, out)
    } else {
        let mut reader = BufReader::new(File::open(source)?);
        io::copy(&mut reader, out)?;
        Ok(())
    }
}

/// Write the tree below `root` as a tar stream.
///
/// Headers are written in deterministic mode (fixed mtime, no owner) so
/// identical trees produce identical archives.
fn write_tar<W: Write>(root: &Path, out: &mut W) -> Result<()> {
    let mut builder = tar::Builder::new(out);
    builder.mode(HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    for entry in walk_tree(root)? {
        match &entry.kind {
            EntryKind::File(_) => builder.append_path_with_name(&entry.path, &entry.name)?,
            EntryKind::Symlink(target) => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Symlink);
                header.set_size(0);
                header.set_mode(0o777);
                header.set_mtime(0);
                builder.append_link(&mut header, &entry.name, target)?;
            }
        }
    }

    builder.into_inner()?;
    Ok(())
}
