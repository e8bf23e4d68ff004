//! Content identity for files and directory trees.
//!
//! A directory is addressed by an index of `"<relative path>\t<hash>\n"`
//! lines sorted by path, so the result does not depend on the order in
//! which the filesystem enumerates entries. Symbolic links are never
//! followed: a link contributes the hash of its target string.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use nativestart_schema::HashAlgorithm;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{PackError, Result};

/// Size and checksum of a file or directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    /// Sum of regular file sizes (symlinks count as 0)
    pub size: u64,
    /// Lowercase hex digest
    pub checksum: String,
}

/// Streaming digest over one of the supported algorithms.
enum Digester {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

impl Write for Digester {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What a tree entry contributes to hashes and archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file of the given length
    File(u64),
    /// Symbolic link with its (unresolved) target
    Symlink(PathBuf),
}

/// A regular file or symlink found below a directory root.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Absolute (or root-relative, as given) path on disk
    pub path: PathBuf,
    /// Path relative to the root, `/` separated
    pub name: String,
    /// File or link
    pub kind: EntryKind,
}

/// Enumerate every regular file and symlink below `root`, depth first and
/// sorted by file name. Directories are descended into but not reported.
///
/// # Errors
///
/// Returns an I/O error if the tree cannot be read and
/// [`PackError::Unsupported`] for fifos, sockets and device nodes.
pub fn walk_tree(root: &Path) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let kind = if file_type.is_symlink() {
            EntryKind::Symlink(fs::read_link(entry.path())?)
        } else if file_type.is_file() {
            EntryKind::File(entry.metadata()?.len())
        } else {
            return Err(PackError::Unsupported(entry.path().to_path_buf()));
        };

        entries.push(TreeEntry {
            name: relative_name(root, entry.path()),
            path: entry.into_path(),
            kind,
        });
    }

    Ok(entries)
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Hash a file or a whole directory tree.
///
/// # Errors
///
/// Returns [`PackError::Unsupported`] if `path` is neither a file nor a
/// directory (or the tree contains special files) and an I/O error if
/// anything becomes unreadable.
pub fn hash_path(algorithm: HashAlgorithm, path: &Path) -> Result<ContentInfo> {
    let metadata = fs::metadata(path)?;
    if metadata.is_file() {
        hash_file(algorithm, path)
    } else if metadata.is_dir() {
        hash_directory(algorithm, path)
    } else {
        Err(PackError::Unsupported(path.to_path_buf()))
    }
}

/// Stream a single file through the digest.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> Result<ContentInfo> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut digest = Digester::new(algorithm);
    let size = io::copy(&mut reader, &mut digest)?;
    Ok(ContentInfo {
        size,
        checksum: digest.finalize_hex(),
    })
}

/// Digest of an in-memory buffer.
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    let mut digest = Digester::new(algorithm);
    digest.update(data);
    digest.finalize_hex()
}

fn hash_directory(algorithm: HashAlgorithm, root: &Path) -> Result<ContentInfo> {
    let mut size = 0;
    let mut index = BTreeMap::new();

    for entry in walk_tree(root)? {
        let checksum = match &entry.kind {
            EntryKind::File(_) => {
                let info = hash_file(algorithm, &entry.path)?;
                size += info.size;
                info.checksum
            }
            EntryKind::Symlink(target) => {
                hash_bytes(algorithm, target.to_string_lossy().as_bytes())
            }
        };
        index.insert(entry.name, checksum);
    }

    Ok(ContentInfo {
        size,
        checksum: hash_index(algorithm, &index),
    })
}

fn hash_index(algorithm: HashAlgorithm, index: &BTreeMap<String, String>) -> String {
    let mut digest = Digester::new(algorithm);
    for (path, hash) in index {
        digest.update(format!("{path}\t{hash}\n").as_bytes());
    }
    digest.finalize_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn file_hash_matches_known_digest() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "hello.txt", b"hello");

        let info = hash_path(HashAlgorithm::Sha256, &tmp.path().join("hello.txt")).unwrap();
        assert_eq!(info.size, 5);
        assert_eq!(info.checksum, HELLO_SHA256);
    }

    #[test]
    fn blake3_file_hash() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "hello.txt", b"hello");

        let info = hash_path(HashAlgorithm::Blake3, &tmp.path().join("hello.txt")).unwrap();
        assert_eq!(info.checksum, blake3::hash(b"hello").to_hex().to_string());
    }

    #[test]
    fn directory_hash_is_digest_of_sorted_index() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b/c.txt", b"hello");
        write(tmp.path(), "a.txt", b"hello");

        let info = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();

        let index = format!("a.txt\t{HELLO_SHA256}\nb/c.txt\t{HELLO_SHA256}\n");
        assert_eq!(info.checksum, hex::encode(Sha256::digest(index.as_bytes())));
        assert_eq!(info.size, 10);
    }

    #[test]
    fn creation_order_does_not_matter() {
        let one = TempDir::new().unwrap();
        write(one.path(), "lib/a.jar", b"aaa");
        write(one.path(), "lib/b.jar", b"bbb");
        write(one.path(), "bin/java", b"java");

        let two = TempDir::new().unwrap();
        write(two.path(), "bin/java", b"java");
        write(two.path(), "lib/b.jar", b"bbb");
        write(two.path(), "lib/a.jar", b"aaa");

        let h1 = hash_path(HashAlgorithm::Sha256, one.path()).unwrap();
        let h2 = hash_path(HashAlgorithm::Sha256, two.path()).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn any_change_changes_the_hash() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "lib/a.jar", b"aaa");
        write(tmp.path(), "lib/b.jar", b"bbb");
        let before = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();

        write(tmp.path(), "lib/b.jar", b"bbc");
        let modified = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();
        assert_ne!(before.checksum, modified.checksum);

        write(tmp.path(), "lib/c.jar", b"");
        let added = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();
        assert_ne!(modified.checksum, added.checksum);

        fs::remove_file(tmp.path().join("lib/c.jar")).unwrap();
        let removed = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();
        assert_eq!(modified, removed);
    }

    #[test]
    fn renaming_a_file_changes_the_hash() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.txt", b"x");
        let before = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();
        fs::rename(tmp.path().join("a.txt"), tmp.path().join("b.txt")).unwrap();
        let after = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();
        assert_ne!(before.checksum, after.checksum);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_hash_their_target_string() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "lib/libjvm.so", b"elf");
        symlink("lib/libjvm.so", tmp.path().join("libjvm.so")).unwrap();

        let info = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();
        // The link adds nothing to the size
        assert_eq!(info.size, 3);

        let target_hash = hex::encode(Sha256::digest(b"lib/libjvm.so"));
        let file_hash = hex::encode(Sha256::digest(b"elf"));
        let index = format!("lib/libjvm.so\t{file_hash}\nlibjvm.so\t{target_hash}\n");
        assert_eq!(info.checksum, hex::encode(Sha256::digest(index.as_bytes())));

        // Retargeting the link changes the directory hash
        fs::remove_file(tmp.path().join("libjvm.so")).unwrap();
        symlink("./lib/libjvm.so", tmp.path().join("libjvm.so")).unwrap();
        let retargeted = hash_path(HashAlgorithm::Sha256, tmp.path()).unwrap();
        assert_ne!(info.checksum, retargeted.checksum);
    }

    #[cfg(unix)]
    #[test]
    fn device_nodes_are_unsupported() {
        let err = hash_path(HashAlgorithm::Sha256, Path::new("/dev/null")).unwrap_err();
        assert!(matches!(err, PackError::Unsupported(_)));
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = hash_path(HashAlgorithm::Sha256, &tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, PackError::Io(_)));
    }

    #[test]
    fn walk_reports_relative_slash_names_in_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "z.txt", b"");
        write(tmp.path(), "a/b/c.txt", b"12");

        let names: Vec<_> = walk_tree(tmp.path())
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a/b/c.txt".to_string(), EntryKind::File(2)),
                ("z.txt".to_string(), EntryKind::File(0)),
            ]
        );
    }
}
