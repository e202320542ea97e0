//! Content-addressed object store.
//!
//! Objects live in the git-lfs standard layout
//! `<root>/<oid[0:2]>/<oid[2:4]>/<oid>`. Older stores put objects directly
//! under the root as `<root>/<oid>`; reads fall back to that flat layout,
//! writes never produce it.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::{Error, Oid, Result};

/// Mode requested for stored and downloaded objects, before the umask.
#[cfg(unix)]
const OBJECT_MODE: u32 = 0o666;

/// A directory of objects keyed by OID.
///
/// Used both for the transfer store and for git's own `.git/lfs/objects`
/// cache, which share the same sharding scheme.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Create a store rooted at the given path. Nothing is created on disk
    /// until the first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        ObjectStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the path where an object with the given OID is stored.
    pub fn object_path(&self, oid: &Oid) -> PathBuf {
        self.root
            .join(oid.shard_outer())
            .join(oid.shard_inner())
            .join(oid.as_str())
    }

    /// Get the flat, unsharded path of an object.
    pub fn legacy_path(&self, oid: &Oid) -> PathBuf {
        self.root.join(oid.as_str())
    }

    /// Find an existing object, sharded layout first.
    pub fn locate(&self, oid: &Oid) -> Option<PathBuf> {
        [self.object_path(oid), self.legacy_path(oid)]
            .into_iter()
            .find(|path| path.is_file())
    }

    /// Check if an object exists in either layout.
    pub fn contains(&self, oid: &Oid) -> bool {
        self.locate(oid).is_some()
    }

    /// Open an object for streaming read.
    pub fn open(&self, oid: &Oid) -> Result<File> {
        let path = self
            .locate(oid)
            .ok_or_else(|| Error::NotFound(oid.to_string()))?;
        Ok(File::open(path)?)
    }

    /// Create a writer that atomically stores an object when finished.
    pub fn writer(&self, oid: &Oid) -> Result<ObjectWriter> {
        ObjectWriter::create(self.object_path(oid))
    }

    /// Store an object from memory.
    pub fn put_bytes(&self, oid: &Oid, content: &[u8]) -> Result<()> {
        let mut writer = self.writer(oid)?;
        writer.write_all(content)?;
        writer.finish(None)?;
        Ok(())
    }

    /// Copy a local file into the store, returning the number of bytes stored.
    ///
    /// With `verify`, the copied bytes must hash to `oid` or nothing is stored.
    /// The source file is only ever read.
    pub fn put_file(&self, oid: &Oid, src: &Path, verify: bool) -> Result<u64> {
        let mut source = File::open(src)?;
        let mut writer = self.writer(oid)?;
        io::copy(&mut source, &mut writer)?;
        let size = writer.finish(verify.then_some(oid))?;
        debug!(oid = %oid, size, path = %self.object_path(oid).display(), "stored object");
        Ok(size)
    }

    /// Copy an object out to `dest`, replacing whatever is there.
    ///
    /// Fails with [`Error::NotFound`] when neither layout holds the object.
    pub fn copy_to(&self, oid: &Oid, dest: &Path, verify: bool) -> Result<u64> {
        let mut source = self.open(oid)?;
        let mut writer = ObjectWriter::create(dest.to_path_buf())?;
        io::copy(&mut source, &mut writer)?;
        let size = writer.finish(verify.then_some(oid))?;
        debug!(oid = %oid, size, dest = %dest.display(), "copied object out");
        Ok(size)
    }
}

/// Writer for streaming content into place.
///
/// Bytes go to a uniquely named temporary file next to the final path and
/// are renamed over it on [`ObjectWriter::finish`]. A writer dropped before
/// that removes its temporary file, so a failed copy never leaves a
/// truncated object behind.
pub struct ObjectWriter {
    file: NamedTempFile,
    hasher: Sha256,
    written: u64,
    final_path: PathBuf,
}

impl ObjectWriter {
    pub(crate) fn create(final_path: PathBuf) -> Result<Self> {
        let parent = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // create_dir_all treats a directory another process just made as success
        fs::create_dir_all(&parent)?;

        let mut builder = tempfile::Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(OBJECT_MODE));
        }
        let file = builder.tempfile_in(&parent)?;

        Ok(ObjectWriter {
            file,
            hasher: Sha256::new(),
            written: 0,
            final_path,
        })
    }

    /// Finish writing and atomically move to the final location.
    ///
    /// If `expected` is given and the written bytes hash to a different OID
    /// the temporary file is discarded and [`Error::IntegrityMismatch`] returned.
    pub fn finish(self, expected: Option<&Oid>) -> Result<u64> {
        let ObjectWriter {
            file,
            hasher,
            written,
            final_path,
        } = self;

        if let Some(expected) = expected {
            let actual = Oid::from_digest(hasher.finalize().as_slice());
            if !expected.matches(&actual) {
                return Err(Error::IntegrityMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        file.as_file().sync_all()?;
        file.persist(&final_path)?;
        Ok(written)
    }
}

impl Write for ObjectWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
