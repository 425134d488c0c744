//! Sharded, content-addressed blob store on the local filesystem
//!
//! Layout:
//! ```text
//! <root>/<shard>/<digest>        # collision index 0
//! <root>/<shard>/<digest>-<k>    # collision index k >= 1
//! ```
//!
//! `<shard>` is the first two hex characters of the digest. Blobs are
//! write-once: a file, once published, is never modified.
//!
//! Writers stage the payload in a temporary file inside the shard directory
//! and publish it with an atomic no-clobber rename. A slot is therefore either
//! absent or holds a complete payload, and two writers can never both claim
//! the same slot. No lock is held across the store.

use crate::model::{BlobKey, CollisionIndex, Digest};
use crate::store::hasher::{ContentHasher, Md5Hasher};
use crate::{Error, Result};
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Prefix of staging files; never a valid blob name.
///
/// A writer that dies between staging and publishing leaves its staging file
/// behind. Nothing removes these automatically; [`BlobStore::stats`] counts
/// them so they can be cleaned up out of band.
const STAGING_PREFIX: &str = ".incoming-";

/// Mode of published blobs, matching the group-shared shard directories
#[cfg(unix)]
const BLOB_MODE: u32 = 0o660;

/// Result of a [`BlobStore::put`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PutOutcome {
    /// Where the payload lives
    pub key: BlobKey,
    /// False when identical bytes were already stored
    pub written: bool,
}

/// Aggregate numbers for a store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Number of stored blobs
    pub blobs: usize,
    /// Blobs living in a collision slot (index >= 1)
    pub collisions: usize,
    /// Total payload bytes
    pub bytes: u64,
    /// Leftover staging files from writers that never published
    pub staging: usize,
}

/// A content-addressed blob store rooted at one directory
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
    hasher: Arc<dyn ContentHasher>,
}

impl BlobStore {
    /// Create a store using MD5 digests.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_hasher(root, Md5Hasher)
    }

    /// Create a store with a custom hasher
    pub fn with_hasher(root: impl Into<PathBuf>, hasher: impl ContentHasher + 'static) -> Self {
        BlobStore {
            root: root.into(),
            hasher: Arc::new(hasher),
        }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the hasher's algorithm name
    pub fn hasher_name(&self) -> &str {
        self.hasher.name()
    }

    /// Compute the digest of a payload without storing it
    pub fn digest(&self, payload: &[u8]) -> Digest {
        self.hasher.digest(payload)
    }

    /// Absolute path of a blob
    pub fn path_for(&self, key: &BlobKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Check if a blob file exists
    pub fn contains(&self, key: &BlobKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Store a payload, returning the key it is addressable by.
    ///
    /// Storing bytes that are already present is a no-op returning the
    /// existing key. When the canonical slot holds different bytes with the
    /// same digest, collision slots `1, 2, ...` are probed in order: a slot
    /// with matching bytes is reused, and the first free slot is claimed.
    pub fn put(&self, payload: &[u8]) -> Result<PutOutcome> {
        let digest = self.hasher.digest(payload);
        let shard_dir = self.root.join(digest.shard());
        create_dir(&shard_dir).map_err(|e| Error::write(&shard_dir, e))?;

        let mut staged: Option<NamedTempFile> = None;
        let mut collision: CollisionIndex = 0;

        loop {
            let key = BlobKey::new(digest, collision);
            let path = shard_dir.join(key.file_name());

            match stored_equals(&path, payload).map_err(|e| Error::write(&path, e))? {
                Some(true) => {
                    debug!(key = %key, "payload already stored");
                    return Ok(PutOutcome {
                        key,
                        written: false,
                    });
                }
                Some(false) => {
                    if collision == 0 {
                        warn!(digest = %digest, "digest collision, probing collision slots");
                    }
                    collision = collision.checked_add(1).ok_or_else(|| {
                        Error::write(
                            &path,
                            io::Error::new(ErrorKind::Other, "collision slots exhausted"),
                        )
                    })?;
                }
                None => {
                    let tmp = match staged.take() {
                        Some(tmp) => tmp,
                        None => stage(&shard_dir, payload)?,
                    };
                    match tmp.persist_noclobber(&path) {
                        Ok(_) => {
                            sync_dir(&shard_dir).map_err(|e| Error::write(&shard_dir, e))?;
                            debug!(key = %key, size = payload.len(), "stored blob");
                            return Ok(PutOutcome { key, written: true });
                        }
                        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                            // Another writer published this slot first; compare against it.
                            debug!(key = %key, "slot claimed concurrently, re-checking");
                            staged = Some(e.file);
                        }
                        Err(e) => return Err(Error::write(&path, e.error)),
                    }
                }
            }
        }
    }

    /// Read a blob.
    ///
    /// `Ok(None)` means no file exists for the key; any other read failure
    /// is returned as an error.
    pub fn try_get(&self, digest: &Digest, collision: CollisionIndex) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(&BlobKey::new(*digest, collision));
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a blob, treating any read failure as "no content".
    ///
    /// Metadata and blob storage can drift apart (moved or misconfigured
    /// roots, permissions), and callers treat a missing body as a normal
    /// state. Stored bytes are not re-hashed here; see [`verify`](Self::verify).
    pub fn get(&self, digest: &Digest, collision: CollisionIndex) -> Option<Vec<u8>> {
        match self.try_get(digest, collision) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(digest = %digest, collision, error = %e, "unreadable blob treated as absent");
                None
            }
        }
    }

    /// Read a blob addressed by a hex digest string.
    ///
    /// An empty digest means nothing was ever stored and yields `None`, as
    /// does a malformed one.
    pub fn get_hex(&self, digest: &str, collision: CollisionIndex) -> Option<Vec<u8>> {
        if digest.is_empty() {
            return None;
        }
        match Digest::from_hex(digest) {
            Ok(d) => self.get(&d, collision),
            Err(e) => {
                warn!(error = %e, "malformed digest treated as absent");
                None
            }
        }
    }

    /// Re-hash a stored blob and check it against its key
    pub fn verify(&self, key: &BlobKey) -> Result<()> {
        let bytes = self
            .try_get(&key.digest, key.collision)?
            .ok_or_else(|| Error::NotFound(key.to_string()))?;
        let actual = self.hasher.digest(&bytes);
        if actual != key.digest {
            return Err(Error::IntegrityMismatch {
                key: key.to_string(),
                actual: actual.to_hex(),
            });
        }
        Ok(())
    }

    /// List every stored blob, sorted by digest then collision index.
    ///
    /// Staging files and names that are not blob names are skipped, as are
    /// blobs sitting in the wrong shard.
    pub fn keys(&self) -> Result<Vec<BlobKey>> {
        let shards = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for shard in shards {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            let shard_name = shard.file_name();
            let Some(shard_name) = shard_name.to_str() else {
                continue;
            };

            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                let name = entry.file_name();
                let Some(key) = name.to_str().and_then(BlobKey::parse_file_name) else {
                    continue;
                };
                if key.digest.shard() == shard_name && entry.file_type()?.is_file() {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Count blobs, collision slots and bytes
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();
        for key in self.keys()? {
            stats.blobs += 1;
            if key.collision > 0 {
                stats.collisions += 1;
            }
            stats.bytes += fs::metadata(self.path_for(&key))?.len();
        }
        stats.staging = self.staging_files()?.len();
        Ok(stats)
    }

    /// Staging files currently present in any shard
    pub fn staging_files(&self) -> Result<Vec<PathBuf>> {
        let shards = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for shard in shards {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                let is_staging = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(STAGING_PREFIX));
                if is_staging {
                    files.push(entry.path());
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("root", &self.root)
            .field("hasher", &self.hasher.name())
            .finish()
    }
}

/// Create a directory and its parents; an existing directory is success
fn create_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o770);
    }
    builder.create(path)
}

/// Compare the file at `path` with `payload`; `None` if there is no file
fn stored_equals(path: &Path, payload: &[u8]) -> io::Result<Option<bool>> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if meta.len() != payload.len() as u64 {
        return Ok(Some(false));
    }
    match fs::read(path) {
        Ok(stored) => Ok(Some(stored == payload)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write the payload to a synced temporary file in `dir`
fn stage(dir: &Path, payload: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| Error::write(dir, e))?;
    tmp.write_all(payload)
        .and_then(|_| set_blob_mode(tmp.as_file()))
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::write(tmp.path(), e))?;
    Ok(tmp)
}

/// Temp files start out owner-only; published blobs must be group-readable
#[cfg(unix)]
fn set_blob_mode(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(BLOB_MODE))
}

#[cfg(not(unix))]
fn set_blob_mode(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
