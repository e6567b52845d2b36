//! Directory-backed medium: one file per key.

use super::Medium;
use crate::error::{CacheError, Result};
use fs2::FileExt;
use lru::LruCache;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Magic bytes for the medium manifest.
const MEDIUM_MAGIC: &[u8; 4] = b"RCM\0";

/// Magic bytes for value files.
const VALUE_MAGIC: &[u8; 4] = b"RCV\0";

/// Current on-disk format version.
const FORMAT_VERSION: u8 = 1;

/// Extension of value files.
const VALUE_EXTENSION: &str = "col";

/// File medium configuration.
#[derive(Clone, Debug)]
pub struct FileMediumConfig {
    /// Directory holding the medium.
    pub path: PathBuf,

    /// Number of values kept in the read cache.
    pub cache_size: usize,

    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for FileMediumConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./cache"),
            cache_size: 64,
            create_if_missing: true,
        }
    }
}

/// A medium storing each key's value in its own checksummed file.
///
/// The directory is locked for exclusive use by this process while the
/// medium is open.
pub struct FileMedium {
    /// Directory holding value files.
    values_path: PathBuf,

    /// Root directory.
    path: PathBuf,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// LRU cache of recently read or written values.
    cache: Mutex<LruCache<String, String>>,
}

impl FileMedium {
    /// Open an existing medium or create a new one.
    pub fn open_or_create(config: FileMediumConfig) -> Result<Self> {
        if config.path.join("MANIFEST").exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(CacheError::NotInitialized)
        }
    }

    /// Create a new medium.
    pub fn create(config: FileMediumConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        fs::create_dir_all(config.path.join("values"))?;

        Self::write_manifest(&config.path)?;

        Self::init(config)
    }

    /// Open an existing medium.
    pub fn open(config: FileMediumConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;
        fs::create_dir_all(config.path.join("values"))?;

        Self::init(config)
    }

    fn init(config: FileMediumConfig) -> Result<Self> {
        let lock_file = Self::acquire_lock(&config.path)?;
        let cache_size = NonZeroUsize::new(config.cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);

        tracing::debug!(path = %config.path.display(), "opened file medium");

        Ok(Self {
            values_path: config.path.join("values"),
            path: config.path,
            _lock_file: lock_file,
            cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    /// Root directory of the medium.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All keys that currently have a value file.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.values_path)? {
            let entry = entry?;
            let file_path = entry.path();
            if file_path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            let Some(stem) = file_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(bytes) = hex::decode(stem) {
                if let Ok(key) = String::from_utf8(bytes) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Path of the file holding `key`. Keys are hex-encoded so any string is
    /// a valid file name.
    fn value_path(&self, key: &str) -> PathBuf {
        self.values_path
            .join(format!("{}.{}", hex::encode(key.as_bytes()), VALUE_EXTENSION))
    }

    fn read_value(&self, file_path: &Path) -> Result<Option<String>> {
        let bytes = match fs::read(file_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        decode_value(&bytes).map(Some)
    }

    fn write_value(&self, file_path: &Path, value: &str) -> Result<()> {
        let content = value.as_bytes();
        let mut file = File::create(file_path)?;

        file.write_all(VALUE_MAGIC)?;
        file.write_all(&[FORMAT_VERSION])?;
        file.write_all(&(content.len() as u64).to_le_bytes())?;
        file.write_all(content)?;
        file.write_all(&crc32fast::hash(content).to_le_bytes())?;

        file.sync_all()?;
        Ok(())
    }

    fn write_manifest(path: &Path) -> Result<()> {
        let mut file = File::create(path.join("MANIFEST"))?;

        file.write_all(MEDIUM_MAGIC)?;
        file.write_all(&[FORMAT_VERSION])?;
        file.sync_all()?;

        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        let mut file = File::open(path.join("MANIFEST"))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != MEDIUM_MAGIC {
            return Err(CacheError::InvalidFormat("Invalid medium magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != FORMAT_VERSION {
            return Err(CacheError::InvalidFormat(format!(
                "Unsupported medium version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join("LOCK"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| CacheError::Locked)?;

        Ok(lock_file)
    }
}

impl Medium for FileMedium {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.cache.lock().get(key).cloned() {
            return Ok(Some(value));
        }

        let value = self.read_value(&self.value_path(key))?;
        tracing::trace!(key, found = value.is_some(), "read value file");

        if let Some(ref value) = value {
            self.cache.lock().put(key.to_string(), value.clone());
        }

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // Evict first so a failed write never leaves a stale cached value.
        self.cache.lock().pop(key);
        self.write_value(&self.value_path(key), value)?;
        self.cache.lock().put(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.cache.lock().pop(key);

        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parse a value file: magic, version, u64 length, payload, crc32.
fn decode_value(bytes: &[u8]) -> Result<String> {
    const HEADER_LEN: usize = 4 + 1 + 8;

    if bytes.len() < HEADER_LEN {
        return Err(CacheError::InvalidFormat("Truncated value header".into()));
    }

    if &bytes[..4] != VALUE_MAGIC {
        return Err(CacheError::InvalidFormat("Invalid value magic".into()));
    }

    if bytes[4] != FORMAT_VERSION {
        return Err(CacheError::InvalidFormat(format!(
            "Unsupported value version: {}",
            bytes[4]
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[5..HEADER_LEN]);
    let len = u64::from_le_bytes(len_bytes) as usize;

    let body = &bytes[HEADER_LEN..];
    if body.len() != len.saturating_add(4) {
        return Err(CacheError::InvalidFormat(format!(
            "Value length mismatch: header says {} bytes, file has {}",
            len,
            body.len().saturating_sub(4)
        )));
    }

    let (content, checksum_bytes) = body.split_at(len);
    let mut stored = [0u8; 4];
    stored.copy_from_slice(checksum_bytes);
    let stored_checksum = u32::from_le_bytes(stored);
    let computed_checksum = crc32fast::hash(content);

    if stored_checksum != computed_checksum {
        return Err(CacheError::ChecksumMismatch {
            expected: stored_checksum,
            got: computed_checksum,
        });
    }

    String::from_utf8(content.to_vec()).map_err(|e| CacheError::Deserialization(e.to_string()))
}
