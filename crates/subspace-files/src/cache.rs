use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{FileError, FileResult};

/// The on-disk cache of zone-downloaded files (maps, LVZ packages), one
/// subdirectory per arena, mirroring the original's `zones/<server>/`
/// layout so a previously-downloaded file with a matching CRC32 never
/// needs to be requested again.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileCache { root: root.into() }
    }

    fn path_for(&self, arena: &str, filename: &str) -> PathBuf {
        self.root.join(arena).join(filename)
    }

    /// Returns the cached bytes if a file exists for `filename` under
    /// `arena` and its CRC32 matches `checksum`; otherwise `None`.
    pub fn lookup(&self, arena: &str, filename: &str, checksum: u32) -> FileResult<Option<Vec<u8>>> {
        let path = self.path_for(arena, filename);

        let mut file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FileError::Io { path: path.display().to_string(), source: e }),
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|e| FileError::Io { path: path.display().to_string(), source: e })?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data);
        let actual = hasher.finalize();

        if actual != checksum {
            return Ok(None);
        }

        Ok(Some(data))
    }

    /// Writes `data` into the cache, creating the arena subdirectory if
    /// needed.
    pub fn store(&self, arena: &str, filename: &str, data: &[u8]) -> FileResult<()> {
        let dir = self.root.join(arena);
        fs::create_dir_all(&dir).map_err(|e| FileError::Io { path: dir.display().to_string(), source: e })?;

        let path = self.path_for(arena, filename);
        fs::write(&path, data).map_err(|e| FileError::Io { path: path.display().to_string(), source: e })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_none_for_missing_file() {
        let cache = FileCache::new(std::env::temp_dir().join("subspace-files-test-missing"));
        let result = cache.lookup("arena", "nonexistent.lvl", 0).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn store_then_lookup_round_trips_with_matching_checksum() {
        let root = std::env::temp_dir().join(format!("subspace-files-test-{}", std::process::id()));
        let cache = FileCache::new(&root);

        let data = b"hello map data".to_vec();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data);
        let checksum = hasher.finalize();

        cache.store("test-arena", "test.lvl", &data).unwrap();
        let found = cache.lookup("test-arena", "test.lvl", checksum).unwrap();
        assert_eq!(found, Some(data));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn lookup_rejects_checksum_mismatch() {
        let root = std::env::temp_dir().join(format!("subspace-files-test-mismatch-{}", std::process::id()));
        let cache = FileCache::new(&root);

        cache.store("test-arena", "test.lvl", b"data").unwrap();
        let found = cache.lookup("test-arena", "test.lvl", 0xDEAD_BEEF).unwrap();
        assert!(found.is_none());

        let _ = fs::remove_dir_all(&root);
    }
}
