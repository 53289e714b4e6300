use std::collections::VecDeque;
use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::cache::FileCache;
use crate::error::{FileError, FileResult};

#[derive(Debug, Clone)]
pub struct FileRequest {
    pub filename: String,
    pub arena: String,
    pub index: u16,
    pub size: u32,
    pub checksum: u32,
    pub decompress: bool,
}

/// What the caller should do after calling into the requester.
pub enum RequestOutcome {
    /// The file was already cached; here are its (decompressed) bytes.
    CacheHit(Vec<u8>),
    /// Nothing else is downloading, so this request became `current` —
    /// the caller must send a `FileRequest` wire packet for `index`.
    SendNow(u16),
    /// Something else is already downloading; this request is queued and
    /// will be sent once the requests ahead of it complete.
    Queued,
}

/// Serializes zone file downloads (maps, LVZ packages) one at a time,
/// exactly as the original does with its intrusive linked list — the zone
/// server only answers one `FileRequest` at a time per connection. Queued
/// requests here are a plain FIFO instead of a free-list-backed linked
/// list since there's no arena allocator to economize against.
pub struct FileRequester {
    cache: FileCache,
    queue: VecDeque<FileRequest>,
    current: Option<FileRequest>,
}

impl FileRequester {
    pub fn new(cache: FileCache) -> Self {
        FileRequester { cache, queue: VecDeque::new(), current: None }
    }

    /// Mirrors `FileRequester::Request`: resolve from cache immediately if
    /// possible, otherwise enqueue and report whether the caller needs to
    /// kick off a download right now.
    pub fn request(&mut self, filename: impl Into<String>, arena: impl Into<String>, index: u16, size: u32, checksum: u32, decompress: bool) -> FileResult<RequestOutcome> {
        let filename = filename.into();
        let arena = arena.into();

        if let Some(cached) = self.cache.lookup(&arena, &filename, checksum)? {
            return Ok(RequestOutcome::CacheHit(cached));
        }

        let request = FileRequest { filename, arena, index, size, checksum, decompress };

        if self.current.is_none() {
            self.current = Some(request);
            Ok(RequestOutcome::SendNow(self.current.as_ref().unwrap().index))
        } else {
            self.queue.push_back(request);
            Ok(RequestOutcome::Queued)
        }
    }

    pub fn current(&self) -> Option<&FileRequest> {
        self.current.as_ref()
    }

    /// Completes the in-flight download: decompresses if requested,
    /// writes the result into the cache, advances to the next queued
    /// request (if any), and returns the decoded bytes plus the request
    /// the caller should now send (if the queue wasn't empty).
    pub fn on_file_received(&mut self, raw: &[u8]) -> FileResult<(Vec<u8>, Option<u16>)> {
        let request = self.current.take().ok_or_else(|| FileError::Inflate { filename: "<none>".into(), size: raw.len() })?;

        let data = if request.decompress {
            let mut decoder = DeflateDecoder::new(raw);
            let mut out = Vec::with_capacity(request.size as usize);
            decoder.read_to_end(&mut out).map_err(|_| FileError::Inflate { filename: request.filename.clone(), size: raw.len() })?;
            out
        } else {
            raw.to_vec()
        };

        self.cache.store(&request.arena, &request.filename, &data)?;

        self.current = self.queue.pop_front();
        let next_index = self.current.as_ref().map(|r| r.index);

        Ok((data, next_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requester() -> FileRequester {
        let root = std::env::temp_dir().join(format!("subspace-files-requester-test-{}", std::process::id()));
        FileRequester::new(FileCache::new(root))
    }

    #[test]
    fn first_request_sends_immediately() {
        let mut requester = requester();
        let outcome = requester.request("map.lvl", "arena", 1, 100, 0, false).unwrap();
        assert!(matches!(outcome, RequestOutcome::SendNow(1)));
    }

    #[test]
    fn second_request_queues_behind_the_first() {
        let mut requester = requester();
        requester.request("a.lvl", "arena", 1, 100, 0, false).unwrap();
        let outcome = requester.request("b.lvl", "arena", 2, 100, 0, false).unwrap();
        assert!(matches!(outcome, RequestOutcome::Queued));
    }

    #[test]
    fn completing_a_download_advances_to_the_queued_request() {
        let mut requester = requester();
        requester.request("a.lvl", "arena", 1, 4, 0, false).unwrap();
        requester.request("b.lvl", "arena", 2, 4, 0, false).unwrap();

        let (data, next) = requester.on_file_received(b"data").unwrap();
        assert_eq!(data, b"data");
        assert_eq!(next, Some(2));
    }
}
