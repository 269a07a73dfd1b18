//! Logo and image handling
//!
//! Rendering a batch of chapters reuses the same cover logo over and over,
//! so image bytes are cached per path. The cache is an owned value handed
//! around by the caller, never a process-wide singleton, and it can be
//! cleared explicitly between batches.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Capacity-bounded cache of image bytes keyed by source path.
///
/// Least recently used entries are evicted first once the capacity is
/// reached.
pub struct ImageCache {
    capacity: usize,
    items: HashMap<PathBuf, Vec<u8>>,
    order: Vec<PathBuf>,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
        }
    }

    /// Bytes for `path`, reading the file on a cache miss.
    pub fn load(&mut self, path: &Path) -> io::Result<&[u8]> {
        if !self.items.contains_key(path) {
            let bytes = fs::read(path)?;
            self.insert(path.to_path_buf(), bytes);
        }
        self.touch(path);
        Ok(self.items[path].as_slice())
    }

    pub fn get(&mut self, path: &Path) -> Option<&[u8]> {
        if self.items.contains_key(path) {
            self.touch(path);
            self.items.get(path).map(|bytes| bytes.as_slice())
        } else {
            None
        }
    }

    pub fn insert(&mut self, path: PathBuf, bytes: Vec<u8>) {
        if self.items.len() >= self.capacity && !self.items.contains_key(&path) {
            if let Some(oldest) = self.order.first().cloned() {
                self.items.remove(&oldest);
                self.order.remove(0);
            }
        }

        self.order.retain(|p| p != &path);
        self.order.push(path.clone());
        self.items.insert(path, bytes);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn touch(&mut self, path: &Path) {
        self.order.retain(|p| p != path);
        self.order.push(path.to_path_buf());
    }
}

/// MIME type guessed from magic bytes, for the formats covers actually use.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
