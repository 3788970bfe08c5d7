//! Thread-safe cache of loaded clips keyed by source path

use crate::clip::AnimClip;
use crate::error::Result;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hit and miss counters of a [`ClipCache`]
#[derive(Debug, Default)]
pub struct CacheStatistics {
    /// Loads answered from the cache
    pub hits: AtomicU64,
    /// Loads that read the file
    pub misses: AtomicU64,
}

impl CacheStatistics {
    /// Hit rate from 0.0 to 1.0
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Loaded clips shared by path
#[derive(Debug, Default)]
pub struct ClipCache {
    clips: RwLock<HashMap<PathBuf, Arc<AnimClip>>>,
    stats: CacheStatistics,
}

impl ClipCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a clip, answering from the cache when possible
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<AnimClip>> {
        self.load_with(path, true, true)
    }

    /// Re-read a clip from disk and replace the cached instance
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<Arc<AnimClip>> {
        self.load_with(path, false, true)
    }

    /// Load a clip with explicit cache behavior.
    ///
    /// `allow_from_cache` lets a cached instance answer; `save_to_cache`
    /// stores a freshly read clip.
    pub fn load_with(
        &self,
        path: impl AsRef<Path>,
        allow_from_cache: bool,
        save_to_cache: bool,
    ) -> Result<Arc<AnimClip>> {
        let path = path.as_ref();

        if allow_from_cache && let Some(found) = self.clips.read().get(path) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(found));
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Reading clip from {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        let loaded = Arc::new(AnimClip::from_reader(reader)?);

        if save_to_cache {
            self.clips
                .write()
                .insert(path.to_path_buf(), Arc::clone(&loaded));
        }
        Ok(loaded)
    }

    /// Cached clip for a path, without touching the disk
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<AnimClip>> {
        self.clips.read().get(path.as_ref()).cloned()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.clips.read().contains_key(path.as_ref())
    }

    /// Drop one cached clip; live `Arc`s stay valid
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Arc<AnimClip>> {
        self.clips.write().remove(path.as_ref())
    }

    /// Drop every cached clip
    pub fn clear(&self) {
        self.clips.write().clear();
    }

    pub fn len(&self) -> usize {
        self.clips.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.read().is_empty()
    }

    pub fn statistics(&self) -> &CacheStatistics {
        &self.stats
    }
}
