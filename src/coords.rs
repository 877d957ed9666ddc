//! Physical coordinate grids and their cache
//!
//! A coordinate grid holds, for every voxel of a volume, its physical
//! position `index * voxel_size` along each axis. Grids only depend on
//! `(shape, voxel_size)`, so they are built once and shared through a
//! bounded least-recently-used cache.

use std::collections::HashMap;
use std::sync::Arc;

use ndarray::{Array4, ArrayView3, Axis};
use parking_lot::Mutex;

use crate::error::{LsdError, Result};

/// Default number of grids kept by an engine-private cache
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Three-channel volume of physical coordinates, channel `d` holding the
/// `d`-th axis coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrid {
    data: Array4<f64>,
}

impl CoordinateGrid {
    pub fn new(shape: [usize; 3], voxel_size: [f64; 3]) -> Self {
        let data = Array4::from_shape_fn(
            (3, shape[0], shape[1], shape[2]),
            |(d, z, y, x)| [z, y, x][d] as f64 * voxel_size[d],
        );
        Self { data }
    }

    pub fn shape(&self) -> [usize; 3] {
        let s = self.data.shape();
        [s[1], s[2], s[3]]
    }

    /// Coordinates along axis `d`
    pub fn axis(&self, d: usize) -> ArrayView3<'_, f64> {
        self.data.index_axis(Axis(0), d)
    }
}

/// Cache key; voxel sizes are compared by bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GridKey {
    shape: [usize; 3],
    voxel_size: [u64; 3],
}

impl GridKey {
    fn new(shape: [usize; 3], voxel_size: [f64; 3]) -> Self {
        Self {
            shape,
            voxel_size: voxel_size.map(f64::to_bits),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    grid: Arc<CoordinateGrid>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<GridKey, CacheEntry>,
    tick: u64,
}

/// Bounded LRU cache of coordinate grids, safe to share between threads.
///
/// A grid is built while the lock is held, so concurrent first requests for
/// the same key build it once.
#[derive(Debug)]
pub struct CoordinateCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Default for CoordinateCache {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            state: Mutex::new(CacheState::default()),
        }
    }
}

impl CoordinateCache {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(LsdError::InvalidCacheCapacity);
        }
        Ok(Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, shape: [usize; 3], voxel_size: [f64; 3]) -> bool {
        self.state
            .lock()
            .entries
            .contains_key(&GridKey::new(shape, voxel_size))
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Grid for `(shape, voxel_size)`, built on first use.
    pub fn get_grid(&self, shape: [usize; 3], voxel_size: [f64; 3]) -> Arc<CoordinateGrid> {
        let key = GridKey::new(shape, voxel_size);
        let mut state = self.state.lock();
        state.tick += 1;
        let tick = state.tick;

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.last_used = tick;
            return Arc::clone(&entry.grid);
        }

        tracing::debug!("Creating coordinate grid for shape {:?}, voxel size {:?}", shape, voxel_size);
        let grid = Arc::new(CoordinateGrid::new(shape, voxel_size));

        if state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| *key);
            if let Some(oldest) = oldest {
                tracing::trace!("Evicting coordinate grid {:?}", oldest);
                state.entries.remove(&oldest);
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                grid: Arc::clone(&grid),
                last_used: tick,
            },
        );
        grid
    }
}
