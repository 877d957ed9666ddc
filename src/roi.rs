//! Voxel-space regions of interest
//!
//! A `Roi` is an axis-aligned box given by a signed offset and a shape, in
//! `(z, y, x)` voxel order. Offsets are signed so that a box grown by some
//! context may extend past the origin before it is intersected with a volume.

use std::fmt;

use ndarray::{s, ArrayView3};

/// Axis-aligned voxel box: `offset` is the first voxel, `shape` the extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Roi {
    pub offset: [i64; 3],
    pub shape: [usize; 3],
}

impl Roi {
    pub fn new(offset: [i64; 3], shape: [usize; 3]) -> Self {
        Self { offset, shape }
    }

    /// Box covering a whole volume of the given shape
    pub fn from_shape(shape: [usize; 3]) -> Self {
        Self { offset: [0; 3], shape }
    }

    /// Build a box from inclusive begin and exclusive end corners.
    /// Axes where `end <= begin` get an empty extent.
    pub fn from_bounds(begin: [i64; 3], end: [i64; 3]) -> Self {
        let mut shape = [0usize; 3];
        for d in 0..3 {
            shape[d] = (end[d] - begin[d]).max(0) as usize;
        }
        Self { offset: begin, shape }
    }

    pub fn begin(&self) -> [i64; 3] {
        self.offset
    }

    pub fn end(&self) -> [i64; 3] {
        [
            self.offset[0] + self.shape[0] as i64,
            self.offset[1] + self.shape[1] as i64,
            self.offset[2] + self.shape[2] as i64,
        ]
    }

    /// Number of voxels in the box
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Grow the box by `neg` voxels before and `pos` voxels after on each axis
    pub fn grow(&self, neg: [usize; 3], pos: [usize; 3]) -> Self {
        let mut offset = self.offset;
        let mut shape = self.shape;
        for d in 0..3 {
            offset[d] -= neg[d] as i64;
            shape[d] += neg[d] + pos[d];
        }
        Self { offset, shape }
    }

    pub fn shift(&self, by: [i64; 3]) -> Self {
        Self {
            offset: [
                self.offset[0] + by[0],
                self.offset[1] + by[1],
                self.offset[2] + by[2],
            ],
            shape: self.shape,
        }
    }

    pub fn intersect(&self, other: &Roi) -> Self {
        let (a, b) = (self.end(), other.end());
        let mut begin = [0i64; 3];
        let mut end = [0i64; 3];
        for d in 0..3 {
            begin[d] = self.offset[d].max(other.offset[d]);
            end[d] = a[d].min(b[d]);
        }
        Self::from_bounds(begin, end)
    }

    /// Smallest box containing both boxes. An empty box does not contribute.
    pub fn union(&self, other: &Roi) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let (a, b) = (self.end(), other.end());
        let mut begin = [0i64; 3];
        let mut end = [0i64; 3];
        for d in 0..3 {
            begin[d] = self.offset[d].min(other.offset[d]);
            end[d] = a[d].max(b[d]);
        }
        Self::from_bounds(begin, end)
    }

    /// Whether `other` lies completely inside this box
    pub fn contains(&self, other: &Roi) -> bool {
        let (a, b) = (self.end(), other.end());
        (0..3).all(|d| other.offset[d] >= self.offset[d] && b[d] <= a[d])
    }

    /// View of `volume` restricted to this box.
    ///
    /// The caller guarantees that the box lies inside the volume; see
    /// [`Roi::contains`] with [`Roi::from_shape`].
    pub fn crop<'a, T>(&self, volume: ArrayView3<'a, T>) -> ArrayView3<'a, T> {
        let b = self.begin().map(|v| v as isize);
        let e = self.end().map(|v| v as isize);
        volume.slice_move(s![b[0]..e[0], b[1]..e[1], b[2]..e[2]])
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?} (shape {:?})", self.begin(), self.end(), self.shape)
    }
}
