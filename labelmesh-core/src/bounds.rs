//! Axis-aligned integer index ranges

use crate::point::Index3;
use serde::{Deserialize, Serialize};

/// Inclusive axis-aligned index range `[min, max]` on every axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Index3,
    pub max: Index3,
}

impl Bounds {
    /// Create bounds from inclusive corners
    pub fn new(min: Index3, max: Index3) -> Self {
        Self { min, max }
    }

    /// Bounds starting at `min` covering `extent` samples per axis
    pub fn from_min_extent(min: Index3, extent: Index3) -> Self {
        Self {
            min,
            max: [
                min[0] + extent[0] - 1,
                min[1] + extent[1] - 1,
                min[2] + extent[2] - 1,
            ],
        }
    }

    /// Number of samples along `axis` (zero or negative when degenerate)
    pub fn extent(&self, axis: usize) -> i64 {
        self.max[axis] - self.min[axis] + 1
    }

    /// Sample counts along all three axes
    pub fn extents(&self) -> Index3 {
        [self.extent(0), self.extent(1), self.extent(2)]
    }

    /// True when any axis spans no samples
    pub fn is_degenerate(&self) -> bool {
        (0..3).any(|axis| self.extent(axis) <= 0)
    }

    /// Total number of samples, zero when degenerate
    pub fn sample_count(&self) -> u64 {
        if self.is_degenerate() {
            return 0;
        }
        self.extents().iter().map(|&e| e as u64).product()
    }

    pub fn contains(&self, index: Index3) -> bool {
        (0..3).all(|axis| index[axis] >= self.min[axis] && index[axis] <= self.max[axis])
    }

    /// Overlap of two ranges; may be degenerate
    pub fn intersection(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: [
                self.min[0].max(other.min[0]),
                self.min[1].max(other.min[1]),
                self.min[2].max(other.min[2]),
            ],
            max: [
                self.max[0].min(other.max[0]),
                self.max[1].min(other.max[1]),
                self.max[2].min(other.max[2]),
            ],
        }
    }

    /// Shift both corners by `delta`
    pub fn translated(&self, delta: Index3) -> Bounds {
        Bounds {
            min: [
                self.min[0] + delta[0],
                self.min[1] + delta[1],
                self.min[2] + delta[2],
            ],
            max: [
                self.max[0] + delta[0],
                self.max[1] + delta[1],
                self.max[2] + delta[2],
            ],
        }
    }

    /// Iterate every index in x-fastest order
    pub fn indices(&self) -> impl Iterator<Item = Index3> {
        let Bounds { min, max } = *self;
        (min[2]..=max[2]).flat_map(move |z| {
            (min[1]..=max[1]).flat_map(move |y| (min[0]..=max[0]).map(move |x| [x, y, z]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_and_degeneracy() {
        let bounds = Bounds::new([0, 0, 0], [3, 4, 5]);
        assert_eq!(bounds.extents(), [4, 5, 6]);
        assert_eq!(bounds.sample_count(), 120);
        assert!(!bounds.is_degenerate());

        // A single sample is still a valid range
        assert!(!Bounds::new([2, 2, 2], [2, 2, 2]).is_degenerate());
        assert!(Bounds::new([0, 0, 0], [3, -1, 3]).is_degenerate());
        assert_eq!(Bounds::new([0, 0, 0], [3, -1, 3]).sample_count(), 0);
    }

    #[test]
    fn test_from_min_extent() {
        let bounds = Bounds::from_min_extent([-2, 0, 5], [4, 1, 2]);
        assert_eq!(bounds, Bounds::new([-2, 0, 5], [1, 0, 6]));
    }

    #[test]
    fn test_intersection_and_contains() {
        let a = Bounds::new([0, 0, 0], [9, 9, 9]);
        let b = Bounds::new([5, -3, 8], [12, 4, 20]);
        let overlap = a.intersection(&b);
        assert_eq!(overlap, Bounds::new([5, 0, 8], [9, 4, 9]));
        assert!(overlap.contains([5, 4, 9]));
        assert!(!overlap.contains([4, 4, 9]));

        let disjoint = a.intersection(&Bounds::new([20, 20, 20], [30, 30, 30]));
        assert!(disjoint.is_degenerate());
    }

    #[test]
    fn test_indices_visit_every_sample_once() {
        let bounds = Bounds::new([-1, 0, 2], [1, 1, 3]);
        let visited: Vec<Index3> = bounds.indices().collect();
        assert_eq!(visited.len() as u64, bounds.sample_count());
        assert_eq!(visited[0], [-1, 0, 2]);
        assert_eq!(visited[1], [0, 0, 2]);
        assert_eq!(*visited.last().unwrap(), [1, 1, 3]);
    }

    #[test]
    fn test_translated() {
        let bounds = Bounds::new([0, 0, 0], [2, 2, 2]).translated([1, -1, 10]);
        assert_eq!(bounds, Bounds::new([1, -1, 10], [3, 1, 12]));
    }
}
