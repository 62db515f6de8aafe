//! Bounded multi-asset inventory grid.
//!
//! Enumerates the box [-Q_1, Q_1] x ... x [-Q_d, Q_d] of integer inventory
//! vectors in lexicographic order and provides the coordinate/index mapping
//! plus per-axis fill-eligibility and neighbor operators the transform
//! solver and quote extraction are built on.

use crate::error::{EngineError, Result};

/// Finite Cartesian product of per-asset inventory levels.
///
/// The ordering is lexicographic with the last axis varying fastest, encoded
/// by a stride table. Along axis `i` the level `q_i` occupies offset
/// `q_i + Q_i` in `0..=2*Q_i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryGrid {
    bounds: Vec<i64>,
    dims: Vec<usize>,
    strides: Vec<usize>,
    len: usize,
}

impl InventoryGrid {
    /// Build the grid for the given per-asset bounds.
    ///
    /// Fails if `bounds` is empty, any bound is zero, or the total number of
    /// grid points would exceed `max_points`. Grid size is exponential in
    /// the number of assets, so the cap is enforced here rather than at
    /// allocation time.
    pub fn new(bounds: &[u32], max_points: usize) -> Result<Self> {
        if bounds.is_empty() {
            return Err(EngineError::Configuration(
                "at least one asset is required".to_string(),
            ));
        }
        for (i, &q) in bounds.iter().enumerate() {
            if q < 1 {
                return Err(EngineError::Configuration(format!(
                    "inventory bound for asset {} must be at least 1",
                    i
                )));
            }
        }

        let dims: Vec<usize> = bounds.iter().map(|&q| 2 * q as usize + 1).collect();
        let mut len = 1usize;
        for &dim in &dims {
            len = len.checked_mul(dim).ok_or_else(|| {
                EngineError::Configuration("inventory grid size overflows usize".to_string())
            })?;
            if len > max_points {
                return Err(EngineError::Configuration(format!(
                    "inventory grid would exceed {} points",
                    max_points
                )));
            }
        }

        let mut strides = vec![1usize; dims.len()];
        for axis in (0..dims.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * dims[axis + 1];
        }

        Ok(Self {
            bounds: bounds.iter().map(|&q| q as i64).collect(),
            dims,
            strides,
            len,
        })
    }

    /// Number of quoted assets (grid dimensions).
    pub fn num_assets(&self) -> usize {
        self.bounds.len()
    }

    /// Total number of inventory states.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Per-asset inventory bounds Q_i.
    pub fn bounds(&self) -> &[i64] {
        &self.bounds
    }

    /// Linear index of an inventory vector, or a configuration error if the
    /// vector has the wrong dimension or leaves the box.
    pub fn index_of(&self, inventory: &[i64]) -> Result<usize> {
        if inventory.len() != self.bounds.len() {
            return Err(EngineError::Configuration(format!(
                "inventory vector has {} entries, grid has {} assets",
                inventory.len(),
                self.bounds.len()
            )));
        }
        let mut index = 0usize;
        for (axis, &q) in inventory.iter().enumerate() {
            if q.abs() > self.bounds[axis] {
                return Err(EngineError::Configuration(format!(
                    "inventory {} for asset {} is outside [-{}, {}]",
                    q, axis, self.bounds[axis], self.bounds[axis]
                )));
            }
            index += (q + self.bounds[axis]) as usize * self.strides[axis];
        }
        Ok(index)
    }

    /// Inventory vector at a linear index, written into `out`.
    pub fn coords_of(&self, index: usize, out: &mut [i64]) {
        debug_assert!(index < self.len);
        debug_assert_eq!(out.len(), self.bounds.len());
        for axis in 0..self.bounds.len() {
            out[axis] = self.axis_offset(index, axis) as i64 - self.bounds[axis];
        }
    }

    /// Offset of `index` along `axis`, in `0..dims[axis]`.
    #[inline]
    fn axis_offset(&self, index: usize, axis: usize) -> usize {
        (index / self.strides[axis]) % self.dims[axis]
    }

    /// Whether a buy fill in `axis` keeps the state in bounds (q_i < Q_i).
    #[inline]
    pub fn can_bid(&self, index: usize, axis: usize) -> bool {
        self.axis_offset(index, axis) + 1 < self.dims[axis]
    }

    /// Whether a sell fill in `axis` keeps the state in bounds (q_i > -Q_i).
    #[inline]
    pub fn can_ask(&self, index: usize, axis: usize) -> bool {
        self.axis_offset(index, axis) > 0
    }

    /// Neighbor after a buy fill, q + e_i. Caller must check `can_bid`.
    #[inline]
    pub fn shift_up(&self, index: usize, axis: usize) -> usize {
        debug_assert!(self.can_bid(index, axis));
        index + self.strides[axis]
    }

    /// Neighbor after a sell fill, q - e_i. Caller must check `can_ask`.
    #[inline]
    pub fn shift_down(&self, index: usize, axis: usize) -> usize {
        debug_assert!(self.can_ask(index, axis));
        index - self.strides[axis]
    }

    /// Linear index of the zero-inventory state, derived from the configured
    /// bounds. The flat-inventory point sits at offset Q_i on every axis, so
    /// it is not a fixed coordinate unless every bound equals one.
    pub fn zero_index(&self) -> usize {
        self.bounds
            .iter()
            .zip(&self.strides)
            .map(|(&q, &s)| q as usize * s)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip() {
        let grid = InventoryGrid::new(&[2, 1, 3], 1 << 20).unwrap();
        assert_eq!(grid.len(), 5 * 3 * 7);
        let mut coords = vec![0i64; 3];
        for index in 0..grid.len() {
            grid.coords_of(index, &mut coords);
            assert_eq!(grid.index_of(&coords).unwrap(), index);
        }
    }

    #[test]
    fn lexicographic_order_is_stable() {
        let grid = InventoryGrid::new(&[1, 1], 1 << 20).unwrap();
        // Last axis fastest: (-1,-1), (-1,0), (-1,1), (0,-1), ...
        assert_eq!(grid.index_of(&[-1, -1]).unwrap(), 0);
        assert_eq!(grid.index_of(&[-1, 0]).unwrap(), 1);
        assert_eq!(grid.index_of(&[-1, 1]).unwrap(), 2);
        assert_eq!(grid.index_of(&[0, -1]).unwrap(), 3);
        assert_eq!(grid.index_of(&[1, 1]).unwrap(), 8);
    }

    #[test]
    fn eligibility_masks_match_bounds() {
        let grid = InventoryGrid::new(&[2, 1], 1 << 20).unwrap();
        let top = grid.index_of(&[2, 0]).unwrap();
        assert!(!grid.can_bid(top, 0));
        assert!(grid.can_ask(top, 0));
        assert!(grid.can_bid(top, 1));

        let bottom = grid.index_of(&[0, -1]).unwrap();
        assert!(grid.can_bid(bottom, 1));
        assert!(!grid.can_ask(bottom, 1));

        let mut coords = vec![0i64; 2];
        let up = grid.shift_up(bottom, 1);
        grid.coords_of(up, &mut coords);
        assert_eq!(coords, vec![0, 0]);
    }

    #[test]
    fn zero_index_handles_asymmetric_bounds() {
        let grid = InventoryGrid::new(&[3, 1, 2], 1 << 20).unwrap();
        let mut coords = vec![0i64; 3];
        grid.coords_of(grid.zero_index(), &mut coords);
        assert_eq!(coords, vec![0, 0, 0]);
    }

    #[test]
    fn rejects_degenerate_bounds() {
        assert!(InventoryGrid::new(&[], 1 << 20).is_err());
        assert!(InventoryGrid::new(&[1, 0], 1 << 20).is_err());
    }

    #[test]
    fn rejects_oversized_grid() {
        // 21^7 states is far past the cap.
        assert!(InventoryGrid::new(&[10; 7], 1 << 20).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_inventory() {
        let grid = InventoryGrid::new(&[1, 1], 1 << 20).unwrap();
        assert!(grid.index_of(&[2, 0]).is_err());
        assert!(grid.index_of(&[0]).is_err());
    }
}
