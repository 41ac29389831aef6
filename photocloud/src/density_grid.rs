/// A cubic `size` × `size` × `size` grid of non-negative occupancy weights.
///
/// Cells live in one flat `Vec<f32>` indexed by `x * size * size + y * size + z`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    size: usize,
    cells: Vec<f32>,
}

impl DensityGrid {
    /// Creates a zero-filled grid with `size` cells per axis.
    ///
    /// # Examples
    /// ```
    /// use photocloud::density_grid::DensityGrid;
    /// let grid = DensityGrid::new(4);
    /// assert_eq!(grid.size(), 4);
    /// assert_eq!(grid.get(3, 3, 3), Some(0.0));
    /// assert_eq!(grid.get(4, 0, 0), None);
    /// ```
    pub fn new(size: usize) -> Self {
        DensityGrid {
            size,
            cells: vec![0.0; size * size * size],
        }
    }

    /// Cells per axis.
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.size && y < self.size && z < self.size {
            Some(x * self.size * self.size + y * self.size + z)
        } else {
            None
        }
    }

    /// Value at `(x, y, z)`, or `None` when out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        self.index(x, y, z).map(|i| self.cells[i])
    }

    /// Value at `(x, y, z)`, treating out-of-bounds cells as empty.
    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        self.get(x, y, z).unwrap_or(0.0)
    }

    /// Writes `value` at `(x, y, z)`. Returns `false` if the cell is out of bounds.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f32) -> bool {
        match self.index(x, y, z) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Adds `amount` to the cell at `(x, y, z)`; out-of-bounds cells are ignored.
    pub fn accumulate(&mut self, x: usize, y: usize, z: usize, amount: f32) {
        if let Some(i) = self.index(x, y, z) {
            self.cells[i] += amount;
        }
    }

    /// All cells in storage order.
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Sum of all cells.
    pub fn total(&self) -> f32 {
        self.cells.iter().sum()
    }

    /// Projects the grid onto one axis by summing over the other two.
    ///
    /// `axis` 0 is x, 1 is y, 2 is z.
    pub fn marginal(&self, axis: usize) -> Vec<f32> {
        let n = self.size;
        let mut marginal = vec![0.0; n];
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    let bin = match axis {
                        0 => x,
                        1 => y,
                        _ => z,
                    };
                    marginal[bin] += self.cells[x * n * n + y * n + z];
                }
            }
        }
        marginal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_index_is_x_major() {
        let mut grid = DensityGrid::new(3);
        assert!(grid.set(1, 2, 0, 5.0));
        assert_eq!(grid.cells()[1 * 9 + 2 * 3], 5.0);
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let mut grid = DensityGrid::new(2);
        assert!(!grid.set(2, 0, 0, 1.0));
        grid.accumulate(0, 5, 0, 1.0);
        assert_eq!(grid.total(), 0.0);
        assert_eq!(grid.value(9, 9, 9), 0.0);
    }

    #[test]
    fn marginals_sum_over_other_axes() {
        let mut grid = DensityGrid::new(3);
        grid.set(0, 1, 2, 1.0);
        grid.set(2, 1, 0, 2.0);
        assert_eq!(grid.marginal(0), vec![1.0, 0.0, 2.0]);
        assert_eq!(grid.marginal(1), vec![0.0, 3.0, 0.0]);
        assert_eq!(grid.marginal(2), vec![2.0, 0.0, 1.0]);
    }
}
