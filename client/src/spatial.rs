use std::collections::HashMap;

use floodwatch_shared::Coordinate;

/// A uniform bucket grid over degree space with cells as wide as the merge
/// radius, so every point within `radius` of a query lies in the 3x3 block of
/// cells around it. Rebuilt for every clustering pass.
pub struct BucketGrid {
    cells: HashMap<(i64, i64), Vec<usize>>,
    cell_size: f64,
}

impl BucketGrid {
    /// Index `points` by position. `cell_size` must be positive.
    pub fn build(points: &[Coordinate], cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (idx, p) in points.iter().enumerate() {
            cells
                .entry(Self::cell_of(*p, cell_size))
                .or_default()
                .push(idx);
        }
        Self { cells, cell_size }
    }

    fn cell_of(p: Coordinate, cell_size: f64) -> (i64, i64) {
        (
            (p.lat / cell_size).floor() as i64,
            (p.lng / cell_size).floor() as i64,
        )
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Indices of every point that could lie within one cell width of `p`,
    /// in ascending index order.
    pub fn neighbours(&self, p: Coordinate) -> Vec<usize> {
        let (row, col) = Self::cell_of(p, self.cell_size);
        let mut out = Vec::new();
        for dr in -1..=1 {
            for dc in -1..=1 {
                if let Some(cell) = self.cells.get(&(row + dr, col + dc)) {
                    out.extend_from_slice(cell);
                }
            }
        }
        out.sort_unstable();
        out
    }
}
