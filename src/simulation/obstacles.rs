//! Fixed blocking cells on the road
//!
//! Multi-cell obstacles are stored as runs of unit cells.

use std::collections::BTreeSet;

use super::types::Cell;

#[derive(Debug, Clone, Default)]
pub struct ObstacleSet {
    cells: BTreeSet<Cell>,
}

/// The unit cells covered by a run of `length` cells starting at `position`
///
/// Positions wrap at `road_length`; a zero length is treated as one cell and
/// a run never covers more than the whole lane.
pub fn run_cells(position: usize, lane: usize, length: usize, road_length: usize) -> Vec<Cell> {
    let start = position % road_length;
    (0..length.clamp(1, road_length))
        .map(|i| Cell::new((start + i) % road_length, lane))
        .collect()
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts every cell, returning how many were not already present
    pub fn add(&mut self, cells: &[Cell]) -> usize {
        cells.iter().filter(|cell| self.cells.insert(**cell)).count()
    }

    /// Removes every listed cell that is present; absent cells are ignored
    pub fn remove(&mut self, cells: &[Cell]) -> usize {
        cells.iter().filter(|cell| self.cells.remove(*cell)).count()
    }

    pub fn blocked(&self, position: usize, lane: usize) -> bool {
        self.cells.contains(&Cell::new(position, lane))
    }

    /// All obstacle cells, ordered by lane then position
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
