//! Ship records: identity, occupied cells and the hits they have taken.

use alloc::vec::Vec;

use crate::common::Coord;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Cell `i` steps along this orientation from `(row, col)`.
    pub fn step(self, row: usize, col: usize, i: usize) -> Coord {
        match self {
            Orientation::Horizontal => (row, col + i),
            Orientation::Vertical => (row + i, col),
        }
    }
}

/// A ship placed on a board.
///
/// `cells` is ordered along the ship; `hits` holds each struck cell once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    id: u8,
    cells: Vec<Coord>,
    hits: Vec<Coord>,
}

impl Ship {
    /// Build a ship from its identifier and ordered cells.
    pub fn new(id: u8, cells: Vec<Coord>) -> Self {
        Self {
            id,
            cells,
            hits: Vec::new(),
        }
    }

    /// Identifier written into the owning board's cells.
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn length(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn hits(&self) -> &[Coord] {
        &self.hits
    }

    /// Whether this ship covers `(row, col)`.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        self.cells.contains(&(row, col))
    }

    /// Record a strike at `(row, col)`.
    /// Returns `true` if the cell belongs to this ship; repeated strikes are
    /// not recorded twice.
    pub fn register_hit(&mut self, row: usize, col: usize) -> bool {
        if !self.covers(row, col) {
            return false;
        }
        if !self.hits.contains(&(row, col)) {
            self.hits.push((row, col));
        }
        true
    }

    /// A ship is sunk once every one of its cells has been struck.
    pub fn is_sunk(&self) -> bool {
        self.hits.len() == self.length()
    }
}
