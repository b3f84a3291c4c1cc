//! Board and marks grids for a single player.

use alloc::vec::Vec;
use core::fmt;
use rand::Rng;

use crate::common::{BoardError, Coord};
use crate::config::{BOARD_SIZE, FLEET_LENGTHS, MARK_HIT, MARK_MISS, MARK_UNKNOWN};
use crate::ship::{Orientation, Ship};

/// Raw 10×10 grid of cell values.
pub type Grid = [[u8; BOARD_SIZE]; BOARD_SIZE];

/// A player's own board: the cell grid plus the fleet it references.
///
/// Every nonzero cell holds the id of a ship in `ships`, and ship ids are
/// `1..=ships.len()` in placement order.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    grid: Grid,
    ships: Vec<Ship>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board state (no ships placed).
    pub fn new() -> Self {
        Self {
            grid: [[0; BOARD_SIZE]; BOARD_SIZE],
            ships: Vec::new(),
        }
    }

    /// Rebuild a board from ships whose ids are already `1..=n`.
    pub(crate) fn from_ships(ships: Vec<Ship>) -> Self {
        let mut grid = [[0; BOARD_SIZE]; BOARD_SIZE];
        for ship in &ships {
            for &(r, c) in ship.cells() {
                grid[r][c] = ship.id();
            }
        }
        Self { grid, ships }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Ship id at `(row, col)`, 0 when empty.
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.grid[row][col]
    }

    /// True iff all `length` cells starting at `(row, col)` lie on the board
    /// and are currently empty.
    pub fn can_place(
        &self,
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> bool {
        self.check_placement(row, col, length, orientation).is_ok()
    }

    fn check_placement(
        &self,
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> Result<(), BoardError> {
        if length == 0 || length > BOARD_SIZE || row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(BoardError::ShipOutOfBounds);
        }
        let (end_r, end_c) = orientation.step(row, col, length - 1);
        if end_r >= BOARD_SIZE || end_c >= BOARD_SIZE {
            return Err(BoardError::ShipOutOfBounds);
        }
        let occupied = (0..length)
            .map(|i| orientation.step(row, col, i))
            .any(|(r, c)| self.grid[r][c] != 0);
        if occupied {
            return Err(BoardError::ShipOverlaps);
        }
        Ok(())
    }

    /// Place a ship of `length` at `(row, col)`, giving it the next id.
    /// Returns the new ship's id.
    pub fn place_ship(
        &mut self,
        row: usize,
        col: usize,
        length: usize,
        orientation: Orientation,
    ) -> Result<u8, BoardError> {
        self.check_placement(row, col, length, orientation)?;
        let id = self.ships.len() as u8 + 1;
        let cells: Vec<Coord> = (0..length)
            .map(|i| orientation.step(row, col, i))
            .collect();
        for &(r, c) in &cells {
            self.grid[r][c] = id;
        }
        self.ships.push(Ship::new(id, cells));
        Ok(id)
    }

    /// Place the standard fleet at random non-overlapping positions.
    ///
    /// Convenience for clients and tests; the server never trusts it.
    pub fn random_fleet<R: Rng>(rng: &mut R) -> Result<Self, BoardError> {
        let mut board = Board::new();
        for &length in FLEET_LENGTHS.iter() {
            let (r, c, orient) = board.random_placement(rng, length)?;
            board.place_ship(r, c, length, orient)?;
        }
        Ok(board)
    }

    /// Returns a random free `(row, col, Orientation)` for a ship of `length`.
    pub fn random_placement<R: Rng>(
        &self,
        rng: &mut R,
        length: usize,
    ) -> Result<(usize, usize, Orientation), BoardError> {
        if length == 0 || length > BOARD_SIZE {
            return Err(BoardError::ShipOutOfBounds);
        }
        for _ in 0..100 {
            let orient = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_r, max_c) = match orient {
                Orientation::Horizontal => (BOARD_SIZE - 1, BOARD_SIZE - length),
                Orientation::Vertical => (BOARD_SIZE - length, BOARD_SIZE - 1),
            };
            let r = rng.random_range(0..=max_r);
            let c = rng.random_range(0..=max_c);
            if self.can_place(r, c, length, orient) {
                return Ok((r, c, orient));
            }
        }
        Err(BoardError::UnableToPlaceShip)
    }

    /// Strike `(row, col)`, recording the hit on the covering ship.
    /// Returns the struck ship's id, or `None` for open water.
    pub(crate) fn strike(&mut self, row: usize, col: usize) -> Option<u8> {
        let id = self.grid[row][col];
        if id == 0 {
            return None;
        }
        if let Some(ship) = self.ships.iter_mut().find(|s| s.id() == id) {
            ship.register_hit(row, col);
        }
        Some(id)
    }

    /// Returns `true` when a fleet is present and every ship is sunk.
    pub fn all_sunk(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(Ship::is_sunk)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        for row in self.grid.iter() {
            write!(f, "  ")?;
            for cell in row.iter() {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }
        write!(f, "  ships: {:?}\n}}", self.ships)
    }
}

/// A player's record of their own shots against the opponent.
///
/// Cells only ever move away from `MARK_UNKNOWN`, never back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marks {
    grid: Grid,
}

impl Default for Marks {
    fn default() -> Self {
        Self::new()
    }
}

impl Marks {
    pub fn new() -> Self {
        Self {
            grid: [[MARK_UNKNOWN; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.grid[row][col]
    }

    pub fn is_marked(&self, row: usize, col: usize) -> bool {
        self.grid[row][col] != MARK_UNKNOWN
    }

    pub fn is_hit(&self, row: usize, col: usize) -> bool {
        self.grid[row][col] == MARK_HIT
    }

    /// Record a shot outcome. Returns `false` if the cell was already marked.
    pub(crate) fn record(&mut self, row: usize, col: usize, hit: bool) -> bool {
        if self.is_marked(row, col) {
            return false;
        }
        self.grid[row][col] = if hit { MARK_HIT } else { MARK_MISS };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn can_place_rejects_edges_and_overlap() {
        let mut board = Board::new();
        assert!(board.can_place(0, 5, 5, Orientation::Horizontal));
        assert!(!board.can_place(0, 6, 5, Orientation::Horizontal));
        assert!(!board.can_place(7, 0, 4, Orientation::Vertical));
        board.place_ship(2, 2, 3, Orientation::Horizontal).unwrap();
        assert!(!board.can_place(0, 3, 3, Orientation::Vertical));
        assert!(board.can_place(0, 5, 2, Orientation::Vertical));
    }

    #[test]
    fn place_ship_assigns_sequential_ids() {
        let mut board = Board::new();
        assert_eq!(board.place_ship(0, 0, 5, Orientation::Horizontal), Ok(1));
        assert_eq!(board.place_ship(1, 0, 4, Orientation::Vertical), Ok(2));
        assert_eq!(board.cell(0, 4), 1);
        assert_eq!(board.cell(4, 0), 2);
        assert_eq!(
            board.place_ship(0, 0, 2, Orientation::Vertical),
            Err(BoardError::ShipOverlaps)
        );
        assert_eq!(board.ships().len(), 2);
    }

    #[test]
    fn random_fleet_covers_standard_cells() {
        let mut rng = SmallRng::seed_from_u64(42);
        let board = Board::random_fleet(&mut rng).unwrap();
        let filled = board.grid().iter().flatten().filter(|&&v| v != 0).count();
        assert_eq!(filled, crate::config::TOTAL_SHIP_CELLS);
        assert_eq!(board.ships().len(), FLEET_LENGTHS.len());
    }

    #[test]
    fn marks_are_append_only() {
        let mut marks = Marks::new();
        assert!(marks.record(4, 4, false));
        assert!(!marks.record(4, 4, true));
        assert_eq!(marks.get(4, 4), MARK_MISS);
    }
}
