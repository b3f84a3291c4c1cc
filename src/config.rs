//! Fixed game constants shared by every room.

pub const BOARD_SIZE: usize = 10;
pub const NUM_SHIPS: usize = 5;

/// Lengths of the standard fleet, longest first.
pub const FLEET_LENGTHS: [usize; NUM_SHIPS] = [5, 4, 3, 3, 2];

/// Total number of ship segments used in the standard configuration.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

/// Number of decimal digits in a room join code.
pub const CODE_DIGITS: usize = 6;

/// Seats per room.
pub const MAX_PLAYERS: usize = 2;

/// Marks grid cell values.
pub const MARK_UNKNOWN: u8 = 0;
pub const MARK_HIT: u8 = 2;
pub const MARK_MISS: u8 = 3;
