//! Common types: coordinates and the errors raised by the core model.

use core::fmt;

/// A `(row, col)` cell coordinate.
pub type Coord = (usize, usize);

/// Errors returned by board placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Ship would leave the 10×10 grid.
    ShipOutOfBounds,
    /// Ship placement overlaps another ship.
    ShipOverlaps,
    /// Random placement gave up after too many attempts.
    UnableToPlaceShip,
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::ShipOutOfBounds => write!(f, "Ship placement is out of bounds"),
            BoardError::ShipOverlaps => write!(f, "Ship placement overlaps with another ship"),
            BoardError::UnableToPlaceShip => write!(f, "Unable to place ship"),
        }
    }
}

/// Reasons a fleet submission is rejected by the sanitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetError {
    /// Grid is not exactly 10 rows of 10 cells.
    BadShape,
    /// A cell holds a negative value.
    NegativeCell { row: usize, col: usize },
    /// A same-identifier cell touches a run without belonging to it.
    Branch { id: i64 },
    /// Two separate runs carry the same identifier.
    DuplicateId { id: i64 },
    /// The extracted run lengths are not the standard fleet.
    BadLengths,
}

impl fmt::Display for FleetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FleetError::BadShape => write!(f, "Board must be 10 rows of 10 cells"),
            FleetError::NegativeCell { row, col } => {
                write!(f, "Negative cell value at ({}, {})", row, col)
            }
            FleetError::Branch { id } => write!(f, "Ship {} is not a straight run", id),
            FleetError::DuplicateId { id } => write!(f, "Ship {} appears more than once", id),
            FleetError::BadLengths => write!(f, "Fleet lengths must be exactly 5, 4, 3, 3, 2"),
        }
    }
}

/// Reasons a join request is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    NoSuchRoom,
    RoomFull,
    /// The connection already holds a seat; it is never told.
    AlreadySeated,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::NoSuchRoom => write!(f, "No room with that code"),
            JoinError::RoomFull => write!(f, "Room already has two players"),
            JoinError::AlreadySeated => write!(f, "Connection already holds a seat"),
        }
    }
}

/// Why an in-room action was refused.
///
/// Apart from `BadFleet`, these are expected under normal races between the
/// two clients and are dropped without telling anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    /// Requester holds no seat in this room.
    NotSeated,
    /// Action is not valid in the current phase.
    WrongPhase,
    /// Requester is not the turn holder.
    NotYourTurn,
    /// Requester already fired at this cell.
    AlreadyMarked,
    /// Fleet submission failed sanitizing.
    BadFleet(FleetError),
}

impl From<FleetError> for ActionError {
    fn from(err: FleetError) -> Self {
        ActionError::BadFleet(err)
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::NotSeated => write!(f, "Connection holds no seat in this room"),
            ActionError::WrongPhase => write!(f, "Action not valid in the current phase"),
            ActionError::NotYourTurn => write!(f, "Not this player's turn"),
            ActionError::AlreadyMarked => write!(f, "Cell was already fired at"),
            ActionError::BadFleet(e) => write!(f, "Fleet rejected: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
#[cfg(feature = "std")]
impl std::error::Error for FleetError {}
#[cfg(feature = "std")]
impl std::error::Error for JoinError {}
#[cfg(feature = "std")]
impl std::error::Error for ActionError {}
