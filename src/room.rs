//! Per-room state machine: seats, fleet submission, turns and the winner.
//!
//! Phases only move forward: `Placing -> Battle -> GameOver`. The turn holder
//! and the winner live inside the phase itself, so a turn outside of battle
//! or a winner before the game is over cannot be represented.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use rand::Rng;

use crate::board::{Board, Marks};
use crate::common::{ActionError, FleetError, JoinError};
use crate::config::{BOARD_SIZE, MAX_PLAYERS};
use crate::sanitizer::sanitize_fleet;

/// Opaque per-room player identifier handed out at join time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(transparent))]
pub struct PlayerId(String);

impl PlayerId {
    /// Generate a fresh random identifier.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        PlayerId(format!("{:08x}", rng.random::<u32>()))
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(String::from(s))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room phase, carrying the turn holder or winner where one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Placing,
    Battle { turn: PlayerId },
    GameOver { winner: PlayerId },
}

/// One seat in a room.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    board: Board,
    marks: Marks,
    ready: bool,
}

impl Player {
    fn new(id: PlayerId) -> Self {
        Self {
            id,
            board: Board::new(),
            marks: Marks::new(),
            ready: false,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// The player's own board and fleet.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The player's shots against the opponent.
    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Result of an accepted shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotOutcome {
    pub row: usize,
    pub col: usize,
    /// Id of the struck ship, `None` on a miss.
    pub hit: Option<u8>,
    /// Whether the struck ship is now sunk.
    pub sunk: bool,
    /// Set when this shot ended the game.
    pub winner: Option<PlayerId>,
}

/// A two-seat game session identified by its join code.
#[derive(Debug, Clone)]
pub struct Room {
    code: String,
    phase: Phase,
    players: Vec<Player>,
}

impl Room {
    /// Create an empty room in the placing phase.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            phase: Phase::Placing,
            players: Vec::with_capacity(MAX_PLAYERS),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Player whose move it is; only set during battle.
    pub fn turn(&self) -> Option<&PlayerId> {
        match &self.phase {
            Phase::Battle { turn } => Some(turn),
            _ => None,
        }
    }

    /// Winning player; only set once the game is over.
    pub fn winner(&self) -> Option<&PlayerId> {
        match &self.phase {
            Phase::GameOver { winner } => Some(winner),
            _ => None,
        }
    }

    /// Seated players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// The seat opposite `id`, if occupied.
    pub fn opponent(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id != id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Seat a new player with an empty board, marks and ready flag.
    pub fn join<R: Rng>(&mut self, rng: &mut R) -> Result<PlayerId, JoinError> {
        if self.is_full() {
            return Err(JoinError::RoomFull);
        }
        let id = loop {
            let candidate = PlayerId::random(rng);
            if self.player(&candidate).is_none() {
                break candidate;
            }
        };
        self.players.push(Player::new(id.clone()));
        Ok(id)
    }

    /// Sanitize and store `player`'s fleet.
    ///
    /// `grid` is `None` when the submission could not even be read as a grid
    /// of integers. On rejection nothing changes. Once both seats are filled
    /// and ready the battle starts with a uniformly random first turn.
    pub fn submit_fleet<R: Rng, G: AsRef<[i64]>>(
        &mut self,
        player: &PlayerId,
        grid: Option<&[G]>,
        ready: bool,
        rng: &mut R,
    ) -> Result<(), ActionError> {
        let idx = self.seat(player)?;
        if self.phase != Phase::Placing {
            return Err(ActionError::WrongPhase);
        }
        let board = sanitize_fleet(grid.ok_or(FleetError::BadShape)?)?;

        let seat = &mut self.players[idx];
        seat.board = board;
        seat.ready = ready;

        if self.is_full() && self.players.iter().all(|p| p.ready) {
            let first = rng.random_range(0..MAX_PLAYERS);
            self.phase = Phase::Battle {
                turn: self.players[first].id.clone(),
            };
        }
        Ok(())
    }

    /// Fire at the opponent's board. Coordinates are clamped onto the grid.
    ///
    /// Every accepted shot passes the turn, hit or miss, unless it sinks the
    /// opponent's last ship.
    pub fn fire(
        &mut self,
        player: &PlayerId,
        row: usize,
        col: usize,
    ) -> Result<ShotOutcome, ActionError> {
        let idx = self.seat(player)?;
        match &self.phase {
            Phase::Battle { turn } if turn == player => {}
            Phase::Battle { .. } => return Err(ActionError::NotYourTurn),
            _ => return Err(ActionError::WrongPhase),
        }
        let row = row.min(BOARD_SIZE - 1);
        let col = col.min(BOARD_SIZE - 1);
        if self.players[idx].marks.is_marked(row, col) {
            return Err(ActionError::AlreadyMarked);
        }

        let (shooter, target) = self.pair_mut(idx);
        let hit = target.board.strike(row, col);
        shooter.marks.record(row, col, hit.is_some());
        let sunk = hit
            .and_then(|id| target.board.ships().iter().find(|s| s.id() == id))
            .is_some_and(|s| s.is_sunk());
        let fleet_lost = hit.is_some() && target.board.all_sunk();
        let shooter_id = shooter.id.clone();
        let target_id = target.id.clone();

        let winner = if fleet_lost {
            self.phase = Phase::GameOver {
                winner: shooter_id.clone(),
            };
            Some(shooter_id)
        } else {
            self.phase = Phase::Battle { turn: target_id };
            None
        };
        Ok(ShotOutcome {
            row,
            col,
            hit,
            sunk,
            winner,
        })
    }

    fn seat(&self, player: &PlayerId) -> Result<usize, ActionError> {
        self.players
            .iter()
            .position(|p| &p.id == player)
            .ok_or(ActionError::NotSeated)
    }

    /// Mutable access to the seat at `idx` and the seat opposite it.
    fn pair_mut(&mut self, idx: usize) -> (&mut Player, &mut Player) {
        let (left, right) = self.players.split_at_mut(1);
        if idx == 0 {
            (&mut left[0], &mut right[0])
        } else {
            (&mut right[0], &mut left[0])
        }
    }
}
