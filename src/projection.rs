//! Per-player views of a room.
//!
//! A player always sees their own board and marks in full, plus the
//! length and hit history of every ship on both sides. The opponent's board
//! is reduced to the cells the viewer has already confirmed as hits.

use alloc::string::String;
use alloc::vec::Vec;

use crate::board::{Board, Grid, Marks};
use crate::common::Coord;
use crate::config::BOARD_SIZE;
use crate::room::{Phase, Player, PlayerId, Room};

/// Wire name of a room phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum PhaseName {
    Placing,
    Battle,
    Gameover,
}

impl From<&Phase> for PhaseName {
    fn from(phase: &Phase) -> Self {
        match phase {
            Phase::Placing => PhaseName::Placing,
            Phase::Battle { .. } => PhaseName::Battle,
            Phase::GameOver { .. } => PhaseName::Gameover,
        }
    }
}

/// Fleet tracker entry: public facts about one ship.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipSummary {
    pub id: u8,
    pub length: usize,
    pub hits: Vec<Coord>,
    pub sunk: bool,
}

/// The viewer's own seat, unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnView {
    pub id: PlayerId,
    pub ready: bool,
    pub board: Grid,
    pub marks: Grid,
    pub ships: Vec<ShipSummary>,
}

/// The opponent's seat as the viewer may see it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct OpponentView {
    pub id: PlayerId,
    pub ready: bool,
    pub board: Grid,
    pub ships: Vec<ShipSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayersView {
    pub me: OwnView,
    pub opp: Option<OpponentView>,
}

/// Everything one player is allowed to know about a room.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomView {
    pub code: String,
    pub phase: PhaseName,
    pub turn: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub players: PlayersView,
}

/// Build `viewer`'s view of `room`, or `None` if they hold no seat.
pub fn project(room: &Room, viewer: &PlayerId) -> Option<RoomView> {
    let me = room.player(viewer)?;
    let opp = room.opponent(viewer).map(|opp| OpponentView {
        id: opp.id().clone(),
        ready: opp.is_ready(),
        board: mask_board(opp.board(), me.marks()),
        ships: summarize(opp.board()),
    });
    Some(RoomView {
        code: String::from(room.code()),
        phase: PhaseName::from(room.phase()),
        turn: room.turn().cloned(),
        winner: room.winner().cloned(),
        players: PlayersView {
            me: own_view(me),
            opp,
        },
    })
}

fn own_view(player: &Player) -> OwnView {
    OwnView {
        id: player.id().clone(),
        ready: player.is_ready(),
        board: *player.board().grid(),
        marks: *player.marks().grid(),
        ships: summarize(player.board()),
    }
}

/// Keep only the cells where `marks` records a confirmed hit.
pub fn mask_board(board: &Board, marks: &Marks) -> Grid {
    let mut masked = [[0; BOARD_SIZE]; BOARD_SIZE];
    for (r, row) in masked.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            if marks.is_hit(r, c) {
                *cell = board.cell(r, c);
            }
        }
    }
    masked
}

fn summarize(board: &Board) -> Vec<ShipSummary> {
    board
        .ships()
        .iter()
        .map(|ship| ShipSummary {
            id: ship.id(),
            length: ship.length(),
            hits: ship.hits().to_vec(),
            sunk: ship.is_sunk(),
        })
        .collect()
}
