//! Session registry: join codes to rooms, and connections to their seats.
//!
//! A room lives as long as a connection is bound to it. A room nobody has
//! joined yet belongs to the connection that created it. Only the rooms
//! touched by a released connection are checked, never on a timer.

use std::collections::HashMap;

use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::common::{ActionError, JoinError};
use crate::config::CODE_DIGITS;
use crate::projection::{project, RoomView};
use crate::room::{PlayerId, Room, ShotOutcome};

/// Server-assigned connection identifier.
pub type ConnId = u64;

/// The seat a connection occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub code: String,
    pub player: PlayerId,
}

pub struct SessionRegistry {
    rooms: HashMap<String, Room>,
    bindings: HashMap<ConnId, Binding>,
    creators: HashMap<String, ConnId>,
    rng: SmallRng,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Registry drawing codes and turns from OS entropy.
    pub fn new() -> Self {
        let mut seed_rng = rand::rng();
        Self::with_rng(SmallRng::from_rng(&mut seed_rng))
    }

    /// Registry with a fixed seed, for reproducible codes and turn order.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            rooms: HashMap::new(),
            bindings: HashMap::new(),
            creators: HashMap::new(),
            rng,
        }
    }

    pub fn room(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn binding(&self, conn: ConnId) -> Option<&Binding> {
        self.bindings.get(&conn)
    }

    /// Create an empty room under a fresh code on behalf of `creator`.
    /// Codes already in use are regenerated rather than overwritten.
    pub fn create_room(&mut self, creator: ConnId) -> String {
        let code = loop {
            let candidate = random_code(&mut self.rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.rooms.insert(code.clone(), Room::new(code.clone()));
        self.creators.insert(code.clone(), creator);
        info!("Room {} created ({} live)", code, self.rooms.len());
        code
    }

    /// Seat `conn` in room `code`. A connection holds at most one seat.
    pub fn join(&mut self, conn: ConnId, code: &str) -> Result<PlayerId, JoinError> {
        if self.bindings.contains_key(&conn) {
            return Err(JoinError::AlreadySeated);
        }
        let room = self.rooms.get_mut(code).ok_or(JoinError::NoSuchRoom)?;
        let player = room.join(&mut self.rng)?;
        info!("Connection {} joined room {} as {}", conn, code, player);
        self.bindings.insert(
            conn,
            Binding {
                code: code.to_string(),
                player: player.clone(),
            },
        );
        Ok(player)
    }

    /// Run a fleet submission for `conn`'s seat. Returns the room code.
    pub fn submit_fleet<G: AsRef<[i64]>>(
        &mut self,
        conn: ConnId,
        grid: Option<&[G]>,
        ready: bool,
    ) -> Result<String, ActionError> {
        let binding = self.bindings.get(&conn).ok_or(ActionError::NotSeated)?;
        let room = self
            .rooms
            .get_mut(&binding.code)
            .ok_or(ActionError::NotSeated)?;
        room.submit_fleet(&binding.player, grid, ready, &mut self.rng)?;
        Ok(binding.code.clone())
    }

    /// Fire from `conn`'s seat. Returns the room code and the shot outcome.
    pub fn fire(
        &mut self,
        conn: ConnId,
        row: usize,
        col: usize,
    ) -> Result<(String, ShotOutcome), ActionError> {
        let binding = self.bindings.get(&conn).ok_or(ActionError::NotSeated)?;
        let room = self
            .rooms
            .get_mut(&binding.code)
            .ok_or(ActionError::NotSeated)?;
        let outcome = room.fire(&binding.player, row, col)?;
        Ok((binding.code.clone(), outcome))
    }

    /// `conn`'s projected view of its room.
    pub fn view(&self, conn: ConnId) -> Option<RoomView> {
        let binding = self.bindings.get(&conn)?;
        let room = self.rooms.get(&binding.code)?;
        project(room, &binding.player)
    }

    /// Connections currently bound to room `code`.
    pub fn connections_in(&self, code: &str) -> Vec<ConnId> {
        let mut conns: Vec<ConnId> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.code == code)
            .map(|(&conn, _)| conn)
            .collect();
        conns.sort_unstable();
        conns
    }

    /// Forget `conn` and drop the rooms it leaves without a bound
    /// connection: its own seat's room, and any room it created that nobody
    /// has joined. Returns the codes of the rooms removed.
    pub fn release(&mut self, conn: ConnId) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .creators
            .iter()
            .filter(|&(_, &creator)| creator == conn)
            .map(|(code, _)| code.clone())
            .collect();
        if let Some(binding) = self.bindings.remove(&conn) {
            if !candidates.contains(&binding.code) {
                candidates.push(binding.code);
            }
        }

        let mut removed = Vec::new();
        for code in candidates {
            if self.bindings.values().any(|b| b.code == code) {
                continue;
            }
            self.creators.remove(&code);
            if self.rooms.remove(&code).is_some() {
                info!("Room {} destroyed ({} live)", code, self.rooms.len());
                removed.push(code);
            }
        }
        removed.sort_unstable();
        removed
    }
}

fn random_code<R: Rng>(rng: &mut R) -> String {
    let max = 10u32.pow(CODE_DIGITS as u32);
    format!("{:0width$}", rng.random_range(0..max), width = CODE_DIGITS)
}
