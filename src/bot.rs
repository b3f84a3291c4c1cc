//! Scripted client: joins a room, auto-places a fleet and fires at random
//! unmarked cells until the game ends.

use log::{debug, info};
use rand::Rng;
use tokio::time::{sleep, timeout, Duration};

use crate::board::Board;
use crate::config::{BOARD_SIZE, MARK_UNKNOWN};
use crate::projection::{PhaseName, RoomView};
use crate::protocol::{decode, encode, ClientMessage, FleetPayload, ServerMessage};
use crate::room::PlayerId;
use crate::transport::Transport;

/// How a bot's game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotOutcome {
    pub code: String,
    pub player: PlayerId,
    pub won: bool,
    pub shots: usize,
}

/// Delay before each shot, keeping a bot well under the server's action
/// rate limit.
pub const DEFAULT_PACE: Duration = Duration::from_millis(100);

/// Silence after which the bot asks for the room state again, in case a
/// broadcast was dropped.
pub const DEFAULT_STATE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Bot<T: Transport> {
    transport: T,
    pace: Duration,
    state_timeout: Duration,
}

impl<T: Transport> Bot<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            pace: DEFAULT_PACE,
            state_timeout: DEFAULT_STATE_TIMEOUT,
        }
    }

    pub fn with_state_timeout(mut self, state_timeout: Duration) -> Self {
        self.state_timeout = state_timeout;
        self
    }

    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    async fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        let frame = encode(msg)?;
        self.transport.send_frame(&frame).await
    }

    /// Next non-heartbeat message; probes are answered on the way.
    async fn recv(&mut self) -> anyhow::Result<ServerMessage> {
        loop {
            let frame = self.transport.recv_frame().await?;
            let msg: ServerMessage = decode(&frame)?;
            if matches!(msg, ServerMessage::Heartbeat) {
                self.send(&ClientMessage::Heartbeat).await?;
                continue;
            }
            return Ok(msg);
        }
    }

    /// Ask the server for a new room and return its code.
    pub async fn create_room(&mut self) -> anyhow::Result<String> {
        self.send(&ClientMessage::CreateRoom).await?;
        loop {
            match self.recv().await? {
                ServerMessage::RoomCreated { code } => return Ok(code),
                ServerMessage::Error { error } => anyhow::bail!("create failed: {:?}", error),
                other => debug!("Ignoring {:?} while creating", other),
            }
        }
    }

    /// Join `code`, place a random fleet and play until the game is over.
    pub async fn play<R: Rng>(&mut self, code: &str, rng: &mut R) -> anyhow::Result<BotOutcome> {
        self.send(&ClientMessage::JoinRoom {
            code: code.to_string(),
        })
        .await?;
        let me = loop {
            match self.recv().await? {
                ServerMessage::Joined { player_id, .. } => break player_id,
                ServerMessage::Error { error } => {
                    anyhow::bail!("join {} failed: {:?}", code, error)
                }
                _ => {}
            }
        };
        info!("Joined room {} as {}", code, me);

        let board = Board::random_fleet(rng).map_err(|e| anyhow::anyhow!(e))?;
        self.send(&ClientMessage::PlaceFleet {
            payload: Some(FleetPayload {
                board: serde_json::to_value(board.grid())?,
            }),
            ready: true,
        })
        .await?;

        let mut shots = 0;
        loop {
            let msg = match timeout(self.state_timeout, self.recv()).await {
                Ok(msg) => msg?,
                Err(_) => {
                    debug!("No state for {:?}, requesting it", self.state_timeout);
                    self.send(&ClientMessage::RequestState).await?;
                    continue;
                }
            };
            match msg {
                ServerMessage::RoomState(view) => match view.phase {
                    PhaseName::Gameover => {
                        let won = view.winner.as_ref() == Some(&me);
                        info!("Room {} over after {} shots, won: {}", code, shots, won);
                        return Ok(BotOutcome {
                            code: code.to_string(),
                            player: me,
                            won,
                            shots,
                        });
                    }
                    PhaseName::Battle if view.turn.as_ref() == Some(&me) => {
                        if let Some((r, c)) = pick_target(&view, rng) {
                            if !self.pace.is_zero() {
                                sleep(self.pace).await;
                            }
                            self.send(&ClientMessage::Fire { r, c }).await?;
                            shots += 1;
                        }
                    }
                    _ => {}
                },
                ServerMessage::Error { error } => {
                    anyhow::bail!("server refused action: {:?}", error)
                }
                _ => {}
            }
        }
    }
}

/// A uniformly random cell the viewer has not fired at yet.
fn pick_target<R: Rng>(view: &RoomView, rng: &mut R) -> Option<(usize, usize)> {
    let marks = &view.players.me.marks;
    let open: Vec<(usize, usize)> = (0..BOARD_SIZE)
        .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
        .filter(|&(r, c)| marks[r][c] == MARK_UNKNOWN)
        .collect();
    if open.is_empty() {
        return None;
    }
    Some(open[rng.random_range(0..open.len())])
}
