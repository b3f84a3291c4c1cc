//! Room server: accept loop, per-connection tasks and the dispatcher.
//!
//! Every connection task forwards decoded actions to one dispatcher task
//! over a channel. The dispatcher owns the [`SessionRegistry`] and handles
//! one action to completion (validate, mutate, broadcast) before looking at
//! the next, so room transitions never interleave.

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::common::ActionError;
use crate::protocol::{decode, encode, grid_from_json, ClientMessage, ErrorKind, ServerMessage};
use crate::rate_limit::{SlidingWindow, DEFAULT_MAX_ACTIONS_PER_SECOND};
use crate::registry::{ConnId, SessionRegistry};
use crate::transport::heartbeat::{probe_timer, Liveness, Probe, DEFAULT_HEARTBEAT_INTERVAL};
use crate::transport::{read_frame, write_frame, DEFAULT_IO_TIMEOUT, DEFAULT_MAX_FRAME_SIZE};

/// Outbound messages buffered per connection before new ones are dropped.
const OUTBOX_CAPACITY: usize = 64;

/// Pending actions buffered for the dispatcher.
const COMMAND_CAPACITY: usize = 1024;

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Runtime settings for the room server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub heartbeat_interval: Duration,
    pub max_actions_per_second: usize,
    pub max_frame_size: u32,
    pub io_timeout: Duration,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_actions_per_second: DEFAULT_MAX_ACTIONS_PER_SECOND,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            io_timeout: DEFAULT_IO_TIMEOUT,
            seed: None,
        }
    }
}

impl ServerConfig {
    fn registry(&self) -> SessionRegistry {
        match self.seed {
            Some(seed) => SessionRegistry::seeded(seed),
            None => SessionRegistry::new(),
        }
    }
}

/// Work items for the dispatcher.
#[derive(Debug)]
pub enum Command {
    Connect {
        conn: ConnId,
        outbox: mpsc::Sender<ServerMessage>,
    },
    Action {
        conn: ConnId,
        msg: ClientMessage,
    },
    Disconnect {
        conn: ConnId,
    },
}

/// Owner of all room state. Handles commands strictly one at a time.
pub struct Dispatcher {
    registry: SessionRegistry,
    outboxes: HashMap<ConnId, mpsc::Sender<ServerMessage>>,
}

impl Dispatcher {
    pub fn new(registry: SessionRegistry) -> Self {
        Self {
            registry,
            outboxes: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Process commands until every sender is gone.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(cmd) = commands.recv().await {
            self.handle(cmd);
        }
        debug!("Dispatcher stopped");
    }

    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { conn, outbox } => {
                self.outboxes.insert(conn, outbox);
            }
            Command::Action { conn, msg } => self.handle_action(conn, msg),
            Command::Disconnect { conn } => {
                self.outboxes.remove(&conn);
                self.registry.release(conn);
            }
        }
    }

    fn handle_action(&mut self, conn: ConnId, msg: ClientMessage) {
        match msg {
            ClientMessage::CreateRoom => {
                let code = self.registry.create_room(conn);
                self.send(conn, ServerMessage::RoomCreated { code });
            }
            ClientMessage::JoinRoom { code } => match self.registry.join(conn, &code) {
                Ok(player_id) => {
                    self.send(
                        conn,
                        ServerMessage::Joined {
                            code: code.clone(),
                            player_id,
                        },
                    );
                    self.broadcast(&code);
                }
                Err(e) => match ErrorKind::for_join(&e) {
                    Some(error) => {
                        debug!("Connection {} could not join {}: {}", conn, code, e);
                        self.send(conn, ServerMessage::Error { error });
                    }
                    None => debug!("Connection {} JOIN_ROOM dropped: {}", conn, e),
                },
            },
            ClientMessage::PlaceFleet { payload, ready } => {
                let grid = payload.and_then(|p| grid_from_json(&p.board));
                match self.registry.submit_fleet(conn, grid.as_deref(), ready) {
                    Ok(code) => {
                        // fleets are only accepted while placing, so a turn
                        // holder now means this submission started the battle
                        if let Some(turn) = self.registry.room(&code).and_then(|r| r.turn()) {
                            info!("Room {} battle started, {} moves first", code, turn);
                        }
                        self.broadcast(&code);
                    }
                    Err(e) => self.reject(conn, "PLACE_FLEET", e),
                }
            }
            ClientMessage::Fire { r, c } => match self.registry.fire(conn, r, c) {
                Ok((code, outcome)) => {
                    if let Some(winner) = &outcome.winner {
                        info!("Room {} game over, winner {}", code, winner);
                    }
                    self.broadcast(&code);
                }
                Err(e) => self.reject(conn, "FIRE", e),
            },
            ClientMessage::RequestState => match self.registry.view(conn) {
                Some(view) => self.send(conn, ServerMessage::RoomState(view)),
                None => debug!("Connection {} requested state without a seat", conn),
            },
            ClientMessage::Heartbeat => {}
        }
    }

    /// Report an action failure if it is client-visible, otherwise drop it.
    fn reject(&mut self, conn: ConnId, action: &str, err: ActionError) {
        match ErrorKind::for_action(&err) {
            Some(error) => {
                debug!("Connection {} {} rejected: {}", conn, action, err);
                self.send(conn, ServerMessage::Error { error });
            }
            None => debug!("Connection {} {} dropped: {}", conn, action, err),
        }
    }

    /// Push each bound connection its own view of room `code`.
    fn broadcast(&mut self, code: &str) {
        for conn in self.registry.connections_in(code) {
            if let Some(view) = self.registry.view(conn) {
                self.send(conn, ServerMessage::RoomState(view));
            }
        }
    }

    fn send(&mut self, conn: ConnId, msg: ServerMessage) {
        let Some(outbox) = self.outboxes.get(&conn) else {
            return;
        };
        if let Err(e) = outbox.try_send(msg) {
            warn!("Connection {} outbox unavailable, message dropped: {}", conn, e);
        }
    }
}

/// Start a dispatcher task and return the channel feeding it.
pub fn spawn_dispatcher(registry: SessionRegistry) -> mpsc::Sender<Command> {
    let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
    tokio::spawn(Dispatcher::new(registry).run(rx));
    tx
}

/// Per-connection settings taken from [`ServerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    pub heartbeat_interval: Duration,
    pub max_actions_per_second: usize,
    pub max_frame_size: u32,
    pub io_timeout: Duration,
}

impl From<&ServerConfig> for ConnectionConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval,
            max_actions_per_second: config.max_actions_per_second,
            max_frame_size: config.max_frame_size,
            io_timeout: config.io_timeout,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// Drive one client connection until it closes, errors, or misses a
/// heartbeat. The dispatcher is told about the connection on entry and on
/// exit, so its room binding is always released.
pub async fn serve_connection<S>(
    stream: S,
    conn: ConnId,
    commands: mpsc::Sender<Command>,
    config: ConnectionConfig,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);
    if commands
        .send(Command::Connect {
            conn,
            outbox: outbox_tx.clone(),
        })
        .await
        .is_err()
    {
        return;
    }

    let writer_task = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            let frame = match encode(&msg) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Connection {}: {}", conn, e);
                    continue;
                }
            };
            let written =
                write_frame(&mut writer, &frame, config.max_frame_size, config.io_timeout).await;
            if let Err(e) = written {
                debug!("Connection {} write failed: {}", conn, e);
                break;
            }
        }
    });

    // Reads run in their own task: a partial frame must never be abandoned
    // by the select below.
    let (frames_tx, mut frames_rx) = mpsc::channel::<Vec<u8>>(OUTBOX_CAPACITY);
    let reader_task = tokio::spawn(async move {
        loop {
            match read_frame(&mut reader, config.max_frame_size).await {
                Ok(frame) => {
                    if frames_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Connection {} read ended: {}", conn, e);
                    break;
                }
            }
        }
    });

    let mut liveness = Liveness::new();
    let mut timer = probe_timer(config.heartbeat_interval);
    let mut limiter = SlidingWindow::per_second(config.max_actions_per_second);

    loop {
        tokio::select! {
            frame = frames_rx.recv() => {
                let Some(frame) = frame else { break };
                liveness.mark_activity();
                if !limiter.admit(Instant::now()) {
                    warn!("Connection {} over rate limit, frame dropped", conn);
                    continue;
                }
                let msg = match decode::<ClientMessage>(&frame) {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!("Connection {} sent an unreadable message: {}", conn, e);
                        continue;
                    }
                };
                if matches!(msg, ClientMessage::Heartbeat) {
                    continue;
                }
                if commands.send(Command::Action { conn, msg }).await.is_err() {
                    break;
                }
            }
            _ = timer.tick() => {
                match liveness.on_tick() {
                    Probe::Expired => {
                        warn!("Connection {} missed heartbeat, terminating", conn);
                        break;
                    }
                    Probe::Send => {
                        if outbox_tx.try_send(ServerMessage::Heartbeat).is_err() {
                            debug!("Connection {} outbox full, probe skipped", conn);
                        }
                    }
                }
            }
        }
    }

    reader_task.abort();
    let _ = commands.send(Command::Disconnect { conn }).await;
    drop(outbox_tx);
    // The writer drains once the dispatcher has dropped its outbox handle.
    let _ = tokio::time::timeout(config.io_timeout, writer_task).await;
    info!("Connection {} closed", conn);
}

/// Source of inbound connections for [`Server::serve_on`].
#[async_trait::async_trait]
pub trait Acceptor: Send {
    type Stream: AsyncRead + AsyncWrite + Send + 'static;

    /// Wait for the next connection and its printable peer address.
    async fn accept(&mut self) -> std::io::Result<(Self::Stream, String)>;
}

#[async_trait::async_trait]
impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> std::io::Result<(TcpStream, String)> {
        let (stream, addr) = TcpListener::accept(self).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed for {}: {}", addr, e);
        }
        Ok((stream, addr.to_string()))
    }
}

/// The TCP room server.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind and serve. Only binding can fail.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        info!("Listening on {}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        self.serve_on(listener).await;
        Ok(())
    }

    /// Accept connections forever. Accept errors are logged and retried.
    pub async fn serve_on<A: Acceptor>(self, mut acceptor: A) {
        let commands = spawn_dispatcher(self.config.registry());
        let conn_config = ConnectionConfig::from(&self.config);
        let mut next_conn: ConnId = 1;
        loop {
            let (stream, peer) = match acceptor.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            let conn = next_conn;
            next_conn += 1;
            info!("Connection {} from {}", conn, peer);
            tokio::spawn(serve_connection(stream, conn, commands.clone(), conn_config));
        }
    }
}
