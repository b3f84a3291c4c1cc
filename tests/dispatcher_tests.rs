#![cfg(feature = "std")]

use fleetroom::projection::PhaseName;
use fleetroom::protocol::FleetPayload;
use fleetroom::server::{Command, Dispatcher};
use fleetroom::{ClientMessage, ErrorKind, PlayerId, ServerMessage, SessionRegistry, BOARD_SIZE};
use serde_json::json;
use tokio::sync::mpsc;

struct Harness {
    dispatcher: Dispatcher,
    outboxes: Vec<(u64, mpsc::Receiver<ServerMessage>)>,
}

impl Harness {
    fn new(seed: u64) -> Self {
        Self {
            dispatcher: Dispatcher::new(SessionRegistry::seeded(seed)),
            outboxes: Vec::new(),
        }
    }

    fn connect(&mut self, conn: u64) {
        let (tx, rx) = mpsc::channel(64);
        self.dispatcher.handle(Command::Connect { conn, outbox: tx });
        self.outboxes.push((conn, rx));
    }

    fn act(&mut self, conn: u64, msg: ClientMessage) {
        self.dispatcher.handle(Command::Action { conn, msg });
    }

    fn drain(&mut self, conn: u64) -> Vec<ServerMessage> {
        let (_, rx) = self
            .outboxes
            .iter_mut()
            .find(|(c, _)| *c == conn)
            .expect("unknown connection");
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn create(&mut self, conn: u64) -> String {
        self.act(conn, ClientMessage::CreateRoom);
        match self.drain(conn).as_slice() {
            [ServerMessage::RoomCreated { code }] => code.clone(),
            other => panic!("expected ROOM_CREATED, got {:?}", other),
        }
    }

    fn join(&mut self, conn: u64, code: &str) -> PlayerId {
        self.act(conn, ClientMessage::JoinRoom { code: code.to_string() });
        let msgs = self.drain(conn);
        match msgs.first() {
            Some(ServerMessage::Joined { player_id, .. }) => player_id.clone(),
            other => panic!("expected JOINED, got {:?}", other),
        }
    }
}

fn canonical_json() -> serde_json::Value {
    let mut grid = vec![vec![0i64; BOARD_SIZE]; BOARD_SIZE];
    for c in 0..5 {
        grid[0][c] = 1;
    }
    for r in 2..6 {
        grid[r][0] = 2;
    }
    for c in 5..8 {
        grid[2][c] = 3;
    }
    for r in 6..9 {
        grid[r][9] = 4;
    }
    grid[9][0] = 5;
    grid[9][1] = 5;
    json!(grid)
}

fn place(board: serde_json::Value, ready: bool) -> ClientMessage {
    ClientMessage::PlaceFleet {
        payload: Some(FleetPayload { board }),
        ready,
    }
}

#[test]
fn join_reports_missing_and_full_rooms() {
    let mut h = Harness::new(1);
    for conn in 1..=4 {
        h.connect(conn);
    }
    h.act(1, ClientMessage::JoinRoom { code: "000000".into() });
    assert_eq!(
        h.drain(1),
        vec![ServerMessage::Error {
            error: ErrorKind::NoSuchRoom
        }]
    );

    let code = h.create(1);
    h.join(1, &code);
    h.join(2, &code);
    h.act(3, ClientMessage::JoinRoom { code: code.clone() });
    assert_eq!(
        h.drain(3),
        vec![ServerMessage::Error {
            error: ErrorKind::RoomFull
        }]
    );
}

#[test]
fn join_broadcasts_state_to_occupants() {
    let mut h = Harness::new(2);
    h.connect(1);
    h.connect(2);
    let code = h.create(1);
    let a = h.join(1, &code);
    let b = h.join(2, &code);

    let to_a = h.drain(1);
    let Some(ServerMessage::RoomState(view)) = to_a.last() else {
        panic!("expected ROOM_STATE for first player, got {:?}", to_a);
    };
    assert_eq!(view.code, code);
    assert_eq!(view.phase, PhaseName::Placing);
    assert_eq!(view.players.me.id, a);
    assert_eq!(view.players.opp.as_ref().map(|o| o.id.clone()), Some(b));
}

#[test]
fn nine_row_board_is_a_bad_fleet() {
    let mut h = Harness::new(3);
    h.connect(1);
    let code = h.create(1);
    h.join(1, &code);
    h.drain(1);

    let nine_rows = json!(vec![vec![0; BOARD_SIZE]; BOARD_SIZE - 1]);
    h.act(1, place(nine_rows, true));
    assert_eq!(
        h.drain(1),
        vec![ServerMessage::Error {
            error: ErrorKind::BadFleet
        }]
    );

    h.act(1, ClientMessage::RequestState);
    let msgs = h.drain(1);
    let [ServerMessage::RoomState(view)] = msgs.as_slice() else {
        panic!("expected ROOM_STATE, got {:?}", msgs);
    };
    assert!(view.players.me.ships.is_empty());
    assert!(!view.players.me.ready);
    assert!(view.players.me.board.iter().flatten().all(|&v| v == 0));
}

#[test]
fn unreadable_boards_are_bad_fleets() {
    let mut h = Harness::new(4);
    h.connect(1);
    let code = h.create(1);
    h.join(1, &code);
    h.drain(1);

    for msg in [
        ClientMessage::PlaceFleet {
            payload: None,
            ready: true,
        },
        place(json!("ships"), true),
        place(json!([[0.5]]), true),
    ] {
        h.act(1, msg);
        assert_eq!(
            h.drain(1),
            vec![ServerMessage::Error {
                error: ErrorKind::BadFleet
            }]
        );
    }
}

#[test]
fn ready_fleets_start_the_battle_for_both() {
    let mut h = Harness::new(5);
    h.connect(1);
    h.connect(2);
    let code = h.create(1);
    let a = h.join(1, &code);
    let b = h.join(2, &code);
    h.drain(1);
    h.drain(2);

    h.act(1, place(canonical_json(), true));
    h.act(2, place(canonical_json(), true));

    let last_state = |msgs: Vec<ServerMessage>| match msgs.last() {
        Some(ServerMessage::RoomState(view)) => view.clone(),
        other => panic!("expected ROOM_STATE, got {:?}", other),
    };
    let view_a = last_state(h.drain(1));
    let view_b = last_state(h.drain(2));
    assert_eq!(view_a.phase, PhaseName::Battle);
    assert_eq!(view_a.turn, view_b.turn);
    let turn = view_a.turn.clone().unwrap();
    assert!(turn == a || turn == b);
    assert!(view_a.winner.is_none());

    // opponent geometry stays hidden before any shot
    let opp = view_a.players.opp.unwrap();
    assert!(opp.board.iter().flatten().all(|&v| v == 0));
    assert_eq!(opp.ships.len(), 5);
}

#[test]
fn out_of_turn_and_unbound_actions_are_silent() {
    let mut h = Harness::new(6);
    h.connect(1);
    h.connect(2);
    h.connect(3);
    let code = h.create(1);
    let a = h.join(1, &code);
    h.join(2, &code);
    h.act(1, place(canonical_json(), true));
    h.act(2, place(canonical_json(), true));
    h.drain(1);
    h.drain(2);

    let turn = h
        .dispatcher
        .registry()
        .room(&code)
        .and_then(|r| r.turn().cloned())
        .unwrap();
    let waiting = if turn == a { 2 } else { 1 };
    h.act(waiting, ClientMessage::Fire { r: 0, c: 0 });
    h.act(waiting, place(canonical_json(), true));
    h.act(3, ClientMessage::Fire { r: 0, c: 0 });
    h.act(3, ClientMessage::RequestState);
    assert!(h.drain(1).is_empty());
    assert!(h.drain(2).is_empty());
    assert!(h.drain(3).is_empty());
}

#[test]
fn fire_broadcasts_and_passes_the_turn() {
    let mut h = Harness::new(7);
    h.connect(1);
    h.connect(2);
    let code = h.create(1);
    let a = h.join(1, &code);
    let b = h.join(2, &code);
    h.act(1, place(canonical_json(), true));
    h.act(2, place(canonical_json(), true));
    h.drain(1);
    h.drain(2);

    let turn = h
        .dispatcher
        .registry()
        .room(&code)
        .and_then(|r| r.turn().cloned())
        .unwrap();
    let (shooter, other_id) = if turn == a { (1, b) } else { (2, a) };
    h.act(shooter, ClientMessage::Fire { r: 9, c: 0 });

    for conn in [1, 2] {
        let msgs = h.drain(conn);
        let [ServerMessage::RoomState(view)] = msgs.as_slice() else {
            panic!("expected one ROOM_STATE, got {:?}", msgs);
        };
        assert_eq!(view.turn.as_ref(), Some(&other_id));
    }

    // shooting the same cell again is ignored entirely
    h.act(3 - shooter, ClientMessage::Fire { r: 4, c: 4 });
    h.drain(1);
    h.drain(2);
    h.act(shooter, ClientMessage::Fire { r: 9, c: 0 });
    assert!(h.drain(1).is_empty());
    assert!(h.drain(2).is_empty());
}

#[test]
fn rooms_are_destroyed_with_their_last_connection() {
    let mut h = Harness::new(8);
    h.connect(1);
    h.connect(2);
    let code = h.create(1);
    h.join(1, &code);
    h.join(2, &code);

    h.dispatcher.handle(Command::Disconnect { conn: 1 });
    assert!(h.dispatcher.registry().room(&code).is_some());
    h.dispatcher.handle(Command::Disconnect { conn: 2 });
    assert!(h.dispatcher.registry().room(&code).is_none());
    assert_eq!(h.dispatcher.registry().room_count(), 0);
}

#[test]
fn fresh_room_survives_unrelated_disconnects() {
    let mut h = Harness::new(9);
    h.connect(1);
    h.connect(2);
    h.connect(3);
    let old = h.create(2);
    h.join(2, &old);
    let code = h.create(1);

    h.dispatcher.handle(Command::Disconnect { conn: 3 });
    h.dispatcher.handle(Command::Disconnect { conn: 2 });
    assert!(h.dispatcher.registry().room(&old).is_none());
    h.join(1, &code);
}

#[test]
fn second_join_from_a_seated_connection_is_ignored() {
    let mut h = Harness::new(10);
    h.connect(1);
    h.connect(2);
    let code = h.create(1);
    let a = h.join(1, &code);

    h.act(1, ClientMessage::JoinRoom { code: code.clone() });
    assert!(h.drain(1).is_empty());

    let b = h.join(2, &code);
    assert_ne!(a, b);
    assert_eq!(h.dispatcher.registry().connections_in(&code), vec![1, 2]);
}
