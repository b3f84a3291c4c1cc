#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod board;
mod common;
mod config;
pub mod projection;
pub mod room;
mod sanitizer;
mod ship;

#[cfg(feature = "std")]
pub mod assets;
#[cfg(feature = "std")]
pub mod bot;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod rate_limit;
#[cfg(feature = "std")]
pub mod registry;
#[cfg(feature = "std")]
pub mod server;
#[cfg(feature = "std")]
pub mod transport;

pub use board::*;
pub use common::*;
pub use config::*;
pub use projection::{project, RoomView};
pub use room::{Phase, Player, PlayerId, Room, ShotOutcome};
pub use sanitizer::sanitize_fleet;
pub use ship::*;

#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use protocol::{ClientMessage, ErrorKind, ServerMessage};
#[cfg(feature = "std")]
pub use registry::SessionRegistry;
#[cfg(feature = "std")]
pub use server::{Server, ServerConfig};
#[cfg(feature = "std")]
pub use transport::{TcpTransport, Transport};
