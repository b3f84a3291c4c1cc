use tokio::io::{duplex, DuplexStream};

use crate::transport::{StreamTransport, DEFAULT_MAX_FRAME_SIZE};

/// Loopback connection for tests: a client-side transport plus the raw
/// stream the server end should be handed.
pub struct InMemoryTransport;

impl InMemoryTransport {
    pub fn pair() -> (StreamTransport<DuplexStream>, DuplexStream) {
        let (client, server) = duplex(DEFAULT_MAX_FRAME_SIZE as usize * 2);
        (StreamTransport::new(client), server)
    }
}
