use tokio::net::{TcpStream, ToSocketAddrs};

use crate::transport::StreamTransport;

pub type TcpTransport = StreamTransport<TcpStream>;

impl StreamTransport<TcpStream> {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}
