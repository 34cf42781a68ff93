//! Pinned dial: connect to one chosen address whatever the URL host says.

use std::io;
use std::net::SocketAddr;
use tokio::net::TcpStream;

#[derive(Debug, Clone, Copy)]
pub struct PinnedDial {
    index: usize,
    addr: SocketAddr,
}

impl PinnedDial {
    pub fn new(index: usize, addr: SocketAddr) -> Self {
        Self { index, addr }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn connect(&self) -> io::Result<TcpStream> {
        tracing::debug!("{}: dialing {}", self.index, self.addr);
        let stream = TcpStream::connect(self.addr).await?;
        stream.set_nodelay(true)?;
        if let Ok(local) = stream.local_addr() {
            tracing::debug!("{}: connected {} -> {}", self.index, local, self.addr);
        }
        Ok(stream)
    }
}
