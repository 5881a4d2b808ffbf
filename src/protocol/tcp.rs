use std::net::SocketAddr;

use tokio::net::TcpStream;

use crate::{error::Result, protocol::StreamTransport};

/// Connect to a raw socket instrument port (e.g. 5025).
pub async fn open_tcp(socket: SocketAddr) -> Result<StreamTransport<TcpStream>> {
    let stream = TcpStream::connect(socket).await?;
    stream.set_nodelay(true)?;

    Ok(StreamTransport::new(socket.to_string(), stream))
}
