use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::Instant,
};

use crate::{
    error::{Error, Result},
    protocol::{Transport, printable},
};

/// [`Transport`] over any async byte stream: a serial port, a TCP socket, or
/// an in-memory duplex pipe.
pub struct StreamTransport<S> {
    name: String,
    stream: Option<S>,
}
impl<S> StreamTransport<S> {
    pub fn new(name: impl Into<String>, stream: S) -> Self {
        Self {
            name: name.into(),
            stream: Some(stream),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn int_send(&mut self, data: &[u8]) -> Result<()> {
        let Some(stream) = &mut self.stream else {
            return Err(Error::Unspecified(format!("{} not connected", self.name)));
        };

        debug!("int_send(): {}", printable(data));

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn recv_until(&mut self, delimiter: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        let Some(stream) = &mut self.stream else {
            return Err(Error::Unspecified(format!("{} not connected", self.name)));
        };

        debug!("recv_until({}, {timeout:?})", printable(delimiter));

        let timed_out = || {
            Error::Timeout(format!(
                "Timed out waiting for {} for {} ms",
                printable(delimiter),
                timeout.as_millis()
            ))
        };

        let mut data = vec![];
        let end = Instant::now() + timeout;

        loop {
            let now = Instant::now();
            if now >= end {
                return Err(timed_out());
            }
            let remaining = end - now;

            match tokio::time::timeout(remaining, stream.read_u8()).await {
                Err(_) => return Err(timed_out()),
                Ok(res) => {
                    data.push(res?);
                    if data.ends_with(delimiter) {
                        debug!("recv_until: {}", printable(&data));
                        return Ok(data);
                    }
                }
            }
        }
    }

    async fn flush_rx(&mut self, timeout: Duration) -> Result<()> {
        let Some(stream) = &mut self.stream else {
            return Err(Error::Unspecified(format!("{} not connected", self.name)));
        };

        debug!("flush_rx({timeout:?})");

        let mut buf = [0u8; 64];
        let end = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= end {
                break;
            }
            let remaining = end - now;

            match tokio::time::timeout(remaining, stream.read(&mut buf)).await {
                Err(_) => break,
                /* EOF, nothing more will arrive */
                Ok(Ok(0)) => break,
                Ok(res) => {
                    res?;
                }
            }
        }

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}
