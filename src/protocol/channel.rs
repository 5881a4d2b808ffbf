use std::time::Duration;

use log::debug;
use tokio::time::sleep;

use crate::{
    error::{Error, Result},
    protocol::Transport,
};

#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Appended to every command
    pub write_terminator: String,
    /// A reply is complete once this sequence is received
    pub read_terminator: Vec<u8>,
    /// Maximum time to wait for a complete reply
    pub timeout: Duration,
    /// Pause after every write before the device accepts the next operation
    pub settle_delay: Duration,
}
impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            write_terminator: "\n".into(),
            read_terminator: b"\n".to_vec(),
            timeout: Duration::from_secs(1),
            settle_delay: Duration::ZERO,
        }
    }
}

/// Line-oriented command/query channel on top of a [`Transport`].
///
/// Every call runs to completion before returning, so a reply always belongs
/// to the command written immediately before it.
pub struct Channel {
    label: String,
    transport: Box<dyn Transport>,
    config: ChannelConfig,
}
impl Channel {
    pub fn new(
        label: impl Into<String>,
        transport: Box<dyn Transport>,
        config: ChannelConfig,
    ) -> Self {
        Self {
            label: label.into(),
            transport,
            config,
        }
    }

    /// Name attached to every log record for this instrument
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub async fn send(&mut self, command: &str) -> Result<()> {
        if !command.is_ascii() {
            return Err(Error::InvalidArgument(format!(
                "Command `{command}` is not ASCII"
            )));
        }

        let mut to_send = Vec::with_capacity(command.len() + self.config.write_terminator.len());
        to_send.extend_from_slice(command.as_bytes());
        to_send.extend_from_slice(self.config.write_terminator.as_bytes());
        self.transport.int_send(&to_send).await?;

        debug!(device = self.label.as_str(); "Sent [{command}]");

        if !self.config.settle_delay.is_zero() {
            sleep(self.config.settle_delay).await;
        }

        Ok(())
    }

    /// Receive a single reply line, without terminator characters.
    pub async fn recv(&mut self) -> Result<String> {
        let resp = self
            .transport
            .recv_until(&self.config.read_terminator, self.config.timeout)
            .await?;
        if !resp.is_ascii() {
            return Err(Error::BadResponse(format!(
                "Reply is not ASCII: {}",
                String::from_utf8_lossy(&resp)
            )));
        }
        let resp = String::from_utf8_lossy(&resp)
            .trim_matches(|c| c == '\r' || c == '\n')
            .to_string();

        debug!(device = self.label.as_str(); "Response [{resp}]");

        Ok(resp)
    }

    pub async fn query(&mut self, command: &str) -> Result<String> {
        self.send(command).await?;
        self.recv().await
    }

    pub async fn query_f64(&mut self, command: &str) -> Result<f64> {
        let resp = self.query(command).await?;
        resp.trim().parse().map_err(|_| Error::Parse {
            field: command.to_string(),
            raw_text: resp,
        })
    }

    /// Drop any unread input, e.g. left over from before a reboot.
    pub async fn flush_rx(&mut self, timeout: Duration) -> Result<()> {
        self.transport.flush_rx(timeout).await
    }

    pub async fn close(&mut self) -> Result<()> {
        debug!(device = self.label.as_str(); "Closing connection");
        self.transport.disconnect().await
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt, duplex},
        time::Instant,
    };

    use super::*;
    use crate::protocol::StreamTransport;

    fn channel(device: tokio::io::DuplexStream, config: ChannelConfig) -> Channel {
        Channel::new("test", Box::new(StreamTransport::new("duplex", device)), config)
    }

    #[tokio::test]
    async fn send_appends_terminator() {
        let (mut host, device) = duplex(64);
        let mut chan = channel(device, ChannelConfig::default());

        chan.send(":FREQ 1000").await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = host.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b":FREQ 1000\n");
    }

    #[tokio::test]
    async fn query_strips_terminators() {
        let (mut host, device) = duplex(64);
        let mut chan = channel(
            device,
            ChannelConfig {
                read_terminator: b"\n\r".to_vec(),
                ..Default::default()
            },
        );

        host.write_all(b"50\n\r").await.unwrap();
        assert_eq!(chan.query("PWR?").await.unwrap(), "50");
    }

    #[tokio::test]
    async fn query_f64_reports_unparseable_reply() {
        let (mut host, device) = duplex(64);
        let mut chan = channel(device, ChannelConfig::default());

        host.write_all(b"OVLD\n").await.unwrap();
        match chan.query_f64(":LEV:AC?").await {
            Err(Error::Parse { field, raw_text }) => {
                assert_eq!(field, ":LEV:AC?");
                assert_eq!(raw_text, "OVLD");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_ascii_command_is_rejected_before_io() {
        let (mut host, device) = duplex(64);
        let mut chan = channel(device, ChannelConfig::default());

        assert!(matches!(
            chan.send("PWR½").await,
            Err(Error::InvalidArgument(_))
        ));
        chan.close().await.unwrap();

        let mut buf = vec![];
        assert_eq!(host.read_to_end(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn non_ascii_reply_is_rejected() {
        let (mut host, device) = duplex(64);
        let mut chan = channel(device, ChannelConfig::default());

        host.write_all(b"12.5\xb5F\n").await.unwrap();
        assert!(matches!(chan.recv().await, Err(Error::BadResponse(_))));

        /* The bad line is consumed, the next one is read normally */
        host.write_all(b"12.5\n").await.unwrap();
        assert_eq!(chan.recv().await.unwrap(), "12.5");
    }

    #[tokio::test(start_paused = true)]
    async fn settle_delay_follows_write() {
        let (_host, device) = duplex(64);
        let mut chan = channel(
            device,
            ChannelConfig {
                settle_delay: Duration::from_millis(100),
                ..Default::default()
            },
        );

        let start = Instant::now();
        chan.send("*ON").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn query_times_out_without_terminator() {
        let (mut host, device) = duplex(64);
        let mut chan = channel(
            device,
            ChannelConfig {
                timeout: Duration::from_millis(750),
                ..Default::default()
            },
        );

        /* Partial line, never terminated */
        host.write_all(b"12.5").await.unwrap();

        let start = Instant::now();
        let res = chan.query(":FREQ?").await;
        let elapsed = start.elapsed();

        assert!(matches!(res, Err(Error::Timeout(_))));
        assert!(elapsed >= Duration::from_millis(750));
        assert!(elapsed < Duration::from_millis(800));
    }
}
