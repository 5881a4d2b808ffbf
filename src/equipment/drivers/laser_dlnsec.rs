//! Labs Electronics DLnsec pulsed diode laser, controlled over a 9600 baud
//! serial line.
//!
//! Every state-changing command is verified against `ERR?` and resent when
//! the laser rejects it.

use std::{fmt::Display, time::Duration};

use async_trait::async_trait;
use futures::future::BoxFuture;
use log::{info, warn};
use tokio::time::sleep;

use crate::{
    equipment::{
        BaseEquipment,
        laser::{LaserEquipment, LaserMode},
    },
    error::{Error, Result},
    protocol::{Channel, ChannelConfig, ErrorStatus, ReliableExecutor, RetryPolicy, Transport},
};

/// Time allowed for stale input to drain on open
const FLUSH_WINDOW: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct DlnsecConfig {
    pub channel: ChannelConfig,
    pub retry: RetryPolicy,
    /// Time the laser needs to come back after `*RBT`
    pub reboot_delay: Duration,
}
impl Default for DlnsecConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig {
                write_terminator: "\n".into(),
                read_terminator: b"\n\r".to_vec(),
                timeout: Duration::from_secs(1),
                settle_delay: Duration::from_millis(100),
            },
            retry: RetryPolicy::default(),
            reboot_delay: Duration::from_secs(2),
        }
    }
}

pub struct DlnsecLaser {
    exec: ReliableExecutor,
    reboot_delay: Duration,
    idn: Option<String>,
}
impl DlnsecLaser {
    pub fn new(
        label: impl Into<String>,
        transport: Box<dyn Transport>,
        config: DlnsecConfig,
    ) -> Self {
        let channel = Channel::new(label, transport, config.channel);

        Self {
            exec: ReliableExecutor::new(channel, config.retry),
            reboot_delay: config.reboot_delay,
            idn: None,
        }
    }

    /// Identification read on [`open`](Self::open)
    pub fn idn(&self) -> Option<&str> {
        self.idn.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.idn.is_some()
    }

    /// Reset the laser to its power-on defaults and read its identification.
    pub async fn open(&mut self) -> Result<()> {
        self.exec.channel().flush_rx(FLUSH_WINDOW).await?;
        self.reboot().await?;

        let idn = self.exec.channel().query("*IDN").await?;
        if idn.is_empty() {
            return Err(Error::BadResponse("Failed getting laser ID number".into()));
        }

        info!(device = self.label(); "Connected to DLnsec [{idn}]");
        self.idn = Some(idn);

        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.idn = None;
        self.exec.channel().close().await
    }

    /// Turn the output off, then close the connection. The connection is
    /// closed even when the laser does not acknowledge the off command.
    pub async fn shutdown(&mut self) -> Result<()> {
        let off = self.off().await;
        let close = self.close().await;
        off.and(close)
    }

    /// Reboot the laser, applying default settings on startup.
    pub async fn reboot(&mut self) -> Result<()> {
        self.exec.channel().send("*RBT").await?;
        sleep(self.reboot_delay).await;

        info!(device = self.label(); "Rebooted");
        Ok(())
    }

    /// Open the laser, run `body`, then shut it down on every exit path.
    ///
    /// The first error wins: a failure in `open` or `body` is returned even
    /// if the shutdown that follows also fails.
    pub async fn with_session<T, F>(mut self, body: F) -> Result<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut DlnsecLaser) -> BoxFuture<'a, Result<T>>,
    {
        let res = match self.open().await {
            Ok(()) => body(&mut self).await,
            Err(e) => Err(e),
        };
        let shutdown = self.shutdown().await;

        match (res, shutdown) {
            (Ok(val), Ok(())) => Ok(val),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(shutdown_err)) => {
                warn!(device = self.label(); "Shutdown after error also failed: {shutdown_err}");
                Err(e)
            }
        }
    }

    pub async fn cw_mode(&mut self) -> Result<()> {
        self.exec.execute("LASE").await?;
        info!(device = self.label(); "Set to CW mode");
        Ok(())
    }

    pub async fn trig_mode(&mut self) -> Result<()> {
        self.exec.execute("EXT").await?;
        info!(device = self.label(); "Set to external trigger mode");
        Ok(())
    }

    /// Turn the output stage on.
    pub async fn on(&mut self) -> Result<()> {
        self.exec.execute("*ON").await?;
        info!(device = self.label(); "Turned power on");
        Ok(())
    }

    /// Turn the output stage off.
    pub async fn off(&mut self) -> Result<()> {
        self.exec.execute("*OFF").await?;
        info!(device = self.label(); "Turned power off");
        Ok(())
    }
}
impl Display for DlnsecLaser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.idn {
            Some(idn) => write!(f, "[{idn}]"),
            None => write!(f, "DLnsec [Not Connected]"),
        }
    }
}
#[async_trait]
impl BaseEquipment for DlnsecLaser {
    fn label(&self) -> &str {
        self.exec.label()
    }

    async fn connect(&mut self) -> Result<()> {
        self.open().await
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.shutdown().await
    }
}
#[async_trait]
impl LaserEquipment for DlnsecLaser {
    async fn set_power(&mut self, percent: i32) -> Result<()> {
        if !(0..=100).contains(&percent) {
            return Err(Error::InvalidArgument(format!(
                "The power [{percent}] must be an integer between 0-100"
            )));
        }

        self.exec.execute(&format!("PWR{percent}")).await?;
        info!(device = self.label(); "Set power to [{percent}%]");
        Ok(())
    }

    async fn get_power(&mut self) -> Result<u8> {
        let resp = self.exec.channel().query("PWR?").await?;
        let power = resp.trim().parse().map_err(|_| Error::Parse {
            field: "power".into(),
            raw_text: resp.clone(),
        })?;

        info!(device = self.label(); "Got power [{power}%]");
        Ok(power)
    }

    async fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if enabled { self.on().await } else { self.off().await }
    }

    async fn set_mode(&mut self, mode: LaserMode) -> Result<()> {
        match mode {
            LaserMode::Continuous => self.cw_mode().await,
            LaserMode::ExternalTrigger => self.trig_mode().await,
        }
    }

    async fn get_error(&mut self) -> Result<ErrorStatus> {
        let status = self.exec.error_status().await?;
        info!(device = self.label(); "Checked for error: {status:?}");
        Ok(status)
    }
}
