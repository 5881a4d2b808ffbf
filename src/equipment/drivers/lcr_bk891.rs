//! B&K Precision 891 LCR meter.
//!
//! Writes are not checked against an error register: the meter accepts
//! settings silently, unlike the laser driver.

use async_trait::async_trait;
use futures::future::BoxFuture;
use log::{debug, info, warn};

use crate::{
    equipment::{
        BaseEquipment,
        lcr_meter::LcrMeterEquipment,
        measurement::{self, Measurement, MeasurementMode},
    },
    error::{Error, Result},
    model::ModelInfo,
    protocol::{Channel, ChannelConfig, Transport},
};

pub struct Bk891 {
    channel: Channel,
    model: Option<ModelInfo>,
    /// Last measurement function sent to the meter. Result replies are
    /// always decoded with this.
    mode: Option<MeasurementMode>,
}
impl Bk891 {
    pub fn new(label: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self::with_config(label, transport, ChannelConfig::default())
    }

    pub fn with_config(
        label: impl Into<String>,
        transport: Box<dyn Transport>,
        config: ChannelConfig,
    ) -> Self {
        Self {
            channel: Channel::new(label, transport, config),
            model: None,
            mode: None,
        }
    }

    pub async fn get_idn(&mut self) -> Result<String> {
        self.channel.query("*IDN?").await
    }

    pub async fn model(&mut self) -> Result<ModelInfo> {
        if let Some(model) = &self.model {
            return Ok(model.clone());
        }

        let model = ModelInfo::from_idn(&self.get_idn().await?)?;
        self.model = Some(model.clone());
        Ok(model)
    }

    /// Measurement function the next result will be decoded with, if known
    pub fn tracked_mode(&self) -> Option<MeasurementMode> {
        self.mode
    }

    /// Select a measurement function by its raw index.
    pub async fn set_measurement_function(&mut self, num: u8) -> Result<()> {
        self.set_mode(MeasurementMode::try_from(num)?).await
    }

    /// Series capacitance and quality factor
    pub async fn get_measurement_csq(&mut self) -> Result<Measurement> {
        self.get_measurement(MeasurementMode::CsQ).await
    }

    /// Connect, run `body`, then disconnect on every exit path.
    ///
    /// A failure in `connect` or `body` is returned even if the disconnect
    /// that follows also fails.
    pub async fn with_session<T, F>(mut self, body: F) -> Result<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a mut Bk891) -> BoxFuture<'a, Result<T>>,
    {
        let res = match self.connect().await {
            Ok(()) => body(&mut self).await,
            Err(e) => Err(e),
        };
        let disconnect = self.disconnect().await;

        match (res, disconnect) {
            (Ok(val), Ok(())) => Ok(val),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(disconnect_err)) => {
                warn!(
                    device = self.label();
                    "Disconnect after error also failed: {disconnect_err}"
                );
                Err(e)
            }
        }
    }

    async fn mode_or_query(&mut self) -> Result<MeasurementMode> {
        match self.mode {
            Some(mode) => Ok(mode),
            None => {
                let mode = self.get_mode().await?;
                self.mode = Some(mode);
                Ok(mode)
            }
        }
    }
}
#[async_trait]
impl BaseEquipment for Bk891 {
    fn label(&self) -> &str {
        self.channel.label()
    }

    async fn connect(&mut self) -> Result<()> {
        let model = self.model().await?;
        info!(device = self.label(); "Connected to {model}");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.mode = None;
        self.channel.close().await
    }
}
#[async_trait]
impl LcrMeterEquipment for Bk891 {
    async fn get_frequency(&mut self) -> Result<f64> {
        self.channel.query_f64(":FREQ?").await
    }

    async fn set_frequency(&mut self, hz: f64) -> Result<()> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Frequency {hz} Hz must be a positive number"
            )));
        }

        self.channel.send(&format!(":FREQ {hz}")).await?;
        info!(device = self.label(); "Set frequency to {hz} Hz");
        Ok(())
    }

    async fn get_ac_level(&mut self) -> Result<f64> {
        self.channel.query_f64(":LEV:AC?").await
    }

    async fn set_ac_level(&mut self, volts: f64) -> Result<()> {
        if !volts.is_finite() || volts < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "AC level {volts} V must be a non-negative number"
            )));
        }

        self.channel.send(&format!(":LEV:AC {volts}")).await?;
        info!(device = self.label(); "Set AC level to {volts} V");
        Ok(())
    }

    async fn get_mode(&mut self) -> Result<MeasurementMode> {
        let resp = self.channel.query(":MEAS:FUNC?").await?;
        MeasurementMode::from_reply(&resp)
    }

    async fn set_mode(&mut self, mode: MeasurementMode) -> Result<()> {
        self.channel
            .send(&format!(":MEAS:FUNC {}", mode.index()))
            .await?;
        self.mode = Some(mode);

        debug!(device = self.label(); "Measurement function set to {mode}");
        Ok(())
    }

    async fn read_result(&mut self) -> Result<Measurement> {
        let mode = self.mode_or_query().await?;

        let resp = self.channel.query(":MEAS:RESU?").await?;
        let values = measurement::decode(mode, &resp)?;

        Ok(Measurement { mode, values })
    }
}
