use async_trait::async_trait;

use crate::{
    equipment::{
        BaseEquipment,
        measurement::{Measurement, MeasurementMode},
    },
    error::{Error, Result},
};

#[async_trait]
/* Don't warn about unused arguments for default implementations */
#[allow(unused_variables)]
pub trait LcrMeterEquipment: BaseEquipment {
    /// Test signal frequency, in hertz
    async fn get_frequency(&mut self) -> Result<f64>;

    async fn set_frequency(&mut self, hz: f64) -> Result<()>;

    /// Test signal RMS level, in volts
    async fn get_ac_level(&mut self) -> Result<f64> {
        Err(Error::Unimplemented("Not implemented".into()))
    }

    async fn set_ac_level(&mut self, volts: f64) -> Result<()> {
        Err(Error::Unimplemented("Not implemented".into()))
    }

    async fn get_mode(&mut self) -> Result<MeasurementMode>;

    async fn set_mode(&mut self, mode: MeasurementMode) -> Result<()>;

    /// Select `mode`, then read one result in it
    async fn get_measurement(&mut self, mode: MeasurementMode) -> Result<Measurement> {
        self.set_mode(mode).await?;
        self.read_result().await
    }

    /// Read one result in the currently selected mode
    async fn read_result(&mut self) -> Result<Measurement>;
}
