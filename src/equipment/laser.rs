use async_trait::async_trait;
use strum_macros::{AsRefStr, EnumIter};

use crate::{
    equipment::BaseEquipment,
    error::{Error, Result},
    protocol::ErrorStatus,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, AsRefStr)]
pub enum LaserMode {
    /// Lasing whenever the trigger input is not held low
    Continuous,
    /// Pulses follow the external trigger input
    ExternalTrigger,
}

#[async_trait]
/* Don't warn about unused arguments for default implementations */
#[allow(unused_variables)]
pub trait LaserEquipment: BaseEquipment {
    /// Output power as an integer percentage, 0-100
    async fn set_power(&mut self, percent: i32) -> Result<()>;

    async fn get_power(&mut self) -> Result<u8>;

    async fn set_enabled(&mut self, enabled: bool) -> Result<()>;

    async fn set_mode(&mut self, mode: LaserMode) -> Result<()> {
        Err(Error::Unimplemented("Not implemented".into()))
    }

    async fn get_error(&mut self) -> Result<ErrorStatus> {
        Err(Error::Unimplemented("Not implemented".into()))
    }
}
