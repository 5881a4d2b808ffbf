pub mod drivers;
pub mod laser;
pub mod lcr_meter;
pub mod measurement;

use async_trait::async_trait;

use crate::{
    equipment::drivers::{laser_dlnsec::DlnsecLaser, lcr_bk891::Bk891},
    error::{Error, Result},
    protocol::Transport,
};

#[async_trait]
pub trait BaseEquipment: Send {
    /// Name used in log records for this instrument
    fn label(&self) -> &str;

    async fn connect(&mut self) -> Result<()>;

    /// Leave the instrument in a safe state and release the transport
    async fn disconnect(&mut self) -> Result<()>;
}

pub enum Equipment {
    Laser(DlnsecLaser),
    LcrMeter(Bk891),
}

/// Build a driver by name (`dlnsec`/`laser` or `bk891`/`lcr`) on top of an
/// open transport.
pub fn equipment_from_name(
    name: &str,
    label: impl Into<String>,
    transport: Box<dyn Transport>,
) -> Result<Equipment> {
    match name.to_lowercase().as_str() {
        "dlnsec" | "laser" => Ok(Equipment::Laser(DlnsecLaser::new(
            label,
            transport,
            Default::default(),
        ))),
        "bk891" | "891" | "lcr" => Ok(Equipment::LcrMeter(Bk891::new(label, transport))),
        _ => Err(Error::NotSupported(format!("Unknown instrument `{name}`"))),
    }
}
