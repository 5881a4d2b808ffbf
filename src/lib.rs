//! Drivers for laboratory instruments spoken to with line-terminated ASCII
//! commands: a DLnsec pulsed laser and a B&K Precision 891 LCR meter.

pub mod data;
pub mod equipment;
pub mod error;
pub mod model;
pub mod protocol;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
