use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::{
    error::{Error, Result},
    protocol::StreamTransport,
};

pub const DEFAULT_BAUD: u32 = 9600;

/// Open a serial port as a line transport. 8N1, no flow control.
pub fn open_serial(path: &str, baud: u32) -> Result<StreamTransport<SerialStream>> {
    let serial = tokio_serial::new(path, baud)
        .open_native_async()
        .map_err(|e| Error::Unhandled(e.into()))?;

    Ok(StreamTransport::new(format!("{path}@{baud}"), serial))
}
