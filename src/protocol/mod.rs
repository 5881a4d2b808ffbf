use std::time::Duration;

use async_trait::async_trait;
use tokio::net::lookup_host;

mod channel;
mod executor;
mod serial;
mod stream;
mod tcp;

pub use channel::{Channel, ChannelConfig};
pub use executor::{ErrorStatus, ReliableExecutor, RetryPolicy};
pub use serial::{DEFAULT_BAUD, open_serial};
pub use stream::StreamTransport;
pub use tcp::open_tcp;

use crate::error::{Error, Result};

/// Byte-oriented duplex connection to an instrument.
///
/// Implementations are already connected when handed to a driver; command
/// and reply correlation relies on calls being strictly ordered, so a
/// transport must not be shared between drivers.
#[async_trait]
pub trait Transport: Send {
    async fn int_send(&mut self, data: &[u8]) -> Result<()>;

    /// Read until `delimiter` has been received, returning everything read
    /// including the delimiter.
    async fn recv_until(&mut self, delimiter: &[u8], timeout: Duration) -> Result<Vec<u8>>;

    /// Discard anything received within `timeout`.
    async fn flush_rx(&mut self, timeout: Duration) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;
}

/// Render line terminators visibly for wire logging.
pub(crate) fn printable(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .replace('\n', "␤")
        .replace('\r', "␍")
}

/// Parsed connection address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Serial { path: String, baud: u32 },
    Tcp { host: String, port: u16 },
}
impl Endpoint {
    /// Accepts:
    ///  - `serial:<path>[?baud=<baud>]`
    ///  - `tcp://<host>:<port>`
    ///  - `TCPIP[board]::<host>::<port>::SOCKET` (VISA raw socket resource)
    pub fn parse(uri: &str) -> Result<Self> {
        if let Some(rest) = uri.strip_prefix("serial:") {
            let (path, baud) = match rest.split_once("?baud=") {
                Some((path, baud)) => (
                    path,
                    baud.parse().map_err(|_| {
                        Error::InvalidArgument(format!("Invalid baud rate in `{uri}`"))
                    })?,
                ),
                None => (rest, DEFAULT_BAUD),
            };
            if path.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "Missing serial port in `{uri}`"
                )));
            }
            Ok(Self::Serial {
                path: path.to_string(),
                baud,
            })
        } else if let Some(rest) = uri.strip_prefix("tcp://") {
            let Some((host, port)) = rest.rsplit_once(':') else {
                return Err(Error::InvalidArgument(format!("Missing port in `{uri}`")));
            };
            Self::tcp(uri, host, port)
        } else if uri.to_uppercase().starts_with("TCPIP") {
            let parts: Vec<_> = uri.split("::").collect();
            match parts.as_slice() {
                [_, host, port, kind] if kind.eq_ignore_ascii_case("SOCKET") => {
                    Self::tcp(uri, host, port)
                }
                _ => Err(Error::NotSupported(format!(
                    "Only raw SOCKET VISA resources are supported: `{uri}`"
                ))),
            }
        } else {
            Err(Error::NotSupported(format!("Unrecognized address `{uri}`")))
        }
    }

    fn tcp(uri: &str, host: &str, port: &str) -> Result<Self> {
        let port = port
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("Invalid port in `{uri}`")))?;
        if host.is_empty() {
            return Err(Error::InvalidArgument(format!("Missing host in `{uri}`")));
        }
        Ok(Self::Tcp {
            host: host.to_string(),
            port,
        })
    }
}

/// Open a transport from a URI, see [`Endpoint::parse`].
pub async fn transport_from_uri(uri: &str) -> Result<Box<dyn Transport>> {
    match Endpoint::parse(uri)? {
        Endpoint::Serial { path, baud } => Ok(Box::new(open_serial(&path, baud)?)),
        Endpoint::Tcp { host, port } => {
            let Some(socket) = lookup_host((host.as_str(), port)).await?.next() else {
                return Err(Error::Unspecified(format!("Could not resolve `{host}`")));
            };
            Ok(Box::new(open_tcp(socket).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serial_uri() {
        assert_eq!(
            Endpoint::parse("serial:/dev/ttyUSB0").unwrap(),
            Endpoint::Serial {
                path: "/dev/ttyUSB0".into(),
                baud: 9600
            }
        );
        assert_eq!(
            Endpoint::parse("serial:COM3?baud=115200").unwrap(),
            Endpoint::Serial {
                path: "COM3".into(),
                baud: 115200
            }
        );
        assert!(matches!(
            Endpoint::parse("serial:COM3?baud=fast"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn parses_tcp_and_visa_socket() {
        assert_eq!(
            Endpoint::parse("tcp://192.168.1.20:5025").unwrap(),
            Endpoint::Tcp {
                host: "192.168.1.20".into(),
                port: 5025
            }
        );
        assert_eq!(
            Endpoint::parse("TCPIP0::lcr.lab::5025::SOCKET").unwrap(),
            Endpoint::Tcp {
                host: "lcr.lab".into(),
                port: 5025
            }
        );
        assert!(matches!(
            Endpoint::parse("TCPIP0::lcr.lab::inst0::INSTR"),
            Err(Error::NotSupported(_))
        ));
        assert!(matches!(
            Endpoint::parse("gpib://1"),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn printable_marks_terminators() {
        assert_eq!(printable(b"PWR?\n\r"), "PWR?␤␍");
    }
}
