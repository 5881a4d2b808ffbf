use std::fmt::Display;

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct ModelInfo {
    /// Manufacturer and family
    pub man_family: Manufacturer,
    /// Manufacturer string
    pub manufacturer: String,
    /// Model string
    pub model: String,
    /// Serial number
    pub serial: Option<String>,
    /// Version number (as reported by *IDN?)
    pub version: Option<String>,
}
impl ModelInfo {
    pub fn from_idn(idn: &str) -> Result<Self> {
        let idn_sep: Vec<_> = idn.split(',').map(str::trim).collect();
        if idn_sep.len() < 2 {
            return Err(Error::BadResponse(format!("Invalid *IDN? response: {idn}")));
        }

        Ok(Self {
            man_family: Manufacturer::from_idn(&idn_sep),
            manufacturer: idn_sep[0].to_string(),
            model: idn_sep[1].to_string(),
            serial: idn_sep.get(2).map(|s| s.to_string()),
            version: idn_sep.get(3).map(|s| s.to_string()),
        })
    }
}
impl Display for ModelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.manufacturer, self.model)?;
        if let Some(serial) = &self.serial {
            write!(f, " (S/N {serial})")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Manufacturer {
    /// Unknown manufacturer
    Unknown,
    /// B&K Precision
    BkPrecision(BkPrecisionFamily),
    /// Labs Electronics
    LabsElectronics(LabsElectronicsFamily),
}
impl Manufacturer {
    fn from_idn(idn: &[&str]) -> Self {
        let man = idn[0].to_lowercase();

        if man.contains("b&k") || man.contains("bk precision") {
            Self::BkPrecision(BkPrecisionFamily::from_idn(idn))
        } else if man.contains("labs") || idn[1].to_lowercase().contains("dlnsec") {
            Self::LabsElectronics(LabsElectronicsFamily::from_idn(idn))
        } else {
            Self::Unknown
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BkPrecisionFamily {
    Unknown,
    /// BK Precision 890-series LCR meter (889B, 890C, 891)
    Lcr890,
}
impl BkPrecisionFamily {
    fn from_idn(idn: &[&str]) -> Self {
        let model = idn[1].to_lowercase();

        if model.starts_with("89") || model.starts_with("889") {
            Self::Lcr890
        } else {
            Self::Unknown
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabsElectronicsFamily {
    Unknown,
    /// DLnsec pulsed diode laser
    Dlnsec,
}
impl LabsElectronicsFamily {
    fn from_idn(idn: &[&str]) -> Self {
        if idn[1].to_lowercase().contains("dlnsec") {
            Self::Dlnsec
        } else {
            Self::Unknown
        }
    }
}
