//! Measurement functions of 890-series LCR meters and decoding of their
//! `:MEAS:RESU?` replies.
//!
//! A result reply carries two comma separated fields with the unit baked into
//! the text, e.g. `"1.25e-08F, 3.20"`. Which unit is attached to which field
//! depends on the active function, so decoding is driven by a static
//! per-function table.

use std::{fmt::Display, str::FromStr};

use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::{
    data::{Reading, Unit},
    error::{Error, Result},
};

/// Measurement function selector, as sent with `:MEAS:FUNC <n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, AsRefStr, EnumString)]
#[repr(u8)]
pub enum MeasurementMode {
    #[strum(serialize = "Cs-Q")]
    CsQ = 0,
    #[strum(serialize = "Cs-D")]
    CsD = 1,
    #[strum(serialize = "Cs-Rs")]
    CsRs = 2,
    #[strum(serialize = "Cp-Q")]
    CpQ = 3,
    #[strum(serialize = "Cp-D")]
    CpD = 4,
    #[strum(serialize = "Cp-Rp")]
    CpRp = 5,
    #[strum(serialize = "Cp-G")]
    CpG = 6,
    #[strum(serialize = "Ls-Q")]
    LsQ = 7,
    #[strum(serialize = "Ls-D")]
    LsD = 8,
    #[strum(serialize = "Ls-Rs")]
    LsRs = 9,
    #[strum(serialize = "Lp-Q")]
    LpQ = 10,
    #[strum(serialize = "Lp-D")]
    LpD = 11,
    #[strum(serialize = "Lp-Rp")]
    LpRp = 12,
    #[strum(serialize = "Lp-G")]
    LpG = 13,
    #[strum(serialize = "Z-deg")]
    ZTheta = 14,
    #[strum(serialize = "Y-deg")]
    YTheta = 15,
    #[strum(serialize = "R-X")]
    RX = 16,
    #[strum(serialize = "G-B")]
    GB = 17,
    #[strum(serialize = "DCR")]
    Dcr = 18,
}
impl MeasurementMode {
    pub const COUNT: usize = 19;

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn rule(self) -> &'static ModeRule {
        &MODE_RULES[self as usize]
    }

    /// Number of values a result reply carries in this mode
    pub fn arity(self) -> usize {
        if self.rule().second.is_some() { 2 } else { 1 }
    }

    /// Parse a `:MEAS:FUNC?` reply, either the numeric index or the name.
    pub fn from_reply(reply: &str) -> Result<Self> {
        let reply = reply.trim();
        if let Ok(idx) = reply.parse::<u8>() {
            return Self::try_from(idx).map_err(|_| {
                Error::BadResponse(format!("Unknown measurement function: {reply}"))
            });
        }
        Self::from_str(reply)
            .map_err(|_| Error::BadResponse(format!("Unknown measurement function: {reply}")))
    }
}
impl TryFrom<u8> for MeasurementMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        use MeasurementMode::*;

        Ok(match value {
            0 => CsQ,
            1 => CsD,
            2 => CsRs,
            3 => CpQ,
            4 => CpD,
            5 => CpRp,
            6 => CpG,
            7 => LsQ,
            8 => LsD,
            9 => LsRs,
            10 => LpQ,
            11 => LpD,
            12 => LpRp,
            13 => LpG,
            14 => ZTheta,
            15 => YTheta,
            16 => RX,
            17 => GB,
            18 => Dcr,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "Measurement function {value} out of range 0-18"
                )));
            }
        })
    }
}
impl Display for MeasurementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_ref(), self.index())
    }
}

/// How one reply field is decoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRule {
    /// Trailing unit text the meter appends to the value
    pub suffix: Option<&'static str>,
    pub unit: Unit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeRule {
    pub first: FieldRule,
    /// `None` for single-value functions
    pub second: Option<FieldRule>,
}

const fn field(suffix: &'static str, unit: Unit) -> FieldRule {
    FieldRule {
        suffix: Some(suffix),
        unit,
    }
}

const FARAD: FieldRule = field("F", Unit::Capacitance);
const HENRY: FieldRule = field("H", Unit::Inductance);
const OHM: FieldRule = field("ohm", Unit::Resistance);
const SIEMENS: FieldRule = field("S", Unit::Conductance);
const DEGREE: FieldRule = field("deg", Unit::Angle);
const FACTOR: FieldRule = FieldRule {
    suffix: None,
    unit: Unit::None,
};

const fn pair(first: FieldRule, second: FieldRule) -> ModeRule {
    ModeRule {
        first,
        second: Some(second),
    }
}

/// Indexed by [`MeasurementMode::index`]
static MODE_RULES: [ModeRule; MeasurementMode::COUNT] = [
    pair(FARAD, FACTOR),   // Cs-Q
    pair(FARAD, FACTOR),   // Cs-D
    pair(FARAD, OHM),      // Cs-Rs
    pair(FARAD, FACTOR),   // Cp-Q
    pair(FARAD, FACTOR),   // Cp-D
    pair(FARAD, OHM),      // Cp-Rp
    pair(FARAD, SIEMENS),  // Cp-G
    pair(HENRY, FACTOR),   // Ls-Q
    pair(HENRY, FACTOR),   // Ls-D
    pair(HENRY, OHM),      // Ls-Rs
    pair(HENRY, FACTOR),   // Lp-Q
    pair(HENRY, FACTOR),   // Lp-D
    pair(HENRY, OHM),      // Lp-Rp
    pair(HENRY, SIEMENS),  // Lp-G
    pair(OHM, DEGREE),     // Z-deg
    pair(SIEMENS, DEGREE), // Y-deg
    pair(OHM, OHM),        // R-X
    pair(SIEMENS, SIEMENS), // G-B
    ModeRule {
        first: OHM,
        second: None,
    }, // DCR
];

/// Values of a result reply. Arity follows the mode it was decoded with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecodedMeasurement {
    Pair(f64, f64),
    Single(f64),
}
impl DecodedMeasurement {
    pub fn primary(&self) -> f64 {
        match self {
            Self::Pair(value, _) | Self::Single(value) => *value,
        }
    }

    pub fn secondary(&self) -> Option<f64> {
        match self {
            Self::Pair(_, value) => Some(*value),
            Self::Single(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub mode: MeasurementMode,
    pub values: DecodedMeasurement,
}
impl Measurement {
    pub fn readings(&self) -> Vec<Reading> {
        let rule = self.mode.rule();
        let mut readings = vec![Reading::new(rule.first.unit, self.values.primary())];
        if let (Some(second), Some(value)) = (rule.second, self.values.secondary()) {
            readings.push(Reading::new(second.unit, value));
        }
        readings
    }
}
impl Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let readings: Vec<_> = self.readings().iter().map(Reading::to_string).collect();
        write!(f, "{}: {}", self.mode.as_ref(), readings.join(", "))
    }
}

fn decode_field(name: &str, text: &str, rule: &FieldRule) -> Result<f64> {
    let text = text.trim();
    let text = match rule.suffix {
        Some(suffix) => text.strip_suffix(suffix).unwrap_or(text),
        None => text,
    };
    text.trim().parse().map_err(|_| Error::Parse {
        field: name.to_string(),
        raw_text: text.to_string(),
    })
}

/// Decode a raw `:MEAS:RESU?` reply produced while `mode` was active.
pub fn decode(mode: MeasurementMode, raw: &str) -> Result<DecodedMeasurement> {
    let rule = mode.rule();
    let fields: Vec<_> = raw.split(',').collect();

    match (fields.as_slice(), &rule.second) {
        ([first, second], Some(second_rule)) => Ok(DecodedMeasurement::Pair(
            decode_field("first", first, &rule.first)?,
            decode_field("second", second, second_rule)?,
        )),
        ([first], None) => Ok(DecodedMeasurement::Single(decode_field(
            "first",
            first,
            &rule.first,
        )?)),
        _ => Err(Error::Parse {
            field: format!("{} values for {}", mode.arity(), mode.as_ref()),
            raw_text: raw.to_string(),
        }),
    }
}
