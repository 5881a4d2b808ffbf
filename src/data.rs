use std::fmt::Display;

use strum_macros::EnumIter;

fn get_prefix_and_scale(val: f64) -> (&'static str, f64) {
    let aval = val.abs();
    if aval == 0.0 {
        ("", val)
    } else if aval < 1e-12 {
        ("f", val / 1e-15)
    } else if aval < 1e-9 {
        ("p", val / 1e-12)
    } else if aval < 1e-6 {
        ("n", val / 1e-9)
    } else if aval < 1e-3 {
        ("u", val / 1e-6)
    } else if aval < 1e0 {
        ("m", val / 1e-3)
    } else if aval < 1e3 {
        ("", val)
    } else if aval < 1e6 {
        ("k", val / 1e3)
    } else if aval < 1e9 {
        ("M", val / 1e6)
    } else if aval < 1e12 {
        ("G", val / 1e9)
    } else {
        ("T", val / 1e12)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter)]
pub enum Unit {
    /// Unitless, e.g. quality or dissipation factor
    None,
    /// Voltage - volts
    Voltage,
    /// Resistance, reactance or impedance - ohms
    Resistance,
    /// Conductance, susceptance or admittance - siemens
    Conductance,
    /// Capacitance - farads
    Capacitance,
    /// Inductance - henries
    Inductance,
    /// Phase angle - degrees
    Angle,
    /// Frequency - hertz
    Frequency,
    /// Percentage of full scale
    Percent,
}
impl Unit {
    fn unit_abbrev(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Voltage => "V",
            Self::Resistance => "Ω",
            Self::Conductance => "S",
            Self::Capacitance => "F",
            Self::Inductance => "H",
            Self::Angle => "°",
            Self::Frequency => "Hz",
            Self::Percent => "%",
        }
    }

    /// Whether SI prefixes make sense for this unit
    fn scalable(&self) -> bool {
        !matches!(self, Self::None | Self::Angle | Self::Percent)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub unit: Unit,
    pub value: f64,
}
impl Reading {
    pub fn new(unit: Unit, value: f64) -> Self {
        Self { unit, value }
    }
}
impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.is_nan() {
            write!(f, "OVERLOAD {}", self.unit.unit_abbrev())
        } else if !self.unit.scalable() {
            write!(f, "{}{}", self.value, self.unit.unit_abbrev())
        } else {
            let (prefix, value) = get_prefix_and_scale(self.value);

            write!(f, "{} {}{}", value, prefix, self.unit.unit_abbrev())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_si_prefix() {
        assert_eq!(
            Reading::new(Unit::Capacitance, 12.5e-9).to_string(),
            format!("{} nF", 12.5e-9 / 1e-9)
        );
        assert_eq!(Reading::new(Unit::Resistance, 100.0).to_string(), "100 Ω");
        assert_eq!(Reading::new(Unit::Frequency, 0.0).to_string(), "0 Hz");
    }

    #[test]
    fn unitless_and_angles_are_not_scaled() {
        assert_eq!(Reading::new(Unit::None, 0.002).to_string(), "0.002");
        assert_eq!(Reading::new(Unit::Angle, -45.0).to_string(), "-45°");
        assert_eq!(Reading::new(Unit::Percent, 50.0).to_string(), "50%");
    }

    #[test]
    fn meter_settings_display() {
        assert_eq!(Reading::new(Unit::Voltage, 0.5).to_string(), "500 mV");
        assert_eq!(Reading::new(Unit::Frequency, 10_000.0).to_string(), "10 kHz");
        assert_eq!(Reading::new(Unit::Percent, 100.0).to_string(), "100%");
    }

    #[test]
    fn nan_is_overload() {
        assert_eq!(
            Reading::new(Unit::Resistance, f64::NAN).to_string(),
            "OVERLOAD Ω"
        );
    }
}
