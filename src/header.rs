// src/header.rs
// Header rows of an oscilloscope CSV capture: vocabulary, typed record, parser

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::error::{Result, ScopeError};

/// Raw `Parameter name -> Value` pairs taken from the top rows of a capture.
pub type RawHeader = BTreeMap<String, String>;

/// Probe input that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Channel {
    Channel1,
    Channel2,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Channel1, Channel::Channel2];

    pub fn token(self) -> &'static str {
        match self {
            Channel::Channel1 => "CH1",
            Channel::Channel2 => "CH2",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Channel {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(s).ok_or_else(|| {
            ScopeError::invalid(Parameter::Source.token(), format!("'{s}' is not a channel"))
        })
    }
}

/// Physical unit of a vertical or horizontal axis.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unit {
    Voltage,
    Current,
    Seconds,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Voltage, Unit::Current, Unit::Seconds];

    pub fn token(self) -> &'static str {
        match self {
            Unit::Voltage => "V",
            Unit::Current => "A",
            Unit::Seconds => "s",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.token() == token)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Unit {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(s).ok_or_else(|| ScopeError::UnknownToken {
            kind: "unit",
            token: s.to_string(),
        })
    }
}

/// The fixed header vocabulary. Tokens are matched case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    RecordLength,
    SampleInterval,
    TriggerPoint,
    Source,
    VerticalUnits,
    VerticalScale,
    VerticalOffset,
    HorizontalUnits,
    HorizontalScale,
    PointFormat,
    YZero,
    ProbeAttenuation,
    ModelNumber,
    SerialNumber,
    FirmwareVersion,
}

impl Parameter {
    pub const ALL: [Parameter; 15] = [
        Parameter::RecordLength,
        Parameter::SampleInterval,
        Parameter::TriggerPoint,
        Parameter::Source,
        Parameter::VerticalUnits,
        Parameter::VerticalScale,
        Parameter::VerticalOffset,
        Parameter::HorizontalUnits,
        Parameter::HorizontalScale,
        Parameter::PointFormat,
        Parameter::YZero,
        Parameter::ProbeAttenuation,
        Parameter::ModelNumber,
        Parameter::SerialNumber,
        Parameter::FirmwareVersion,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Parameter::RecordLength => "Record Length",
            Parameter::SampleInterval => "Sample Interval",
            Parameter::TriggerPoint => "Trigger Point",
            Parameter::Source => "Source",
            Parameter::VerticalUnits => "Vertical Units",
            Parameter::VerticalScale => "Vertical Scale",
            Parameter::VerticalOffset => "Vertical Offset",
            Parameter::HorizontalUnits => "Horizontal Units",
            Parameter::HorizontalScale => "Horizontal Scale",
            Parameter::PointFormat => "Pt Fmt",
            Parameter::YZero => "Yzero",
            Parameter::ProbeAttenuation => "Probe Atten",
            Parameter::ModelNumber => "Model Number",
            Parameter::SerialNumber => "Serial Number",
            Parameter::FirmwareVersion => "Firmware Version",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Typed acquisition settings for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub record_length: f64,
    pub sample_interval: f64,
    pub trigger_point: f64,
    pub source: Channel,
    pub vertical_units: Unit,
    pub vertical_scale: f64,
    pub vertical_offset: f64,
    pub horizontal_units: Unit,
    pub horizontal_scale: f64,
    pub y_zero: f64,
    pub probe_attenuation: u32,
    pub model_number: String,
    pub serial_number: String,
    pub firmware_version: String,
}

impl Header {
    /// Parse a raw header mapping into a typed header.
    ///
    /// Every key must belong to the vocabulary and every one of the 15
    /// parameters must be present. `Pt Fmt` is required but not kept.
    pub fn parse(raw: &RawHeader) -> Result<Self> {
        let mut builder = HeaderBuilder::default();
        for (key, value) in raw {
            builder.set(key, value)?;
        }
        let header = builder.build()?;
        debug!(
            "Parsed header: source={}, record_length={}, model={}",
            header.source, header.record_length, header.model_number
        );
        Ok(header)
    }

    /// Collect `(key, value)` pairs and parse them. A repeated key keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let raw: RawHeader = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::parse(&raw)
    }

    /// Samples per second.
    pub fn sample_rate(&self) -> f64 {
        1.0 / self.sample_interval
    }

    /// Expected sample count.
    pub fn record_len(&self) -> usize {
        self.record_length.round() as usize
    }
}

type Coerce = fn(&mut HeaderBuilder, Parameter, &str) -> Result<()>;

/// Token-indexed coercion table; one entry per vocabulary parameter.
static SCHEMA: [(Parameter, Coerce); 15] = [
    (Parameter::RecordLength, |b, p, v| {
        b.record_length = Some(count(p, v)?);
        Ok(())
    }),
    (Parameter::SampleInterval, |b, p, v| {
        b.sample_interval = Some(float(p, v)?);
        Ok(())
    }),
    (Parameter::TriggerPoint, |b, p, v| {
        b.trigger_point = Some(float(p, v)?);
        Ok(())
    }),
    (Parameter::Source, |b, _, v| {
        b.source = Some(v.parse()?);
        Ok(())
    }),
    (Parameter::VerticalUnits, |b, p, v| {
        b.vertical_units = Some(unit(p, v)?);
        Ok(())
    }),
    (Parameter::VerticalScale, |b, p, v| {
        b.vertical_scale = Some(float(p, v)?);
        Ok(())
    }),
    (Parameter::VerticalOffset, |b, p, v| {
        b.vertical_offset = Some(float(p, v)?);
        Ok(())
    }),
    (Parameter::HorizontalUnits, |b, p, v| {
        b.horizontal_units = Some(unit(p, v)?);
        Ok(())
    }),
    (Parameter::HorizontalScale, |b, p, v| {
        b.horizontal_scale = Some(float(p, v)?);
        Ok(())
    }),
    (Parameter::PointFormat, |b, _, v| {
        b.point_format = Some(v.to_string());
        Ok(())
    }),
    (Parameter::YZero, |b, p, v| {
        b.y_zero = Some(float(p, v)?);
        Ok(())
    }),
    (Parameter::ProbeAttenuation, |b, p, v| {
        b.probe_attenuation = Some(attenuation(p, v)?);
        Ok(())
    }),
    (Parameter::ModelNumber, |b, _, v| {
        b.model_number = Some(v.to_string());
        Ok(())
    }),
    (Parameter::SerialNumber, |b, _, v| {
        b.serial_number = Some(v.to_string());
        Ok(())
    }),
    (Parameter::FirmwareVersion, |b, _, v| {
        b.firmware_version = Some(v.to_string());
        Ok(())
    }),
];

fn float(param: Parameter, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| {
        ScopeError::invalid(param.token(), format!("'{raw}' is not a number"))
    })
}

/// A whole, non-negative sample count.
fn count(param: Parameter, raw: &str) -> Result<f64> {
    let value = float(param, raw)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(ScopeError::invalid(
            param.token(),
            format!("'{raw}' is not a valid sample count"),
        ));
    }
    Ok(value)
}

fn unit(param: Parameter, raw: &str) -> Result<Unit> {
    Unit::from_token(raw.trim()).ok_or_else(|| {
        ScopeError::invalid(param.token(), format!("'{raw}' is not a known unit"))
    })
}

fn attenuation(param: Parameter, raw: &str) -> Result<u32> {
    let value = float(param, raw)?;
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(ScopeError::invalid(
            param.token(),
            format!("'{raw}' is not a valid attenuation"),
        ));
    }
    Ok(value.trunc() as u32)
}

/// Accumulates coerced values until every parameter has been seen.
#[derive(Debug, Default, Clone)]
pub struct HeaderBuilder {
    record_length: Option<f64>,
    sample_interval: Option<f64>,
    trigger_point: Option<f64>,
    source: Option<Channel>,
    vertical_units: Option<Unit>,
    vertical_scale: Option<f64>,
    vertical_offset: Option<f64>,
    horizontal_units: Option<Unit>,
    horizontal_scale: Option<f64>,
    point_format: Option<String>,
    y_zero: Option<f64>,
    probe_attenuation: Option<u32>,
    model_number: Option<String>,
    serial_number: Option<String>,
    firmware_version: Option<String>,
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `key` against the vocabulary and store its coerced value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        let (param, coerce) = SCHEMA
            .iter()
            .find(|(p, _)| p.token() == key)
            .ok_or_else(|| ScopeError::invalid(key, "not a recognized parameter"))?;
        let value = value.trim();
        coerce(self, *param, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Header> {
        fn need<T>(slot: Option<T>, param: Parameter) -> Result<T> {
            slot.ok_or(ScopeError::MissingParameter(param))
        }

        need(self.point_format, Parameter::PointFormat)?;

        Ok(Header {
            record_length: need(self.record_length, Parameter::RecordLength)?,
            sample_interval: need(self.sample_interval, Parameter::SampleInterval)?,
            trigger_point: need(self.trigger_point, Parameter::TriggerPoint)?,
            source: need(self.source, Parameter::Source)?,
            vertical_units: need(self.vertical_units, Parameter::VerticalUnits)?,
            vertical_scale: need(self.vertical_scale, Parameter::VerticalScale)?,
            vertical_offset: need(self.vertical_offset, Parameter::VerticalOffset)?,
            horizontal_units: need(self.horizontal_units, Parameter::HorizontalUnits)?,
            horizontal_scale: need(self.horizontal_scale, Parameter::HorizontalScale)?,
            y_zero: need(self.y_zero, Parameter::YZero)?,
            probe_attenuation: need(self.probe_attenuation, Parameter::ProbeAttenuation)?,
            model_number: need(self.model_number, Parameter::ModelNumber)?,
            serial_number: need(self.serial_number, Parameter::SerialNumber)?,
            firmware_version: need(self.firmware_version, Parameter::FirmwareVersion)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawHeader {
        [
            ("Record Length", "2.500000e+03"),
            ("Sample Interval", "2.000000e-10"),
            ("Trigger Point", "1.250000000000e+03"),
            ("Source", "CH1"),
            ("Vertical Units", "V"),
            ("Vertical Scale", "1.000000e+00"),
            ("Vertical Offset", "-2.400000e+00"),
            ("Horizontal Units", "s"),
            ("Horizontal Scale", "5.000000e-08"),
            ("Pt Fmt", "Y"),
            ("Yzero", "0.000000e+00"),
            ("Probe Atten", "1.000000e+00"),
            ("Model Number", "TDS2022C"),
            ("Serial Number", "C050447"),
            ("Firmware Version", "FV:v24.26"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_header_from_raw() {
        let header = Header::parse(&sample_raw()).unwrap();

        let expected = Header {
            record_length: 2.5e3,
            sample_interval: 2.0e-10,
            trigger_point: 1.25e3,
            source: Channel::Channel1,
            vertical_units: Unit::Voltage,
            vertical_scale: 1.0,
            vertical_offset: -2.4,
            horizontal_units: Unit::Seconds,
            horizontal_scale: 5e-8,
            y_zero: 0.0,
            probe_attenuation: 1,
            model_number: "TDS2022C".to_string(),
            serial_number: "C050447".to_string(),
            firmware_version: "FV:v24.26".to_string(),
        };

        assert_eq!(header, expected);
        assert_eq!(header.record_len(), 2500);
    }

    #[test]
    fn test_unknown_key_is_rejected_by_name() {
        let mut raw = sample_raw();
        raw.insert("Weird entry".to_string(), "3.4e3".to_string());

        let err = Header::parse(&raw).unwrap_err();
        assert!(matches!(err, ScopeError::InvalidParameter { ref key, .. } if key == "Weird entry"));
        assert!(err.to_string().contains("Weird entry"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut raw = sample_raw();
        let value = raw.remove("Yzero").unwrap();
        raw.insert("YZero".to_string(), value);

        assert!(matches!(
            Header::parse(&raw),
            Err(ScopeError::InvalidParameter { ref key, .. }) if key == "YZero"
        ));
    }

    #[test]
    fn test_every_missing_parameter_is_reported() {
        for param in Parameter::ALL {
            let mut raw = sample_raw();
            raw.remove(param.token());

            match Header::parse(&raw) {
                Err(ScopeError::MissingParameter(missing)) => assert_eq!(missing, param),
                other => panic!("expected missing {param}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_values_are_invalid_parameters() {
        let cases = [
            ("Source", "CH3"),
            ("Vertical Units", "volts"),
            ("Horizontal Units", "S"),
            ("Probe Atten", "ten"),
            ("Probe Atten", "-1"),
            ("Record Length", "lots"),
        ];

        for (key, value) in cases {
            let mut raw = sample_raw();
            raw.insert(key.to_string(), value.to_string());

            let err = Header::parse(&raw).unwrap_err();
            assert!(
                matches!(err, ScopeError::InvalidParameter { key: ref k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
            assert!(err.to_string().contains(value));
        }
    }

    #[test]
    fn test_probe_attenuation_truncates() {
        let mut raw = sample_raw();
        raw.insert("Probe Atten".to_string(), "1.000000e+01".to_string());
        assert_eq!(Header::parse(&raw).unwrap().probe_attenuation, 10);

        raw.insert("Probe Atten".to_string(), "2.9".to_string());
        assert_eq!(Header::parse(&raw).unwrap().probe_attenuation, 2);
    }

    #[test]
    fn test_record_length_must_be_whole_count() {
        for bad in ["-5", "NaN", "inf", "2500.5"] {
            let mut raw = sample_raw();
            raw.insert("Record Length".to_string(), bad.to_string());

            let err = Header::parse(&raw).unwrap_err();
            assert!(
                matches!(err, ScopeError::InvalidParameter { ref key, .. } if key == "Record Length"),
                "{bad} gave {err:?}"
            );
            assert!(err.to_string().contains(bad));
        }

        let mut raw = sample_raw();
        raw.insert("Record Length".to_string(), "0".to_string());
        assert_eq!(Header::parse(&raw).unwrap().record_len(), 0);
    }

    #[test]
    fn test_pair_order_does_not_matter() {
        let forward: Vec<_> = sample_raw().into_iter().collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            Header::from_pairs(forward).unwrap(),
            Header::from_pairs(reversed).unwrap()
        );
    }

    #[test]
    fn test_channel_and_unit_tokens() {
        assert_eq!("CH2".parse::<Channel>().unwrap(), Channel::Channel2);
        assert_eq!(Channel::Channel1.to_string(), "CH1");
        assert!("ch1".parse::<Channel>().is_err());
        assert_eq!("A".parse::<Unit>().unwrap(), Unit::Current);
        assert!(matches!(
            "x".parse::<Unit>(),
            Err(ScopeError::UnknownToken { kind: "unit", ref token }) if token == "x"
        ));
        assert_eq!(Parameter::from_token("Pt Fmt"), Some(Parameter::PointFormat));
        assert_eq!(Parameter::from_token("Point Format"), None);
    }

    #[test]
    fn test_builder_reports_first_gap() {
        let mut builder = HeaderBuilder::new();
        builder.set("Source", "CH2").unwrap().set("Pt Fmt", "Y").unwrap();

        assert!(matches!(
            builder.build(),
            Err(ScopeError::MissingParameter(Parameter::RecordLength))
        ));
    }
}
