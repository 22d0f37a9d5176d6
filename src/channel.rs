// src/channel.rs
// One channel of a capture: typed header plus time/value samples

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, ScopeError};
use crate::header::{Channel, Header};

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRecord {
    header: Header,
    time: Vec<f64>,
    value: Vec<f64>,
}

impl ChannelRecord {
    /// Pair a parsed header with its sample columns.
    ///
    /// Both columns must hold exactly `header.record_len()` samples.
    pub fn assemble(header: Header, time: Vec<f64>, value: Vec<f64>) -> Result<Self> {
        let expected = header.record_len();
        if time.len() != value.len() || time.len() != expected {
            return Err(ScopeError::LengthMismatch {
                time: time.len(),
                value: value.len(),
                expected,
            });
        }

        Ok(ChannelRecord {
            header,
            time,
            value,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Declared source of this record.
    pub fn channel(&self) -> Channel {
        self.header.source
    }

    /// Sample times in seconds.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Samples in `header().vertical_units`.
    pub fn value(&self) -> &[f64] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Write `Time,Value` rows to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        self.write_to(File::create(output_file)?)
    }

    pub fn write_to<W: Write>(&self, output: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(output);
        writer.write_record(["Time", "Value"])?;

        for (t, v) in self.time.iter().zip(&self.value) {
            writer.write_record([t.to_string(), v.to_string()])?;
        }

        writer.flush()?;
        Ok(())
    }
}
