// src/capture.rs
// Capture loading: one file, or a directory holding one file per channel

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::channel::ChannelRecord;
use crate::error::{Result, ScopeError};
use crate::header::{Channel, Header};
use crate::reader;

/// Header rows a Tektronix TDS-series export carries above the data.
pub const DEFAULT_HEADER_ROWS: usize = 18;

/// Most capture files a directory may hold: one per channel.
pub const MAX_CAPTURE_FILES: usize = 2;

/// Loader settings.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Number of leading rows scanned for header pairs.
    pub header_rows: usize,
    /// Capture file extensions, without the dot, matched case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            header_rows: DEFAULT_HEADER_ROWS,
            extensions: vec!["csv".to_string()],
        }
    }
}

/// A complete acquisition with at least one channel present.
#[derive(Debug, Clone)]
pub struct Capture {
    channel_1: Option<ChannelRecord>,
    channel_2: Option<ChannelRecord>,
    input_path: Option<PathBuf>,
}

impl Capture {
    pub fn new(
        channel_1: Option<ChannelRecord>,
        channel_2: Option<ChannelRecord>,
        input_path: Option<PathBuf>,
    ) -> Result<Self> {
        if channel_1.is_none() && channel_2.is_none() {
            return Err(ScopeError::NoChannelDataPresent);
        }

        Ok(Capture {
            channel_1,
            channel_2,
            input_path,
        })
    }

    pub fn channel_1(&self) -> Option<&ChannelRecord> {
        self.channel_1.as_ref()
    }

    pub fn channel_2(&self) -> Option<&ChannelRecord> {
        self.channel_2.as_ref()
    }

    pub fn channel(&self, channel: Channel) -> Option<&ChannelRecord> {
        match channel {
            Channel::Channel1 => self.channel_1(),
            Channel::Channel2 => self.channel_2(),
        }
    }

    /// Present channels in channel order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.channel_1.iter().chain(self.channel_2.iter())
    }

    /// Resolved file or directory the capture was loaded from.
    pub fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref()
    }

    /// Write a `Time,CH1,CH2` table. Absent channels are left blank; present
    /// channels must share one time base.
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        self.write_to(File::create(output_file)?)
    }

    pub fn write_to<W: Write>(&self, output: W) -> Result<()> {
        let time = self
            .channels()
            .next()
            .map(ChannelRecord::time)
            .ok_or(ScopeError::NoChannelDataPresent)?;

        if let (Some(a), Some(b)) = (&self.channel_1, &self.channel_2) {
            if a.time() != b.time() {
                let index = a
                    .time()
                    .iter()
                    .zip(b.time())
                    .position(|(x, y)| x != y)
                    .unwrap_or_else(|| a.len().min(b.len()));
                return Err(ScopeError::TimeBaseMismatch {
                    index,
                    ch1: a.len(),
                    ch2: b.len(),
                });
            }
        }

        let mut writer = csv::Writer::from_writer(output);
        writer.write_record(["Time", "CH1", "CH2"])?;

        let cell = |record: Option<&ChannelRecord>, i: usize| {
            record.map(|r| r.value()[i].to_string()).unwrap_or_default()
        };

        for (i, t) in time.iter().enumerate() {
            writer.write_record([
                t.to_string(),
                cell(self.channel_1(), i),
                cell(self.channel_2(), i),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Loads captures from files and directories.
#[derive(Debug, Clone, Default)]
pub struct CaptureLoader {
    options: LoadOptions,
}

impl CaptureLoader {
    pub fn new(options: LoadOptions) -> Self {
        CaptureLoader { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Parse header and samples of one file.
    pub fn load_record<P: AsRef<Path>>(&self, input_file: P) -> Result<ChannelRecord> {
        let path = input_file.as_ref();
        let rows = reader::read_file(path, self.options.header_rows)?;
        let header = Header::parse(&rows.header)?;
        debug!("{:?} declares {}", path, header.source);
        ChannelRecord::assemble(header, rows.time, rows.value)
    }

    /// Parse only the header of one file.
    pub fn load_header<P: AsRef<Path>>(&self, input_file: P) -> Result<Header> {
        let raw = reader::read_header(input_file, self.options.header_rows)?;
        Header::parse(&raw)
    }

    /// Load a single capture file. The record lands in the slot named by
    /// its header's `Source`.
    pub fn load_single<P: AsRef<Path>>(&self, input_file: P) -> Result<Capture> {
        let input_path = fs::canonicalize(input_file)?;
        let record = self.load_record(&input_path)?;

        let capture = match record.channel() {
            Channel::Channel1 => Capture::new(Some(record), None, Some(input_path))?,
            Channel::Channel2 => Capture::new(None, Some(record), Some(input_path))?,
        };

        info!("Loaded single-channel capture from {:?}", capture.input_path);
        Ok(capture)
    }

    /// Load a directory holding one capture file per channel. Files are found
    /// recursively and routed by their header's `Source`, not by name.
    pub fn load_directory<P: AsRef<Path>>(&self, input_folder: P) -> Result<Capture> {
        let input_path = fs::canonicalize(input_folder)?;
        let files = self.discover(&input_path)?;

        if files.is_empty() {
            return Err(ScopeError::EmptyFolder(input_path));
        }
        if files.len() > MAX_CAPTURE_FILES {
            return Err(ScopeError::CustomFolderStructure {
                path: input_path,
                found: files.len(),
            });
        }

        let mut channel_1 = None;
        let mut channel_2 = None;

        for file in &files {
            let record = self.load_record(file)?;
            let slot = match record.channel() {
                Channel::Channel1 => &mut channel_1,
                Channel::Channel2 => &mut channel_2,
            };
            if slot.is_some() {
                return Err(ScopeError::DuplicateChannel {
                    channel: record.channel(),
                    path: file.clone(),
                });
            }
            *slot = Some(record);
        }

        let capture = Capture::new(channel_1, channel_2, Some(input_path))?;
        info!(
            "Loaded capture from {:?} with {} channel(s)",
            capture.input_path,
            capture.channels().count()
        );
        Ok(capture)
    }

    /// Every capture file under `dir`, sorted by path. Symlinked
    /// directories are not entered.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current)? {
                let entry = entry?;
                let path = entry.path();
                // file_type() does not follow symlinks, so linked directories are skipped
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                } else if self.is_capture_file(&path) {
                    debug!("Found capture file {:?}", path);
                    found.push(path);
                }
            }
        }

        found.sort();
        Ok(found)
    }

    pub fn is_capture_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.options
                    .extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

/// Load a single capture file with default options.
pub fn load_single<P: AsRef<Path>>(input_file: P) -> Result<Capture> {
    CaptureLoader::default().load_single(input_file)
}

/// Load a capture directory with default options.
pub fn load_directory<P: AsRef<Path>>(input_folder: P) -> Result<Capture> {
    CaptureLoader::default().load_directory(input_folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::tests::header_for;

    fn record(source: Channel, samples: &[f64]) -> ChannelRecord {
        let time: Vec<f64> = (0..samples.len()).map(|i| i as f64 * 1e-9).collect();
        ChannelRecord::assemble(header_for(source, samples.len()), time, samples.to_vec())
            .unwrap()
    }

    #[test]
    fn test_no_channel_data_present_error() {
        assert!(matches!(
            Capture::new(None, None, None),
            Err(ScopeError::NoChannelDataPresent)
        ));
    }

    #[test]
    fn test_channel_lookup() {
        let capture = Capture::new(None, Some(record(Channel::Channel2, &[1.0])), None).unwrap();

        assert!(capture.channel_1().is_none());
        assert!(capture.channel(Channel::Channel2).is_some());
        assert_eq!(capture.channels().count(), 1);
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let loader = CaptureLoader::default();

        assert!(loader.is_capture_file(Path::new("F0001CH1.CSV")));
        assert!(loader.is_capture_file(Path::new("renamed.csv")));
        assert!(loader.is_capture_file(Path::new("mixed.CsV")));
        assert!(!loader.is_capture_file(Path::new("notes.txt")));
        assert!(!loader.is_capture_file(Path::new("csv")));
    }

    #[test]
    fn test_merged_csv_leaves_absent_channel_blank() {
        let capture = Capture::new(Some(record(Channel::Channel1, &[0.5, 1.5])), None, None)
            .unwrap();

        let mut out = Vec::new();
        capture.write_to(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Time,CH1,CH2\n0,0.5,\n0.000000001,1.5,\n"
        );
    }

    #[test]
    fn test_merged_csv_requires_shared_time_base() {
        let capture = Capture::new(
            Some(record(Channel::Channel1, &[0.5, 1.5])),
            Some(record(Channel::Channel2, &[0.5])),
            None,
        )
        .unwrap();

        assert!(matches!(
            capture.write_to(Vec::new()),
            Err(ScopeError::TimeBaseMismatch { index: 1, ch1: 2, ch2: 1 })
        ));
    }

    #[test]
    fn test_merged_csv_reports_first_diverging_sample() {
        let shifted = ChannelRecord::assemble(
            header_for(Channel::Channel2, 3),
            vec![0.0, 1e-9, 5e-9],
            vec![0.1, 0.2, 0.3],
        )
        .unwrap();
        let capture = Capture::new(
            Some(record(Channel::Channel1, &[0.5, 1.5, 2.5])),
            Some(shifted),
            None,
        )
        .unwrap();

        let err = capture.write_to(Vec::new()).unwrap_err();
        assert!(matches!(err, ScopeError::TimeBaseMismatch { index: 2, ch1: 3, ch2: 3 }));
        assert!(err.to_string().contains("sample 2"));
    }
}
