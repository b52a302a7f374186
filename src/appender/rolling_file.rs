//! Appends formatted records to a file, rotating once it grows past a
//! configured size.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use crate::appender::{Appender, Encoding};
use crate::error::{LogError, Result};
use crate::level::Level;

/// Appender backed by a single growing file, rotated to `<path>.N` once it
/// exceeds `max_bytes`. Keeps at most `max_backups` rotated files, deleting
/// the oldest when the limit would otherwise be exceeded.
pub struct RollingFileAppender {
    path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    writer: BufWriter<File>,
    written: u64,
    encoding: Encoding,
    scratch: Vec<u8>,
}

impl RollingFileAppender {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, max_backups: usize) -> Result<Self> {
        let path = path.into();
        let (writer, written) = Self::open_writer(&path)?;
        Ok(RollingFileAppender {
            path,
            max_bytes,
            max_backups,
            writer,
            written,
            encoding: Encoding::default(),
            scratch: Vec::new(),
        })
    }

    fn open_writer(path: &Path) -> Result<(BufWriter<File>, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::AppenderFailure {
                appender: "rolling_file".to_string(),
                source,
            })?;
        let written = file
            .metadata()
            .map_err(|source| LogError::AppenderFailure {
                appender: "rolling_file".to_string(),
                source,
            })?
            .len();
        Ok((BufWriter::new(file), written))
    }

    fn rotate(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|source| LogError::AppenderFailure {
                appender: "rolling_file".to_string(),
                source,
            })?;

        if self.max_backups > 0 {
            let oldest = self.backup_path(self.max_backups);
            if oldest.exists() {
                let _ = fs::remove_file(&oldest);
            }
            for n in (1..self.max_backups).rev() {
                let from = self.backup_path(n);
                if from.exists() {
                    let _ = fs::rename(&from, self.backup_path(n + 1));
                }
            }
            let _ = fs::rename(&self.path, self.backup_path(1));
        }

        let (writer, written) = Self::open_writer(&self.path)?;
        self.writer = writer;
        self.written = written;
        Ok(())
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }
}

impl Appender for RollingFileAppender {
    fn write(&mut self, _level: Level, message: &str) -> Result<()> {
        if self.written >= self.max_bytes {
            self.rotate()?;
        }
        self.encoding.encode_into(message, &mut self.scratch);
        let line_len = self.scratch.len() as u64 + 1;
        self.writer
            .write_all(&self.scratch)
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(|source| LogError::AppenderFailure {
                appender: "rolling_file".to_string(),
                source,
            })?;
        self.written += line_len;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|source| LogError::AppenderFailure {
                appender: "rolling_file".to_string(),
                source,
            })
    }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn set_encoding(&mut self, encoding: Encoding) -> Result<()> {
        self.encoding = encoding;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_once_size_threshold_is_crossed() {
        let dir = std::env::temp_dir().join(format!("swiftlog-test-{:?}", std::thread::current().id()));
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("app.log");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_file(format!("{}.1", path.display()));

        let mut appender = RollingFileAppender::open(&path, 16, 2).unwrap();
        appender.write(Level::Info, "0123456789").unwrap();
        appender.write(Level::Info, "0123456789").unwrap(); // crosses 16 bytes, rotates next write
        appender.flush().unwrap();

        assert!(path.exists());
        assert!(PathBuf::from(format!("{}.1", path.display())).exists());
    }
}
