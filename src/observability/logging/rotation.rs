//! Size-bounded rotating log file.
//!
//! # Layout
//! ```text
//! logs/app.log     active segment
//! logs/app.log.1   most recent rotated segment
//! ...
//! logs/app.log.N   oldest kept segment (N = max_backups)
//! ```
//!
//! When the next line would push the active segment past `max_bytes`, every
//! segment shifts up by one, the one beyond `max_backups` is deleted and a
//! fresh active segment is opened.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::sink::LogSink;

/// A log file that rotates by size and keeps a bounded number of segments.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    state: Mutex<FileState>,
}

#[derive(Debug, Default)]
struct FileState {
    file: Option<File>,
    written: u64,
}

impl RotatingFile {
    /// The file is opened lazily on the first write.
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_backups: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            max_backups,
            state: Mutex::new(FileState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of segment `index`; index 0 is the active file.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        if index == 0 {
            return self.path.clone();
        }
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(format!(".{index}"));
        self.path.with_file_name(name)
    }

    fn open(&self) -> io::Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let len = file.metadata()?.len();
        Ok((file, len))
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        // Close the active segment before renaming it.
        state.file = None;
        state.written = 0;

        if self.max_backups == 0 {
            return remove_if_exists(&self.path);
        }

        remove_if_exists(&self.segment_path(self.max_backups))?;
        for index in (1..self.max_backups).rev() {
            rename_if_exists(&self.segment_path(index), &self.segment_path(index + 1))?;
        }
        rename_if_exists(&self.path, &self.segment_path(1))
    }
}

impl LogSink for RotatingFile {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let len = line.len() as u64 + 1;

        if state.file.is_none() {
            let (file, written) = self.open()?;
            state.file = Some(file);
            state.written = written;
        }

        if self.max_bytes > 0 && state.written > 0 && state.written + len > self.max_bytes {
            self.rotate(&mut state)?;
            let (file, written) = self.open()?;
            state.file = Some(file);
            state.written = written;
        }

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let result = match state.file.as_mut() {
            Some(file) => file.write_all(buf.as_bytes()),
            None => Err(io::Error::other("log file is not open")),
        };
        match result {
            Ok(()) => {
                state.written += len;
                Ok(())
            }
            Err(err) => {
                // Reopen on the next write.
                state.file = None;
                Err(err)
            }
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

fn rename_if_exists(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 29 characters plus the newline: 30 bytes per line.
    fn line(i: usize) -> String {
        format!("{i:0>29}")
    }

    fn segment_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_rotates_at_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path().join("app.log"), 100, 2);

        for i in 1..=10 {
            file.write_line(&line(i)).unwrap();
        }

        // 3 lines fit per segment; lines 1-3 were rotated out.
        let active = fs::read_to_string(file.segment_path(0)).unwrap();
        let first = fs::read_to_string(file.segment_path(1)).unwrap();
        let second = fs::read_to_string(file.segment_path(2)).unwrap();

        assert_eq!(active, format!("{}\n", line(10)));
        assert_eq!(first.lines().collect::<Vec<_>>(), vec![line(7), line(8), line(9)]);
        assert_eq!(second.lines().collect::<Vec<_>>(), vec![line(4), line(5), line(6)]);
        assert!(!file.segment_path(3).exists());
    }

    #[test]
    fn test_segment_count_never_exceeds_bound() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path().join("app.log"), 64, 3);

        for i in 0..500 {
            file.write_line(&line(i)).unwrap();
            assert!(segment_count(dir.path()) <= 4);
        }
        assert_eq!(segment_count(dir.path()), 4);
    }

    #[test]
    fn test_segment_never_exceeds_cap() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path().join("app.log"), 95, 5);

        for i in 0..50 {
            file.write_line(&line(i)).unwrap();
        }
        for index in 0..=5 {
            let len = fs::metadata(file.segment_path(index)).unwrap().len();
            assert!(len <= 95, "segment {index} is {len} bytes");
        }
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, format!("{}\n{}\n", line(1), line(2))).unwrap();

        let file = RotatingFile::new(&path, 100, 1);
        file.write_line(&line(3)).unwrap();
        // Existing 60 bytes count toward the cap.
        file.write_line(&line(4)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", line(4)));
        assert_eq!(
            fs::read_to_string(file.segment_path(1)).unwrap().lines().count(),
            3
        );
    }

    #[test]
    fn test_zero_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path().join("app.log"), 60, 0);

        for i in 0..5 {
            file.write_line(&line(i)).unwrap();
        }
        assert_eq!(segment_count(dir.path()), 1);
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            format!("{}\n", line(4))
        );
    }

    #[test]
    fn test_unwritable_path_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = RotatingFile::new(dir.path().join("missing").join("app.log"), 100, 1);
        assert!(file.write_line("lost").is_err());

        // Recovers once the directory exists.
        fs::create_dir(dir.path().join("missing")).unwrap();
        assert!(file.write_line("kept").is_ok());
    }

    #[test]
    fn test_segment_path_naming() {
        let file = RotatingFile::new("logs/app.log", 10, 5);
        assert_eq!(file.segment_path(0), PathBuf::from("logs/app.log"));
        assert_eq!(file.segment_path(3), PathBuf::from("logs/app.log.3"));
    }
}
