//! File table over `std::fs`.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use condmacro_core::{FileMode, FileTable, HostError};
use tracing::debug;

use crate::policy::wildcard;

#[derive(Debug)]
enum OpenFile {
    Reader(BufReader<File>),
    Writer(File),
}

/// Open files keyed by handle. Handles start at 1 and are never reused
/// within one table.
#[derive(Debug, Default)]
pub struct StdFileTable {
    open: HashMap<u32, OpenFile>,
    last: u32,
}

impl StdFileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles currently open.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    fn entry(&mut self, handle: u32) -> Result<&mut OpenFile, HostError> {
        self.open.get_mut(&handle).ok_or(HostError::BadHandle)
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

impl FileTable for StdFileTable {
    fn open(&mut self, path: &Path, mode: FileMode) -> Result<u32, HostError> {
        let mut options = OpenOptions::new();
        match mode {
            FileMode::CreateNew => options.write(true).create_new(true),
            FileMode::Create => options.write(true).create(true).truncate(true),
            FileMode::Open => options.read(true),
            FileMode::OpenOrCreate => options.write(true).create(true),
            FileMode::Truncate => options.write(true).truncate(true),
            FileMode::Append => options.append(true).create(true),
        };
        let file = options.open(path)?;
        let entry = if mode.is_read() {
            OpenFile::Reader(BufReader::new(file))
        } else {
            OpenFile::Writer(file)
        };
        self.last += 1;
        self.open.insert(self.last, entry);
        debug!(path = %path.display(), mode = %mode, handle = self.last, "file opened");
        Ok(self.last)
    }

    fn close(&mut self, handle: u32) -> Result<(), HostError> {
        match self.open.remove(&handle) {
            Some(OpenFile::Writer(mut file)) => Ok(file.flush()?),
            Some(OpenFile::Reader(_)) => Ok(()),
            None => Err(HostError::BadHandle),
        }
    }

    fn read_line(&mut self, handle: u32) -> Result<Option<String>, HostError> {
        let OpenFile::Reader(reader) = self.entry(handle)? else {
            return Err(HostError::WrongMode {
                handle,
                operation: "reading",
            });
        };
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn write(&mut self, handle: u32, text: &str, newline: bool) -> Result<(), HostError> {
        let OpenFile::Writer(file) = self.entry(handle)? else {
            return Err(HostError::WrongMode {
                handle,
                operation: "writing",
            });
        };
        file.write_all(text.as_bytes())?;
        if newline {
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    fn seek(&mut self, handle: u32, position: u64) -> Result<(), HostError> {
        match self.entry(handle)? {
            OpenFile::Reader(reader) => reader.seek(SeekFrom::Start(position))?,
            OpenFile::Writer(file) => file.seek(SeekFrom::Start(position))?,
        };
        Ok(())
    }

    fn tell(&mut self, handle: u32) -> Result<u64, HostError> {
        let position = match self.entry(handle)? {
            OpenFile::Reader(reader) => reader.stream_position()?,
            OpenFile::Writer(file) => file.stream_position()?,
        };
        Ok(position)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, HostError> {
        let re = wildcard(pattern).map_err(|err| HostError::Io(err.to_string()))?;
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .is_some_and(|name| re.is_match(&name.to_string_lossy()));
            if matches && path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    fn file_length(&self, path: &Path) -> Result<u64, HostError> {
        Ok(fs::metadata(path)?.len())
    }

    fn create_dir(&self, path: &Path) -> Result<(), HostError> {
        Ok(fs::create_dir_all(path)?)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, HostError> {
        Ok(fs::read_to_string(path)?)
    }

    fn system_path(&self, id: &str) -> Option<PathBuf> {
        let home = home_dir();
        match id.to_ascii_lowercase().as_str() {
            "temp" => Some(std::env::temp_dir()),
            "userprofile" => home,
            "desktop" | "desktopdirectory" => home.map(|h| h.join("Desktop")),
            "mydocuments" | "personal" => home.map(|h| h.join("Documents")),
            "mymusic" => home.map(|h| h.join("Music")),
            "mypictures" => home.map(|h| h.join("Pictures")),
            "myvideos" => home.map(|h| h.join("Videos")),
            "applicationdata" => std::env::var_os("APPDATA")
                .map(PathBuf::from)
                .or_else(|| home.map(|h| h.join(".config"))),
            "localapplicationdata" => std::env::var_os("LOCALAPPDATA")
                .map(PathBuf::from)
                .or_else(|| home.map(|h| h.join(".local").join("share"))),
            "current" => std::env::current_dir().ok(),
            _ => None,
        }
    }
}
