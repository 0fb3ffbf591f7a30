use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Local;
use log::Record;

use super::level_name;

/// Size at which the log file gets rotated. 10 MiB.
pub const MAX_BYTES: u64 = 10 * 1024 * 1024;
/// How many rotated log files to keep around.
pub const BACKUP_COUNT: usize = 5;

/// Plain text rendition of a record, one line per record (unless the message
/// itself has newlines in it).
pub fn format_plain(record: &Record) -> String {
    format!(
        "{} - {} - {} - {}",
        Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
        record.target(),
        level_name(record),
        record.args()
    )
}

/// An append-only log file that moves itself out of the way once it gets too big.
///
/// `bot.log` becomes `bot.log.1`, `bot.log.1` becomes `bot.log.2` and so on,
/// up to `backup_count`. Whatever would go past that is deleted.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    size: u64,
}

impl RotatingFile {
    /// Open or create the file at `path` for appending.
    ///
    /// A `max_bytes` of zero means the file is never rotated.
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            size,
        })
    }

    /// Path of the `index`-th backup, e.g. `bot.log.3`.
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Write `line` plus a newline, rotating first if it wouldn't fit.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let incoming = line.len() as u64 + 1;

        // An empty file is never rotated, otherwise a single huge line
        // would leave an empty backup behind.
        if self.max_bytes > 0 && self.size > 0 && self.size + incoming >= self.max_bytes {
            self.roll_over()?;
        }

        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.size += incoming;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn roll_over(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count > 0 {
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    let to = self.backup_path(index + 1);
                    if to.exists() {
                        fs::remove_file(&to)?;
                    }
                    fs::rename(&from, &to)?;
                }
            }

            let first = self.backup_path(1);
            if first.exists() {
                fs::remove_file(&first)?;
            }
            fs::rename(&self.path, &first)?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.size = 0;
        Ok(())
    }
}
