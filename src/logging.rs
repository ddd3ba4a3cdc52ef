use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use env_logger::{Builder, Target};

use crate::config::AppConfig;

#[cfg(target_os = "macos")]
const PLATFORM_LOG_SEGMENTS: &[&str] = &["Library", "Logs", "WishCraft"];
#[cfg(not(target_os = "macos"))]
const PLATFORM_LOG_SEGMENTS: &[&str] = &[".config", "wishcraft", "logs"];

const LOG_FILE_NAME: &str = "wishcraft.log";

pub fn log_directory() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    for segment in PLATFORM_LOG_SEGMENTS {
        path.push(segment);
    }
    Some(path)
}

pub fn log_file_path() -> Option<PathBuf> {
    let mut dir = log_directory()?;
    dir.push(LOG_FILE_NAME);
    Some(dir)
}

/// Installs the global logger: stdout, plus the log file when enabled.
///
/// `RUST_LOG` still takes precedence over the configured level.
pub fn init(config: &AppConfig) -> Result<()> {
    let mut builder = Builder::new();
    builder
        .filter_level(config.log_level())
        .format_timestamp_millis()
        .parse_default_env();

    let log_file = if config.log_to_file {
        open_log_file()
    } else {
        None
    };
    match log_file {
        Some(file) => builder.target(Target::Pipe(Box::new(Tee { file }))),
        None => builder.target(Target::Stdout),
    };

    builder.try_init().context("logger already initialised")
}

fn open_log_file() -> Option<File> {
    let path = log_file_path()?;
    fs::create_dir_all(path.parent()?).ok()?;
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Mirrors every record to stdout and the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}
