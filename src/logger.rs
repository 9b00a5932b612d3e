use crate::config::Config;

use chrono::Local;
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Installs the [`Logger`] with the level from `config`.
pub fn init(config: &Config) -> Result<(), SetLoggerError> {
    log::set_logger(&Logger)?;
    log::set_max_level(config.loglevel);
    Ok(())
}

/// Writes records of this crate to stdout. Records of dependencies (serenity,
/// rustls, ...) are dropped.
pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = Local::now().format("%Y-%m-%d %H:%M:%S");

        println!("[{}] [{}] {}", now, level_str(record.level()), record.args());
    }

    fn flush(&self) {}
}

fn level_str(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
