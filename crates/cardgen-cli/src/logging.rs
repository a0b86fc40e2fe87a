//! Logger backend for the `log` facade, configured from the `logging` group.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Context;
use cardgen_core::config::LoggingConfig;
use chrono::{SecondsFormat, Utc};
use log::{LevelFilter, Log, Metadata, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "plain" => Ok(LogFormat::Text),
            other => Err(anyhow::anyhow!(
                "Invalid log format: {} (expected json or text)",
                other
            )),
        }
    }
}

enum Sink {
    Stdout,
    Stderr,
    File(File),
}

impl Sink {
    /// Open the configured sink. With `stdout_reserved`, lines meant for
    /// stdout go to stderr so machine-readable output stays clean.
    fn open(config: &LoggingConfig, stdout_reserved: bool) -> anyhow::Result<Self> {
        match config.output.trim().to_ascii_lowercase().as_str() {
            "stdout" if stdout_reserved => Ok(Sink::Stderr),
            "stdout" => Ok(Sink::Stdout),
            "stderr" => Ok(Sink::Stderr),
            "file" => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("logging.file_path is required for file output"))?;
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create log directory {}", parent.display())
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?;
                Ok(Sink::File(file))
            }
            other => Err(anyhow::anyhow!(
                "Invalid log output: {} (expected stdout, stderr or file)",
                other
            )),
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Sink::Stdout => writeln!(io::stdout().lock(), "{}", line),
            Sink::Stderr => writeln!(io::stderr().lock(), "{}", line),
            Sink::File(file) => writeln!(file, "{}", line),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout => io::stdout().flush(),
            Sink::Stderr => io::stderr().flush(),
            Sink::File(file) => file.flush(),
        }
    }
}

/// Line-oriented logger writing JSON objects or plain text.
pub struct CardgenLogger {
    level: LevelFilter,
    format: LogFormat,
    sink: Mutex<Sink>,
}

impl CardgenLogger {
    fn from_config(
        config: &LoggingConfig,
        verbose: bool,
        stdout_reserved: bool,
    ) -> anyhow::Result<Self> {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            config.level.to_level_filter()
        };
        Ok(Self {
            level,
            format: LogFormat::parse(&config.format)?,
            sink: Mutex::new(Sink::open(config, stdout_reserved)?),
        })
    }

    fn render(&self, record: &Record<'_>) -> String {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        match self.format {
            LogFormat::Json => serde_json::json!({
                "time": timestamp,
                "level": record.level().as_str().to_ascii_lowercase(),
                "target": record.target(),
                "msg": record.args().to_string(),
            })
            .to_string(),
            LogFormat::Text => format!(
                "{} {:<5} {}: {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            ),
        }
    }
}

impl Log for CardgenLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.render(record);
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.write_line(&line);
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.flush();
        }
    }
}

/// Install the process-wide logger.
///
/// `verbose` forces debug level regardless of configuration.
/// `stdout_reserved` is set by commands whose stdout is machine-readable.
pub fn init(config: &LoggingConfig, verbose: bool, stdout_reserved: bool) -> anyhow::Result<()> {
    let logger = CardgenLogger::from_config(config, verbose, stdout_reserved)?;
    let level = logger.level;
    let logger: &'static CardgenLogger = Box::leak(Box::new(logger));
    log::set_logger(logger).map_err(|err| anyhow::anyhow!("Logger already installed: {}", err))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardgen_core::config::LogLevel;
    use log::Level;

    fn config(format: &str, output: &str) -> LoggingConfig {
        LoggingConfig {
            format: format.to_string(),
            output: output.to_string(),
            ..LoggingConfig::default()
        }
    }

    fn record_line(logger: &CardgenLogger, level: Level, message: &str) -> String {
        logger.render(
            &Record::builder()
                .level(level)
                .target("cardgen_core::bootstrap")
                .args(format_args!("{}", message))
                .build(),
        )
    }

    #[test]
    fn test_json_lines() {
        let logger = CardgenLogger::from_config(&config("json", "stderr"), false, false).unwrap();
        let line = record_line(&logger, Level::Info, "Application assembled");
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["msg"], "Application assembled");
        assert_eq!(value["target"], "cardgen_core::bootstrap");
    }

    #[test]
    fn test_text_lines() {
        let logger = CardgenLogger::from_config(&config("text", "stderr"), false, false).unwrap();
        let line = record_line(&logger, Level::Warn, "fallback");
        assert!(line.ends_with("WARN  cardgen_core::bootstrap: fallback"));
    }

    #[test]
    fn test_level_filtering() {
        let mut cfg = config("json", "stderr");
        cfg.level = LogLevel::Warn;
        let logger = CardgenLogger::from_config(&cfg, false, false).unwrap();
        assert!(!logger.enabled(&Metadata::builder().level(Level::Info).build()));
        assert!(logger.enabled(&Metadata::builder().level(Level::Error).build()));

        let logger = CardgenLogger::from_config(&cfg, true, false).unwrap();
        assert!(logger.enabled(&Metadata::builder().level(Level::Debug).build()));
    }

    #[test]
    fn test_reserved_stdout_logs_to_stderr() {
        let logger = CardgenLogger::from_config(&config("json", "stdout"), false, true).unwrap();
        assert!(matches!(*logger.sink.lock().unwrap(), Sink::Stderr));

        let logger = CardgenLogger::from_config(&config("json", "stdout"), false, false).unwrap();
        assert!(matches!(*logger.sink.lock().unwrap(), Sink::Stdout));
    }

    #[test]
    fn test_file_output_requires_path() {
        assert!(CardgenLogger::from_config(&config("json", "file"), false, false).is_err());
        assert!(CardgenLogger::from_config(&config("xml", "stdout"), false, false).is_err());
        assert!(CardgenLogger::from_config(&config("json", "syslog"), false, false).is_err());
    }

    #[test]
    fn test_file_output_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config("text", "file");
        cfg.file_path = Some(dir.path().join("logs/cardgen.log"));
        let logger = CardgenLogger::from_config(&cfg, false, false).unwrap();

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("written"))
                .build(),
        );
        logger.flush();

        let content = std::fs::read_to_string(dir.path().join("logs/cardgen.log")).unwrap();
        assert!(content.contains("written"));
    }
}
