use std::path::PathBuf;

use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use once_cell::sync::OnceCell;

// The handle must stay alive or the file writer shuts down.
static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

pub fn init() -> anyhow::Result<()> {
    LOGGER.get_or_try_init(|| {
        let log_dir = log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let handle = Logger::try_with_env_or_str("info")?
            .log_to_file(
                FileSpec::default()
                    .directory(&log_dir)
                    .basename("reader")
                    .suffix("log")
                    .suppress_timestamp(),
            )
            .rotate(
                Criterion::Size(5_000_000),
                Naming::Numbers,
                Cleanup::KeepLogFiles(5),
            )
            .duplicate_to_stderr(Duplicate::Warn)
            .start()?;
        Ok::<LoggerHandle, anyhow::Error>(handle)
    })?;
    Ok(())
}

fn log_dir() -> PathBuf {
    PathBuf::from("logs")
}
