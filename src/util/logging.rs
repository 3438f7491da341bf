use std::path::Path;

use flexi_logger::{Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

/// Starts the process logger. Without `log_dir` everything goes to stderr;
/// with it, records are written to a rotated file under that directory and
/// duplicated to stderr.
///
/// Keep the handle alive for the whole run; dropping it flushes and closes
/// the log file.
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str("info")?;
    let handle = match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            logger
                .duplicate_to_stderr(Duplicate::Info)
                .log_to_file(
                    FileSpec::default()
                        .directory(log_dir)
                        .basename("pdf-speech")
                        .suppress_timestamp(),
                )
                .rotate(
                    Criterion::AgeOrSize(Age::Day, 10_000_000),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(7),
                )
                .start()?
        }
        None => logger.log_to_stderr().start()?,
    };
    Ok(handle)
}
