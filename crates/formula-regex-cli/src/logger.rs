use log::{LevelFilter, Log, Metadata, Record};

/// Writes `level target: message` lines to stderr.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{} {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the stderr logger for `-v` (debug) and `-vv` (trace); quiet otherwise.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => return Ok(()),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    log::set_logger(&LOGGER).map_err(|err| anyhow::anyhow!("install logger: {err}"))?;
    log::set_max_level(level);
    Ok(())
}
