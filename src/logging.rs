//! Process-wide tracing setup.
//!
//! [`init`] installs a `tracing-subscriber` fmt layer exactly once. Later calls
//! are no-ops and hand back the settings of the first call.

use once_cell::sync::OnceCell;
use tracing::Level;

static TRACING: OnceCell<LogSettings> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogSettings {
    /// Log at DEBUG instead of INFO.
    pub debug: bool,
}

impl LogSettings {
    pub fn level(&self) -> Level {
        if self.debug { Level::DEBUG } else { Level::INFO }
    }
}

/// Install the global subscriber. Output goes to stderr.
pub fn init(settings: LogSettings) -> &'static LogSettings {
    TRACING.get_or_init(|| {
        // Another subscriber may already be set (tests); keep it.
        let _ = tracing_subscriber::fmt()
            .with_max_level(settings.level())
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        settings
    })
}
