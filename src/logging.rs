//! Logging setup for depgraph-di
//!
//! Every event the container emits uses the `depgraph_di` target with
//! structured fields (`service`, `scope`, `dependencies`, ...). Registration,
//! build and override are logged at DEBUG; each resolution step and cache
//! hit at TRACE.
//!
//! # Features
//!
//! - `logging` - Emit events through `tracing` (default)
//! - `logging-json` - Install a JSON subscriber (production)
//! - `logging-pretty` - Install a human-readable subscriber (development)
//!
//! Without `logging-json` or `logging-pretty` the init functions do nothing;
//! bring your own subscriber instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use depgraph_di::logging;
//!
//! // JSON if logging-json, pretty if only logging-pretty
//! logging::init();
//!
//! // Or configure explicitly
//! logging::builder()
//!     .trace()
//!     .crate_only()
//!     .pretty()
//!     .init();
//!
//! // RUST_LOG style directives
//! logging::builder()
//!     .with_directives("depgraph_di=trace,my_app=info")
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event this crate emits
pub const TARGET: &str = "depgraph_di";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON lines
    #[default]
    Json,
    /// Multi-line, colourful
    Pretty,
    /// Single line per event
    Compact,
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    directives: Option<String>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
    with_thread_names: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            directives: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
            with_thread_names: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    pub fn error(self) -> Self {
        self.with_level(Level::ERROR)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show events from this crate
    pub fn crate_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Use `RUST_LOG` style filter directives.
    ///
    /// Takes precedence over the level and target filter.
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Include source file names
    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    /// Include source line numbers
    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    /// Include thread ids
    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    /// Include thread names
    pub fn with_thread_names(mut self) -> Self {
        self.with_thread_names = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter expression the subscriber will be installed with
    pub fn filter_directives(&self) -> String {
        match (&self.directives, self.target) {
            (Some(directives), _) => directives.clone(),
            (None, Some(target)) => format!("{target}={}", self.level),
            (None, None) => self.level.to_string(),
        }
    }

    /// Install the configured subscriber as the global default.
    ///
    /// Panics if a global subscriber is already set, like
    /// `tracing_subscriber`'s own `init`.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::new(self.filter_directives());
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_thread_names(self.with_thread_names)
            .with_target(true);
        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).init(),
            // JSON output needs the `logging-json` feature; plain text otherwise
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer).init(),
            LogFormat::Pretty => registry.with(layer.pretty()).init(),
            LogFormat::Compact => registry.with(layer.compact()).init(),
        }
    }

    /// No subscriber feature enabled: does nothing
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install the default subscriber: JSON with `logging-json`, otherwise
/// pretty with `logging-pretty`, otherwise nothing
pub fn init() {
    if cfg!(feature = "logging-json") {
        init_json();
    } else {
        init_pretty();
    }
}

/// Install a JSON subscriber at DEBUG
///
/// ```json
/// {"timestamp":"2026-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Registering service","service":"app::Database","scope":"singleton"},"target":"depgraph_di"}
/// ```
pub fn init_json() {
    builder().json().debug().init();
}

/// Install a pretty subscriber at DEBUG
pub fn init_pretty() {
    builder().pretty().debug().init();
}

/// Install a subscriber showing only this crate's events
pub fn init_crate_only() {
    builder().crate_only().debug().init();
}
