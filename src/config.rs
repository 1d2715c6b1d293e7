//! Centralized configuration and builder for snaplist.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - ListConfig::from_env() reads SNAPLIST_* variables on top of defaults.
//! - ListBuilder returns a ListConfig, which SnapList / enumerate consume.
//!
//! List policy:
//! - bulk_isolation (ENV SNAPLIST_BULK_ISOLATION = visible|isolated)
//!
//! Enumeration (producer side):
//! - first_flush = 32 (first batch is pushed as soon as 32 entries are pending)
//! - flush_interval_ms = 500 (later batches are pushed on this interval)
//! - count_limit = None (no limit)
//! - show_hidden = false, show_dot_files = false
//!   All of the above can be overridden via ENV or builder.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

/// What readers observe while a bulk-update window is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BulkIsolation {
    /// Readers see every write as it lands; only notifications are held back.
    #[default]
    Visible,
    /// Readers see the contents frozen at begin_bulk_operation until the window ends.
    Isolated,
}

impl BulkIsolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkIsolation::Visible => "visible",
            BulkIsolation::Isolated => "isolated",
        }
    }
}

impl FromStr for BulkIsolation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" | "0" | "off" => Ok(BulkIsolation::Visible),
            "isolated" | "1" | "on" => Ok(BulkIsolation::Isolated),
            other => Err(anyhow!("unknown bulk isolation mode '{}'", other)),
        }
    }
}

/// Top-level configuration for a list and the enumerator feeding it.
#[derive(Clone, Debug)]
pub struct ListConfig {
    /// Reader visibility inside bulk windows.
    /// Env: SNAPLIST_BULK_ISOLATION (default visible)
    pub bulk_isolation: BulkIsolation,

    /// Pending entries that trigger the first flush into the list.
    /// Env: SNAPLIST_FIRST_FLUSH (default 32)
    pub first_flush: usize,

    /// Interval between subsequent flushes, in milliseconds.
    /// Env: SNAPLIST_FLUSH_INTERVAL_MS (default 500)
    pub flush_interval_ms: u64,

    /// Stop enumeration after this many listed entries.
    /// Env: SNAPLIST_COUNT_LIMIT (default None; 0 also means "no limit")
    pub count_limit: Option<usize>,

    /// List entries carrying the platform "hidden" attribute.
    /// Env: SNAPLIST_SHOW_HIDDEN (default false; "1|true|on|yes" => true)
    pub show_hidden: bool,

    /// List entries whose name starts with '.'.
    /// Env: SNAPLIST_SHOW_DOT_FILES (default false)
    pub show_dot_files: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            bulk_isolation: BulkIsolation::Visible,

            first_flush: 32,
            flush_interval_ms: 500,
            count_limit: None,

            show_hidden: false,
            show_dot_files: false,
        }
    }
}

fn env_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

impl ListConfig {
    /// Load configuration from environment variables.
    /// Unparsable values are ignored (default stays in place).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SNAPLIST_BULK_ISOLATION") {
            match v.parse::<BulkIsolation>() {
                Ok(mode) => cfg.bulk_isolation = mode,
                Err(e) => log::warn!("SNAPLIST_BULK_ISOLATION ignored: {e}"),
            }
        }

        // ----- enumeration -----
        if let Ok(v) = std::env::var("SNAPLIST_FIRST_FLUSH") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.first_flush = n.max(1);
            }
        }

        if let Ok(v) = std::env::var("SNAPLIST_FLUSH_INTERVAL_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.flush_interval_ms = n;
            }
        }

        if let Ok(v) = std::env::var("SNAPLIST_COUNT_LIMIT") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.count_limit = if n == 0 { None } else { Some(n) };
            }
        }

        if let Ok(v) = std::env::var("SNAPLIST_SHOW_HIDDEN") {
            cfg.show_hidden = env_flag(&v);
        }

        if let Ok(v) = std::env::var("SNAPLIST_SHOW_DOT_FILES") {
            cfg.show_dot_files = env_flag(&v);
        }

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_bulk_isolation(mut self, mode: BulkIsolation) -> Self {
        self.bulk_isolation = mode;
        self
    }

    pub fn with_first_flush(mut self, n: usize) -> Self {
        self.first_flush = n.max(1);
        self
    }

    pub fn with_flush_interval_ms(mut self, ms: u64) -> Self {
        self.flush_interval_ms = ms;
        self
    }

    pub fn with_count_limit(mut self, limit: Option<usize>) -> Self {
        self.count_limit = limit.filter(|&n| n > 0);
        self
    }

    pub fn with_show_hidden(mut self, on: bool) -> Self {
        self.show_hidden = on;
        self
    }

    pub fn with_show_dot_files(mut self, on: bool) -> Self {
        self.show_dot_files = on;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for ListConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ListConfig {{ \
             bulk_isolation: {}, \
             first_flush: {}, \
             flush_interval_ms: {}, \
             count_limit: {}, \
             show_hidden: {}, \
             show_dot_files: {} \
             }}",
            self.bulk_isolation.as_str(),
            self.first_flush,
            self.flush_interval_ms,
            self.count_limit
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.show_hidden,
            self.show_dot_files,
        )
    }
}

/// Lightweight builder that produces a ListConfig.
/// `SnapList::builder()` returns this builder.
#[derive(Clone, Debug)]
pub struct ListBuilder {
    cfg: ListConfig,
}

impl Default for ListBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: ListConfig::from_env(),
        }
    }
}

impl ListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: ListConfig::default(),
        }
    }

    pub fn bulk_isolation(mut self, mode: BulkIsolation) -> Self {
        self.cfg.bulk_isolation = mode;
        self
    }

    pub fn first_flush(mut self, n: usize) -> Self {
        self.cfg.first_flush = n.max(1);
        self
    }

    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.cfg.flush_interval_ms = ms;
        self
    }

    pub fn count_limit(mut self, limit: Option<usize>) -> Self {
        self.cfg.count_limit = limit.filter(|&n| n > 0);
        self
    }

    pub fn show_hidden(mut self, on: bool) -> Self {
        self.cfg.show_hidden = on;
        self
    }

    pub fn show_dot_files(mut self, on: bool) -> Self {
        self.cfg.show_dot_files = on;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> ListConfig {
        self.cfg
    }
}
