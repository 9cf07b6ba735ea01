use std::ffi::OsString;

/// Run-time switches, read once at start-up and passed down explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    /// Progress lines on stdout and debug logging
    pub verbose: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// VERBOSE only has to be present, its value is ignored
    pub fn from_lookup<F: Fn(&str) -> Option<OsString>>(lookup: F) -> Self {
        Settings {
            verbose: lookup("VERBOSE").is_some(),
        }
    }

    /// Default env_logger filter when RUST_LOG is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
