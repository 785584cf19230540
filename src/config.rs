use chrono_tz::Tz;

/// Default number of future weekly occurrences probed before a fixed
/// reservation may be created or activated.
pub const DEFAULT_HORIZON_WEEKS: u32 = 8;

/// Engine configuration. The facility operates in one fixed timezone;
/// "today" is always resolved against it, never against the host clock's
/// zone.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub timezone: Tz,
    pub horizon_weeks: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Guayaquil,
            horizon_weeks: DEFAULT_HORIZON_WEEKS,
        }
    }
}

impl Config {
    /// Read configuration from `CANCHA_TZ` (IANA zone name) and
    /// `CANCHA_HORIZON_WEEKS`, falling back to defaults for anything
    /// absent or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timezone = std::env::var("CANCHA_TZ")
            .ok()
            .and_then(|s| s.parse::<Tz>().ok())
            .unwrap_or(defaults.timezone);
        let horizon_weeks = std::env::var("CANCHA_HORIZON_WEEKS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.horizon_weeks);
        Self {
            timezone,
            horizon_weeks,
        }
    }
}
