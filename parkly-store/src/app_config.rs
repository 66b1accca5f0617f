use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub detection: DetectionConfig,
    #[serde(default)]
    pub rules: BusinessRules,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    /// Plate-recognition run used at check-in.
    pub plate_url: String,
    /// Slot-occupancy run shown on the booking screen.
    pub occupancy_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_lead_minutes")]
    pub min_lead_time_minutes: i64,
    #[serde(default = "default_cancellation_hours")]
    pub cancellation_window_hours: i64,
}

fn default_lead_minutes() -> i64 {
    120
}

fn default_cancellation_hours() -> i64 {
    24
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            min_lead_time_minutes: default_lead_minutes(),
            cancellation_window_hours: default_cancellation_hours(),
        }
    }
}

impl BusinessRules {
    pub fn min_lead_time(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.min_lead_time_minutes)
    }

    pub fn cancellation_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cancellation_window_hours)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "parkly=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layered: `{dir}/default`, `{dir}/{RUN_MODE}`, `{dir}/local`, then
    /// `PARKLY__SECTION__KEY` environment variables.
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            .add_source(config::Environment::with_prefix("PARKLY").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Everything pointed at one host, rules left at their defaults.
    pub fn for_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            api: ApiConfig {
                base_url: base.to_string(),
                request_timeout_secs: default_timeout_secs(),
            },
            detection: DetectionConfig {
                plate_url: format!("{}/process-video", base),
                occupancy_url: format!("{}/process-video", base),
            },
            rules: BusinessRules::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}
