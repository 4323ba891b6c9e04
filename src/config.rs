// src/config.rs
use crate::advisor::deepseek::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::models::Position;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Signal monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Polling and surfacing rules
    pub monitor: MonitorConfig,

    /// Quote and history sources
    pub data: DataConfig,

    /// Text-generation advisor
    pub advisor: AdvisorConfig,

    /// Webhook notifications
    pub notify: NotifyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Which report vocabulary the monitor evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonitorMode {
    /// Moving-average rule engine
    Rule,
    /// Model-generated intraday swing actions
    AiIntraday,
}

impl FromStr for MonitorMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "rule" => Ok(MonitorMode::Rule),
            "ai-intraday" | "ai" => Ok(MonitorMode::AiIntraday),
            other => Err(AppError::Config(format!("Unknown monitor mode: {}", other))),
        }
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MonitorMode::Rule => write!(f, "rule"),
            MonitorMode::AiIntraday => write!(f, "ai-intraday"),
        }
    }
}

/// Which changed signals reach the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceFilter {
    All,
    /// Only signals that ask for a trade
    Actionable,
}

impl FromStr for SurfaceFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(SurfaceFilter::All),
            "actionable" => Ok(SurfaceFilter::Actionable),
            other => Err(AppError::Config(format!("Unknown surface filter: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Instrument codes, processed in this order every tick
    pub codes: Vec<String>,

    pub interval_secs: u64,

    /// Poll around the clock instead of only within trading hours
    pub all_day: bool,

    pub mode: MonitorMode,

    /// Ask the advisor to corroborate surfaced rule signals
    pub ai_corroboration: bool,

    pub surface_filter: SurfaceFilter,

    /// Let bias signals through the actionable filter
    pub include_bias: bool,

    /// Daily bars requested from the history source
    pub history_limit: usize,

    /// Held positions by instrument code
    pub positions: HashMap<String, Position>,

    /// Run a single tick and exit
    pub run_once: bool,
}

impl MonitorConfig {
    /// Position held in `code`, if any
    pub fn position(&self, code: &str) -> Option<&Position> {
        self.positions.get(code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory of `{code}.json` history files; provider klines when unset
    pub history_dir: Option<String>,

    pub quote_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bot webhook; messages are only logged when unset
    pub webhook_url: Option<String>,

    /// First line of every delivered message
    pub prefix: String,

    pub timeout_secs: u64,

    /// Extra attempts for error-class messages
    pub max_retries: u32,

    pub retry_delay_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Directory for the daily log file
    pub log_dir: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            codes: vec!["159218".to_string(), "159840".to_string()],
            interval_secs: 60,
            all_day: true,
            mode: MonitorMode::Rule,
            ai_corroboration: false,
            surface_filter: SurfaceFilter::All,
            include_bias: false,
            history_limit: 200,
            positions: HashMap::new(),
            run_once: false,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history_dir: None,
            quote_timeout_secs: 15,
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            max_tokens: 800,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            prefix: "[Signal Monitor]".to_string(),
            timeout_secs: 3,
            max_retries: 3,
            retry_delay_secs: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: false,
            log_dir: "logs".to_string(),
        }
    }
}

/// `code:value` pairs separated by commas, e.g. `159218:1.02,159840:0.88`
pub fn parse_code_values(raw: &str) -> AppResult<HashMap<String, f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (code, value) = item
                .split_once(':')
                .ok_or_else(|| AppError::Config(format!("Expected code:value, got '{}'", item)))?;
            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|_| AppError::Config(format!("Invalid number in '{}'", item)))?;
            Ok((code.trim().to_string(), value))
        })
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional numeric setting, rejecting values outside `T`'s range
fn parse_number<T, G>(get: G, key: &str, default: T) -> AppResult<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| non_empty(lookup(key));
        let flag = |key: &str, default: bool| get(key).and_then(|v| parse_bool(&v)).unwrap_or(default);

        let codes: Vec<String> = match get("MONITOR_CODES") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.monitor.codes.clone(),
        };
        if codes.is_empty() {
            return Err(AppError::Config("MONITOR_CODES lists no instruments".to_string()));
        }

        let mode = match get("MONITOR_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.monitor.mode,
        };
        let surface_filter = match get("MONITOR_SURFACE_FILTER") {
            Some(raw) => raw.parse()?,
            None => defaults.monitor.surface_filter,
        };

        let costs = get("POSITION_COSTS")
            .map(|raw| parse_code_values(&raw))
            .transpose()?
            .unwrap_or_default();
        let ratios = get("POSITION_RATIOS")
            .map(|raw| parse_code_values(&raw))
            .transpose()?
            .unwrap_or_default();
        let mut positions: HashMap<String, Position> = HashMap::new();
        for (code, cost) in costs {
            positions.entry(code).or_default().cost = Some(cost);
        }
        for (code, ratio) in ratios {
            positions.entry(code).or_default().ratio = ratio;
        }

        let monitor_config = MonitorConfig {
            codes,
            interval_secs: parse_number(&get, "MONITOR_INTERVAL_SECS", defaults.monitor.interval_secs)?,
            all_day: flag("MONITOR_ALL_DAY", defaults.monitor.all_day),
            mode,
            ai_corroboration: flag("MONITOR_AI_CORROBORATION", defaults.monitor.ai_corroboration),
            surface_filter,
            include_bias: flag("MONITOR_INCLUDE_BIAS", defaults.monitor.include_bias),
            history_limit: parse_number(&get, "HISTORY_LIMIT", defaults.monitor.history_limit)?,
            positions,
            run_once: flag("MONITOR_ONCE", defaults.monitor.run_once),
        };

        let data_config = DataConfig {
            history_dir: get("HISTORY_DIR"),
            quote_timeout_secs: parse_number(&get, "QUOTE_TIMEOUT_SECS", defaults.data.quote_timeout_secs)?,
        };

        let advisor_config = AdvisorConfig {
            api_key: get("DEEPSEEK_API_KEY"),
            api_url: get("DEEPSEEK_API_URL").unwrap_or(defaults.advisor.api_url),
            model: get("DEEPSEEK_MODEL").unwrap_or(defaults.advisor.model),
            timeout_secs: parse_number(&get, "DEEPSEEK_TIMEOUT_SECS", defaults.advisor.timeout_secs)?,
            max_tokens: parse_number(&get, "DEEPSEEK_MAX_TOKENS", defaults.advisor.max_tokens)?,
        };

        let notify_config = NotifyConfig {
            webhook_url: get("LARK_WEBHOOK_URL"),
            prefix: lookup("NOTIFY_PREFIX").unwrap_or(defaults.notify.prefix),
            timeout_secs: parse_number(&get, "NOTIFY_TIMEOUT_SECS", defaults.notify.timeout_secs)?,
            max_retries: parse_number(&get, "NOTIFY_MAX_RETRIES", defaults.notify.max_retries)?,
            retry_delay_secs: parse_number(&get, "NOTIFY_RETRY_DELAY_SECS", defaults.notify.retry_delay_secs)?,
        };

        // Create Logging config
        let logging_config = LoggingConfig {
            level: get("LOG_LEVEL").unwrap_or(defaults.logging.level),
            to_file: flag("LOG_TO_FILE", defaults.logging.to_file),
            log_dir: get("LOG_DIR").unwrap_or(defaults.logging.log_dir),
        };

        Ok(Config {
            monitor: monitor_config,
            data: data_config,
            advisor: advisor_config,
            notify: notify_config,
            logging: logging_config,
        })
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path)
            .map_err(|e| AppError::Config(format!("Failed to open config file: {}", e)))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents)
            .map_err(|e| AppError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// `{log_dir}/monitor_{YYYYMMDD}.log` for the current local date
    pub fn log_file_path(&self) -> PathBuf {
        let date = chrono::Local::now().format("%Y%m%d");
        Path::new(&self.logging.log_dir).join(format!("monitor_{}.log", date))
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        // Configure output
        if self.logging.to_file {
            fs::create_dir_all(&self.logging.log_dir)
                .map_err(|e| AppError::Config(format!("Failed to create log directory: {}", e)))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.log_file_path())
                .map_err(|e| AppError::Config(format!("Failed to open log file: {}", e)))?;

            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        builder
            .try_init()
            .map_err(|e| AppError::Config(format!("Failed to initialize logger: {}", e)))?;

        Ok(())
    }
}
