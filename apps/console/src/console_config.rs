use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use frontdesk_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// Which collection adapter backs the console.
///
/// `Memory` keeps records in JSON files under the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Http,
    Memory,
}

impl FromStr for GatewayMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "memory" => Ok(Self::Memory),
            _ => Err(AppError::Validation(format!(
                "invalid FRONTDESK_GATEWAY value '{value}': expected http or memory"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub api_timeout: Duration,
    pub auth_token: Option<String>,
    pub search_debounce: Duration,
    pub reset_page_on_delete: bool,
    pub gateway: GatewayMode,
    pub data_dir: PathBuf,
}

impl ConsoleConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let api_url = lookup("FRONTDESK_API_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "http://localhost:5000".to_owned());
        let api_timeout_secs = parse_or(
            "FRONTDESK_API_TIMEOUT_SECS",
            lookup("FRONTDESK_API_TIMEOUT_SECS"),
            300_u64,
        )?;
        if api_timeout_secs == 0 {
            return Err(AppError::Validation(
                "FRONTDESK_API_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }
        let auth_token = lookup("FRONTDESK_AUTH_TOKEN")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let search_debounce_ms = parse_or(
            "FRONTDESK_SEARCH_DEBOUNCE_MS",
            lookup("FRONTDESK_SEARCH_DEBOUNCE_MS"),
            500_u64,
        )?;
        let reset_page_on_delete = parse_flag(
            "FRONTDESK_RESET_PAGE_ON_DELETE",
            lookup("FRONTDESK_RESET_PAGE_ON_DELETE"),
        )?;
        let gateway = lookup("FRONTDESK_GATEWAY")
            .map(|value| value.parse::<GatewayMode>())
            .transpose()?
            .unwrap_or(GatewayMode::Http);
        let data_dir = lookup("FRONTDESK_DATA_DIR")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map_or_else(|| PathBuf::from(".frontdesk"), PathBuf::from);

        Ok(Self {
            api_url,
            api_timeout: Duration::from_secs(api_timeout_secs),
            auth_token,
            search_debounce: Duration::from_millis(search_debounce_ms),
            reset_page_on_delete,
            gateway,
            data_dir,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_or<T>(name: &str, value: Option<String>, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value.trim().parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_flag(name: &str, value: Option<String>) -> AppResult<bool> {
    let Some(value) = value else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid {name} value '{value}': expected true or false"
        ))),
    }
}
