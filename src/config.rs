use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Any authenticated session may delete any listing id.
    AnySession,
    /// Only the session that created a listing may delete it.
    OwnerOnly,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any_session" | "any" => Ok(DeletePolicy::AnySession),
            "owner_only" | "owner" => Ok(DeletePolicy::OwnerOnly),
            other => Err(format!("unknown delete policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: Option<String>,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub app_id: String,
    pub public_rps: u32,
    pub write_rps: u32,
    pub contact_country_code: String,
    pub delete_policy: DeletePolicy,
    pub json_logs: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            session_secret: get_env("SESSION_SECRET")?,
            session_ttl_hours: get_env_parse_or("SESSION_TTL_HOURS", 24 * 30)?,
            app_id: env::var("APP_ID").unwrap_or_else(|_| "axtargetbotwebsite".to_string()),
            public_rps: get_env_parse_or("PUBLIC_RPS", 50)?,
            write_rps: get_env_parse_or("WRITE_RPS", 5)?,
            contact_country_code: env::var("CONTACT_COUNTRY_CODE")
                .unwrap_or_else(|_| "994".to_string()),
            delete_policy: get_env_parse_or("DELETE_POLICY", DeletePolicy::AnySession)?,
            json_logs: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
