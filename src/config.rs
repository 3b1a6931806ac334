use std::net::IpAddr;
use std::path::PathBuf;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub parish_name: String,
    /// Where new-submission notices go. No notices when unset.
    pub office_email: Option<String>,
    pub upload_dir: PathBuf,
    pub max_body_size: usize,
    pub max_upload_size: usize,
    pub allowed_upload_types: Vec<String>,
    pub submission_rate_limit: u32,
    pub submission_rate_window_secs: u64,
    pub trusted_proxies: Vec<IpNet>,
    pub secure_cookies: bool,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

const DEFAULT_UPLOAD_TYPES: &str = "application/pdf,image/jpeg,image/png,image/webp";

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters".to_string());
        }

        let host: IpAddr = env_or("PARISH_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PARISH_HOST: {e}"))?;

        let port: u16 = env_parse("PARISH_PORT", "3000")?;

        let base_url = env_or("PARISH_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let parish_name = env_or("PARISH_NAME", "St. Joseph Parish");

        let office_email = std::env::var("PARISH_OFFICE_EMAIL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let upload_dir = PathBuf::from(env_or("PARISH_UPLOAD_DIR", "uploads"));

        let max_body_size: usize = env_parse("PARISH_MAX_BODY_SIZE", "12582912")?;
        let max_upload_size: usize = env_parse("PARISH_MAX_UPLOAD_SIZE", "5242880")?;
        if max_upload_size > max_body_size {
            return Err("PARISH_MAX_UPLOAD_SIZE cannot exceed PARISH_MAX_BODY_SIZE".to_string());
        }

        let allowed_upload_types = split_list(&env_or("PARISH_UPLOAD_TYPES", DEFAULT_UPLOAD_TYPES));

        let submission_rate_limit: u32 = env_parse("PARISH_RATE_LIMIT", "10")?;
        let submission_rate_window_secs: u64 = env_parse("PARISH_RATE_LIMIT_WINDOW_SECS", "60")?;

        let trusted_proxies: Vec<IpNet> = split_list(&env_or("PARISH_TRUSTED_PROXIES", ""))
            .into_iter()
            .map(|s| {
                s.parse()
                    .map_err(|e| format!("Invalid PARISH_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let secure_cookies = base_url.starts_with("https://");

        let log_level = env_or("PARISH_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("PARISH_SMTP_HOST").ok(),
            std::env::var("PARISH_SMTP_PORT").ok(),
            std::env::var("PARISH_SMTP_USER").ok(),
            std::env::var("PARISH_SMTP_PASS").ok(),
            std::env::var("PARISH_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid PARISH_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            parish_name,
            office_email,
            upload_dir,
            max_body_size,
            max_upload_size,
            allowed_upload_types,
            submission_rate_limit,
            submission_rate_window_secs,
            trusted_proxies,
            secure_cookies,
            log_level,
            smtp,
        })
    }

    pub fn accepts_upload_type(&self, content_type: &str) -> bool {
        self.allowed_upload_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(content_type))
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse()
        .map_err(|e| format!("Invalid {key}: {e}"))
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
