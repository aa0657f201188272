use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use primed_application::AuditSettings;
use primed_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_AUDIT_TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub audit_api_token: String,
    pub data_path: PathBuf,
    pub audit_settings: AuditSettings,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let audit_api_token = validate_audit_token(required_env("AUDIT_API_TOKEN")?)?;
        let data_path = PathBuf::from(required_non_empty_env("PRIMED_DATA_PATH")?);

        let audit_settings = AuditSettings::from_env()?;

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            audit_api_token,
            data_path,
            audit_settings,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn validate_audit_token(token: String) -> Result<String, AppError> {
    if token.trim().len() < MIN_AUDIT_TOKEN_LENGTH {
        return Err(AppError::Validation(format!(
            "AUDIT_API_TOKEN must be at least {MIN_AUDIT_TOKEN_LENGTH} characters"
        )));
    }

    Ok(token.trim().to_owned())
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::validate_audit_token;

    #[test]
    fn short_audit_tokens_are_rejected() {
        assert!(validate_audit_token("too-short".to_owned()).is_err());
        assert!(validate_audit_token(format!("  {}  ", "x".repeat(31))).is_err());
    }

    #[test]
    fn audit_tokens_are_trimmed() {
        let token = validate_audit_token(format!(" {} ", "x".repeat(40)));
        assert_eq!(token.ok(), Some("x".repeat(40)));
    }
}
