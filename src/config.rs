use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub db_max_connections: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
    pub twilio: Option<TwilioConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = database_url_from_env()?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is empty");
        }
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("APP_PORT").unwrap_or(3000);
        let jwt_ttl_days = parse_var("JWT_TTL_DAYS").unwrap_or(30);
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS").unwrap_or(10);
        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS").unwrap_or(30);
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let twilio = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_FROM_PHONE_NUMBER"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_days,
            db_max_connections,
            request_timeout_secs,
            cors_allowed_origins,
            twilio,
        })
    }
}

/// `DATABASE_URL` wins; otherwise every `DB_*` part must be present.
fn database_url_from_env() -> anyhow::Result<String> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(url);
    }

    let parts = ["DB_HOST", "DB_USER", "DB_PASSWORD", "DB_NAME", "DB_PORT"]
        .map(|key| env::var(key).ok().filter(|v| !v.is_empty()));
    match parts {
        [Some(host), Some(user), Some(password), Some(name), Some(port)] => {
            postgres_url(&host, &user, &password, &name, &port)
        }
        _ => anyhow::bail!(
            "database configuration not found: set DATABASE_URL or DB_HOST, DB_USER, DB_PASSWORD, DB_NAME, DB_PORT"
        ),
    }
}

/// Credentials are percent-encoded so characters such as `@` or `/` survive.
fn postgres_url(
    host: &str,
    user: &str,
    password: &str,
    name: &str,
    port: &str,
) -> anyhow::Result<String> {
    let mut url = reqwest::Url::parse(&format!("postgres://{host}:{port}/{name}"))
        .context("invalid DB_HOST, DB_PORT or DB_NAME")?;
    url.set_username(user)
        .map_err(|_| anyhow::anyhow!("DB_USER cannot be used in a database URL"))?;
    url.set_password(Some(password))
        .map_err(|_| anyhow::anyhow!("DB_PASSWORD cannot be used in a database URL"))?;
    Ok(url.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_postgres_url_from_parts() {
        let url = postgres_url("db", "shop", "pw", "market", "5432").unwrap();
        assert_eq!(url, "postgres://shop:pw@db:5432/market");
    }

    #[test]
    fn escapes_reserved_characters_in_credentials() {
        let url = postgres_url("db", "shop", "p@ss/w:rd", "market", "5432").unwrap();
        assert_eq!(url, "postgres://shop:p%40ss%2Fw%3Ard@db:5432/market");

        let parsed = reqwest::Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("db"));
        assert_eq!(parsed.port(), Some(5432));
        assert_eq!(parsed.path(), "/market");
    }

    #[test]
    fn splits_origin_list() {
        let origins = split_list(" http://a.test, ,http://b.test ");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }
}
