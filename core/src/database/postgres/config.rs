use std::env;

use dotenv::dotenv;
use tokio_postgres::Config;
use url::Url;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DATABASE: &str = "before_verify_db";
pub const DEFAULT_USER: &str = "postgres";

#[derive(thiserror::Error, Debug)]
pub enum ConnectionConfigError {
    #[error("Could not parse connection string make sure it is correctly formatted: {0}")]
    CouldNotParseConnectionString(tokio_postgres::Error),

    #[error("PGPORT must be a port number, got '{0}'")]
    InvalidPort(String),
}

/// Where to connect, either a full `DATABASE_URL` or the individual `PG*` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSettings {
    Url(String),
    Parts {
        host: String,
        port: u16,
        dbname: String,
        user: String,
        password: Option<String>,
    },
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings::Parts {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dbname: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
            password: None,
        }
    }
}

impl ConnectionSettings {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self, ConnectionConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConnectionConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            return Ok(ConnectionSettings::Url(url));
        }

        let port = match lookup("PGPORT") {
            Some(port) => {
                port.trim().parse().map_err(|_| ConnectionConfigError::InvalidPort(port))?
            }
            None => DEFAULT_PORT,
        };

        Ok(ConnectionSettings::Parts {
            host: lookup("PGHOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            dbname: lookup("PGDATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            user: lookup("PGUSER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: lookup("PGPASSWORD"),
        })
    }

    pub fn to_config(&self) -> Result<Config, ConnectionConfigError> {
        match self {
            ConnectionSettings::Url(url) => {
                url.parse().map_err(ConnectionConfigError::CouldNotParseConnectionString)
            }
            ConnectionSettings::Parts { host, port, dbname, user, password } => {
                let mut config = Config::new();
                config.host(host).port(*port).dbname(dbname).user(user);
                if let Some(password) = password {
                    config.password(password);
                }
                Ok(config)
            }
        }
    }

    /// Whether the settings explicitly ask for TLS, in which case there is no plaintext fallback.
    pub fn requires_ssl(&self) -> bool {
        match self {
            ConnectionSettings::Url(url) => url.contains("sslmode=require"),
            ConnectionSettings::Parts { .. } => false,
        }
    }

    /// A description safe to log, the password never appears in it.
    pub fn redacted(&self) -> String {
        match self {
            ConnectionSettings::Url(raw) => match Url::parse(raw) {
                Ok(mut url) => {
                    if url.password().is_some() {
                        let _ = url.set_password(Some("****"));
                    }
                    url.to_string()
                }
                Err(_) => "<unparseable DATABASE_URL>".to_string(),
            },
            ConnectionSettings::Parts { host, port, dbname, user, .. } => {
                format!("postgres://{}@{}:{}/{}", user, host, port, dbname)
            }
        }
    }
}
