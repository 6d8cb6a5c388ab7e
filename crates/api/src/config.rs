//! Runtime configuration, read once from the environment at startup.
//!
//! | Variable | Default |
//! |---|---|
//! | `SOUK_BIND_ADDR` | `0.0.0.0:8080` |
//! | `JWT_SECRET` | insecure dev secret (with a warning) |
//! | `SOUK_TOKEN_TTL_MINUTES` | `60` (at most one year) |
//! | `SOUK_BRAND_MODERATION` | `false` |
//! | `USE_PERSISTENT_STORES` | `false` (then `DATABASE_URL` is required) |
//! | `SOUK_ADMIN_EMAIL`, `SOUK_ADMIN_PASSWORD`, `SOUK_ADMIN_NAME` | no admin bootstrap |

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret";

/// One year.
const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set{context}")]
    Missing { var: &'static str, context: &'static str },

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Admin account created (if absent) at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl core::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// New brands start `pending` instead of `approved`.
    pub brand_moderation: bool,
    /// `Some` selects the Postgres store.
    pub database_url: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::minutes(60),
            brand_moderation: false,
            database_url: None,
            admin: None,
        }
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl_minutes", &self.token_ttl.num_minutes())
            .field("brand_moderation", &self.brand_moderation)
            .field("persistent", &self.database_url.is_some())
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ApiConfig::default();

        if let Some(raw) = lookup("SOUK_BIND_ADDR") {
            config.bind_addr = raw.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    var: "SOUK_BIND_ADDR",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => config.jwt_secret = secret,
            None => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        if let Some(raw) = lookup("SOUK_TOKEN_TTL_MINUTES") {
            config.token_ttl = raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=MAX_TOKEN_TTL_MINUTES).contains(m))
                .and_then(Duration::try_minutes)
                .ok_or_else(|| ConfigError::Invalid {
                    var: "SOUK_TOKEN_TTL_MINUTES",
                    value: raw.clone(),
                    reason: format!("expected between 1 and {MAX_TOKEN_TTL_MINUTES} minutes"),
                })?;
        }

        config.brand_moderation = parse_flag("SOUK_BRAND_MODERATION", lookup("SOUK_BRAND_MODERATION"))?;

        if parse_flag("USE_PERSISTENT_STORES", lookup("USE_PERSISTENT_STORES"))? {
            let url = lookup("DATABASE_URL").ok_or(ConfigError::Missing {
                var: "DATABASE_URL",
                context: " when USE_PERSISTENT_STORES=true",
            })?;
            config.database_url = Some(url);
        }

        config.admin = match (lookup("SOUK_ADMIN_EMAIL"), lookup("SOUK_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                email,
                password,
                display_name: lookup("SOUK_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            (Some(_), None) => {
                return Err(ConfigError::Missing {
                    var: "SOUK_ADMIN_PASSWORD",
                    context: " when SOUK_ADMIN_EMAIL is set",
                });
            }
            _ => None,
        };

        Ok(config)
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_brand_moderation(mut self, enabled: bool) -> Self {
        self.brand_moderation = enabled;
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn with_admin(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        self.admin = Some(AdminBootstrap {
            email: email.into(),
            password: password.into(),
            display_name: display_name.into(),
        });
        self
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}
