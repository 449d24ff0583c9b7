use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// First admin account, created only while the admins table is empty.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub user_token_expires_in: i64,  // seconds
    pub admin_token_expires_in: i64, // seconds
}

/// Outbound mail API. An empty `api_url` switches the mailer to log-only mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            from_email: "no-reply@emb-transfer.com".to_string(),
            from_name: "EMB Transfer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub fcm_server_key: String,
    pub fcm_url: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            fcm_server_key: String::new(),
            fcm_url: "https://fcm.googleapis.com/fcm/send".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
        }
    }
}

/// What the monthly limit check does when the tier's limit key is missing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingLimitPolicy {
    #[default]
    FailOpen,
    FailClosed,
}

impl std::str::FromStr for MissingLimitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_open" | "open" => Ok(MissingLimitPolicy::FailOpen),
            "fail_closed" | "closed" => Ok(MissingLimitPolicy::FailClosed),
            other => Err(format!("unknown missing limit policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LimitsConfig {
    #[serde(default)]
    pub missing_limit_policy: MissingLimitPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl BootstrapAdminConfig {
    fn from_env() -> Option<Self> {
        let username = env::var("BOOTSTRAP_ADMIN_USERNAME").ok()?;
        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
        Some(Self {
            username,
            password,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
        })
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No file: environment plus defaults
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                let mail_defaults = MailConfig::default();
                let push_defaults = PushConfig::default();
                let delivery_defaults = DeliveryConfig::default();

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        user_token_expires_in: get_env_parse("JWT_USER_EXPIRES_IN", 604_800i64),
                        admin_token_expires_in: get_env_parse("JWT_ADMIN_EXPIRES_IN", 28_800i64),
                    },
                    mail: MailConfig {
                        api_url: get_env("MAIL_API_URL").unwrap_or_default(),
                        api_key: get_env("MAIL_API_KEY").unwrap_or_default(),
                        from_email: get_env("MAIL_FROM_EMAIL").unwrap_or(mail_defaults.from_email),
                        from_name: get_env("MAIL_FROM_NAME").unwrap_or(mail_defaults.from_name),
                    },
                    push: PushConfig {
                        fcm_server_key: get_env("FCM_SERVER_KEY").unwrap_or_default(),
                        fcm_url: get_env("FCM_URL").unwrap_or(push_defaults.fcm_url),
                    },
                    delivery: DeliveryConfig {
                        max_attempts: get_env_parse(
                            "DELIVERY_MAX_ATTEMPTS",
                            delivery_defaults.max_attempts,
                        ),
                        initial_backoff_ms: get_env_parse(
                            "DELIVERY_INITIAL_BACKOFF_MS",
                            delivery_defaults.initial_backoff_ms,
                        ),
                    },
                    limits: LimitsConfig {
                        missing_limit_policy: get_env_parse(
                            "MISSING_LIMIT_POLICY",
                            MissingLimitPolicy::FailOpen,
                        ),
                    },
                    bootstrap_admin: BootstrapAdminConfig::from_env(),
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        // Environment always wins over the file
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_USER_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.user_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_ADMIN_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.admin_token_expires_in = n;
        }
        if let Ok(v) = env::var("MAIL_API_URL") {
            config.mail.api_url = v;
        }
        if let Ok(v) = env::var("MAIL_API_KEY") {
            config.mail.api_key = v;
        }
        if let Ok(v) = env::var("MAIL_FROM_EMAIL") {
            config.mail.from_email = v;
        }
        if let Ok(v) = env::var("MAIL_FROM_NAME") {
            config.mail.from_name = v;
        }
        if let Ok(v) = env::var("FCM_SERVER_KEY") {
            config.push.fcm_server_key = v;
        }
        if let Ok(v) = env::var("FCM_URL") {
            config.push.fcm_url = v;
        }
        if let Ok(v) = env::var("DELIVERY_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            config.delivery.max_attempts = n;
        }
        if let Ok(v) = env::var("DELIVERY_INITIAL_BACKOFF_MS")
            && let Ok(n) = v.parse()
        {
            config.delivery.initial_backoff_ms = n;
        }
        if let Ok(v) = env::var("MISSING_LIMIT_POLICY") {
            config.limits.missing_limit_policy = v.parse()?;
        }
        if let Some(admin) = BootstrapAdminConfig::from_env() {
            config.bootstrap_admin = Some(admin);
        }

        Ok(config)
    }
}
