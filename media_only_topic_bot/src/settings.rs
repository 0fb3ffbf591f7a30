use std::{fmt, path::PathBuf, str::FromStr};

use bot_commons::logging::{AlertConfigError, LoggerConfig, SmtpAlertConfig};
use teloxide::types::{ChatId, MessageId, ThreadId};

use crate::types::TopicTarget;

/// Where the production log goes unless `LOG_FILE` says otherwise.
pub const DEFAULT_LOG_FILE: &str = "export_log.log";

/// Env files to load, most important first. Neither of them overrides
/// variables that are already set in the environment.
pub const ENV_FILES: [&str; 2] = [".env.prod", ".env"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

#[derive(Debug, thiserror::Error)]
#[error("expected \"production\" or \"development\"")]
pub struct UnknownEnvironment;

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Environment::Production),
            "development" => Ok(Environment::Development),
            _ => Err(UnknownEnvironment),
        }
    }
}

/// A string that doesn't show up in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(\"**********\")")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{0} is required.")]
    Missing(&'static str),
    #[error("{name} is invalid ({value:?}): {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} is required in production.")]
    RequiredInProduction(&'static str),
    #[error("SMTP_USER is invalid: {0}")]
    InvalidEmail(#[from] AlertConfigError),
    #[error("failed to load {path}: {source}")]
    DotEnv {
        path: &'static str,
        #[source]
        source: dotenvy::Error,
    },
}

/// Everything the bot is told through the environment.
///
/// Please make sure your environment or `.env` contains the following variables:
/// - `BOT_TOKEN` - an API token for your bot.
/// - `TOPIC_ID` - an ID for your group chat topic.
/// - `GROUP_CHAT_ID` - an ID for your group chat.
/// - `ENVIRONMENT` - `production` or `development`. Production silences logging
///   down to errors, writes them to a rotating log file, and emails critical ones.
///
/// Required only in production:
/// - `SMTP_HOST` - SMTP server address (e.g. `smtp.gmail.com`).
/// - `SMTP_USER` - email address to log in as, and to send alerts to.
/// - `SMTP_PASSWORD` - password for it. If you're using Gmail, this needs to be an app password.
///
/// Optional:
/// - `LOG_FILE` - path of the production log file, `export_log.log` by default.
#[derive(Debug, Clone)]
pub struct Settings {
    environment: Environment,
    bot_token: Secret,
    topic_id: ThreadId,
    group_chat_id: ChatId,
    smtp: Option<SmtpAlertConfig>,
    log_file: PathBuf,
}

fn parse_var<T>(name: &'static str, value: String) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| SettingsError::Invalid {
        name,
        reason: e.to_string(),
        value,
    })
}

impl Settings {
    /// Load `.env.prod` and `.env` if they're around, then read the environment.
    ///
    /// # Errors
    ///
    /// Errors if an env file can't be read or parsed, or if the resulting
    /// environment doesn't validate, see [`Settings::from_lookup`].
    pub fn load() -> Result<Self, SettingsError> {
        for path in ENV_FILES {
            match dotenvy::from_filename(path) {
                Ok(_) => {}
                Err(e) if e.not_found() => {}
                Err(source) => return Err(SettingsError::DotEnv { path, source }),
            }
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build and validate settings from whatever `lookup` returns for each variable name.
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Errors if a required variable is missing or doesn't parse, or if we're in
    /// production without email settings.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(SettingsError::Missing(name));

        let environment: Environment = parse_var("ENVIRONMENT", require("ENVIRONMENT")?)?;
        let bot_token = Secret(require("BOT_TOKEN")?);
        let topic_id = ThreadId(MessageId(parse_var("TOPIC_ID", require("TOPIC_ID")?)?));
        let group_chat_id = ChatId(parse_var("GROUP_CHAT_ID", require("GROUP_CHAT_ID")?)?);

        // We only email logging information on failure in production,
        // but if it's all there in development anyway, might as well check it.
        let smtp = match (get("SMTP_HOST"), get("SMTP_USER"), get("SMTP_PASSWORD")) {
            (Some(host), Some(user), Some(password)) => {
                Some(SmtpAlertConfig::new(host, &user, password)?)
            }
            (host, user, _) if environment == Environment::Production => {
                let missing = if host.is_none() {
                    "SMTP_HOST"
                } else if user.is_none() {
                    "SMTP_USER"
                } else {
                    "SMTP_PASSWORD"
                };
                return Err(SettingsError::RequiredInProduction(missing));
            }
            _ => None,
        };

        let log_file = get("LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Ok(Self {
            environment,
            bot_token,
            topic_id,
            group_chat_id,
            smtp,
            log_file,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn bot_token(&self) -> &Secret {
        &self.bot_token
    }

    pub fn topic_id(&self) -> ThreadId {
        self.topic_id
    }

    pub fn group_chat_id(&self) -> ChatId {
        self.group_chat_id
    }

    pub fn smtp(&self) -> Option<&SmtpAlertConfig> {
        self.smtp.as_ref()
    }

    /// The chat and topic this bot keeps clean.
    pub fn target(&self) -> TopicTarget {
        TopicTarget {
            chat_id: self.group_chat_id,
            thread_id: self.topic_id,
        }
    }

    /// Which log sinks this environment gets.
    pub fn logger_config(&self) -> LoggerConfig {
        match (self.environment, &self.smtp) {
            (Environment::Production, Some(alerts)) => LoggerConfig::Production {
                log_file: self.log_file.clone(),
                alerts: alerts.clone(),
            },
            // Production without SMTP doesn't get past `from_lookup`.
            _ => LoggerConfig::Development,
        }
    }
}
