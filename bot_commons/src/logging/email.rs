use std::{fmt, io, thread, time::Duration};

use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use html_escape::encode_text;
use lettre::{
    address::AddressError,
    message::{Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Address, Message, SmtpTransport, Transport,
};
use log::Record;

use super::level_name;

/// STARTTLS submission port.
pub const SMTP_PORT: u16 = 587;

pub const GREEN_HEX: &str = "#28a745";
pub const RED_HEX: &str = "#dc3545";
pub const DARK_RED_HEX: &str = "#dc3545";
pub const YELLOW_HEX: &str = "#ffc107";

/// How long [`EmailAlerts::flush`] waits for queued alerts to go out.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

const EMAIL_TEMPLATE: &str = include_str!("../../templates/error_email.html");

/// Where alert emails go and how to log in there.
///
/// The SMTP user is both the sender and the recipient: alerts are mailed to yourself.
#[derive(Clone)]
pub struct SmtpAlertConfig {
    host: String,
    user: Address,
    password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertConfigError {
    #[error("{address:?} is not a valid email address: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("failed to build the alert email: {0}")]
    Email(#[from] lettre::error::Error),
    #[error("SMTP failure: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl SmtpAlertConfig {
    /// # Errors
    ///
    /// Errors if `user` is not an email address.
    pub fn new(
        host: impl Into<String>,
        user: &str,
        password: impl Into<String>,
    ) -> Result<Self, AlertConfigError> {
        let user = user
            .parse::<Address>()
            .map_err(|source| AlertConfigError::InvalidAddress {
                address: user.to_string(),
                source,
            })?;

        Ok(Self {
            host: host.into(),
            user,
            password: password.into(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &Address {
        &self.user
    }
}

impl fmt::Debug for SmtpAlertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpAlertConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A rendered alert, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEmail {
    pub subject: String,
    pub html: String,
}

impl AlertEmail {
    /// Render `record` into the HTML alert template. Everything that came from
    /// the record is HTML-escaped.
    pub fn render(record: &Record, now: &DateTime<Local>) -> Self {
        let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let level = level_name(record);
        let location = format!(
            "{}:{}",
            record.file().unwrap_or("<unknown>"),
            record.line().unwrap_or(0)
        );
        let message = record.args().to_string();
        let level_lower = level.to_lowercase();
        let logger_name = encode_text(record.target());
        let file_location = encode_text(&location);
        let message = encode_text(&message);

        let vars: [(&str, &str); 7] = [
            ("timestamp", timestamp.as_str()),
            ("level", level),
            ("level_lower", level_lower.as_str()),
            ("level_color", level_color(level)),
            ("logger_name", &*logger_name),
            ("file_location", &*file_location),
            ("message", &*message),
        ];
        let html = fill_template(EMAIL_TEMPLATE, &vars);

        Self {
            subject: format!("Application {level} - {timestamp}"),
            html,
        }
    }
}

pub fn level_color(level: &str) -> &'static str {
    match level {
        "CRITICAL" => DARK_RED_HEX,
        "ERROR" => RED_HEX,
        "WARNING" => YELLOW_HEX,
        _ => GREEN_HEX,
    }
}

/// Substitute `${name}` placeholders in one pass. Unknown placeholders are left alone,
/// and substituted values are never looked at again.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            // Unterminated. Keep it verbatim.
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Something that can deliver an [`AlertEmail`].
pub trait AlertTransport: Send + Sync {
    fn send(&self, email: &AlertEmail) -> Result<(), AlertError>;
}

/// Sends alerts over SMTP with STARTTLS, from the SMTP user to itself.
pub struct SmtpAlertTransport {
    mailer: SmtpTransport,
    mailbox: Mailbox,
}

impl SmtpAlertTransport {
    /// Set up the transport. Doesn't connect to anything yet.
    ///
    /// # Errors
    ///
    /// Errors if TLS parameters for the host can't be built.
    pub fn new(config: &SmtpAlertConfig) -> Result<Self, AlertError> {
        let mailer = SmtpTransport::starttls_relay(&config.host)?
            .port(SMTP_PORT)
            .credentials(Credentials::new(
                config.user.to_string(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            mailer,
            mailbox: Mailbox::new(None, config.user.clone()),
        })
    }
}

impl AlertTransport for SmtpAlertTransport {
    fn send(&self, email: &AlertEmail) -> Result<(), AlertError> {
        let message = Message::builder()
            .from(self.mailbox.clone())
            .to(self.mailbox.clone())
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative().singlepart(SinglePart::html(email.html.clone())),
            )?;

        self.mailer.send(&message)?;
        Ok(())
    }
}

enum Job {
    Send(AlertEmail),
    Flush(Sender<()>),
}

/// The email sink of the logger.
///
/// Emails are sent from a thread of its own, so whoever logged a critical record
/// isn't stuck waiting on the SMTP server.
pub struct EmailAlerts {
    jobs: Sender<Job>,
}

impl EmailAlerts {
    /// Start the sending thread. It stops once this is dropped.
    ///
    /// # Errors
    ///
    /// Errors if the thread can't be spawned.
    pub fn new(transport: impl AlertTransport + 'static) -> io::Result<Self> {
        let (jobs, queue) = crossbeam_channel::unbounded();

        thread::Builder::new()
            .name("email-alerts".to_string())
            .spawn(move || {
                for job in queue {
                    match job {
                        Job::Send(email) => {
                            // Stderr, since logging about it would loop.
                            if let Err(e) = transport.send(&email) {
                                eprintln!("Failed to send an alert email: {e}");
                            }
                        }
                        Job::Flush(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            })?;

        Ok(Self { jobs })
    }

    /// Render `record` and queue it for sending.
    pub fn alert(&self, record: &Record) {
        let email = AlertEmail::render(record, &Local::now());
        if self.jobs.send(Job::Send(email)).is_err() {
            eprintln!("The email alert thread is gone, dropping an alert");
        }
    }

    /// Wait until everything queued so far is sent, or [`FLUSH_TIMEOUT`] passes.
    pub fn flush(&self) {
        let (done, wait) = crossbeam_channel::bounded(1);
        if self.jobs.send(Job::Flush(done)).is_ok() {
            let _ = wait.recv_timeout(FLUSH_TIMEOUT);
        }
    }
}
