use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::info;
use std::error::Error as StdError;
use std::fmt;

use crate::slot::SlotRecord;

pub const DEFAULT_SUBJECT: &str = "Driving Lesson Openings Available";

/// Failure to deliver a notification
#[derive(Debug)]
pub enum DeliveryError {
    /// Nothing to send
    EmptyBatch,
    /// Sender or recipient address did not parse
    InvalidAddress(String, lettre::address::AddressError),
    /// Message could not be assembled
    Message(lettre::error::Error),
    /// SMTP relay setup or send failed
    Transport(lettre::transport::smtp::Error),
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::EmptyBatch => write!(f, "Refusing to send an empty notification"),
            DeliveryError::InvalidAddress(addr, err) => {
                write!(f, "Invalid email address '{}': {}", addr, err)
            }
            DeliveryError::Message(err) => write!(f, "Failed to build email: {}", err),
            DeliveryError::Transport(err) => write!(f, "Failed to send email: {}", err),
        }
    }
}

impl StdError for DeliveryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DeliveryError::EmptyBatch => None,
            DeliveryError::InvalidAddress(_, err) => Some(err),
            DeliveryError::Message(err) => Some(err),
            DeliveryError::Transport(err) => Some(err),
        }
    }
}

impl From<lettre::error::Error> for DeliveryError {
    fn from(err: lettre::error::Error) -> Self {
        DeliveryError::Message(err)
    }
}

impl From<lettre::transport::smtp::Error> for DeliveryError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        DeliveryError::Transport(err)
    }
}

/// Sink for batches of newly found slots
pub trait Notifier {
    /// Send one notification covering every record in `records` (non-empty)
    fn notify(&mut self, records: &[SlotRecord]) -> Result<(), DeliveryError>;
}

/// One line per slot, as listed in the email body
pub fn format_slot_line(record: &SlotRecord) -> String {
    format!("{} | Instructor: {}", record.identifier, record.instructor)
}

pub fn compose_body(records: &[SlotRecord], login_url: &str) -> String {
    let lines: Vec<String> = records.iter().map(format_slot_line).collect();
    format!(
        "Here are the available appointments:\n\n{}\n\nYou can log in here:\n{}",
        lines.join("\n"),
        login_url
    )
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, DeliveryError> {
    addr.trim()
        .parse()
        .map_err(|e| DeliveryError::InvalidAddress(addr.to_string(), e))
}

/// SMTP settings for [`SmtpNotifier`]
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
    pub recipients: Vec<String>,
    pub subject: String,
    /// Link appended to the body so recipients can book
    pub login_url: String,
}

/// Sends a plain-text email through a STARTTLS relay
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Vec<Mailbox>,
    subject: String,
    login_url: String,
}

impl SmtpNotifier {
    /// Validate addresses and prepare the relay; nothing is sent yet
    pub fn new(settings: SmtpSettings) -> Result<Self, DeliveryError> {
        let from = parse_mailbox(&settings.sender)?;
        let to = settings
            .recipients
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>, _>>()?;

        let creds = Credentials::new(settings.sender.clone(), settings.password);
        let transport = SmtpTransport::starttls_relay(&settings.server)?
            .port(settings.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from,
            to,
            subject: settings.subject,
            login_url: settings.login_url,
        })
    }

    fn build_message(&self, records: &[SlotRecord]) -> Result<Message, DeliveryError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        Ok(builder.body(compose_body(records, &self.login_url))?)
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&mut self, records: &[SlotRecord]) -> Result<(), DeliveryError> {
        if records.is_empty() {
            return Err(DeliveryError::EmptyBatch);
        }
        let email = self.build_message(records)?;
        self.transport.send(&email)?;

        let recipients: Vec<String> = self.to.iter().map(|m| m.to_string()).collect();
        info!("Email sent successfully to {}", recipients.join(", "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_rule::ClockTime;
    use chrono::Weekday;

    fn record(id: &str, instructor: &str) -> SlotRecord {
        SlotRecord {
            identifier: id.to_string(),
            day: Weekday::Sun,
            start_time: ClockTime::from_hhmm("1000").unwrap(),
            end_time: ClockTime::from_hhmm("1100").unwrap(),
            instructor: instructor.to_string(),
        }
    }

    fn settings() -> SmtpSettings {
        SmtpSettings {
            server: "smtp.example.com".to_string(),
            port: 587,
            sender: "watcher@example.com".to_string(),
            password: "secret".to_string(),
            recipients: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            subject: DEFAULT_SUBJECT.to_string(),
            login_url: "https://booking.example.com/login".to_string(),
        }
    }

    #[test]
    fn test_compose_body() {
        let body = compose_body(
            &[record("Sun, Jan 12", "Kim"), record("Sun, Jan 19", "Sam")],
            "https://booking.example.com/login",
        );
        assert_eq!(
            body,
            "Here are the available appointments:\n\n\
             Sun, Jan 12 | Instructor: Kim\n\
             Sun, Jan 19 | Instructor: Sam\n\n\
             You can log in here:\nhttps://booking.example.com/login"
        );
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let mut s = settings();
        s.recipients.push("not an address".to_string());
        let err = SmtpNotifier::new(s).err().unwrap();
        assert!(matches!(err, DeliveryError::InvalidAddress(ref a, _) if a == "not an address"));
    }

    #[test]
    fn test_build_message_headers() {
        let notifier = SmtpNotifier::new(settings()).unwrap();
        let message = notifier.build_message(&[record("Sun, Jan 12", "Kim")]).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Driving Lesson Openings Available"));
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("Sun, Jan 12 | Instructor: Kim"));
    }

    #[test]
    fn test_empty_batch_is_refused() {
        let mut notifier = SmtpNotifier::new(settings()).unwrap();
        assert!(matches!(notifier.notify(&[]), Err(DeliveryError::EmptyBatch)));
    }
}
