//! Subject notices and their attachments

use serde::{Deserialize, Serialize};
use chrono::{DateTime, FixedOffset};

/// A file attached to a [`Notice`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    id: String,
    filename: String,
}

impl Attachment {
    pub fn new(id: String, filename: String) -> Self {
        Self { id, filename }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn filename(&self) -> &str { &self.filename }
}

/// A publication date, as the portal sends it
///
/// The portal sends RFC 2822 dates (e.g. `Tue, 15 Nov 2016 12:40:03 +0100`). Notices are displayed without their
/// leading weekday and trailing offset, which is what [`PubDate::text`] returns for them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PubDate {
    raw: String,
    text: String,
    parsed: Option<DateTime<FixedOffset>>,
}

impl PubDate {
    /// Number of characters of the weekday prefix (`"Tue, "`)
    const WEEKDAY_LEN: usize = 5;
    /// Number of characters of the offset suffix (`" +0100"`)
    const OFFSET_LEN: usize = 6;

    /// A notice date. Returns `None` when the field is too short to hold a weekday and an offset
    pub fn from_notice_field(raw: &str) -> Option<Self> {
        let n_chars = raw.chars().count();
        if n_chars < Self::WEEKDAY_LEN + Self::OFFSET_LEN {
            return None;
        }
        let text: String = raw.chars()
            .skip(Self::WEEKDAY_LEN)
            .take(n_chars - Self::WEEKDAY_LEN - Self::OFFSET_LEN)
            .collect();

        Some(Self {
            raw: raw.to_string(),
            text,
            parsed: DateTime::parse_from_rfc2822(raw).ok(),
        })
    }

    /// A date that is displayed as-is, such as a feed `pubDate`
    pub fn verbatim(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            text: raw.to_string(),
            parsed: DateTime::parse_from_rfc2822(raw.trim()).ok(),
        }
    }

    /// The field exactly as received
    pub fn raw(&self) -> &str { &self.raw }
    /// The form that should be displayed
    pub fn text(&self) -> &str { &self.text }
    /// The date itself, if the field is a valid RFC 2822 date
    pub fn parsed(&self) -> Option<&DateTime<FixedOffset>> { self.parsed.as_ref() }
}

impl std::fmt::Display for PubDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// An announcement posted to the students of a subject
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    id: String,
    subject_id: String,
    title: String,
    pub_date: PubDate,
    description: String,
    /// In the order the portal lists them
    attachments: Vec<Attachment>,
}

impl Notice {
    pub fn new(id: String, subject_id: String, title: String, pub_date: PubDate, description: String, attachments: Vec<Attachment>) -> Self {
        Self { id, subject_id, title, pub_date, description, attachments }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn subject_id(&self) -> &str { &self.subject_id }
    pub fn title(&self) -> &str { &self.title }
    pub fn pub_date(&self) -> &PubDate { &self.pub_date }
    pub fn description(&self) -> &str { &self.description }
    pub fn attachments(&self) -> &[Attachment] { &self.attachments }
}
