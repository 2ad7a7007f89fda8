//! This module turns cached documents into typed records
//!
//! The portal serves three kinds of documents, see [`Format`]. Each resource is decoded by exactly one parser,
//! picked by [`Payload::parse`].

pub mod notices;
pub mod enrollment;
pub mod rss;
pub mod ical;

use std::collections::HashMap;

use crate::error::Result;
use crate::resource::Resource;
use crate::{Notice, Profile, ScheduleEvent, Subject};
use self::rss::FeedItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    /// RSS 2.0 feed
    Rss,
    /// iCalendar (RFC 5545)
    ICal,
}

impl Format {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Rss => "application/rss+xml",
            Format::ICal => "text/calendar",
        }
    }
}

/// The decoded content of a resource
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Notices(HashMap<String, Vec<Notice>>),
    Subjects(Vec<Subject>),
    Profile(Profile),
    News(Vec<FeedItem>),
    Schedule(Vec<ScheduleEvent>),
}

impl Payload {
    /// Decode the raw content of a resource
    pub fn parse(resource: Resource, raw: &[u8]) -> Result<Self> {
        match resource {
            Resource::Notices => self::notices::parse_bytes(raw).map(Payload::Notices),
            Resource::Subjects => self::enrollment::parse_subjects(raw).map(Payload::Subjects),
            Resource::Profile => self::enrollment::parse_profile(raw).map(Payload::Profile),
            Resource::NewsFeed => self::rss::parse_bytes(raw).map(Payload::News),
            Resource::Timetable | Resource::Calendar => {
                self::ical::parse(raw).collect::<Result<Vec<_>>>().map(Payload::Schedule)
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Notices(map) => map.values().map(|v| v.len()).sum(),
            Payload::Subjects(s) => s.len(),
            Payload::Profile(_) => 1,
            Payload::News(items) => items.len(),
            Payload::Schedule(events) => events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
