//! The documents the portal API serves

use bitflags::bitflags;
use url::Url;

use crate::error::Result;
use crate::formats::Format;

/// A remote document, and where it is cached locally
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Notices, grouped by subject
    Notices,
    /// The subjects the user is enrolled in
    Subjects,
    /// The signed-in user
    Profile,
    /// Global news feed
    NewsFeed,
    /// Weekly class timetable
    Timetable,
    /// Academic calendar (exams, holidays...)
    Calendar,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Subjects,
        Resource::Profile,
        Resource::Notices,
        Resource::NewsFeed,
        Resource::Timetable,
        Resource::Calendar,
    ];

    /// The cache key of this resource
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Notices => "avisos.json",
            Resource::Subjects => "assignatures.json",
            Resource::Profile => "info-personal.json",
            Resource::NewsFeed => "noticies.rss",
            Resource::Timetable => "horari.ics",
            Resource::Calendar => "calendari.ics",
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Resource::Notices | Resource::Subjects | Resource::Profile => Format::Json,
            Resource::NewsFeed => Format::Rss,
            Resource::Timetable | Resource::Calendar => Format::ICal,
        }
    }

    /// Build the URL of this resource on a given portal
    pub fn url(&self, base_url: &Url) -> Result<Url> {
        Ok(base_url.join(&format!("/api-v1/{}", self.name()))?)
    }

    fn flag(&self) -> ResourceSet {
        match self {
            Resource::Notices => ResourceSet::NOTICES,
            Resource::Subjects => ResourceSet::SUBJECTS,
            Resource::Profile => ResourceSet::PROFILE,
            Resource::NewsFeed => ResourceSet::NEWS_FEED,
            Resource::Timetable => ResourceSet::TIMETABLE,
            Resource::Calendar => ResourceSet::CALENDAR,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

bitflags! {
    /// A group of resources, e.g. to refresh them in a row
    pub struct ResourceSet: u8 {
        const NOTICES = 1;
        const SUBJECTS = 2;
        const PROFILE = 4;
        const NEWS_FEED = 8;
        const TIMETABLE = 16;
        const CALENDAR = 32;
        /// What a user sees on the notices screen
        const NOTICE_BOARD = Self::NOTICES.bits | Self::SUBJECTS.bits;
        const SCHEDULES = Self::TIMETABLE.bits | Self::CALENDAR.bits;
    }
}

impl ResourceSet {
    /// The resources of this set, enrollment and profile first since other views depend on them
    pub fn resources(&self) -> Vec<Resource> {
        Resource::ALL.iter()
            .filter(|r| self.contains(r.flag()))
            .copied()
            .collect()
    }
}

impl From<Resource> for ResourceSet {
    fn from(resource: Resource) -> Self {
        resource.flag()
    }
}
