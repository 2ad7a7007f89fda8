//! Calendar events (iCal `VEVENT` items)

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime};

/// A class, exam or any other timetable entry, as found in an iCal feed.
///
/// Only the usual properties get an accessor, the others are kept in [`ScheduleEvent::properties`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// `(name, value)` of every property, in the order of the feed
    properties: Vec<(String, Option<String>)>,
}

impl ScheduleEvent {
    pub fn new(properties: Vec<(String, Option<String>)>) -> Self {
        Self { properties }
    }

    /// The value of the first property with this name
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn properties(&self) -> &[(String, Option<String>)] {
        &self.properties
    }

    pub fn uid(&self) -> Option<&str> { self.property("UID") }
    pub fn summary(&self) -> Option<&str> { self.property("SUMMARY") }
    pub fn location(&self) -> Option<&str> { self.property("LOCATION") }
    pub fn description(&self) -> Option<&str> { self.property("DESCRIPTION") }
    pub fn start_raw(&self) -> Option<&str> { self.property("DTSTART") }
    pub fn end_raw(&self) -> Option<&str> { self.property("DTEND") }

    /// Start time, in whatever time zone the feed uses. All-day events start at midnight
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        self.start_raw().and_then(parse_ical_date_time)
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        self.end_raw().and_then(parse_ical_date_time)
    }
}

fn parse_ical_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_end_matches('Z');
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_formats() {
        let event = ScheduleEvent::new(vec![
            ("DTSTART".to_string(), Some("20240212T080000Z".to_string())),
            ("DTEND".to_string(), Some("20240212".to_string())),
            ("SUMMARY".to_string(), None),
        ]);
        assert_eq!(event.starts_at().unwrap().to_string(), "2024-02-12 08:00:00");
        assert_eq!(event.ends_at().unwrap().to_string(), "2024-02-12 00:00:00");
        assert_eq!(event.summary(), None);
        assert_eq!(event.property("dtstart"), Some("20240212T080000Z"));
    }
}
