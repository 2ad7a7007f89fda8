//! Decoding of iCal timetables and calendars
//!
//! This is a thin wrapper around the `ical` crate: events are passed through with all their properties.

use std::collections::VecDeque;

use ical::parser::ical::component::IcalEvent;
use ical::IcalParser;

use crate::error::{PortalError, Result};
use crate::ScheduleEvent;

/// Iterate over the events of an iCal document
///
/// A document can contain several `VCALENDAR`s; their events are yielded in order.
/// A decoding error is yielded once, then the iteration stops.
pub fn parse(content: &[u8]) -> ScheduleEvents<'_> {
    ScheduleEvents {
        reader: IcalParser::new(content),
        pending: VecDeque::new(),
        seen_calendar: false,
        finished: false,
    }
}

pub struct ScheduleEvents<'a> {
    reader: IcalParser<&'a [u8]>,
    pending: VecDeque<ScheduleEvent>,
    seen_calendar: bool,
    finished: bool,
}

impl<'a> Iterator for ScheduleEvents<'a> {
    type Item = Result<ScheduleEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            match self.reader.next() {
                None => {
                    self.finished = true;
                    if self.seen_calendar == false {
                        return Some(Err(PortalError::malformed("iCal", "no VCALENDAR found")));
                    }
                },
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(PortalError::malformed("iCal", err)));
                },
                Some(Ok(calendar)) => {
                    self.seen_calendar = true;
                    self.pending.extend(calendar.events.iter().map(to_schedule_event));
                },
            }
        }
    }
}

fn to_schedule_event(event: &IcalEvent) -> ScheduleEvent {
    ScheduleEvent::new(event.properties.iter()
        .map(|prop| (prop.name.clone(), prop.value.clone()))
        .collect())
}
