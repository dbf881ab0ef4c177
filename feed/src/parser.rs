// SPDX-FileCopyrightText: 2025-2026 icsync contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Feed parsing using the icalendar crate's low-level parser.

use icalendar::parser::{Component, read_calendar, unfold};
use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::error::FeedError;
use crate::types::RemoteEvent;

/// Parses decoded feed text into the ordered sequence of events it carries.
///
/// Events are returned in document order. `VEVENT` components without a
/// `UID` are skipped with a warning: one malformed component must not
/// discard an otherwise healthy feed.
///
/// # Errors
///
/// Returns [`FeedError::Parse`] if the text is not valid iCalendar data.
pub fn parse_events(ics: &str) -> Result<Vec<RemoteEvent>, FeedError> {
    let unfolded = unfold(ics);
    let calendar = read_calendar(&unfolded).map_err(|e| FeedError::Parse(e.to_string()))?;

    let mut events = Vec::new();
    for component in &calendar.components {
        if component.name != "VEVENT" {
            continue;
        }
        match parse_event(component) {
            Some(event) => events.push(event),
            None => tracing::warn!("skipping VEVENT without UID"),
        }
    }

    tracing::debug!(events = events.len(), "parsed calendar feed");
    Ok(events)
}

fn parse_event(vevent: &Component) -> Option<RemoteEvent> {
    let uid = vevent.find_prop("UID")?.val.to_string();

    let sequence = vevent
        .find_prop("SEQUENCE")
        .and_then(|p| p.val.as_ref().parse().ok());
    let last_modified = vevent
        .find_prop("LAST-MODIFIED")
        .and_then(|p| parse_utc_stamp(p.val.as_ref()));

    Some(RemoteEvent {
        uid,
        summary: prop_value(vevent, "SUMMARY"),
        description: prop_value(vevent, "DESCRIPTION"),
        location: prop_value(vevent, "LOCATION"),
        dtstart: prop_value(vevent, "DTSTART"),
        dtend: prop_value(vevent, "DTEND"),
        sequence,
        last_modified,
    })
}

fn prop_value(component: &Component, name: &str) -> Option<String> {
    component.find_prop(name).map(|p| p.val.to_string())
}

/// Parses an iCalendar UTC date-time like `20240101T100000Z`.
///
/// `LAST-MODIFIED` must be in UTC per RFC 5545; anything else counts as
/// absent, which the reconciliation engine treats as "always newer".
fn parse_utc_stamp(value: &str) -> Option<Timestamp> {
    let value = value.strip_suffix('Z')?;
    let datetime = DateTime::strptime("%Y%m%dT%H%M%S", value).ok()?;
    let zoned = datetime.to_zoned(TimeZone::UTC).ok()?;
    Some(zoned.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Feed//EN\r\n\
BEGIN:VEVENT\r\n\
UID:first@example.com\r\n\
SUMMARY:Team meeting\r\n\
DESCRIPTION:Weekly catch-up\r\n\
LOCATION:Room 4\r\n\
DTSTART:20250601T090000Z\r\n\
DTEND:20250601T100000Z\r\n\
SEQUENCE:3\r\n\
LAST-MODIFIED:20250530T120000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:second@example.com\r\n\
SUMMARY:Lunch\r\n\
DTSTART:20250602T120000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parse_reads_events_in_document_order() {
        let events = parse_events(FEED).expect("feed parses");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].uid, "first@example.com");
        assert_eq!(events[1].uid, "second@example.com");
    }

    #[test]
    fn parse_extracts_fields() {
        let events = parse_events(FEED).expect("feed parses");
        let event = &events[0];

        assert_eq!(event.summary.as_deref(), Some("Team meeting"));
        assert_eq!(event.description.as_deref(), Some("Weekly catch-up"));
        assert_eq!(event.location.as_deref(), Some("Room 4"));
        assert_eq!(event.dtstart.as_deref(), Some("20250601T090000Z"));
        assert_eq!(event.dtend.as_deref(), Some("20250601T100000Z"));
        assert_eq!(event.sequence, Some(3));
        assert_eq!(
            event.last_modified,
            Some("2025-05-30T12:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn parse_leaves_absent_fields_empty() {
        let events = parse_events(FEED).expect("feed parses");
        let event = &events[1];

        assert_eq!(event.description, None);
        assert_eq!(event.sequence, None);
        assert_eq!(event.last_modified, None);
    }

    #[test]
    fn parse_skips_event_without_uid() {
        let feed = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:No identity\r\n\
DTSTART:20250601T090000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:kept@example.com\r\n\
SUMMARY:Kept\r\n\
DTSTART:20250601T100000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse_events(feed).expect("feed parses");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid, "kept@example.com");
    }

    #[test]
    fn parse_handles_folded_lines() {
        let feed = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:folded@example.com\r\n\
SUMMARY:A summary that has been folded \r\n across two lines\r\n\
DTSTART:20250601T090000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse_events(feed).expect("feed parses");

        assert_eq!(
            events[0].summary.as_deref(),
            Some("A summary that has been folded across two lines")
        );
    }

    #[test]
    fn parse_rejects_non_calendar_data() {
        let result = parse_events("<html>not a calendar</html>");
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[test]
    fn parse_treats_non_utc_last_modified_as_absent() {
        let feed = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:floating@example.com\r\n\
LAST-MODIFIED:20250530T120000\r\n\
DTSTART:20250601T090000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse_events(feed).expect("feed parses");

        assert_eq!(events[0].last_modified, None);
    }

    #[test]
    fn utc_stamp_round_trips() {
        let stamp = parse_utc_stamp("20240101T100000Z").expect("stamp parses");
        assert_eq!(stamp, "2024-01-01T10:00:00Z".parse().unwrap());
    }
}
