//! iCalendar export of the whole history.
//!
//! The feed is always rendered from scratch; nothing from a previous feed is
//! read back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DutyResult;
use crate::models::{Components, DutyCycle, History, Shift};
use crate::store::DutyStore;

/// Namespace for per-cycle event UIDs, so a cycle keeps its UID across rebuilds.
const EVENT_NAMESPACE: Uuid = Uuid::from_u128(0x5f1c_2a7e_8d3b_4c60_9e21_7b4d_0a6f_3c18);

const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub name: String,
    pub description: String,
    pub timezone: String,
    pub tracker: Option<TrackerQuery>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            name: "Triage Duty".to_string(),
            description: "Weekly triage duty rotation".to_string(),
            timezone: "America/Los_Angeles".to_string(),
            tracker: None,
        }
    }
}

/// Builds an issue-tracker search link for a set of components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerQuery {
    /// URL with an `{ids}` placeholder, e.g. `https://tracker.example/search?component={ids}`.
    pub query_template: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Metadata field holding a component's tracker identifier.
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

fn default_separator() -> String {
    ",".to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

impl TrackerQuery {
    pub fn link(&self, names: &[String], components: &Components) -> String {
        let ids: Vec<String> = names
            .iter()
            .map(|name| {
                let id = components
                    .find(name)
                    .and_then(|c| c.metadata.get(&self.id_field))
                    .and_then(|v| v.as_str())
                    .unwrap_or(name.as_str());
                url::form_urlencoded::byte_serialize(id.as_bytes()).collect::<String>()
            })
            .collect();
        self.query_template
            .replace("{ids}", &ids.join(&self.separator))
    }
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Appends `line` folded at 75 octets, never splitting a UTF-8 sequence.
fn push_folded(out: &mut String, line: &str) {
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > budget {
            out.push_str("\r\n ");
            // Continuation lines lose one octet to the leading space.
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        out.push(ch);
        used += width;
    }
    out.push_str("\r\n");
}

fn ical_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn shift_line(shift: &Shift, components: &Components, settings: &FeedSettings) -> String {
    let mut line = format!("{}: {}", shift.triager, shift.components.join(", "));
    if let Some(tracker) = &settings.tracker {
        if !shift.components.is_empty() {
            line.push('\n');
            line.push_str(&tracker.link(&shift.components, components));
        }
    }
    line
}

fn push_event(
    out: &mut String,
    cycle: &DutyCycle,
    components: &Components,
    settings: &FeedSettings,
    stamp: &str,
) {
    let assignment = &cycle.assignment;
    let uid = Uuid::new_v5(&EVENT_NAMESPACE, cycle.start_date.to_string().as_bytes());
    let summary = format!(
        "Triage: {} & {}",
        assignment.first.triager, assignment.second.triager
    );
    let description = assignment
        .shifts()
        .iter()
        .map(|shift| shift_line(shift, components, settings))
        .collect::<Vec<_>>()
        .join("\n\n");

    push_folded(out, "BEGIN:VEVENT");
    push_folded(out, &format!("UID:{}", uid));
    push_folded(out, &format!("DTSTAMP:{}", stamp));
    push_folded(out, &format!("DTSTART;VALUE=DATE:{}", ical_date(cycle.start_date)));
    push_folded(out, &format!("DTEND;VALUE=DATE:{}", ical_date(cycle.end_date())));
    push_folded(out, &format!("SUMMARY:{}", escape_text(&summary)));
    push_folded(out, &format!("DESCRIPTION:{}", escape_text(&description)));
    push_folded(out, "TRANSP:TRANSPARENT");
    push_folded(out, "END:VEVENT");
}

/// Renders the complete feed text for `history`.
pub fn render_feed(
    history: &History,
    components: &Components,
    settings: &FeedSettings,
    generated_at: DateTime<Utc>,
) -> String {
    let stamp = generated_at.format("%Y%m%dT%H%M%SZ").to_string();
    let mut out = String::new();

    push_folded(&mut out, "BEGIN:VCALENDAR");
    push_folded(&mut out, "VERSION:2.0");
    push_folded(&mut out, "PRODID:-//dutycal//Triage Duty//EN");
    push_folded(&mut out, "CALSCALE:GREGORIAN");
    push_folded(&mut out, "METHOD:PUBLISH");
    push_folded(&mut out, &format!("X-WR-CALNAME:{}", escape_text(&settings.name)));
    push_folded(
        &mut out,
        &format!("X-WR-CALDESC:{}", escape_text(&settings.description)),
    );
    push_folded(&mut out, &format!("X-WR-TIMEZONE:{}", settings.timezone));
    push_folded(&mut out, "REFRESH-INTERVAL;VALUE=DURATION:PT1H");
    push_folded(&mut out, "X-PUBLISHED-TTL:PT1H");

    for cycle in history.cycles() {
        push_event(&mut out, &cycle, components, settings, &stamp);
    }

    push_folded(&mut out, "END:VCALENDAR");
    out
}

/// Regenerates the feed file from `history`, replacing whatever was there.
pub fn rebuild_feed(
    store: &DutyStore,
    history: &History,
    components: &Components,
    settings: &FeedSettings,
    generated_at: DateTime<Utc>,
) -> DutyResult<()> {
    let text = render_feed(history, components, settings, generated_at);
    store.write_feed(&text)?;
    tracing::debug!(events = history.len(), path = %store.feed_path().display(), "Rebuilt feed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Component};
    use chrono::TimeZone;
    use serde_json::json;

    fn history() -> History {
        let mut history = History::new();
        for (start, first, second) in [("2024-01-08", "carol", "alice"), ("2024-01-01", "alice", "bob")] {
            history.insert(DutyCycle::new(
                start.parse().unwrap(),
                Assignment::new(
                    Shift::new(first, vec!["DOM".into(), "CSS; Layout".into()]),
                    Shift::new(second, vec!["Audio".into()]),
                ),
            ));
        }
        history
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn unfold(text: &str) -> String {
        text.replace("\r\n ", "")
    }

    #[test]
    fn one_all_day_event_per_cycle_in_date_order() {
        let text = render_feed(
            &history(),
            &Components::default(),
            &FeedSettings::default(),
            now(),
        );

        let starts: Vec<&str> = text
            .lines()
            .filter_map(|l| l.strip_prefix("DTSTART;VALUE=DATE:"))
            .collect();
        assert_eq!(starts, vec!["20240101", "20240108"]);
        assert!(text.contains("DTEND;VALUE=DATE:20240108\r\n"));
        assert!(text.contains("DTEND;VALUE=DATE:20240115\r\n"));
        assert!(text.contains("SUMMARY:Triage: alice & bob\r\n"));
        assert!(text.contains("DTSTAMP:20240102T030405Z\r\n"));
    }

    #[test]
    fn header_carries_refresh_and_timezone() {
        let text = render_feed(
            &History::new(),
            &Components::default(),
            &FeedSettings::default(),
            now(),
        );
        assert!(text.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(text.ends_with("END:VCALENDAR\r\n"));
        assert!(text.contains("X-WR-TIMEZONE:America/Los_Angeles\r\n"));
        assert!(text.contains("REFRESH-INTERVAL;VALUE=DURATION:PT1H\r\n"));
        assert!(text.contains("X-WR-CALNAME:Triage Duty\r\n"));
        assert!(!text.contains("BEGIN:VEVENT"));
    }

    #[test]
    fn description_escapes_and_lists_components() {
        let text = unfold(&render_feed(
            &history(),
            &Components::default(),
            &FeedSettings::default(),
            now(),
        ));
        assert!(text.contains(r"DESCRIPTION:alice: DOM\, CSS\; Layout\n\nbob: Audio"));
    }

    #[test]
    fn uid_is_stable_across_rebuilds() {
        let later = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let settings = FeedSettings::default();
        let uids = |text: String| -> Vec<String> {
            text.lines()
                .filter(|l| l.starts_with("UID:"))
                .map(str::to_string)
                .collect()
        };
        assert_eq!(
            uids(render_feed(&history(), &Components::default(), &settings, now())),
            uids(render_feed(&history(), &Components::default(), &settings, later))
        );
    }

    #[test]
    fn tracker_link_joins_component_ids() {
        let components = Components::new(vec![
            Component::new("DOM", json!({"id": "Core::DOM"})),
            Component::new("CSS; Layout", json!({})),
            Component::new("Audio", json!({"id": "Web Audio"})),
        ]);
        let settings = FeedSettings {
            tracker: Some(TrackerQuery {
                query_template: "https://bugs.example/search?component={ids}".into(),
                separator: ",".into(),
                id_field: "id".into(),
            }),
            ..FeedSettings::default()
        };

        let text = unfold(&render_feed(&history(), &components, &settings, now()));
        assert!(text.contains(
            r"https://bugs.example/search?component=Core%3A%3ADOM\,CSS%3B+Layout"
        ));
        assert!(text.contains(r"https://bugs.example/search?component=Web+Audio"));
    }

    #[test]
    fn long_lines_fold_at_75_octets() {
        let settings = FeedSettings {
            description: "é".repeat(100),
            ..FeedSettings::default()
        };
        let text = render_feed(&History::new(), &Components::default(), &settings, now());
        for line in text.split("\r\n") {
            assert!(line.len() <= MAX_LINE_OCTETS, "{} octets: {}", line.len(), line);
        }
        assert!(unfold(&text).contains(&format!("X-WR-CALDESC:{}", "é".repeat(100))));
    }
}
