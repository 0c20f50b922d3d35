use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// A single committed revision as reconstructed from tool log output.
///
/// The hash is the primary identity. Instances are built up line by line by
/// the backend parsers and treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    /// Full revision hash
    pub hash: String,
    /// Local sequential id, when the tool has one (mercurial rev numbers)
    pub local_id: Option<String>,
    /// Parent hashes, in tool-reported order
    pub parents: Vec<String>,
    /// Committing user id
    pub author: String,
    /// First line of the commit message
    pub message: String,
    /// Branch the changeset was committed on, when reported
    pub branch: Option<String>,
    /// Commit timestamp as reported by the tool (timezone dropped)
    pub timestamp: Option<NaiveDateTime>,
    /// `timestamp` truncated to midnight and rolled back to that ISO week's
    /// Monday; used for weekly-bucketed reporting
    pub week_start: Option<NaiveDateTime>,
}

impl Changeset {
    /// Start a new record at a revision boundary line.
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            local_id: None,
            parents: Vec::new(),
            author: String::new(),
            message: String::new(),
            branch: None,
            timestamp: None,
            week_start: None,
        }
    }

    /// Record the commit timestamp along with its week-aligned form.
    pub fn set_timestamp(&mut self, timestamp: NaiveDateTime) {
        self.week_start = Some(align_to_week_start(timestamp));
        self.timestamp = Some(timestamp);
    }
}

/// Align a timestamp to the Monday of its ISO calendar week, at midnight.
pub fn align_to_week_start(timestamp: NaiveDateTime) -> NaiveDateTime {
    let truncated = timestamp
        .with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp);
    let days_from_monday = truncated.weekday().num_days_from_monday() as i64;
    truncated - Duration::days(days_from_monday)
}

/// Parse a tool-reported date line such as `Fri Nov 09 12:44:01 2012 -0700`.
///
/// Both git's medium format and the mercurial log template report this
/// layout. The trailing timezone token is dropped before parsing, matching
/// the rest of the pipeline which works in tool-local naive time. Splitting
/// happens on whitespace, never on a byte offset, so lossily decoded lines
/// with multi-byte replacement characters are rejected rather than panicking.
pub fn parse_tool_date(raw: &str) -> Option<NaiveDateTime> {
    let (without_tz, _tz) = raw.trim().rsplit_once(' ')?;
    NaiveDateTime::parse_from_str(without_tz.trim(), "%a %b %e %H:%M:%S %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_tool_date() {
        let parsed = parse_tool_date("Fri Nov 09 12:44:01 2012 -0700").unwrap();
        assert_eq!(parsed, ts(2012, 11, 9, 12, 44, 1));
    }

    #[test]
    fn test_parse_tool_date_space_padded_day() {
        let parsed = parse_tool_date("Fri Nov  9 12:44:01 2012 -0700").unwrap();
        assert_eq!(parsed, ts(2012, 11, 9, 12, 44, 1));
    }

    #[test]
    fn test_parse_tool_date_rejects_garbage() {
        assert!(parse_tool_date("not a date at all").is_none());
        assert!(parse_tool_date("").is_none());
    }

    #[test]
    fn test_parse_tool_date_survives_lossy_decoding() {
        // Lossily decoded tool output can place a multi-byte replacement
        // character anywhere in the line, including the timezone position.
        assert!(parse_tool_date("abcdef\u{FFFD}abc").is_none());
        assert!(parse_tool_date("\u{FFFD}").is_none());
        let parsed = parse_tool_date("Fri Nov 09 12:44:01 2012 \u{FFFD}0700").unwrap();
        assert_eq!(parsed, ts(2012, 11, 9, 12, 44, 1));
    }

    #[test]
    fn test_week_alignment_rolls_back_to_monday() {
        // 2012-11-09 was a Friday; that ISO week started Monday 2012-11-05.
        let aligned = align_to_week_start(ts(2012, 11, 9, 12, 44, 1));
        assert_eq!(aligned, ts(2012, 11, 5, 0, 0, 0));
    }

    #[test]
    fn test_week_alignment_is_identity_on_monday_midnight() {
        let monday = ts(2012, 11, 5, 0, 0, 0);
        assert_eq!(align_to_week_start(monday), monday);
    }

    #[test]
    fn test_set_timestamp_fills_both_fields() {
        let mut changeset = Changeset::new("abc123");
        changeset.set_timestamp(ts(2012, 11, 9, 12, 44, 1));
        assert_eq!(changeset.timestamp, Some(ts(2012, 11, 9, 12, 44, 1)));
        assert_eq!(changeset.week_start, Some(ts(2012, 11, 5, 0, 0, 0)));
    }
}
