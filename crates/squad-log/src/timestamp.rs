//! Parses the game log's timestamp and chain-id prefix:
//! `[YYYY.MM.DD-HH.MM.SS:mmm][ <chain>]`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use squad_core::ChainId;

/// Matches the standard log prefix and captures the timestamp and chain-id
/// fields; the remainder of the line (the rule-specific tail) follows.
pub static PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{4}\.\d{2}\.\d{2}-\d{2}\.\d{2}\.\d{2}:\d{3})\]\[([ \d]+)\](.*)$")
        .expect("valid regex")
});

/// A decomposed log line: timestamp, chain-id, and everything after the
/// prefix (the part rule regexes match against).
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixedLine<'a> {
    pub time: DateTime<Utc>,
    pub chain_id: ChainId,
    pub tail: &'a str,
}

/// Parse `YYYY.MM.DD-HH.MM.SS:mmm` as UTC.
pub fn parse_log_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y.%m.%d-%H.%M.%S:%3f").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Split a raw log line into its timestamp/chain-id prefix and tail. Returns
/// `None` if the line doesn't start with the standard prefix shape at all
/// (never the case for well-formed Squad logs, but input may be garbage).
pub fn split_prefix(line: &str) -> Option<PrefixedLine<'_>> {
    let caps = PREFIX.captures(line)?;
    let time = parse_log_timestamp(&caps[1])?;
    let chain_id: ChainId = caps[2].trim().parse().ok()?;
    let tail_start = caps.get(3)?.start();
    Some(PrefixedLine {
        time,
        chain_id,
        tail: &line[tail_start..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timestamp() {
        let t = parse_log_timestamp("2024.01.15-12.30.45:123").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-15T12:30:45.123+00:00");
    }

    #[test]
    fn splits_prefix_and_tail() {
        let line = "[2024.01.15-12.30.45:123][ 42]LogWorld: Bringing World /Game/Maps/Narva/Narva_Invasion_v1.Narva_Invasion_v1";
        let parsed = split_prefix(line).unwrap();
        assert_eq!(parsed.chain_id, ChainId(42));
        assert!(parsed.tail.starts_with("LogWorld: "));
    }

    #[test]
    fn rejects_line_without_prefix() {
        assert!(split_prefix("not a log line").is_none());
    }
}
