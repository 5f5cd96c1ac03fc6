//! Lyrics payload classification and LRC timestamp parsing.

use once_cell::sync::Lazy;
use regex::Regex;

/// A payload is considered timestamped when this pattern appears anywhere in
/// it. Centiseconds are mandatory here even though the per-line tag accepts
/// their absence, so `[01:02]`-only files classify as plain text.
#[allow(clippy::unwrap_used)] // pattern is a checked literal
static SYNCED_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}:\d{2}\.\d{2}\]").unwrap());

/// Leading tag on a single lyric line: `[mm:ss]` or `[mm:ss.cc]`.
#[allow(clippy::unwrap_used)] // pattern is a checked literal
static LINE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d{2}):(\d{2})(?:\.(\d{2}))?\](.*)$").unwrap());

/// One timed line of lyrics.
///
/// `text` may be empty: LRC files use a bare tag to mark an instrumental
/// break or a pause.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsLine {
    /// Seconds from track start at which this line becomes current.
    pub offset_seconds: f64,
    pub text: String,
}

/// The outcome of classifying and parsing a raw lyrics payload.
///
/// `Absent` is an explicit "looked up, found nothing" marker; callers that
/// have not performed a lookup yet should model that with `Option` or a
/// missing cache entry, not with this variant.
#[derive(Debug, Clone, PartialEq)]
pub enum LyricsDocument {
    /// Timed lines in source order. The sequence can legitimately be empty:
    /// a payload that carries a timestamp marker somewhere but no line with
    /// a leading tag still counts as timestamped and is never downgraded to
    /// `Plain`.
    Synced(Vec<LyricsLine>),
    /// Untimed lyrics, kept as one opaque block.
    Plain(String),
    /// The lookup came back empty.
    Absent,
}

impl LyricsDocument {
    /// Classify and parse a raw lyrics payload.
    ///
    /// Lines that fail to match the leading tag pattern (metadata headers
    /// like `[ti:...]`, stray text) are skipped silently; parsing never
    /// fails. Lines are emitted in source order and are not sorted.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Absent;
        }
        if !SYNCED_MARKER_RE.is_match(raw) {
            return Self::Plain(raw.to_string());
        }

        let mut lines = Vec::new();
        for line in raw.lines() {
            let Some(caps) = LINE_TAG_RE.captures(line) else {
                continue;
            };
            let minutes = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0);
            let seconds = caps
                .get(2)
                .and_then(|s| s.as_str().parse::<u32>().ok())
                .unwrap_or(0);
            let centis = caps
                .get(3)
                .and_then(|c| c.as_str().parse::<u32>().ok())
                .unwrap_or(0);
            let offset_seconds =
                f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(centis) / 100.0;
            let text = caps
                .get(4)
                .map_or(String::new(), |t| t.as_str().trim().to_string());
            lines.push(LyricsLine {
                offset_seconds,
                text,
            });
        }
        Self::Synced(lines)
    }

    /// The timed lines, when this document is synced.
    #[must_use]
    pub fn synced_lines(&self) -> Option<&[LyricsLine]> {
        match self {
            Self::Synced(lines) => Some(lines),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_absent() {
        assert_eq!(LyricsDocument::parse(""), LyricsDocument::Absent);
    }

    #[test]
    fn untimed_payload_is_plain() {
        let raw = "Hello darkness my old friend\nI've come to talk with you again";
        assert_eq!(
            LyricsDocument::parse(raw),
            LyricsDocument::Plain(raw.to_string())
        );
    }

    #[test]
    fn timestamped_payload_is_synced() {
        let doc = LyricsDocument::parse("[00:12.34]Hello world");
        let lines = doc.synced_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].offset_seconds - 12.34).abs() < 1e-9);
        assert_eq!(lines[0].text, "Hello world");
    }

    #[test]
    fn source_order_is_preserved_without_sorting() {
        let doc = LyricsDocument::parse("[00:10.00]Hello\n[00:05.00]World");
        let lines = doc.synced_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert!((lines[0].offset_seconds - 10.0).abs() < 1e-9);
        assert!((lines[1].offset_seconds - 5.0).abs() < 1e-9);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(lines[1].text, "World");
    }

    #[test]
    fn metadata_headers_are_dropped() {
        let raw = "[ti:Song Title]\n[ar:Artist]\n[00:05.00]First line\n[00:10.00]Second line";
        let lines = LyricsDocument::parse(raw).synced_lines().unwrap().to_vec();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "First line");
        assert_eq!(lines[1].text, "Second line");
    }

    #[test]
    fn centiseconds_are_optional_on_individual_lines() {
        // The second line has no centisecond group; it still parses because
        // the first line satisfies the payload-level marker check.
        let doc = LyricsDocument::parse("[00:05.00]A\n[00:10]B");
        let lines = doc.synced_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert!((lines[1].offset_seconds - 10.0).abs() < 1e-9);
    }

    #[test]
    fn tag_without_centiseconds_alone_is_plain() {
        // Without a full mm:ss.cc marker anywhere, the payload never
        // qualifies as timestamped.
        let raw = "[00:10]Hello";
        assert_eq!(
            LyricsDocument::parse(raw),
            LyricsDocument::Plain(raw.to_string())
        );
    }

    #[test]
    fn marker_without_parseable_lines_stays_synced_and_empty() {
        // The marker appears mid-line, so no line carries a leading tag.
        let doc = LyricsDocument::parse("timing note 00:12.34] goes here");
        assert_eq!(doc, LyricsDocument::Synced(Vec::new()));
    }

    #[test]
    fn bare_tag_keeps_empty_text() {
        let doc = LyricsDocument::parse("[00:30.00]\n[00:35.00]Back to singing");
        let lines = doc.synced_lines().unwrap();
        assert_eq!(lines[0].text, "");
        assert_eq!(lines[1].text, "Back to singing");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let doc = LyricsDocument::parse("[01:02.03]   spaced out   ");
        let lines = doc.synced_lines().unwrap();
        assert_eq!(lines[0].text, "spaced out");
        assert!((lines[0].offset_seconds - 62.03).abs() < 1e-9);
    }

    #[test]
    fn crlf_line_endings_are_handled() {
        let doc = LyricsDocument::parse("[00:01.00]One\r\n[00:02.00]Two");
        let lines = doc.synced_lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "Two");
    }
}
