//! LRC/LRCX text parsing and serialization.
//!
//! The grammar covered here is the common LRC core (ID tags, one or more
//! `[mm:ss.xx]` time tags per line) plus the LRCX translation extension
//! (`[mm:ss.xx][tr:lang]text` lines attached to the timed line at the same
//! position). Parsing either succeeds with at least one timed line or fails
//! with no partial result.

use crate::document::{LyricsDocument, LyricsLine};
use crate::error::ParseError;
use std::collections::BTreeSet;
use std::time::Duration;

/// Parse LRC/LRCX text into a document.
///
/// # Errors
///
/// Returns [`ParseError`] when the text contains no timed lyrics line.
pub fn parse(input: &str) -> Result<LyricsDocument, ParseError> {
    let mut title = None;
    let mut artist = None;
    let mut offset_ms = 0i64;
    let mut lines: Vec<LyricsLine> = Vec::new();
    // (position, language, text) collected before lines are sorted
    let mut translations: Vec<(Duration, String, String)> = Vec::new();

    for raw in input.lines() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let (timestamps, rest) = take_timestamps(raw);
        if timestamps.is_empty() {
            // Not a timed line; try an ID tag.
            if let Some((tag, value)) = parse_id_tag(raw) {
                match tag.to_lowercase().as_str() {
                    "ti" => title = Some(value),
                    "ar" => artist = Some(value),
                    "offset" => {
                        if let Ok(parsed) = value.parse::<i64>() {
                            offset_ms = parsed;
                        }
                    }
                    _ => {} // Ignore unknown tags
                }
            }
            continue;
        }

        if let Some((language, text)) = parse_translation_tag(rest) {
            for position in &timestamps {
                translations.push((*position, language.clone(), text.clone()));
            }
            continue;
        }

        let text = rest.trim();
        for position in timestamps {
            lines.push(LyricsLine::new(position, text));
        }
    }

    if lines.is_empty() {
        return Err(ParseError::new("no timed lyrics lines found"));
    }

    for (position, language, text) in translations {
        if let Some(line) = lines.iter_mut().find(|line| line.position == position) {
            line.translations.insert(language, text);
        }
    }

    let mut document = LyricsDocument::new(lines);
    document.metadata.title = title;
    document.metadata.artist = artist;
    document.metadata.translation_languages = translation_languages(&document);
    document.offset_ms = offset_ms;
    Ok(document)
}

/// Serialize a document back to LRCX text.
#[must_use]
pub fn serialize(document: &LyricsDocument) -> String {
    let mut out = String::new();
    if let Some(title) = &document.metadata.title {
        out.push_str(&format!("[ti:{title}]\n"));
    }
    if let Some(artist) = &document.metadata.artist {
        out.push_str(&format!("[ar:{artist}]\n"));
    }
    if document.offset_ms != 0 {
        out.push_str(&format!("[offset:{}]\n", document.offset_ms));
    }
    for line in document.lines() {
        let stamp = format_timestamp(line.position);
        out.push_str(&format!("[{stamp}]{}\n", line.content));
        for (language, text) in &line.translations {
            out.push_str(&format!("[{stamp}][tr:{language}]{text}\n"));
        }
    }
    out
}

/// Distinct language codes present in line translations, in sorted order.
#[must_use]
pub fn translation_languages(document: &LyricsDocument) -> Vec<String> {
    let mut languages: BTreeSet<&str> = BTreeSet::new();
    for line in document.lines() {
        for language in line.translations.keys() {
            languages.insert(language);
        }
    }
    languages.into_iter().map(str::to_string).collect()
}

/// Extract all leading `[mm:ss.xx]` time tags, returning the remainder.
fn take_timestamps(line: &str) -> (Vec<Duration>, &str) {
    let mut timestamps = Vec::new();
    let mut remaining = line;

    while remaining.starts_with('[') {
        let Some(end) = remaining.find(']') else {
            break;
        };
        let Some(timestamp) = parse_timestamp(&remaining[1..end]) else {
            break;
        };
        timestamps.push(timestamp);
        remaining = &remaining[end + 1..];
    }

    (timestamps, remaining)
}

/// Parse a `[tr]` / `[tr:lang]` attachment tag, returning (language, text).
///
/// A missing language code maps to the unspecified-language tag `und`.
fn parse_translation_tag(rest: &str) -> Option<(String, String)> {
    let rest = rest.strip_prefix('[')?;
    let end = rest.find(']')?;
    let tag = &rest[..end];
    let language = match tag.split_once(':') {
        Some(("tr", code)) if !code.is_empty() => code.to_string(),
        _ if tag == "tr" => "und".to_string(),
        _ => return None,
    };
    Some((language, rest[end + 1..].trim().to_string()))
}

/// Parse an ID tag like `[ti:Title]` or `[ar:Artist]`.
fn parse_id_tag(line: &str) -> Option<(String, String)> {
    if !line.starts_with('[') {
        return None;
    }
    let end = line.find(']')?;
    let content = &line[1..end];
    let (tag, value) = content.split_once(':')?;

    // If the tag part looks like a number, it's a timestamp, not an ID tag.
    if tag.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some((tag.to_string(), value.trim().to_string()))
}

/// Parse a timestamp like `mm:ss.xx`, `mm:ss` or `mm:ss:xx`.
fn parse_timestamp(s: &str) -> Option<Duration> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    match parts.len() {
        2 => {
            let minutes: u64 = parts[0].parse().ok()?;
            let (seconds, millis) = match parts[1].split_once('.') {
                Some((secs, frac)) => (secs.parse::<u64>().ok()?, parse_fraction_ms(frac)?),
                None => (parts[1].parse::<u64>().ok()?, 0),
            };
            if seconds >= 60 {
                return None;
            }
            Some(Duration::from_millis(
                minutes * 60_000 + seconds * 1_000 + millis,
            ))
        }
        3 => {
            // mm:ss:xx (hundredths)
            let minutes: u64 = parts[0].parse().ok()?;
            let seconds: u64 = parts[1].parse().ok()?;
            let hundredths: u64 = parts[2].parse().ok()?;
            if seconds >= 60 {
                return None;
            }
            Some(Duration::from_millis(
                minutes * 60_000 + seconds * 1_000 + hundredths * 10,
            ))
        }
        _ => None,
    }
}

/// Parse a fractional-seconds suffix into milliseconds.
fn parse_fraction_ms(frac: &str) -> Option<u64> {
    if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits: String = frac.chars().chain("000".chars()).take(3).collect();
    digits.parse().ok()
}

/// Format a duration as `mm:ss.xx`.
fn format_timestamp(position: Duration) -> String {
    let total_ms = position.as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1_000;
    let hundredths = (total_ms % 1_000) / 10;
    format!("{minutes:02}:{seconds:02}.{hundredths:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_line() {
        let doc = parse("[00:12.34]Hello world").unwrap();
        assert_eq!(doc.lines().len(), 1);
        assert_eq!(doc.lines()[0].position, Duration::from_millis(12340));
        assert_eq!(doc.lines()[0].content, "Hello world");
    }

    #[test]
    fn test_parse_multiple_lines_sorted() {
        let input = "[00:15.00]Third\n[00:05.00]First\n[00:10.00]Second";
        let doc = parse(input).unwrap();
        let texts: Vec<_> = doc.lines().iter().map(|l| l.content.as_str()).collect();
        assert_eq!(texts, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_parse_id_tags() {
        let input = "[ti:Song Title]\n[ar:Artist Name]\n[00:05.00]Lyrics here";
        let doc = parse(input).unwrap();
        assert_eq!(doc.metadata.title, Some("Song Title".to_string()));
        assert_eq!(doc.metadata.artist, Some("Artist Name".to_string()));
    }

    #[test]
    fn test_parse_offset_tag() {
        let input = "[offset:-500]\n[00:10.00]Test";
        let doc = parse(input).unwrap();
        assert_eq!(doc.offset_ms, -500);
        // The offset shifts the comparison point, not the stored positions.
        assert_eq!(doc.lines()[0].position, Duration::from_secs(10));
    }

    #[test]
    fn test_parse_multi_timestamp_line() {
        let doc = parse("[00:05.00][00:15.00]Repeated lyric").unwrap();
        assert_eq!(doc.lines().len(), 2);
        assert_eq!(doc.lines()[0].position, Duration::from_secs(5));
        assert_eq!(doc.lines()[1].position, Duration::from_secs(15));
    }

    #[test]
    fn test_parse_translation_attachment() {
        let input = "[00:05.00]Hello\n[00:05.00][tr:zh]你好";
        let doc = parse(input).unwrap();
        assert_eq!(doc.lines().len(), 1);
        assert_eq!(doc.lines()[0].translation(Some("zh")), Some("你好"));
        assert_eq!(doc.metadata.translation_languages, vec!["zh".to_string()]);
    }

    #[test]
    fn test_parse_translation_without_language() {
        let input = "[00:05.00]Hello\n[00:05.00][tr]Bonjour";
        let doc = parse(input).unwrap();
        assert_eq!(doc.lines()[0].translation(None), Some("Bonjour"));
    }

    #[test]
    fn test_parse_rejects_untimed_text() {
        assert!(parse("just some plain text\nwithout any tags").is_err());
        assert!(parse("").is_err());
        assert!(parse("[ti:Title only]").is_err());
    }

    #[test]
    fn test_parse_alternative_timestamp_format() {
        let doc = parse("[00:12:34]Hello").unwrap();
        assert_eq!(doc.lines()[0].position, Duration::from_millis(12340));
    }

    #[test]
    fn test_parse_cjk_content() {
        let doc = parse("[00:05.00]你好世界").unwrap();
        assert_eq!(doc.lines()[0].content, "你好世界");
    }

    #[test]
    fn test_serialize_contains_tags_and_lines() {
        let input = "[ti:Song]\n[ar:Artist]\n[00:05.00]Hello\n[00:05.00][tr:zh]你好";
        let mut doc = parse(input).unwrap();
        doc.offset_ms = 250;
        let text = serialize(&doc);
        assert!(text.contains("[ti:Song]"));
        assert!(text.contains("[ar:Artist]"));
        assert!(text.contains("[offset:250]"));
        assert!(text.contains("[00:05.00]Hello"));
        assert!(text.contains("[00:05.00][tr:zh]你好"));
    }

    #[test]
    fn test_serialize_parse_round_trip() {
        let input = "[00:05.00]First\n[00:10.50]Second\n[00:10.50][tr:zh]第二";
        let doc = parse(input).unwrap();
        let round = parse(&serialize(&doc)).unwrap();
        assert_eq!(doc.lines(), round.lines());
    }
}
