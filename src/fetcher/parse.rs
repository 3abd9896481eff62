//! Extraction of year, rating, vote count and runtime from a title page.
//!
//! The page's JSON-LD block is the primary source. Runtime falls back to the
//! technical specs section ("2h 10m") when the JSON-LD has no duration.

use crate::dataset::AutoFields;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

lazy_static! {
    static ref LD_JSON_SELECTOR: Selector = Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("Failed to parse JSON-LD selector");
    static ref TECHSPEC_RUNTIME_SELECTOR: Selector =
        Selector::parse(r#"[data-testid="title-techspec_runtime"] li"#)
            .expect("Failed to parse runtime selector");
    static ref YEAR_RE: Regex = Regex::new(r"^\s*(\d{4})").expect("Failed to compile year regex");
    static ref ISO_HOURS_RE: Regex = Regex::new(r"(\d+)H").expect("Failed to compile hours regex");
    static ref ISO_MINUTES_RE: Regex =
        Regex::new(r"(\d+)M").expect("Failed to compile minutes regex");
    static ref TEXT_HOURS_RE: Regex =
        Regex::new(r"(\d+)\s*h").expect("Failed to compile hours regex");
    static ref TEXT_MINUTES_RE: Regex =
        Regex::new(r"(\d+)\s*m").expect("Failed to compile minutes regex");
}

const MOVIE_TYPES: [&str; 2] = ["Movie", "CreativeWork"];

pub fn parse_title_page(html: &str) -> AutoFields {
    let document = Html::parse_document(html);
    let mut fields = AutoFields::default();

    if let Some(ld) = find_movie_json_ld(&document) {
        fields.year = ld
            .get("datePublished")
            .and_then(value_as_string)
            .and_then(|date| capture_number(&YEAR_RE, &date));

        if let Some(rating) = ld.get("aggregateRating") {
            fields.rating = rating.get("ratingValue").and_then(value_as_f64);
            fields.vote_count = rating
                .get("ratingCount")
                .and_then(value_as_string)
                .and_then(|count| digits_only(&count));
        }

        fields.runtime_minutes = ld
            .get("duration")
            .and_then(Value::as_str)
            .and_then(iso8601_duration_minutes);
    }

    if fields.runtime_minutes.is_none() {
        fields.runtime_minutes = document
            .select(&TECHSPEC_RUNTIME_SELECTOR)
            .next()
            .and_then(|li| runtime_text_minutes(&li.text().collect::<Vec<_>>().join(" ")));
    }

    fields
}

fn find_movie_json_ld(document: &Html) -> Option<Value> {
    for script in document.select(&LD_JSON_SELECTOR) {
        let raw = script.text().collect::<String>();
        let data: Value = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(_) => continue,
        };
        let found = match data {
            Value::Array(items) => items.into_iter().find(is_movie),
            object @ Value::Object(_) if is_movie(&object) => Some(object),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn is_movie(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => MOVIE_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| MOVIE_TYPES.contains(&t)),
        _ => false,
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn capture_number<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// "1,234,567" -> 1234567
fn digits_only(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// "PT2H10M" -> 130. A zero duration counts as absent.
fn iso8601_duration_minutes(duration: &str) -> Option<i32> {
    // minutes only live in the time part, "P1M" is a month
    let time_part = duration.split_once('T').map_or("", |(_, time)| time);
    let hours: i32 = capture_number(&ISO_HOURS_RE, time_part).unwrap_or(0);
    let minutes: i32 = capture_number(&ISO_MINUTES_RE, time_part).unwrap_or(0);
    positive_minutes(hours, minutes)
}

/// "2h 10m" -> 130
fn runtime_text_minutes(text: &str) -> Option<i32> {
    let hours: i32 = capture_number(&TEXT_HOURS_RE, text).unwrap_or(0);
    let minutes: i32 = capture_number(&TEXT_MINUTES_RE, text).unwrap_or(0);
    positive_minutes(hours, minutes)
}

/// Totals that overflow count as absent.
fn positive_minutes(hours: i32, minutes: i32) -> Option<i32> {
    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    (total > 0).then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(head: &str, body: &str) -> String {
        format!("<html><head>{}</head><body>{}</body></html>", head, body)
    }

    fn ld(json: &str) -> String {
        format!(r#"<script type="application/ld+json">{}</script>"#, json)
    }

    #[test]
    fn parses_all_fields_from_json_ld() {
        let html = page(
            &ld(r#"{
                "@type": "Movie",
                "name": "El laberinto del fauno",
                "datePublished": "2006-10-11",
                "aggregateRating": {"ratingValue": 8.2, "ratingCount": 712345},
                "duration": "PT1H58M"
            }"#),
            "",
        );
        let fields = parse_title_page(&html);
        assert_eq!(
            fields,
            AutoFields {
                year: Some(2006),
                rating: Some(8.2),
                vote_count: Some(712345),
                runtime_minutes: Some(118),
            }
        );
    }

    #[test]
    fn picks_movie_entry_from_a_list() {
        let html = page(
            &ld(r#"[
                {"@type": "BreadcrumbList"},
                {"@type": "CreativeWork", "datePublished": "1997", "aggregateRating": {"ratingValue": "7.6", "ratingCount": "1,234"}}
            ]"#),
            "",
        );
        let fields = parse_title_page(&html);
        assert_eq!(fields.year, Some(1997));
        assert_eq!(fields.rating, Some(7.6));
        assert_eq!(fields.vote_count, Some(1234));
        assert_eq!(fields.runtime_minutes, None);
    }

    #[test]
    fn skips_broken_json_ld_blocks() {
        let head = format!(
            "{}{}",
            ld("{ not json"),
            ld(r#"{"@type": "Movie", "datePublished": "2001-09-07"}"#)
        );
        let fields = parse_title_page(&page(&head, ""));
        assert_eq!(fields.year, Some(2001));
        assert_eq!(fields.rating, None);
    }

    #[test]
    fn runtime_falls_back_to_tech_specs() {
        let body = r#"<ul><li data-testid="title-techspec_runtime"><span>Runtime</span>
            <div><ul><li>2h 10m</li></ul></div></li></ul>"#;
        let fields = parse_title_page(&page(&ld(r#"{"@type": "Movie"}"#), body));
        assert_eq!(fields.runtime_minutes, Some(130));
    }

    #[test]
    fn page_without_metadata_yields_empty_fields() {
        let fields = parse_title_page("<html><body><p>Nothing here</p></body></html>");
        assert!(fields.is_empty());
    }

    #[test]
    fn duration_parsing() {
        assert_eq!(iso8601_duration_minutes("PT2H"), Some(120));
        assert_eq!(iso8601_duration_minutes("PT45M"), Some(45));
        assert_eq!(iso8601_duration_minutes("P1M"), None);
        assert_eq!(iso8601_duration_minutes("PT0M"), None);
        assert_eq!(runtime_text_minutes("1h"), Some(60));
        assert_eq!(runtime_text_minutes("95 min"), Some(95));
    }

    #[test]
    fn overflowing_runtime_is_absent() {
        assert_eq!(iso8601_duration_minutes("PT99999999H"), None);
        assert_eq!(runtime_text_minutes("2000000000h"), None);

        let html = page(
            &ld(r#"{"@type": "Movie", "datePublished": "2001", "duration": "PT99999999H"}"#),
            "",
        );
        let fields = parse_title_page(&html);
        assert_eq!(fields.year, Some(2001));
        assert_eq!(fields.runtime_minutes, None);

        let body = r#"<ul><li data-testid="title-techspec_runtime"><span>Runtime</span>
            <div><ul><li>2000000000h</li></ul></div></li></ul>"#;
        let fields = parse_title_page(&page(&ld(r#"{"@type": "Movie"}"#), body));
        assert_eq!(fields.runtime_minutes, None);
    }
}
