//! Turns raw service output into an [`ExtractionResult`].
//!
//! The service is not a contract partner: answers arrive wrapped in markdown
//! fences, surrounded by prose, cut off mid-object, flattened, or padded with
//! fields nobody asked for. Each step below runs only when the previous one
//! did not produce a usable structure:
//!
//! 1. isolate the text between the first `{` and the last `}`
//! 2. strict parse
//! 3. close unbalanced `{`/`[` and parse again
//! 4. promote a top-level flat case list into a single anonymous bench
//! 5. give up with [`ExtractionResult::degraded`]
//!
//! Every surviving entry is narrowed to `(serial, case_number)`.
//!
//! Known limitation: the balance check in step 3 counts braces inside string
//! values too, so a truncated response whose strings contain `{` or `}` is
//! not repaired and falls through to step 5.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::schema::{Entry, ExtractionResult, Group};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z]*").expect("valid code fence pattern"));

const SOURCE_KEYS: &[&str] = &["court_name", "source", "court", "label"];
const DATE_KEYS: &[&str] = &["list_date", "date", "cause_list_date"];
const GROUP_LIST_KEYS: &[&str] = &["benches", "groups", "courts"];
const GROUP_NUMBER_KEYS: &[&str] = &["bench_number", "court_number", "group_number", "number"];
const GROUP_NAME_KEYS: &[&str] = &["bench_name", "name", "title"];
const ENTRY_LIST_KEYS: &[&str] = &["cases", "entries", "items"];
const SERIAL_KEYS: &[&str] = &["sr_no", "serial", "serial_no", "item_no", "sno"];
const CASE_NUMBER_KEYS: &[&str] = &["case_number", "case_no", "case", "identifier"];

/// Which step produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizePath {
    Direct,
    Repaired,
    Promoted,
    Fallback,
}

pub fn sanitize(raw: &str) -> ExtractionResult {
    sanitize_with_path(raw).0
}

pub fn sanitize_with_path(raw: &str) -> (ExtractionResult, SanitizePath) {
    let Some(candidate) = isolate_json(raw) else {
        return fallback(raw, "no JSON object in response");
    };

    let (value, repaired) = match serde_json::from_str::<Value>(&candidate) {
        Ok(value) => (value, false),
        Err(parse_err) => {
            let reparsed = repair_truncated(&candidate)
                .and_then(|fixed| serde_json::from_str::<Value>(&fixed).ok());
            match reparsed {
                Some(value) => (value, true),
                None => {
                    debug!(error = %parse_err, "Brace repair did not produce valid JSON");
                    return fallback(raw, "unparseable JSON");
                }
            }
        }
    };

    let Some((result, promoted)) = interpret(&value) else {
        return fallback(raw, "JSON does not match the cause list schema");
    };

    let path = if promoted {
        SanitizePath::Promoted
    } else if repaired {
        SanitizePath::Repaired
    } else {
        SanitizePath::Direct
    };
    debug!(?path, groups = result.groups.len(), entries = result.entry_count(), "Sanitized response");

    (result, path)
}

fn fallback(raw: &str, reason: &str) -> (ExtractionResult, SanitizePath) {
    let preview: String = raw.chars().take(120).collect();
    warn!(reason, preview = %preview, "Falling back to degraded result");
    (ExtractionResult::degraded(), SanitizePath::Fallback)
}

/// Strip code fences and keep the text from the first `{` to the last `}`.
/// When no `}` follows the first `{` the rest of the text is kept, so the
/// repair step still gets a chance.
pub fn isolate_json(raw: &str) -> Option<String> {
    let unfenced = CODE_FENCE.replace_all(raw, "");
    let start = unfenced.find('{')?;
    let tail = &unfenced[start..];

    let candidate = match tail.rfind('}') {
        Some(end) => &tail[..=end],
        None => tail,
    };

    Some(candidate.trim().to_string())
}

/// Append closers for every unmatched `{` or `[`, innermost first.
/// Returns `None` when nothing is left open.
pub fn repair_truncated(text: &str) -> Option<String> {
    let mut open: Vec<char> = Vec::new();

    for c in text.chars() {
        match c {
            '{' | '[' => open.push(c),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }

    if open.is_empty() {
        return None;
    }

    let mut repaired = text.trim_end().trim_end_matches(',').to_string();
    for opener in open.iter().rev() {
        repaired.push(if *opener == '{' { '}' } else { ']' });
    }

    Some(repaired)
}

/// Map a parsed value onto the schema. The flag reports whether a flat list
/// was promoted into a bench.
fn interpret(value: &Value) -> Option<(ExtractionResult, bool)> {
    let obj = value.as_object()?;

    let mut result = ExtractionResult {
        source: string_field(obj, SOURCE_KEYS).unwrap_or_default(),
        date: string_field(obj, DATE_KEYS).unwrap_or_default(),
        groups: Vec::new(),
        degraded: false,
    };

    if let Some(groups) = array_field(obj, GROUP_LIST_KEYS) {
        result.groups = groups
            .iter()
            .filter_map(Value::as_object)
            .map(parse_group)
            .filter(|g| !g.entries.is_empty() || g.number.is_some() || !g.name.trim().is_empty())
            .collect();
        return Some((result, false));
    }

    if let Some(entries) = array_field(obj, ENTRY_LIST_KEYS) {
        // No number or name, so the merge keys it by position and it never
        // joins a real bench from another chunk.
        let mut group = Group::new(None, "");
        for entry in entries.iter().filter_map(parse_entry) {
            group.push_unique(entry);
        }
        if !group.entries.is_empty() {
            result.groups.push(group);
        }
        return Some((result, true));
    }

    None
}

fn parse_group(obj: &Map<String, Value>) -> Group {
    let number = string_field(obj, GROUP_NUMBER_KEYS).filter(|n| !n.is_empty());
    let name = string_field(obj, GROUP_NAME_KEYS).unwrap_or_default();

    let mut group = Group::new(number, name);
    if let Some(entries) = array_field(obj, ENTRY_LIST_KEYS) {
        for entry in entries.iter().filter_map(parse_entry) {
            group.push_unique(entry);
        }
    }
    group
}

/// Keep only the serial and case number; anything else the service added is dropped.
fn parse_entry(value: &Value) -> Option<Entry> {
    let obj = value.as_object()?;
    let case_number = string_field(obj, CASE_NUMBER_KEYS).filter(|c| !c.is_empty())?;
    let serial = string_field(obj, SERIAL_KEYS).unwrap_or_default();
    Some(Entry::new(serial, case_number))
}

/// First alias present as a string or number, trimmed.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn array_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().find_map(|key| obj.get(*key)?.as_array())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BENCHES: &str = r#"{"court_name": "HIGH COURT", "list_date": "06-01-2025", "benches": [{"bench_number": null, "bench_name": "BENCH A", "cases": [{"sr_no": "1", "case_number": "Case/100/2025"}, {"sr_no": "2", "case_number": "Case/101/2025"}]}, {"bench_number": null, "bench_name": "BENCH B", "cases": [{"sr_no": "1", "case_number": "Case/200/2025"}]}]}"#;

    #[test]
    fn test_clean_response_parses_directly() {
        let (result, path) = sanitize_with_path(TWO_BENCHES);

        assert_eq!(path, SanitizePath::Direct);
        assert!(!result.degraded);
        assert_eq!(result.source, "HIGH COURT");
        assert_eq!(result.date, "06-01-2025");
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups[0].name, "BENCH A");
        assert_eq!(result.groups[0].number, None);
        assert_eq!(result.groups[0].entries.len(), 2);
        assert_eq!(result.groups[1].entries, vec![Entry::new("1", "Case/200/2025")]);
    }

    #[test]
    fn test_fenced_response_with_prose() {
        let raw = format!("Sure! Here is the cause list:\n```json\n{TWO_BENCHES}\n```\nLet me know if you need more.");
        let (result, path) = sanitize_with_path(&raw);

        assert_eq!(path, SanitizePath::Direct);
        assert_eq!(result, sanitize(TWO_BENCHES));
    }

    #[test]
    fn test_truncated_response_is_repaired() {
        // Drop the final "]}" closing the bench list and the root object
        let truncated = &TWO_BENCHES[..TWO_BENCHES.len() - 2];
        let (result, path) = sanitize_with_path(truncated);

        assert_eq!(path, SanitizePath::Repaired);
        assert_eq!(result, sanitize(TWO_BENCHES));
    }

    #[test]
    fn test_missing_two_closing_braces_is_repaired() {
        let complete = r#"{"court_name": "HC", "list_date": "", "benches": [], "meta": {"page": {"n": 1}}}"#;
        let truncated = &complete[..complete.len() - 2];
        let (result, path) = sanitize_with_path(truncated);

        assert_eq!(path, SanitizePath::Repaired);
        assert_eq!(result, sanitize(complete));
        assert!(result.is_confirmed_empty());
    }

    #[test]
    fn test_truncated_mid_entry_keeps_complete_entries() {
        let raw = r#"{"court_name": "HC", "benches": [{"bench_number": "2", "cases": [{"sr_no": "1", "case_number": "WP/1/2025"}, {"sr_no": "2", "case_nu"#;
        let (result, path) = sanitize_with_path(raw);

        assert_eq!(path, SanitizePath::Repaired);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].number.as_deref(), Some("2"));
        assert_eq!(result.groups[0].entries, vec![Entry::new("1", "WP/1/2025")]);
    }

    #[test]
    fn test_braces_inside_strings_defeat_repair() {
        let raw = r#"{"court_name": "HC", "benches": [{"bench_name": "Odd { name", "cases": [{"sr_no": "1", "case_number": "A/1"}"#;
        let (result, path) = sanitize_with_path(raw);

        assert_eq!(path, SanitizePath::Fallback);
        assert!(result.degraded);
    }

    #[test]
    fn test_flat_entry_list_is_promoted() {
        let raw = r#"{"court_name": "DISTRICT COURT", "date": "2025-01-06", "cases": [{"sr_no": 1, "case_number": "OS/1/2020"}, {"sr_no": 2, "case_number": "OS/2/2020"}]}"#;
        let (result, path) = sanitize_with_path(raw);

        assert_eq!(path, SanitizePath::Promoted);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].number, None);
        assert!(result.groups[0].name.is_empty());
        assert_eq!(result.groups[0].entries[1], Entry::new("2", "OS/2/2020"));
    }

    #[test]
    fn test_empty_flat_list_is_confirmed_empty() {
        let (result, path) = sanitize_with_path(r#"{"court_name": "DISTRICT COURT", "cases": []}"#);

        assert_eq!(path, SanitizePath::Promoted);
        assert!(result.is_confirmed_empty());
    }

    #[test]
    fn test_plain_prose_falls_back() {
        let (result, path) = sanitize_with_path("I'm sorry, I could not read the document you provided.");

        assert_eq!(path, SanitizePath::Fallback);
        assert_eq!(result, ExtractionResult::degraded());
    }

    #[test]
    fn test_object_without_schema_falls_back() {
        let (result, path) = sanitize_with_path(r#"{"error": "content blocked"}"#);
        assert_eq!(path, SanitizePath::Fallback);
        assert!(result.degraded);
    }

    #[test]
    fn test_explicit_empty_list_is_confirmed_empty() {
        let (result, path) = sanitize_with_path(r#"{"court_name": "", "list_date": "", "benches": []}"#);
        assert_eq!(path, SanitizePath::Direct);
        assert!(result.is_confirmed_empty());
    }

    #[test]
    fn test_entries_are_narrowed_to_two_fields() {
        let raw = r#"{"benches": [{"bench_number": 4, "bench_name": "COURT NO. 4", "cases": [
            {"sr_no": "1", "case_number": "WP/1/2025", "petitioner": "A", "respondent": "State", "advocate": "X", "stage": "ADMISSION"}
        ], "judges": ["J1"]}]}"#;
        let result = sanitize(raw);
        let entry = &result.groups[0].entries[0];

        let value = serde_json::to_value(entry).unwrap();
        let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(keys, vec!["case_number", "serial"]);
        assert_eq!(entry, &Entry::new("1", "WP/1/2025"));
        assert_eq!(result.groups[0].number.as_deref(), Some("4"));
    }

    #[test]
    fn test_field_aliases_and_duplicates() {
        let raw = r#"{"source": "HC", "date": "06.01.2025", "groups": [{"number": "03", "name": "Court 3", "entries": [
            {"serial": "1", "case_no": "A/1"},
            {"serial": "1", "case_no": "A/1"},
            {"serial": "2", "case_no": ""},
            {"serial": "3"},
            "garbage"
        ]}]}"#;
        let result = sanitize(raw);

        assert_eq!(result.source, "HC");
        assert_eq!(result.date, "06.01.2025");
        assert_eq!(result.groups[0].number.as_deref(), Some("03"));
        assert_eq!(result.groups[0].entries, vec![Entry::new("1", "A/1")]);
    }

    #[test]
    fn test_anonymous_empty_groups_are_dropped() {
        let raw = r#"{"benches": [{"bench_name": "", "cases": []}, {"bench_name": "BENCH C", "cases": []}]}"#;
        let result = sanitize(raw);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].name, "BENCH C");
    }

    #[test]
    fn test_repair_helpers() {
        assert_eq!(repair_truncated("{\"a\": [1, 2"), Some("{\"a\": [1, 2]}".to_string()));
        assert_eq!(repair_truncated("{\"a\": [{\"b\": 1},"), Some("{\"a\": [{\"b\": 1}]}".to_string()));
        assert_eq!(repair_truncated("{}"), None);
        assert_eq!(isolate_json("no braces here"), None);
        assert_eq!(isolate_json("x {\"a\": 1} y").as_deref(), Some("{\"a\": 1}"));
        assert_eq!(isolate_json("```json\n{\"a\": [1\n```").as_deref(), Some("{\"a\": [1"));
    }
}
