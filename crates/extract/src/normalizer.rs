use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::schema::Group;

static NAME_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.,!?;:'"()\-/]"#).expect("valid punctuation pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Identity used to reconcile the same bench reported by different chunks.
///
/// Derivation, in order of preference:
/// 1. the extracted bench number, normalized by [`normalize_number`]
/// 2. the bench name, normalized by [`normalize_name`]
/// 3. a synthetic key built from the chunk index and the group's position in it
///
/// Names are never mined for numbers, so `"Court-2"` without a number and
/// number `"2"` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Number(String),
    Name(String),
    Synthetic { chunk: usize, position: usize },
}

impl GroupKey {
    pub fn derive(group: &Group, chunk: usize, position: usize) -> Self {
        if let Some(number) = group.number.as_deref().map(normalize_number) {
            if !number.is_empty() {
                return GroupKey::Number(number);
            }
        }

        let name = normalize_name(&group.name);
        if !name.is_empty() {
            return GroupKey::Name(name);
        }

        GroupKey::Synthetic { chunk, position }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "no:{n}"),
            GroupKey::Name(n) => write!(f, "name:{n}"),
            GroupKey::Synthetic { chunk, position } => write!(f, "synthetic:{chunk}:{position}"),
        }
    }
}

/// Normalize a bench number: trim, lowercase, keep only alphanumerics, and
/// drop leading zeros from purely numeric values.
pub fn normalize_number(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
        let stripped = cleaned.trim_start_matches('0');
        if stripped.is_empty() {
            return "0".to_string();
        }
        return stripped.to_string();
    }

    cleaned
}

/// Normalize a bench name: lowercase, punctuation to spaces, collapse whitespace.
pub fn normalize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let without_punctuation = NAME_PUNCTUATION.replace_all(&lowered, " ");
    WHITESPACE
        .replace_all(&without_punctuation, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(number: Option<&str>, name: &str) -> Group {
        Group::new(number.map(str::to_string), name)
    }

    #[test]
    fn test_number_normalization() {
        let cases = [
            ("2", "2"),
            (" 2 ", "2"),
            ("02", "2"),
            ("000", "0"),
            ("0", "0"),
            ("2A", "2a"),
            ("II", "ii"),
            ("No. 12", "no12"),
            ("  ", ""),
            ("-", ""),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_number(raw), expected, "input {raw:?}");
        }
    }

    #[test]
    fn test_name_normalization() {
        let cases = [
            ("BENCH A", "bench a"),
            ("  Bench   A ", "bench a"),
            ("Court-2", "court 2"),
            ("COURT NO. 2", "court no 2"),
            ("Hon'ble Justice X.Y. Rao", "hon ble justice x y rao"),
            ("D/B (Division Bench)", "d b division bench"),
            ("", ""),
            ("...", ""),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_name(raw), expected, "input {raw:?}");
        }
    }

    #[test]
    fn test_number_takes_precedence_over_name() {
        let key = GroupKey::derive(&group(Some("3"), "BENCH A"), 0, 0);
        assert_eq!(key, GroupKey::Number("3".into()));
    }

    #[test]
    fn test_same_name_without_number_gives_same_key() {
        let a = GroupKey::derive(&group(None, "BENCH A"), 0, 0);
        let b = GroupKey::derive(&group(None, "bench a."), 4, 2);
        assert_eq!(a, b);
        assert_eq!(a, GroupKey::Name("bench a".into()));
    }

    #[test]
    fn test_name_is_not_mined_for_a_number() {
        let named = GroupKey::derive(&group(None, "Court-2"), 0, 0);
        let numbered = GroupKey::derive(&group(Some("2"), "Court-2"), 1, 0);
        assert_eq!(named, GroupKey::Name("court 2".into()));
        assert_eq!(numbered, GroupKey::Number("2".into()));
        assert_ne!(named, numbered);
    }

    #[test]
    fn test_numbers_match_regardless_of_name() {
        let a = GroupKey::derive(&group(Some("02"), "COURT NO. 2"), 0, 0);
        let b = GroupKey::derive(&group(Some("2"), "Court 2 (Vacation)"), 3, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_number_falls_back_to_name() {
        let key = GroupKey::derive(&group(Some("  "), "BENCH B"), 0, 0);
        assert_eq!(key, GroupKey::Name("bench b".into()));
    }

    #[test]
    fn test_synthetic_key_when_nothing_identifies_the_group() {
        let a = GroupKey::derive(&group(None, ""), 2, 0);
        let b = GroupKey::derive(&group(Some(""), "--"), 2, 1);
        assert_eq!(a, GroupKey::Synthetic { chunk: 2, position: 0 });
        assert_eq!(b, GroupKey::Synthetic { chunk: 2, position: 1 });
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(GroupKey::Number("2".into()).to_string(), "no:2");
        assert_eq!(GroupKey::Name("bench a".into()).to_string(), "name:bench a");
        assert_eq!(
            GroupKey::Synthetic { chunk: 1, position: 3 }.to_string(),
            "synthetic:1:3"
        );
    }
}
