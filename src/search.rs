//! Substring search over keys and string values
//!
//! Walks users, then their categories (`pwHints`, `notes`, or any other
//! object), then the items inside each category. Each hit names the
//! navigable path it belongs to and a human description of what matched.

use crate::document::{Annotation, Document, NodeId, NodeKind, Value, NOTES_KEY, PW_HINTS_KEY};

/// A single search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Path to select in the tree view
    pub path: String,
    /// Human-readable description of the match
    pub description: String,
}

struct Matcher {
    needle: String,
    case_sensitive: bool,
}

impl Matcher {
    fn new(needle: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive {
            needle.to_string()
        } else {
            needle.to_lowercase()
        };
        Self {
            needle,
            case_sensitive,
        }
    }

    fn matches(&self, haystack: &str) -> bool {
        if self.case_sensitive {
            haystack.contains(&self.needle)
        } else {
            haystack.to_lowercase().contains(&self.needle)
        }
    }
}

fn category_label(user: &str, category: &str) -> String {
    match category {
        PW_HINTS_KEY => format!("{} [Hint]", user),
        NOTES_KEY => format!("{} [Notes]", user),
        _ => format!("{} {}", user, category),
    }
}

/// Search the document, calling `emit` for every hit
///
/// Emission order follows the document's display order. The same path may
/// be emitted more than once when several things inside it match.
pub fn search<F>(doc: &Document, needle: &str, case_sensitive: bool, mut emit: F)
where
    F: FnMut(SearchHit),
{
    if needle.is_empty() {
        return;
    }
    let matcher = Matcher::new(needle, case_sensitive);
    let mut hit = |path: String, description: String| emit(SearchHit { path, description });

    for user_id in doc.children_sorted(doc.groups()) {
        let Some(user) = doc.key(user_id) else { continue };
        let user_path = user.to_string();

        if matcher.matches(user) {
            hit(user_path.clone(), format!("{}: LHS Tree", user));
        }

        for category_id in doc.children_sorted(user_id) {
            let Some(category) = doc.key(category_id) else { continue };
            let category_path = format!("{}.{}", user_path, category);
            let label = category_label(user, category);

            if doc.kind(category_id).is_some_and(NodeKind::is_leaf) {
                // A loose field directly under the user
                check_field(doc, &matcher, category_id, &user_path, user, &mut hit);
                continue;
            }

            if matcher.matches(Annotation::bare_name(category)) {
                let description = match category {
                    PW_HINTS_KEY | NOTES_KEY => format!("{} : LHS Tree", label),
                    _ => format!("{}: LHS Tree", label),
                };
                hit(category_path.clone(), description);
            }

            for item_id in doc.children_sorted(category_id) {
                let Some(item) = doc.key(item_id) else { continue };
                let item_path = format!("{}.{}", category_path, item);
                let bare_item = Annotation::bare_name(item);
                let prefix = format!("{} {}", label, bare_item);

                if matcher.matches(bare_item) {
                    hit(item_path.clone(), format!("{}: LHS Tree", prefix));
                }
                match doc.value(item_id) {
                    Some(Value::String(text)) if matcher.matches(text) => {
                        hit(item_path.clone(), format!("{}: In Text: '{}'", prefix, bare_item));
                    }
                    Some(Value::Object(_)) | Some(Value::Array(_)) => {
                        walk_fields(doc, &matcher, item_id, &item_path, &prefix, &mut hit);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Collect every hit into a vector
pub fn search_all(doc: &Document, needle: &str, case_sensitive: bool) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    search(doc, needle, case_sensitive, |h| hits.push(h));
    hits
}

/// Match a single field's key and, for strings, its text
fn check_field<F>(
    doc: &Document,
    matcher: &Matcher,
    id: NodeId,
    item_path: &str,
    prefix: &str,
    hit: &mut F,
) where
    F: FnMut(String, String),
{
    let Some((_, bare)) = doc.annotation(id) else { return };
    if matcher.matches(bare) {
        hit(
            item_path.to_string(),
            format!("{}: Field Name: '{}'", prefix, bare),
        );
    }
    if let Some(Value::String(text)) = doc.value(id) {
        if matcher.matches(text) {
            hit(item_path.to_string(), format!("{}: In Text: '{}'", prefix, bare));
        }
    }
}

/// Match keys and string leaves inside an item, reporting them against the item path
fn walk_fields<F>(
    doc: &Document,
    matcher: &Matcher,
    id: NodeId,
    item_path: &str,
    prefix: &str,
    hit: &mut F,
) where
    F: FnMut(String, String),
{
    let in_array = matches!(doc.value(id), Some(Value::Array(_)));
    for child in doc.children_sorted(id) {
        if in_array {
            // Array indices are not field names
            if let Some(Value::String(text)) = doc.value(child) {
                if matcher.matches(text) {
                    let key = doc.annotation(id).map(|(_, bare)| bare).unwrap_or_default();
                    hit(item_path.to_string(), format!("{}: In Text: '{}'", prefix, key));
                }
            }
        } else {
            check_field(doc, matcher, child, item_path, prefix, hit);
        }
        if doc.kind(child).is_some_and(|k| !k.is_leaf()) {
            walk_fields(doc, matcher, child, item_path, prefix, hit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse(
            br#"{
                "timeStamp": "Fri Jul 30 21:25:10 BST 2021",
                "groups": {
                    "Alice": {
                        "pwHints": {
                            "Bank": {"userId": "alice99", "pre": "", "post": "", "notes": "Branch in town", "positional": "12345"}
                        },
                        "notes": {
                            "ml!shopping": "Milk and bread"
                        },
                        "savings": {
                            "isa": {"provider": "BankCo", "extra": {"secretField": "no"}}
                        }
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_item_name_match() {
        let hits = search_all(&sample(), "bank", false);
        assert!(hits.contains(&SearchHit {
            path: "Alice.pwHints.Bank".into(),
            description: "Alice [Hint] Bank: LHS Tree".into(),
        }));
        assert!(hits.contains(&SearchHit {
            path: "Alice.savings.isa".into(),
            description: "Alice savings isa: In Text: 'provider'".into(),
        }));
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(search_all(&sample(), "bank", true).is_empty());
        assert!(!search_all(&sample(), "Bank", true).is_empty());
    }

    #[test]
    fn test_text_match_in_note() {
        let hits = search_all(&sample(), "MILK", false);
        assert_eq!(
            hits,
            vec![SearchHit {
                path: "Alice.notes.ml!shopping".into(),
                description: "Alice [Notes] shopping: In Text: 'shopping'".into(),
            }]
        );
    }

    #[test]
    fn test_field_name_match() {
        let hits = search_all(&sample(), "secret", false);
        assert!(hits.contains(&SearchHit {
            path: "Alice.savings.isa".into(),
            description: "Alice savings isa: Field Name: 'secretField'".into(),
        }));
    }

    #[test]
    fn test_category_and_user_match() {
        let hits = search_all(&sample(), "notes", false);
        assert!(hits.contains(&SearchHit {
            path: "Alice.notes".into(),
            description: "Alice [Notes] : LHS Tree".into(),
        }));
        // The hint's "notes" field matches by name
        assert!(hits.contains(&SearchHit {
            path: "Alice.pwHints.Bank".into(),
            description: "Alice [Hint] Bank: Field Name: 'notes'".into(),
        }));

        let hits = search_all(&sample(), "ali", false);
        assert!(hits.contains(&SearchHit {
            path: "Alice".into(),
            description: "Alice: LHS Tree".into(),
        }));

        let hits = search_all(&sample(), "savings", false);
        assert!(hits.contains(&SearchHit {
            path: "Alice.savings".into(),
            description: "Alice savings: LHS Tree".into(),
        }));
    }

    #[test]
    fn test_empty_needle_finds_nothing() {
        assert!(search_all(&sample(), "", false).is_empty());
    }
}
