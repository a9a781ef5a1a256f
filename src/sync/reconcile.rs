// flowsync/src/sync/reconcile.rs
//! Pairs a bulk response back up with the records that were sent.
//!
//! Webflow returns bulk results in no particular order and renames colliding
//! slugs by appending a four character suffix, so items are matched in five
//! passes. Each pass removes what it matched from both pools:
//!
//! 1. the record's own item id (update path)
//! 2. exact slug, only when a single remaining item carries it
//! 3. auto-suffixed slug (`<slug>-xxxx`), best field score among candidates
//! 4. name, best field score if positive or the only candidate
//! 5. one leftover record with one leftover item
//!
//! Whatever is still unmatched afterwards is simply absent from the result.

use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{DestinationItem, MatchedItem, ParsedRecord};

pub fn reconcile(sent: &[ParsedRecord], response: Vec<DestinationItem>) -> Vec<MatchedItem> {
    let mut records: Vec<&ParsedRecord> = sent.iter().collect();
    let mut items = response;
    let mut matched = Vec::with_capacity(sent.len());

    take_matches(&mut records, &mut items, &mut matched, |record, items| {
        let id = record.item_id.as_deref()?;
        items.iter().position(|item| item.id == id)
    });

    take_matches(&mut records, &mut items, &mut matched, |record, items| {
        let slug = record.slug()?;
        let mut hits = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.slug() == Some(slug));
        let (first, _) = hits.next()?;
        hits.next().is_none().then_some(first)
    });

    take_matches(&mut records, &mut items, &mut matched, |record, items| {
        let slug = record.slug()?;
        let pattern = Regex::new(&format!("^{}-[a-z0-9]{{4}}$", regex::escape(slug))).ok()?;
        let candidates = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.slug().is_some_and(|s| pattern.is_match(s)))
            .map(|(index, _)| index);
        best_candidate(record, items, candidates).map(|(index, _)| index)
    });

    take_matches(&mut records, &mut items, &mut matched, |record, items| {
        let name = record.name()?;
        let candidates: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.name() == Some(name))
            .map(|(index, _)| index)
            .collect();
        let only_candidate = candidates.len() == 1;
        let (index, score) = best_candidate(record, items, candidates)?;
        (score > 0 || only_candidate).then_some(index)
    });

    if records.len() == 1 && items.len() == 1 {
        if let (Some(record), Some(item)) = (records.pop(), items.pop()) {
            matched.push(pair(record, item));
        }
    }

    matched
}

/// Runs one matching pass over every remaining record.
fn take_matches<'a, F>(
    records: &mut Vec<&'a ParsedRecord>,
    items: &mut Vec<DestinationItem>,
    matched: &mut Vec<MatchedItem>,
    find: F,
) where
    F: Fn(&ParsedRecord, &[DestinationItem]) -> Option<usize>,
{
    let mut unmatched = Vec::new();
    for record in records.drain(..) {
        match find(record, &items[..]) {
            Some(index) => {
                let item = items.remove(index);
                matched.push(pair(record, item));
            }
            None => unmatched.push(record),
        }
    }
    *records = unmatched;
}

fn pair(record: &ParsedRecord, item: DestinationItem) -> MatchedItem {
    let slug = item
        .slug()
        .or_else(|| record.slug())
        .unwrap_or_default()
        .to_string();
    MatchedItem {
        record: record.record.clone(),
        item_id: item.id,
        slug,
    }
}

/// Highest scoring candidate; ties keep the earliest.
fn best_candidate(
    record: &ParsedRecord,
    items: &[DestinationItem],
    candidates: impl IntoIterator<Item = usize>,
) -> Option<(usize, usize)> {
    candidates
        .into_iter()
        .map(|index| (index, score_field_match(&record.field_data, &items[index].field_data)))
        .fold(None, |best, (index, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((index, score)),
        })
}

/// Number of the record's fields, other than `slug` and `name`, that the item
/// holds an equal value for.
pub fn score_field_match(record: &Map<String, Value>, item: &Map<String, Value>) -> usize {
    record
        .iter()
        .filter(|(key, _)| key.as_str() != "slug" && key.as_str() != "name")
        .filter(|(key, value)| values_equal(Some(*value), item.get(key.as_str())))
        .count()
}

/// Null and missing are equal to each other and to nothing else.
fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (None, None) => true,
        (Some(a), Some(b)) => deep_equal(a, b),
        _ => false,
    }
}

fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y).all(|(x, y)| deep_equal(x, y)),
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len() && x.iter().all(|(key, value)| y.get(key).is_some_and(|other| deep_equal(value, other)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{item, record};
    use serde_json::json;

    fn sent(id: &str, fields: Value, item_id: Option<&str>) -> ParsedRecord {
        ParsedRecord {
            record: record(id, None, None),
            field_data: fields.as_object().cloned().unwrap_or_default(),
            item_id: item_id.map(str::to_string),
        }
    }

    fn with_data(mut item: DestinationItem, extra: Value) -> DestinationItem {
        if let Value::Object(extra) = extra {
            item.field_data.extend(extra);
        }
        item
    }

    fn pairs(matched: &[MatchedItem]) -> Vec<(String, String, String)> {
        let mut out: Vec<_> = matched
            .iter()
            .map(|m| (m.record.id.clone(), m.item_id.clone(), m.slug.clone()))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_exact_slug_pass_runs_before_prefix_pass() {
        let batch = vec![
            sent("recFoo", json!({"name": "Foo", "slug": "foo"}), None),
            sent("recSuffixed", json!({"name": "Foo 2", "slug": "foo-a1b2"}), None),
        ];
        let response = vec![item("itm_x", "Foo", "foo-xy9z"), item("itm_a", "Foo 2", "foo-a1b2")];

        let matched = reconcile(&batch, response);

        assert_eq!(
            pairs(&matched),
            vec![
                ("recFoo".into(), "itm_x".into(), "foo-xy9z".into()),
                ("recSuffixed".into(), "itm_a".into(), "foo-a1b2".into()),
            ]
        );
    }

    #[test]
    fn test_id_match_ignores_response_order() {
        let batch = vec![
            sent("rec1", json!({"name": "One", "slug": "one"}), Some("itm_1")),
            sent("rec2", json!({"name": "Two", "slug": "two"}), Some("itm_2")),
        ];
        let response = vec![item("itm_2", "Renamed", "other"), item("itm_1", "Renamed", "other")];

        let matched = reconcile(&batch, response);
        assert_eq!(
            pairs(&matched),
            vec![
                ("rec1".into(), "itm_1".into(), "other".into()),
                ("rec2".into(), "itm_2".into(), "other".into()),
            ]
        );
    }

    #[test]
    fn test_prefix_candidates_are_scored_by_fields() {
        // Two records collided on "post"; neither kept the plain slug.
        let batch = vec![
            sent("recCheap", json!({"name": "Post", "slug": "post", "price": 5}), None),
            sent("recDear", json!({"name": "Post", "slug": "post", "price": 50}), None),
        ];
        let response = vec![
            with_data(item("itm_a", "Post", "post-0001"), json!({"price": 50.0})),
            with_data(item("itm_b", "Post", "post-0002"), json!({"price": 5})),
        ];

        let matched = reconcile(&batch, response);
        assert_eq!(
            pairs(&matched),
            vec![
                ("recCheap".into(), "itm_b".into(), "post-0002".into()),
                ("recDear".into(), "itm_a".into(), "post-0001".into()),
            ]
        );
    }

    #[test]
    fn test_ambiguous_name_without_evidence_stays_unmatched() {
        let batch = vec![
            sent("rec1", json!({"name": "Same", "slug": "s1", "price": 1}), None),
            sent("rec2", json!({"name": "Same", "slug": "s2", "price": 2}), None),
        ];
        let response = vec![
            with_data(item("itm_a", "Same", "x"), json!({"price": 9})),
            with_data(item("itm_b", "Same", "y"), json!({"price": 8})),
        ];

        assert!(reconcile(&batch, response).is_empty());
    }

    #[test]
    fn test_name_pass_accepts_scored_or_sole_candidates() {
        // Both slugs came back renamed, so only names connect records to items.
        let batch = vec![
            sent("recA", json!({"name": "Alpha", "slug": "alpha", "price": 5}), None),
            sent("recB", json!({"name": "Beta", "slug": "beta", "price": 7}), None),
        ];
        let response = vec![
            with_data(item("itm_a1", "Alpha", "renamed-one"), json!({"price": 9})),
            with_data(item("itm_a2", "Alpha", "renamed-two"), json!({"price": 5})),
            with_data(item("itm_b", "Beta", "renamed-three"), json!({"price": 0})),
        ];

        let matched = reconcile(&batch, response);

        // Alpha wins on a shared price; Beta scores nothing but is the only Beta.
        assert_eq!(
            pairs(&matched),
            vec![
                ("recA".into(), "itm_a2".into(), "renamed-two".into()),
                ("recB".into(), "itm_b".into(), "renamed-three".into()),
            ]
        );
    }

    #[test]
    fn test_single_leftover_pair_is_matched() {
        let batch = vec![sent("rec1", json!({"name": "Before", "slug": "before"}), None)];
        let response = vec![item("itm_9", "After", "after")];

        let matched = reconcile(&batch, response);
        assert_eq!(pairs(&matched), vec![("rec1".into(), "itm_9".into(), "after".into())]);
    }

    #[test]
    fn test_score_field_match_rules() {
        let record = json!({
            "name": "ignored",
            "slug": "ignored",
            "price": 1,
            "tags": ["a", "b"],
            "image": {"url": "u", "alt": null},
            "summary": null,
            "extra": "x"
        });
        let item = json!({
            "name": "different",
            "price": 1.0,
            "tags": ["a", "b"],
            "image": {"url": "u", "alt": null}
        });
        let (record, item) = (record.as_object().unwrap(), item.as_object().unwrap());

        // price, tags, image and the null summary match; extra does not.
        assert_eq!(score_field_match(record, item), 4);
        assert_eq!(score_field_match(record, item), score_field_match(record, item));

        assert!(!deep_equal(&json!(["a", "b"]), &json!(["b", "a"])));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": null})));
        assert!(!values_equal(Some(&Value::Null), Some(&json!(""))));
    }
}
