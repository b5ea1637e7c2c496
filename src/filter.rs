use std::borrow::Cow;

use crate::types::Record;

/// Apply the free-text query to the cache.
///
/// Blank queries return the cache as-is (borrowed, same order). Otherwise the
/// query is trimmed and lowercased and every record whose lowercased
/// `name category location description` text contains it is kept, in cache order.
pub fn filter<'a>(records: &'a [Record], query: &str) -> Cow<'a, [Record]> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return Cow::Borrowed(records);
    }
    Cow::Owned(
        records
            .iter()
            .filter(|record| matches(record, &needle))
            .cloned()
            .collect(),
    )
}

/// Trimmed, case-folded form of a query. Empty means "no filter".
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Whether a record matches an already-normalized query.
pub fn matches(record: &Record, normalized_query: &str) -> bool {
    haystack(record).contains(normalized_query)
}

fn haystack(record: &Record) -> String {
    let mut text = format!("{} {} {}", record.name, record.category, record.location);
    if let Some(description) = &record.description {
        text.push(' ');
        text.push_str(description);
    }
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, category: &str, location: &str, description: Option<&str>) -> Record {
        Record {
            id: None,
            name: name.to_string(),
            category: category.to_string(),
            location: location.to_string(),
            description: description.map(str::to_string),
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record("Joe's Cafe", "Food", "Main St", None),
            record("Bolt Hardware", "Retail", "5th Ave", Some("Tools and keys cut while you wait")),
            record("Green Leaf", "Food", "Harbor Rd", Some("Vegan lunches")),
        ]
    }

    #[test]
    fn blank_query_returns_the_cache_untouched() {
        let cache = sample();
        for query in ["", "   ", "\t\n"] {
            let result = filter(&cache, query);
            assert!(matches!(result, Cow::Borrowed(_)));
            assert_eq!(result.as_ref(), cache.as_slice());
        }
    }

    #[test]
    fn query_is_trimmed_and_case_folded() {
        let cache = sample();
        let result = filter(&cache, "  JOE ");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Joe's Cafe");
    }

    #[test]
    fn description_participates_and_order_is_preserved() {
        let cache = sample();
        let names: Vec<String> = filter(&cache, "food").iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, ["Joe's Cafe", "Green Leaf"]);
        assert_eq!(filter(&cache, "keys cut").len(), 1);
        assert_eq!(filter(&cache, "vegan")[0].name, "Green Leaf");
    }

    #[test]
    fn absent_description_contributes_nothing() {
        let cache = vec![record("Joe's Cafe", "Food", "Main St", None)];
        assert!(filter(&cache, "none").is_empty());
        assert!(filter(&cache, "main st ").len() == 1);
    }

    #[test]
    fn non_matching_query_yields_nothing() {
        let cache = sample();
        assert!(filter(&cache, "zzz").is_empty());
    }

    #[test]
    fn kept_and_dropped_records_agree_with_the_predicate() {
        let cache = sample();
        for query in ["a", "st", "food", "5TH", "wait", "x"] {
            let needle = normalize_query(query);
            let kept = filter(&cache, query);
            for record in &cache {
                let is_kept = kept.iter().any(|k| k == record);
                assert_eq!(is_kept, matches(record, &needle), "query {query:?}");
            }
        }
    }
}
