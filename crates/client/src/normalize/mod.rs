//! Normalization of provider responses into [`ResultRecord`] lists.
//!
//! The provider returns whatever JSON its extraction model produced. The
//! response is classified into a [`ResponseShape`] first, then each item is
//! mapped through the field aliases in [`fields`]. Normalization never fails;
//! an unrecognized body yields an empty list.

mod fields;

use serde_json::Value;

use bestof_core::ResultRecord;

use fields::{looks_like_item, lookup, record_from_item};

/// Paths probed for an item array, most specific first.
const CONTAINER_PATHS: &[&str] = &[
    "data.data.results",
    "data.results",
    "data.items",
    "data.data",
    "data",
    "results",
    "items",
    "recipes",
    "products",
];

/// Structural classification of a provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape<'a> {
    /// The body is itself the item array.
    FlatList(&'a [Value]),
    /// Items found under a container path or a category map, in document order.
    NestedContainer(Vec<&'a Value>),
    /// The body (or its `data`) is a single item.
    SingleItem(&'a Value),
    Unrecognized,
}

impl<'a> ResponseShape<'a> {
    pub fn detect(body: &'a Value) -> Self {
        if let Value::Array(items) = body {
            return ResponseShape::FlatList(items);
        }
        if !body.is_object() {
            return ResponseShape::Unrecognized;
        }

        if let Some(items) = CONTAINER_PATHS.iter().find_map(|path| lookup(body, path).and_then(Value::as_array)) {
            return ResponseShape::NestedContainer(items.iter().collect());
        }

        if let Some(items) = body.get("data").and_then(category_items) {
            return ResponseShape::NestedContainer(items);
        }

        if looks_like_item(body) {
            return ResponseShape::SingleItem(body);
        }
        match body.get("data") {
            Some(data) if looks_like_item(data) => ResponseShape::SingleItem(data),
            _ => ResponseShape::Unrecognized,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResponseShape::FlatList(_) => "flat_list",
            ResponseShape::NestedContainer(_) => "nested_container",
            ResponseShape::SingleItem(_) => "single_item",
            ResponseShape::Unrecognized => "unrecognized",
        }
    }

    fn items(self) -> Vec<&'a Value> {
        match self {
            ResponseShape::FlatList(items) => items.iter().collect(),
            ResponseShape::NestedContainer(items) => items,
            ResponseShape::SingleItem(item) => vec![item],
            ResponseShape::Unrecognized => Vec::new(),
        }
    }
}

/// Items of a category map: an object whose values are all arrays, at least
/// one of which holds objects. Arrays are concatenated in document order.
fn category_items(data: &Value) -> Option<Vec<&Value>> {
    let map = data.as_object()?;
    if map.is_empty() || !map.values().all(Value::is_array) {
        return None;
    }

    let items: Vec<&Value> = map.values().filter_map(Value::as_array).flatten().collect();
    items.iter().any(|item| item.is_object()).then_some(items)
}

/// Map a provider response to result records.
///
/// Items lacking both title and url are skipped; ranks default to the
/// 1-based position among emitted records.
pub fn normalize(body: &Value) -> Vec<ResultRecord> {
    let shape = ResponseShape::detect(body);
    let kind = shape.kind();

    if shape == ResponseShape::Unrecognized {
        let keys: Vec<&str> = body.as_object().map(|m| m.keys().map(String::as_str).collect()).unwrap_or_default();
        tracing::warn!(?keys, "unrecognized provider response shape");
        return Vec::new();
    }

    let items = shape.items();
    let total = items.len();
    let mut records = Vec::with_capacity(total);
    for item in items {
        if let Some(record) = record_from_item(item, records.len() + 1) {
            records.push(record);
        }
    }

    tracing::debug!(shape = kind, items = total, records = records.len(), "normalized provider response");
    records
}

/// Map a detail response for `url` to a single record.
///
/// Detail payloads often carry commentary without a title or url, so the
/// item is located directly and `url` filled in when absent. Returns `None`
/// when nothing usable came back.
pub fn normalize_detail(body: &Value, url: &str) -> Option<ResultRecord> {
    if ResponseShape::detect(body) != ResponseShape::Unrecognized {
        return normalize(body).into_iter().next();
    }

    let item = body.get("data").filter(|d| d.is_object()).unwrap_or(body);
    let mut item = item.as_object()?.clone();
    item.entry("url").or_insert_with(|| Value::String(url.to_string()));

    let record = record_from_item(&Value::Object(item), 1)?;
    (record.is_enriched() || record.rating.is_some() || record.unique_feature.is_some() || !record.takeaways.is_empty())
        .then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_list() {
        let body = json!([
            {"title": "A", "url": "https://x.com/a", "rating": 4.1},
            {"title": "B", "url": "https://x.com/b"}
        ]);
        let records = normalize(&body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "A");
        assert_eq!(records[0].rating, Some(4.1));
        assert_eq!(records[1].rank, Some(2));
    }

    #[test]
    fn test_nested_container() {
        let body = json!({
            "success": true,
            "data": {"results": [{"name": "Brownies", "link": "https://x.com/b", "score": "4.7/5"}]}
        });
        assert!(matches!(ResponseShape::detect(&body), ResponseShape::NestedContainer(_)));

        let records = normalize(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Brownies");
        assert_eq!(records[0].url, "https://x.com/b");
        assert_eq!(records[0].rating, Some(4.7));
    }

    #[test]
    fn test_doubly_nested_container() {
        let body = json!({"data": {"data": {"results": [{"title": "Deep", "url": "https://x.com/d"}]}}});
        let records = normalize(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Deep");
    }

    #[test]
    fn test_top_level_recipes_container() {
        let body = json!({"recipes": [{"recipeTitle": "Soup", "url": "https://x.com/s"}]});
        assert_eq!(normalize(&body)[0].title, "Soup");
    }

    #[test]
    fn test_category_map_concatenated_in_order() {
        let body = json!({
            "data": {
                "desserts": [{"title": "Cake", "url": "https://x.com/cake"}],
                "mains": [{"title": "Stew", "url": "https://x.com/stew"}, {"title": "Chili", "url": "https://x.com/chili"}]
            }
        });
        let titles: Vec<_> = normalize(&body).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Cake", "Stew", "Chili"]);
    }

    #[test]
    fn test_single_item() {
        let body = json!({"title": "Only", "url": "https://x.com/o", "keyTakeaways": ["one"]});
        assert!(matches!(ResponseShape::detect(&body), ResponseShape::SingleItem(_)));
        let records = normalize(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].takeaways, vec!["one"]);
    }

    #[test]
    fn test_single_item_wrapped_in_data() {
        let body = json!({
            "success": true,
            "data": {"title": "Detail", "bigDifference": "No eggs", "commentSummary": {"pros": ["Easy"]}}
        });
        let records = normalize(&body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].unique_feature.as_deref(), Some("No eggs"));
        assert_eq!(records[0].pros, vec!["Easy"]);
    }

    #[test]
    fn test_unrecognized_is_empty() {
        assert!(normalize(&json!({"success": true, "status": "completed"})).is_empty());
        assert!(normalize(&json!("text")).is_empty());
        assert!(normalize(&json!(null)).is_empty());
        assert_eq!(ResponseShape::detect(&json!({"foo": 1})), ResponseShape::Unrecognized);
    }

    #[test]
    fn test_detail_without_title() {
        let body = json!({
            "success": true,
            "data": {"bigDifference": "Uses brown butter", "commentSummary": {"summary": "Great", "pros": ["Chewy"]}}
        });
        assert!(normalize(&body).is_empty());

        let record = normalize_detail(&body, "https://x.com/c").unwrap();
        assert_eq!(record.url, "https://x.com/c");
        assert_eq!(record.unique_feature.as_deref(), Some("Uses brown butter"));
        assert_eq!(record.pros, vec!["Chewy"]);
    }

    #[test]
    fn test_detail_with_nothing_usable() {
        assert!(normalize_detail(&json!({"success": true, "data": {}}), "https://x.com/c").is_none());
        assert!(normalize_detail(&json!([]), "https://x.com/c").is_none());
    }

    #[test]
    fn test_empty_container() {
        assert!(normalize(&json!({"data": {"results": []}})).is_empty());
    }

    #[test]
    fn test_items_without_title_or_url_skipped_and_ranks_compact() {
        let body = json!([
            {"title": "A", "url": "https://x.com/a"},
            {"rating": 5},
            {"url": "https://x.com/c"}
        ]);
        let records = normalize(&body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "https://x.com/c");
        assert_eq!(records[1].rank, Some(2));
    }
}
