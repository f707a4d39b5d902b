//! Field aliases and value coercion for provider items.

use serde_json::Value;

use bestof_core::ResultRecord;

const TITLE: &[&str] = &["title", "name", "recipeTitle", "recipe_title"];
const URL: &[&str] = &["url", "link", "sourceUrl", "source_url", "href"];
const RATING: &[&str] = &["rating", "score", "stars", "averageRating"];
const IMAGE: &[&str] = &["imageUrl", "image_url", "image", "thumbnail"];
const SUMMARY: &[&str] = &["summary", "description", "commentSummary.summary", "comments.summary"];
const PROS: &[&str] = &["pros", "commentSummary.pros", "comments.pros"];
const CONS: &[&str] = &["cons", "commentSummary.cons", "comments.cons"];
const TIPS: &[&str] = &[
    "tips",
    "tipsAndTricks",
    "tips_and_tricks",
    "commentSummary.tips",
    "commentSummary.tipsAndTricks",
    "comments.tips",
    "comments.tipsAndTricks",
];
const UNIQUE: &[&str] =
    &["bigDifference", "big_difference", "uniqueness", "whatMakesItUnique", "what_makes_it_unique", "unique"];
const TAKEAWAYS: &[&str] = &["keyTakeaways", "key_takeaways", "takeaways"];
const RANK: &[&str] = &["rank", "position"];

/// Follow a dotted path through nested objects.
pub(crate) fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

/// Whether an object carries enough to be a result item on its own.
pub(crate) fn looks_like_item(value: &Value) -> bool {
    value.is_object() && (first_string(value, TITLE).is_some() || first_string(value, URL).is_some())
}

/// Build a record from one provider item.
///
/// Returns `None` for non-objects and for items with neither title nor url.
/// `position` is the 1-based index the record will be emitted at.
pub(crate) fn record_from_item(item: &Value, position: usize) -> Option<ResultRecord> {
    if !item.is_object() {
        return None;
    }

    let url = first_string(item, URL);
    let title = first_string(item, TITLE).or_else(|| url.clone())?;

    let rank = first_rank(item).unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX));

    let mut record = ResultRecord::new(title, url.unwrap_or_default()).with_rank(rank);
    record.rating = first_rating(item);
    record.image_url = first_string(item, IMAGE);
    record.summary = first_string(item, SUMMARY);
    record.pros = first_list(item, PROS);
    record.cons = first_list(item, CONS);
    record.tips = first_list(item, TIPS);
    record.unique_feature = first_string(item, UNIQUE);
    record.takeaways = first_list(item, TAKEAWAYS);

    Some(record)
}

fn first_string(item: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|path| {
        lookup(item, path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn first_list(item: &Value, aliases: &[&str]) -> Vec<String> {
    aliases.iter().find_map(|path| lookup(item, path).and_then(string_list)).unwrap_or_default()
}

/// An array of strings, or a single string as a one-element list.
fn string_list(value: &Value) -> Option<Vec<String>> {
    let list: Vec<String> = match value {
        Value::String(s) => vec![s.trim().to_string()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(|s| s.trim().to_string()).collect(),
        _ => return None,
    };
    let list: Vec<String> = list.into_iter().filter(|s| !s.is_empty()).collect();
    (!list.is_empty()).then_some(list)
}

fn first_rating(item: &Value) -> Option<f64> {
    RATING.iter().find_map(|path| lookup(item, path).and_then(parse_rating))
}

/// A number, or the numeric prefix of a string like `"4.5/5"`.
fn parse_rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            let end = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(s.len());
            s[..end].parse::<f64>().ok()?
        }
        _ => return None,
    };
    rating.is_finite().then_some(rating)
}

fn first_rank(item: &Value) -> Option<u32> {
    RANK.iter()
        .find_map(|path| lookup(item, path).and_then(Value::as_u64))
        .filter(|rank| *rank > 0)
        .and_then(|rank| u32::try_from(rank).ok())
}
