//! Merging detail lookups into basic records and rating order.

use std::cmp::Ordering;

use bestof_core::ResultRecord;

/// Overlay detail fields onto a basic record. Detail values win when present;
/// the basic record's url is kept.
pub fn merge_detail(mut basic: ResultRecord, detail: ResultRecord) -> ResultRecord {
    if !detail.title.is_empty() && detail.title != detail.url {
        basic.title = detail.title;
    }
    if detail.rating.is_some() {
        basic.rating = detail.rating;
    }
    if detail.image_url.is_some() {
        basic.image_url = detail.image_url;
    }
    if detail.summary.is_some() {
        basic.summary = detail.summary;
    }
    if !detail.pros.is_empty() {
        basic.pros = detail.pros;
    }
    if !detail.cons.is_empty() {
        basic.cons = detail.cons;
    }
    if !detail.tips.is_empty() {
        basic.tips = detail.tips;
    }
    if detail.unique_feature.is_some() {
        basic.unique_feature = detail.unique_feature;
    }
    if !detail.takeaways.is_empty() {
        basic.takeaways = detail.takeaways;
    }
    basic
}

/// Sort by rating (missing counts as 0) descending, then by unique-feature
/// length descending, keeping input order for full ties. Ranks become 1..N.
pub fn sort_by_rating(records: &mut [ResultRecord]) {
    records.sort_by(|a, b| {
        let by_rating = b.rating.unwrap_or(0.0).partial_cmp(&a.rating.unwrap_or(0.0)).unwrap_or(Ordering::Equal);
        by_rating.then_with(|| unique_len(b).cmp(&unique_len(a)))
    });

    for (i, record) in records.iter_mut().enumerate() {
        record.rank = Some(u32::try_from(i + 1).unwrap_or(u32::MAX));
    }
}

fn unique_len(record: &ResultRecord) -> usize {
    record.unique_feature.as_deref().map_or(0, str::len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_detail_wins_when_present() {
        let basic = ResultRecord::new("Basic", "https://x.com/a").with_rating(3.0).with_rank(1);
        let mut detail = ResultRecord::new("Detailed Title", "https://x.com/other").with_rating(4.6);
        detail.pros = vec!["Moist".into()];
        detail.unique_feature = Some("Sour cream".into());

        let merged = merge_detail(basic, detail);
        assert_eq!(merged.title, "Detailed Title");
        assert_eq!(merged.url, "https://x.com/a");
        assert_eq!(merged.rating, Some(4.6));
        assert_eq!(merged.pros, vec!["Moist"]);
        assert_eq!(merged.rank, Some(1));
        assert!(merged.is_enriched());
    }

    #[test]
    fn test_merge_keeps_basic_when_detail_empty() {
        let mut basic = ResultRecord::new("Basic", "https://x.com/a").with_rating(3.0);
        basic.summary = Some("from search".into());
        let detail = ResultRecord::new("https://x.com/a", "https://x.com/a");

        let merged = merge_detail(basic, detail);
        assert_eq!(merged.title, "Basic");
        assert_eq!(merged.rating, Some(3.0));
        assert_eq!(merged.summary.as_deref(), Some("from search"));
    }

    #[test]
    fn test_sort_by_rating_with_tie_breaks() {
        let mut short = ResultRecord::new("short", "u1").with_rating(4.5);
        short.unique_feature = Some("x".into());
        let mut long = ResultRecord::new("long", "u2").with_rating(4.5);
        long.unique_feature = Some("much longer".into());
        let unrated = ResultRecord::new("unrated", "u3");
        let top = ResultRecord::new("top", "u4").with_rating(4.9);
        let first_plain = ResultRecord::new("plain-a", "u5").with_rating(2.0);
        let second_plain = ResultRecord::new("plain-b", "u6").with_rating(2.0);

        let mut records = vec![unrated, short, first_plain, long, top, second_plain];
        sort_by_rating(&mut records);

        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["top", "long", "short", "plain-a", "plain-b", "unrated"]);
        let ranks: Vec<_> = records.iter().map(|r| r.rank.unwrap()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
    }
}
