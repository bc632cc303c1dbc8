//! Grouping and summarizing over a filtered event table.
//!
//! Every grouping emits one row per distinct key, in the order keys are
//! first seen in the input. Keys with no members never appear. "Best" lookups
//! pick the strictly largest value and, on an exact tie, the earliest row in
//! that first-seen order; NaN values never win. An empty table has no best
//! row, reported as `None`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::Weekday;

use crate::metrics;
use crate::models::{
    Column, Counted, EnrichedEvent, Metric, MixRow, Overview, Reduction, Segment, SummaryRow,
    SummaryTable,
};

pub fn group_by<'a, K, F>(events: &'a [EnrichedEvent], key: F) -> Vec<(K, Vec<&'a EnrichedEvent>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&EnrichedEvent) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&EnrichedEvent>)> = Vec::new();

    for event in events {
        let Some(k) = key(event) else {
            continue;
        };
        match index.get(&k) {
            Some(&position) => groups[position].1.push(event),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![event]));
            }
        }
    }

    groups
}

pub fn summarize<K, F>(events: &[EnrichedEvent], key: F, columns: &[Column]) -> SummaryTable<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&EnrichedEvent) -> Option<K>,
{
    let rows = group_by(events, key)
        .into_iter()
        .map(|(key, members)| SummaryRow {
            key,
            count: members.len(),
            values: columns.iter().map(|column| reduce(*column, &members)).collect(),
        })
        .collect();

    SummaryTable {
        columns: columns.to_vec(),
        rows,
    }
}

/// Reduces one column over a group. NaN inputs are skipped, so a mean over
/// only-NaN values is NaN and a sum over them is zero.
fn reduce(column: Column, members: &[&EnrichedEvent]) -> f64 {
    let values = members.iter().map(|event| column.metric.value(event));
    match column.reduction {
        Reduction::Mean => metrics::mean(values).unwrap_or(f64::NAN),
        Reduction::Sum => values.filter(|v| !v.is_nan()).sum(),
        Reduction::Count => values.filter(|v| !v.is_nan()).count() as f64,
    }
}

pub fn by_platform(events: &[EnrichedEvent], columns: &[Column]) -> SummaryTable<String> {
    summarize(events, |e| Some(e.platform.clone()), columns)
}

pub fn by_content_type(events: &[EnrichedEvent], columns: &[Column]) -> SummaryTable<String> {
    summarize(events, |e| Some(e.content_type.clone()), columns)
}

pub fn by_hour(events: &[EnrichedEvent], columns: &[Column]) -> SummaryTable<u32> {
    summarize(events, |e| Some(e.post_hour), columns)
}

pub fn by_day(events: &[EnrichedEvent], columns: &[Column]) -> SummaryTable<Weekday> {
    summarize(events, |e| Some(e.day_of_week), columns)
}

/// Groups by campaign; events without a campaign are left out.
pub fn by_campaign(events: &[EnrichedEvent], columns: &[Column]) -> SummaryTable<String> {
    summarize(events, |e| e.campaign_name.clone(), columns)
}

pub fn by_segment(events: &[EnrichedEvent], columns: &[Column]) -> SummaryTable<Segment> {
    summarize(events, |e| Some(segment_of(e)), columns)
}

pub fn segment_of(event: &EnrichedEvent) -> Segment {
    Segment {
        platform: event.platform.clone(),
        content_type: event.content_type.clone(),
    }
}

pub fn count_by<K, F>(events: &[EnrichedEvent], key: F) -> Vec<Counted<K>>
where
    K: Eq + Hash + Clone,
    F: Fn(&EnrichedEvent) -> Option<K>,
{
    group_by(events, key)
        .into_iter()
        .map(|(key, members)| Counted {
            key,
            count: members.len(),
        })
        .collect()
}

/// Stable descending sort by count; ties keep their first-seen order.
pub fn rank_counts<K>(mut counts: Vec<Counted<K>>) -> Vec<Counted<K>> {
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

pub fn best_count<K>(counts: &[Counted<K>]) -> Option<&Counted<K>> {
    let mut best: Option<&Counted<K>> = None;
    for candidate in counts {
        if best.map_or(true, |current| candidate.count > current.count) {
            best = Some(candidate);
        }
    }
    best
}

impl<K> SummaryTable<K> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// The row with the largest value in `column`, or `None` when no row has
    /// a number there.
    pub fn best(&self, column: Column) -> Option<&SummaryRow<K>> {
        let index = self.position(column)?;
        let mut best: Option<(&SummaryRow<K>, f64)> = None;

        for row in &self.rows {
            let value = row.values[index];
            if value.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, current)| value > current) {
                best = Some((row, value));
            }
        }

        best.map(|(row, _)| row)
    }

    /// Stable descending sort on `column`; NaN rows go last.
    pub fn sorted_desc(mut self, column: Column) -> Self {
        if let Some(index) = self.position(column) {
            self.rows.sort_by(|a, b| {
                let (x, y) = (a.values[index], b.values[index]);
                match (x.is_nan(), y.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                }
            });
        }
        self
    }
}

pub fn overview(events: &[EnrichedEvent]) -> Overview {
    Overview {
        posts: events.len(),
        total_engagement: events.iter().map(|e| e.engagement).sum(),
        avg_engagement_rate: metrics::mean(events.iter().map(|e| e.engagement_rate)),
        total_ad_spend: events.iter().map(|e| e.ad_spend).sum(),
        total_revenue: events.iter().map(|e| e.revenue_generated).sum(),
        avg_roi: metrics::mean(events.iter().map(|e| e.roi)),
    }
}

/// Share of posts per content type, largest share first.
pub fn content_mix(events: &[EnrichedEvent]) -> Vec<MixRow> {
    let total = events.len();
    let table = by_content_type(
        events,
        &[Column::mean(Metric::Engagement), Column::mean(Metric::Roi)],
    );

    let mut rows: Vec<MixRow> = table
        .rows
        .into_iter()
        .map(|row| MixRow {
            share_pct: row.count as f64 / total as f64 * 100.0,
            posts: row.count,
            avg_engagement: row.values[0],
            avg_roi: row.values[1],
            content_type: row.key,
        })
        .collect();

    rows.sort_by(|a, b| b.posts.cmp(&a.posts));
    rows
}

/// Mean reach per platform over video content, highest first.
pub fn video_reach(events: &[EnrichedEvent]) -> SummaryTable<String> {
    let videos: Vec<EnrichedEvent> = events
        .iter()
        .filter(|e| e.content_type.to_lowercase().contains("video"))
        .cloned()
        .collect();

    by_platform(&videos, &[Column::mean(Metric::Reach)]).sorted_desc(Column::mean(Metric::Reach))
}
