use std::collections::BTreeSet;

use chrono::{NaiveDateTime, Weekday};
use serde::Serialize;

/// One raw engagement record as loaded from the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: NaiveDateTime,
    pub platform: String,
    pub content_type: String,
    pub campaign_name: Option<String>,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub reach: f64,
    pub ad_spend: f64,
    pub roi: f64,
}

/// An event together with its derived metrics.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedEvent {
    pub timestamp: NaiveDateTime,
    pub platform: String,
    pub content_type: String,
    pub campaign_name: Option<String>,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub reach: f64,
    pub ad_spend: f64,
    pub roi: f64,
    pub engagement: f64,
    /// NaN when `reach` is zero.
    pub engagement_rate: f64,
    pub revenue_generated: f64,
    pub year: i32,
    pub post_hour: u32,
    pub day_of_week: Weekday,
}

impl EnrichedEvent {
    /// The engagement rate, or `None` when it is not available.
    pub fn rate(&self) -> Option<f64> {
        if self.engagement_rate.is_nan() {
            None
        } else {
            Some(self.engagement_rate)
        }
    }
}

/// Allowed values per dimension. An empty set places no restriction on
/// that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub platforms: BTreeSet<String>,
    pub content_types: BTreeSet<String>,
    pub years: BTreeSet<i32>,
}

impl FilterCriteria {
    pub fn is_unrestricted(&self) -> bool {
        self.platforms.is_empty() && self.content_types.is_empty() && self.years.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reduction {
    Mean,
    Sum,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Likes,
    Comments,
    Shares,
    Reach,
    AdSpend,
    Roi,
    Engagement,
    EngagementRate,
    Revenue,
}

impl Metric {
    pub fn value(self, event: &EnrichedEvent) -> f64 {
        match self {
            Metric::Likes => event.likes,
            Metric::Comments => event.comments,
            Metric::Shares => event.shares,
            Metric::Reach => event.reach,
            Metric::AdSpend => event.ad_spend,
            Metric::Roi => event.roi,
            Metric::Engagement => event.engagement,
            Metric::EngagementRate => event.engagement_rate,
            Metric::Revenue => event.revenue_generated,
        }
    }
}

/// A single requested reduction over a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub metric: Metric,
    pub reduction: Reduction,
}

impl Column {
    pub const fn mean(metric: Metric) -> Self {
        Self {
            metric,
            reduction: Reduction::Mean,
        }
    }

    pub const fn sum(metric: Metric) -> Self {
        Self {
            metric,
            reduction: Reduction::Sum,
        }
    }

    pub const fn count(metric: Metric) -> Self {
        Self {
            metric,
            reduction: Reduction::Count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow<K> {
    pub key: K,
    pub count: usize,
    /// One value per requested column, in request order.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryTable<K> {
    pub columns: Vec<Column>,
    pub rows: Vec<SummaryRow<K>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Segment {
    pub platform: String,
    pub content_type: String,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.platform, self.content_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Slot {
    pub day_of_week: Weekday,
    pub post_hour: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counted<K> {
    pub key: K,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub posts: usize,
    pub total_engagement: f64,
    pub avg_engagement_rate: Option<f64>,
    pub total_ad_spend: f64,
    pub total_revenue: f64,
    pub avg_roi: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MixRow {
    pub content_type: String,
    pub posts: usize,
    pub share_pct: f64,
    pub avg_engagement: f64,
    pub avg_roi: f64,
}
