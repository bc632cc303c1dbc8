use chrono::Weekday;
use serde::Serialize;

use crate::aggregate;
use crate::detect::{self, HighImpactReport, SuspiciousReport};
use crate::filter;
use crate::models::{
    Column, EnrichedEvent, FilterCriteria, Metric, MixRow, Overview, Segment, SummaryTable,
};

pub const RATE: Column = Column::mean(Metric::EngagementRate);
pub const ENGAGEMENT: Column = Column::mean(Metric::Engagement);
pub const ROI: Column = Column::mean(Metric::Roi);

/// Every dashboard tab computed from one filter application.
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    pub criteria: FilterCriteria,
    pub overview: Overview,
    pub platform_rates: SummaryTable<String>,
    pub best_platform: Option<String>,
    pub content_performance: SummaryTable<String>,
    pub segment_performance: SummaryTable<Segment>,
    pub campaigns: SummaryTable<String>,
    pub best_campaign: Option<String>,
    pub hourly: SummaryTable<u32>,
    pub best_hour: Option<u32>,
    pub daily: SummaryTable<Weekday>,
    pub best_day: Option<Weekday>,
    pub video_reach: SummaryTable<String>,
    pub best_video_platform: Option<String>,
    pub content_mix: Vec<MixRow>,
    pub high_impact: HighImpactReport,
    pub suspicious: SuspiciousReport,
}

impl Insights {
    pub fn compute(events: &[EnrichedEvent], criteria: &FilterCriteria) -> Self {
        let filtered = filter::apply(events, criteria);
        Self::from_filtered(&filtered, criteria.clone())
    }

    pub fn from_filtered(events: &[EnrichedEvent], criteria: FilterCriteria) -> Self {
        let platform_rates =
            aggregate::by_platform(events, &[RATE, Column::count(Metric::EngagementRate)]);
        let content_performance = aggregate::by_content_type(
            events,
            &[
                Column::mean(Metric::Likes),
                Column::mean(Metric::Comments),
                Column::mean(Metric::Shares),
                ENGAGEMENT,
            ],
        );
        let segment_performance =
            aggregate::by_segment(events, &[ENGAGEMENT, Column::sum(Metric::Revenue)]);
        let campaigns = aggregate::by_campaign(
            events,
            &[Column::mean(Metric::AdSpend), Column::mean(Metric::Revenue), ROI],
        );
        let hourly = aggregate::by_hour(events, &[ENGAGEMENT]);
        let daily = aggregate::by_day(events, &[ENGAGEMENT]);
        let video_reach = aggregate::video_reach(events);

        Self {
            best_platform: platform_rates.best(RATE).map(|r| r.key.clone()),
            best_campaign: campaigns.best(ROI).map(|r| r.key.clone()),
            best_hour: hourly.best(ENGAGEMENT).map(|r| r.key),
            best_day: daily.best(ENGAGEMENT).map(|r| r.key),
            best_video_platform: video_reach.rows.first().map(|r| r.key.clone()),
            overview: aggregate::overview(events),
            content_mix: aggregate::content_mix(events),
            high_impact: detect::high_impact(events),
            suspicious: detect::suspicious(events),
            criteria,
            platform_rates,
            content_performance,
            segment_performance,
            campaigns,
            hourly,
            daily,
            video_reach,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overview.posts == 0
    }
}
