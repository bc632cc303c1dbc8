use chrono::{Datelike, Timelike};

use crate::models::{EnrichedEvent, Event};

pub fn derive(events: &[Event]) -> Vec<EnrichedEvent> {
    events.iter().map(enrich).collect()
}

pub fn enrich(event: &Event) -> EnrichedEvent {
    let engagement = event.likes + event.comments + event.shares;

    EnrichedEvent {
        timestamp: event.timestamp,
        platform: event.platform.clone(),
        content_type: event.content_type.clone(),
        campaign_name: event.campaign_name.clone(),
        likes: event.likes,
        comments: event.comments,
        shares: event.shares,
        reach: event.reach,
        ad_spend: event.ad_spend,
        roi: event.roi,
        engagement,
        engagement_rate: engagement_rate(engagement, event.reach),
        revenue_generated: event.ad_spend * (1.0 + event.roi),
        year: event.timestamp.year(),
        post_hour: event.timestamp.hour(),
        day_of_week: event.timestamp.weekday(),
    }
}

/// Engagement as a percentage of reach; NaN when reach is zero.
pub fn engagement_rate(engagement: f64, reach: f64) -> f64 {
    if reach == 0.0 {
        f64::NAN
    } else {
        engagement / reach * 100.0
    }
}

/// Arithmetic mean that skips NaN values. `None` when nothing remains.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|value| !value.is_nan())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
