//! Builders for sample events used across unit tests.

use chrono::NaiveDate;

use crate::metrics;
use crate::models::{EnrichedEvent, Event};

pub struct EventBuilder {
    event: Event,
}

pub fn event(platform: &str, content_type: &str) -> EventBuilder {
    EventBuilder {
        event: Event {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .unwrap(),
            platform: platform.to_string(),
            content_type: content_type.to_string(),
            campaign_name: None,
            likes: 10.0,
            comments: 0.0,
            shares: 0.0,
            reach: 100.0,
            ad_spend: 100.0,
            roi: 0.1,
        },
    }
}

impl EventBuilder {
    /// Puts the whole engagement into `likes`.
    pub fn engagement(mut self, value: f64) -> Self {
        self.event.likes = value;
        self.event.comments = 0.0;
        self.event.shares = 0.0;
        self
    }

    pub fn reach(mut self, value: f64) -> Self {
        self.event.reach = value;
        self
    }

    pub fn roi(mut self, value: f64) -> Self {
        self.event.roi = value;
        self
    }

    pub fn ad_spend(mut self, value: f64) -> Self {
        self.event.ad_spend = value;
        self
    }

    pub fn campaign(mut self, name: &str) -> Self {
        self.event.campaign_name = Some(name.to_string());
        self
    }

    /// January 2024 starts on a Monday.
    pub fn at(mut self, year: i32, month: u32, day: u32, hour: u32) -> Self {
        self.event.timestamp = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap();
        self
    }

    pub fn build(self) -> Event {
        self.event
    }

    pub fn enriched(self) -> EnrichedEvent {
        metrics::enrich(&self.event)
    }
}

/// Events with engagement 1, 2, ..., n on a single platform.
pub fn ramp(n: usize) -> Vec<EnrichedEvent> {
    (1..=n)
        .map(|i| event("Instagram", "Reel").engagement(i as f64).enriched())
        .collect()
}
