//! Rule-based detectors over the currently filtered events.
//!
//! Thresholds come from the events handed in, so they move with the active
//! filter. Quantiles use linear interpolation between order statistics:
//! for sorted values `v[0..n]` and fraction `q`, the position `q * (n - 1)`
//! is split into its integer part `i` and remainder `f`, and the result is
//! `v[i] + f * (v[i + 1] - v[i])`.

use chrono::Weekday;
use serde::Serialize;

use crate::aggregate::{best_count, count_by, rank_counts, segment_of};
use crate::metrics;
use crate::models::{Counted, EnrichedEvent, RiskLevel, Segment, Slot};

pub const HIGH_IMPACT_QUANTILE: f64 = 0.80;
pub const SUSPICIOUS_QUANTILE: f64 = 0.90;

/// Suspicious ratios (in percent) below this are LOW.
pub const LOW_RISK_BELOW: f64 = 5.0;
/// Suspicious ratios (in percent) below this are MEDIUM; the rest are HIGH.
pub const MEDIUM_RISK_BELOW: f64 = 15.0;

pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

pub fn risk_level(ratio_pct: f64) -> RiskLevel {
    if ratio_pct < LOW_RISK_BELOW {
        RiskLevel::Low
    } else if ratio_pct < MEDIUM_RISK_BELOW {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Posts worth promoting: top-quintile engagement, at least average rate,
/// positive ROI.
#[derive(Debug, Clone, Serialize)]
pub struct HighImpactReport {
    pub engagement_cutoff: Option<f64>,
    pub avg_rate: Option<f64>,
    /// One flag per input event, aligned by index.
    pub flags: Vec<bool>,
    pub flagged: usize,
    /// Flag counts per (platform, content type), largest first.
    pub segments: Vec<Counted<Segment>>,
}

impl HighImpactReport {
    pub fn top(&self) -> Option<&Counted<Segment>> {
        self.segments.first()
    }
}

pub fn high_impact(events: &[EnrichedEvent]) -> HighImpactReport {
    let engagement: Vec<f64> = events.iter().map(|e| e.engagement).collect();
    let engagement_cutoff = quantile(&engagement, HIGH_IMPACT_QUANTILE);
    let avg_rate = metrics::mean(events.iter().map(|e| e.engagement_rate));

    let flags: Vec<bool> = match (engagement_cutoff, avg_rate) {
        (Some(cutoff), Some(avg)) => events
            .iter()
            .map(|e| e.engagement >= cutoff && e.rate().is_some_and(|r| r >= avg) && e.roi > 0.0)
            .collect(),
        _ => vec![false; events.len()],
    };

    let flagged_events = select(events, &flags, true);
    let segments = rank_counts(count_by(&flagged_events, |e| Some(segment_of(e))));

    tracing::debug!(
        cutoff = ?engagement_cutoff,
        avg_rate = ?avg_rate,
        flagged = flagged_events.len(),
        "high-impact detection"
    );

    HighImpactReport {
        engagement_cutoff,
        avg_rate,
        flags,
        flagged: flagged_events.len(),
        segments,
    }
}

/// Posts with unusually high engagement but no return.
#[derive(Debug, Clone, Serialize)]
pub struct SuspiciousReport {
    pub engagement_threshold: Option<f64>,
    pub flags: Vec<bool>,
    pub suspicious_count: usize,
    pub total_count: usize,
    pub ratio_pct: f64,
    pub risk_level: RiskLevel,
    pub heatmap: Vec<Counted<Slot>>,
    pub by_day: Vec<Counted<Weekday>>,
    pub safe_slots: Vec<Counted<Slot>>,
    pub recommended_slot: Option<Counted<Slot>>,
}

impl SuspiciousReport {
    pub fn has_data(&self) -> bool {
        self.total_count > 0
    }
}

pub fn suspicious(events: &[EnrichedEvent]) -> SuspiciousReport {
    let engagement: Vec<f64> = events.iter().map(|e| e.engagement).collect();
    let engagement_threshold = quantile(&engagement, SUSPICIOUS_QUANTILE);

    let flags: Vec<bool> = match engagement_threshold {
        Some(threshold) => events
            .iter()
            .map(|e| e.engagement > threshold && e.roi <= 0.0)
            .collect(),
        None => Vec::new(),
    };

    let flagged = select(events, &flags, true);
    let safe = select(events, &flags, false);

    let total_count = events.len();
    let suspicious_count = flagged.len();
    let ratio_pct = if total_count == 0 {
        0.0
    } else {
        suspicious_count as f64 * 100.0 / total_count as f64
    };

    let safe_slots = count_by(&safe, |e| Some(slot_of(e)));
    let recommended_slot = best_count(&safe_slots).cloned();

    tracing::debug!(
        threshold = ?engagement_threshold,
        suspicious = suspicious_count,
        total = total_count,
        "suspicious-activity detection"
    );

    SuspiciousReport {
        engagement_threshold,
        suspicious_count,
        total_count,
        ratio_pct,
        risk_level: risk_level(ratio_pct),
        heatmap: count_by(&flagged, |e| Some(slot_of(e))),
        by_day: count_by(&flagged, |e| Some(e.day_of_week)),
        safe_slots,
        recommended_slot,
        flags,
    }
}

fn slot_of(event: &EnrichedEvent) -> Slot {
    Slot {
        day_of_week: event.day_of_week,
        post_hour: event.post_hour,
    }
}

fn select(events: &[EnrichedEvent], flags: &[bool], wanted: bool) -> Vec<EnrichedEvent> {
    events
        .iter()
        .zip(flags.iter().copied().chain(std::iter::repeat(false)))
        .filter(|(_, flag)| *flag == wanted)
        .map(|(event, _)| event.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{event, ramp};

    #[test]
    fn quantile_interpolates_linearly() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();

        assert!((quantile(&values, 0.90).unwrap() - 90.1).abs() < 1e-9);
        assert!((quantile(&values, 0.80).unwrap() - 80.2).abs() < 1e-9);
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(100.0));
    }

    #[test]
    fn quantile_handles_tiny_and_empty_sets() {
        assert_eq!(quantile(&[7.0], 0.9), Some(7.0));
        assert!((quantile(&[4.0, 2.0], 0.5).unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.9), None);
        assert_eq!(quantile(&[f64::NAN], 0.9), None);
    }

    #[test]
    fn risk_bands_are_lower_inclusive() {
        assert_eq!(risk_level(0.0), RiskLevel::Low);
        assert_eq!(risk_level(4.99), RiskLevel::Low);
        assert_eq!(risk_level(5.0), RiskLevel::Medium);
        assert_eq!(risk_level(14.99), RiskLevel::Medium);
        assert_eq!(risk_level(15.0), RiskLevel::High);
        assert_eq!(risk_level(100.0), RiskLevel::High);
    }

    #[test]
    fn thresholds_follow_the_filtered_set() {
        let full = suspicious(&ramp(100));
        let half = suspicious(&ramp(50));

        assert!((full.engagement_threshold.unwrap() - 90.1).abs() < 1e-9);
        assert!((half.engagement_threshold.unwrap() - 45.1).abs() < 1e-9);
    }

    // With ten posts the interpolated 90th percentile sits between the two
    // largest values, so only the very top post can exceed it.
    #[test]
    fn ten_post_scenario_flags_only_the_strict_top() {
        let mut events: Vec<EnrichedEvent> = (1..=8)
            .map(|i| event("Instagram", "Reel").engagement(f64::from(i) * 10.0).roi(0.3).enriched())
            .collect();
        events.push(event("Instagram", "Reel").engagement(500.0).roi(0.0).enriched());
        events.push(event("TikTok", "Video").engagement(600.0).roi(-0.2).enriched());

        let report = suspicious(&events);

        assert!((report.engagement_threshold.unwrap() - 510.0).abs() < 1e-9);
        assert_eq!(report.suspicious_count, 1);
        assert!(report.flags[9]);
        assert_eq!(report.ratio_pct, 10.0);
        assert_eq!(report.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn twenty_post_scenario_flags_both_outliers() {
        let mut events: Vec<EnrichedEvent> = (1..=18)
            .map(|i| event("Instagram", "Reel").engagement(f64::from(i)).roi(0.5).enriched())
            .collect();
        events.push(
            event("Instagram", "Reel")
                .engagement(900.0)
                .roi(-0.4)
                .at(2024, 1, 6, 23)
                .enriched(),
        );
        events.push(
            event("Facebook", "Image")
                .engagement(950.0)
                .roi(0.0)
                .at(2024, 1, 6, 23)
                .enriched(),
        );

        let report = suspicious(&events);

        assert_eq!(report.suspicious_count, 2);
        assert_eq!(report.risk_level, RiskLevel::Medium);
        assert_eq!(
            report.heatmap,
            vec![Counted {
                key: Slot {
                    day_of_week: Weekday::Sat,
                    post_hour: 23
                },
                count: 2
            }]
        );
        assert_eq!(report.by_day, vec![Counted { key: Weekday::Sat, count: 2 }]);
    }

    #[test]
    fn high_engagement_with_positive_roi_is_not_suspicious() {
        let mut events = ramp(19);
        events.push(event("Instagram", "Reel").engagement(1000.0).roi(0.01).enriched());

        assert_eq!(suspicious(&events).suspicious_count, 0);
    }

    #[test]
    fn safe_slot_is_busiest_clean_slot() {
        let events = vec![
            event("A", "Reel").engagement(1.0).at(2024, 1, 1, 9).enriched(),
            event("A", "Reel").engagement(2.0).at(2024, 1, 2, 18).enriched(),
            event("A", "Reel").engagement(3.0).at(2024, 1, 2, 18).enriched(),
            event("A", "Reel").engagement(4.0).at(2024, 1, 1, 9).enriched(),
            event("A", "Reel").engagement(5.0).at(2024, 1, 3, 7).enriched(),
        ];
        let report = suspicious(&events);
        let slot = report.recommended_slot.unwrap();

        assert_eq!(
            slot.key,
            Slot {
                day_of_week: Weekday::Mon,
                post_hour: 9
            }
        );
        assert_eq!(slot.count, 2);
        assert_eq!(report.safe_slots.iter().map(|c| c.count).sum::<usize>(), 5);
    }

    #[test]
    fn high_impact_requires_all_three_conditions() {
        let events = vec![
            event("Instagram", "Reel").engagement(90.0).reach(100.0).roi(0.4).enriched(),
            event("Instagram", "Reel").engagement(95.0).reach(100.0).roi(-0.1).enriched(),
            event("TikTok", "Video").engagement(100.0).reach(10_000.0).roi(0.9).enriched(),
            event("Facebook", "Image").engagement(5.0).reach(100.0).roi(0.2).enriched(),
            event("Facebook", "Image").engagement(10.0).reach(100.0).roi(0.2).enriched(),
        ];
        let report = high_impact(&events);

        assert!((report.engagement_cutoff.unwrap() - 96.0).abs() < 1e-9);
        assert_eq!(report.flags, vec![false, false, false, false, false]);

        let mut boosted = events.clone();
        boosted[0] = event("Instagram", "Reel").engagement(100.0).reach(100.0).roi(0.4).enriched();
        let report = high_impact(&boosted);

        assert_eq!(report.flags, vec![true, false, false, false, false]);
        assert_eq!(
            report.top().map(|c| (c.key.platform.as_str(), c.count)),
            Some(("Instagram", 1))
        );
    }

    #[test]
    fn high_impact_segments_rank_by_count() {
        let mut events = Vec::new();
        for _ in 0..2 {
            events.push(
                event("TikTok", "Video")
                    .engagement(100.0)
                    .reach(100.0)
                    .roi(0.5)
                    .enriched(),
            );
        }
        for _ in 0..3 {
            events.push(
                event("Instagram", "Reel")
                    .engagement(100.0)
                    .reach(100.0)
                    .roi(0.5)
                    .enriched(),
            );
        }
        let report = high_impact(&events);

        let ranked: Vec<(&str, usize)> = report
            .segments
            .iter()
            .map(|c| (c.key.platform.as_str(), c.count))
            .collect();
        assert_eq!(ranked, vec![("Instagram", 3), ("TikTok", 2)]);
    }

    #[test]
    fn zero_reach_rows_do_not_qualify_or_skew_the_average() {
        let events = vec![
            event("A", "Reel").engagement(100.0).reach(0.0).roi(1.0).enriched(),
            event("B", "Reel").engagement(100.0).reach(200.0).roi(1.0).enriched(),
            event("C", "Reel").engagement(1.0).reach(200.0).roi(1.0).enriched(),
        ];
        let report = high_impact(&events);

        assert!((report.avg_rate.unwrap() - 25.25).abs() < 1e-9);
        assert_eq!(report.flags, vec![false, true, false]);
    }

    #[test]
    fn empty_set_reports_no_data() {
        let fraud = suspicious(&[]);
        let impact = high_impact(&[]);

        assert!(!fraud.has_data());
        assert_eq!(fraud.engagement_threshold, None);
        assert_eq!(fraud.ratio_pct, 0.0);
        assert_eq!(fraud.risk_level, RiskLevel::Low);
        assert!(fraud.recommended_slot.is_none());
        assert!(fraud.heatmap.is_empty());
        assert_eq!(impact.engagement_cutoff, None);
        assert!(impact.top().is_none());
    }

    #[test]
    fn detectors_handle_fewer_than_five_rows() {
        let events = ramp(3);
        let fraud = suspicious(&events);
        let impact = high_impact(&events);

        assert!((fraud.engagement_threshold.unwrap() - 2.8).abs() < 1e-9);
        assert_eq!(fraud.suspicious_count, 0);
        assert_eq!(impact.flagged, 1);
    }
}
