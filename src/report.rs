use std::fmt::{Display, Write};

use crate::insights::Insights;
use crate::models::{FilterCriteria, SummaryTable};

const NO_DATA: &str = "No data available.";

pub fn criteria_label(criteria: &FilterCriteria) -> String {
    if criteria.is_unrestricted() {
        return "all posts".to_string();
    }

    let mut parts = Vec::new();
    if !criteria.platforms.is_empty() {
        parts.push(format!("platform in [{}]", join(&criteria.platforms)));
    }
    if !criteria.content_types.is_empty() {
        parts.push(format!("content type in [{}]", join(&criteria.content_types)));
    }
    if !criteria.years.is_empty() {
        parts.push(format!("year in [{}]", join(&criteria.years)));
    }
    parts.join(", ")
}

fn join<T: Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_undefined<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "undefined".to_string(), |v| v.to_string())
}

fn number(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{v:.2}"),
        _ => "n/a".to_string(),
    }
}

fn write_table<K: Display>(output: &mut String, table: &SummaryTable<K>) {
    if table.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }

    for row in &table.rows {
        let values = table
            .columns
            .iter()
            .zip(&row.values)
            .map(|(column, value)| {
                format!(
                    "{:?} {:?} {}",
                    column.reduction,
                    column.metric,
                    number(Some(*value))
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(output, "- {} ({} posts): {}", row.key, row.count, values);
    }
}

pub fn render(insights: &Insights) -> String {
    let mut output = String::new();
    let overview = &insights.overview;

    let _ = writeln!(output, "# Social Media Engagement Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} posts)",
        criteria_label(&insights.criteria),
        overview.posts
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total engagement: {:.0}", overview.total_engagement);
    let _ = writeln!(
        output,
        "- Avg engagement rate: {}%",
        number(overview.avg_engagement_rate)
    );
    let _ = writeln!(output, "- Ad spend: {:.2}", overview.total_ad_spend);
    let _ = writeln!(output, "- Revenue: {:.2}", overview.total_revenue);
    let _ = writeln!(output, "- Avg ROI: {}", number(overview.avg_roi));
    let _ = writeln!(output);

    let _ = writeln!(output, "## Platform Engagement");
    write_table(&mut output, &insights.platform_rates);
    let _ = writeln!(
        output,
        "Best engagement platform: {}",
        or_undefined(insights.best_platform.as_deref())
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Content Performance");
    write_table(&mut output, &insights.content_performance);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Platform x Content Type");
    write_table(&mut output, &insights.segment_performance);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Campaign ROI");
    write_table(&mut output, &insights.campaigns);
    let _ = writeln!(
        output,
        "Best campaign by ROI: {}",
        or_undefined(insights.best_campaign.as_deref())
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Best Posting Time");
    write_table(&mut output, &insights.hourly);
    let _ = writeln!(
        output,
        "Best hour: {}",
        or_undefined(insights.best_hour.map(|h| format!("{h}:00")))
    );
    write_table(&mut output, &insights.daily);
    let _ = writeln!(output, "Best day: {}", or_undefined(insights.best_day));
    let _ = writeln!(output);

    let _ = writeln!(output, "## Video Strategy");
    write_table(&mut output, &insights.video_reach);
    let _ = writeln!(
        output,
        "Best platform for promotional videos: {}",
        or_undefined(insights.best_video_platform.as_deref())
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Content Mix");
    if insights.content_mix.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
    } else {
        for row in &insights.content_mix {
            let _ = writeln!(
                output,
                "- {}: {} posts ({:.1}%), avg engagement {}, avg ROI {}",
                row.content_type,
                row.posts,
                row.share_pct,
                number(Some(row.avg_engagement)),
                number(Some(row.avg_roi))
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## High-Impact Content");
    let impact = &insights.high_impact;
    match impact.top() {
        None => {
            let _ = writeln!(output, "No high-impact content detected.");
        }
        Some(top) => {
            for segment in &impact.segments {
                let _ = writeln!(
                    output,
                    "- {} on {}: {} posts",
                    segment.key.content_type, segment.key.platform, segment.count
                );
            }
            let _ = writeln!(
                output,
                "Best promotion opportunity: {} on {}",
                top.key.content_type, top.key.platform
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Suspicious Activity");
    let fraud = &insights.suspicious;
    if !fraud.has_data() {
        let _ = writeln!(output, "{NO_DATA}");
        return output;
    }
    let _ = writeln!(
        output,
        "- Engagement threshold (p90): {}",
        number(fraud.engagement_threshold)
    );
    let _ = writeln!(
        output,
        "- Suspicious posts: {} of {} ({:.1}%)",
        fraud.suspicious_count, fraud.total_count, fraud.ratio_pct
    );
    let _ = writeln!(output, "- Risk level: {}", fraud.risk_level);
    for day in &fraud.by_day {
        let _ = writeln!(output, "- {}: {} suspicious", day.key, day.count);
    }
    let _ = writeln!(
        output,
        "Recommended safe slot: {}",
        or_undefined(
            fraud
                .recommended_slot
                .as_ref()
                .map(|slot| format!("{} {}:00", slot.key.day_of_week, slot.key.post_hour))
        )
    );

    output
}
