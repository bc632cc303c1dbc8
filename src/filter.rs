use crate::models::{EnrichedEvent, FilterCriteria};

pub fn matches(criteria: &FilterCriteria, event: &EnrichedEvent) -> bool {
    (criteria.platforms.is_empty() || criteria.platforms.contains(&event.platform))
        && (criteria.content_types.is_empty()
            || criteria.content_types.contains(&event.content_type))
        && (criteria.years.is_empty() || criteria.years.contains(&event.year))
}

/// Returns the events passing every populated dimension, in input order.
pub fn apply(events: &[EnrichedEvent], criteria: &FilterCriteria) -> Vec<EnrichedEvent> {
    let filtered: Vec<EnrichedEvent> = events
        .iter()
        .filter(|event| matches(criteria, event))
        .cloned()
        .collect();

    tracing::debug!(
        platforms = ?criteria.platforms,
        content_types = ?criteria.content_types,
        years = ?criteria.years,
        input = events.len(),
        kept = filtered.len(),
        "filter applied"
    );
    if filtered.is_empty() && !events.is_empty() {
        tracing::warn!("filter left no events");
    }

    filtered
}
