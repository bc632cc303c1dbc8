use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{LoadError, Result};
use crate::metrics;
use crate::models::{EnrichedEvent, Event};

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "date",
    "platform",
    "content_type",
    "likes",
    "comments",
    "shares",
    "reach",
    "ad_spend",
    "roi",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// The derived event table, loaded once and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct EventStore {
    events: Arc<[EnrichedEvent]>,
}

impl EventStore {
    pub fn load(path: &Path) -> Result<Self> {
        let events = load_csv(path)?;
        tracing::info!(path = %path.display(), rows = events.len(), "event table loaded");
        Ok(Self::from_events(&events))
    }

    pub fn from_events(events: &[Event]) -> Self {
        Self {
            events: metrics::derive(events).into(),
        }
    }

    /// An immutable view of the table. Each caller gets its own handle; the
    /// rows themselves are never written after load.
    pub fn snapshot(&self) -> Arc<[EnrichedEvent]> {
        Arc::clone(&self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

pub fn load_csv(path: &Path) -> Result<Vec<Event>> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_events(file)
}

pub fn read_events<R: Read>(source: R) -> Result<Vec<Event>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        date: String,
        platform: String,
        content_type: String,
        #[serde(default)]
        campaign_name: Option<String>,
        likes: String,
        comments: String,
        shares: String,
        reach: String,
        ad_spend: String,
        roi: String,
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns { missing });
    }

    let mut events = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: CsvRow = record.deserialize(Some(&headers))?;

        events.push(Event {
            timestamp: parse_timestamp(&row.date).ok_or_else(|| LoadError::InvalidTimestamp {
                line,
                value: row.date.clone(),
            })?,
            platform: row.platform,
            content_type: row.content_type,
            campaign_name: row.campaign_name.filter(|name| !name.is_empty()),
            likes: parse_count(line, "likes", &row.likes)?,
            comments: parse_count(line, "comments", &row.comments)?,
            shares: parse_count(line, "shares", &row.shares)?,
            reach: parse_count(line, "reach", &row.reach)?,
            ad_spend: parse_count(line, "ad_spend", &row.ad_spend)?,
            roi: parse_signed(line, "roi", &row.roi)?,
        });
    }

    Ok(events)
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn parse_signed(line: u64, column: &'static str, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(LoadError::InvalidNumber {
            line,
            column,
            value: value.to_string(),
        }),
    }
}

fn parse_count(line: u64, column: &'static str, value: &str) -> Result<f64> {
    let parsed = parse_signed(line, column, value)?;
    if parsed < 0.0 {
        return Err(LoadError::InvalidNumber {
            line,
            column,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;

    const HEADER: &str = "date,platform,content_type,campaign_name,likes,comments,shares,reach,ad_spend,roi";

    #[test]
    fn reads_rows_and_blank_campaigns() {
        let data = format!(
            "{HEADER}\n2024-03-01 14:30:00,Instagram,Reel,Spring Launch,120,10,5,2000,50.5,0.4\n\
             2024-03-02 09:00:00,Facebook,Image,,40,2,1,800,0,-0.1\n"
        );
        let events = read_events(data.as_bytes()).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].campaign_name.as_deref(), Some("Spring Launch"));
        assert_eq!(events[0].timestamp.hour(), 14);
        assert_eq!(events[1].campaign_name, None);
        assert_eq!(events[1].roi, -0.1);
    }

    #[test]
    fn campaign_column_is_optional() {
        let data = "date,platform,content_type,likes,comments,shares,reach,ad_spend,roi\n\
                    2023-12-31,YouTube,Video,1,2,3,10,5,1.5\n";
        let events = read_events(data.as_bytes()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].campaign_name, None);
        assert_eq!(events[0].timestamp.year(), 2023);
    }

    #[test]
    fn reports_every_missing_column() {
        let data = "date,platform,likes,comments,shares,reach,roi\n";
        let err = read_events(data.as_bytes()).unwrap_err();

        match err {
            LoadError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["content_type".to_string(), "ad_spend".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_bad_timestamp_with_line() {
        let data = format!("{HEADER}\nyesterday,Instagram,Reel,,1,1,1,10,1,0.1\n");
        let err = read_events(data.as_bytes()).unwrap_err();

        assert!(matches!(err, LoadError::InvalidTimestamp { line: 2, .. }));
    }

    #[test]
    fn rejects_negative_counts() {
        let data = format!("{HEADER}\n2024-01-01,Instagram,Reel,,-4,1,1,10,1,0.1\n");
        let err = read_events(data.as_bytes()).unwrap_err();

        assert!(matches!(
            err,
            LoadError::InvalidNumber {
                column: "likes",
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_finite_roi() {
        for value in ["NaN", "inf", "-inf"] {
            let data = format!("{HEADER}\n2024-01-01,Instagram,Reel,,4,1,1,10,1,{value}\n");
            let err = read_events(data.as_bytes()).unwrap_err();

            assert!(
                matches!(err, LoadError::InvalidNumber { column: "roi", line: 2, .. }),
                "{value} accepted as roi: {err}"
            );
        }
    }

    #[test]
    fn accepts_common_timestamp_shapes() {
        assert!(parse_timestamp("2024-05-06T07:08:09Z").is_some());
        assert!(parse_timestamp("2024-05-06T07:08").is_some());
        assert_eq!(
            parse_timestamp("2024-05-06 18:00").map(|ts| ts.hour()),
            Some(18)
        );
        assert!(parse_timestamp("06/05/2024").is_none());
    }

    #[test]
    fn store_loads_from_disk_and_shares_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "2024-02-10 20:00:00,TikTok,Video,,100,20,30,0,10,0.5").unwrap();
        file.flush().unwrap();

        let store = EventStore::load(file.path()).unwrap();
        let first = store.snapshot();
        let second = store.snapshot();

        assert_eq!(store.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first[0].engagement, 150.0);
        assert!(first[0].engagement_rate.is_nan());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_csv(&dir.path().join("absent.csv")).unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
    }
}
