//! Announcement history.
//!
//! Stores one record per announcement in daily JSONL files at
//! ~/.mastodon-speaker-history/{date}.jsonl.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::HistoryConfig;

fn default_history_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mastodon-speaker-history")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    pub timestamp: String,
    pub notification_id: String,
    pub notification_type: String,
    pub author: String,
    pub text: String,
    pub spoken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub speech_latency_ms: u64,
}

impl AnnouncementRecord {
    pub fn now_timestamp() -> String {
        Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

pub struct AnnouncementHistory {
    dir: PathBuf,
}

impl AnnouncementHistory {
    /// `None` when history is disabled in config.
    pub fn from_config(config: &HistoryConfig) -> Option<Self> {
        config.enabled.then(|| Self {
            dir: config.dir.clone().unwrap_or_else(default_history_dir),
        })
    }

    fn file_for(&self, date: &str) -> PathBuf {
        self.dir.join(format!("{date}.jsonl"))
    }

    /// Append a record to today's file. Failures are logged and swallowed.
    pub fn save_record(&self, record: &AnnouncementRecord) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("Failed to create history dir {}: {e}", self.dir.display());
            return;
        }

        let date = Local::now().format("%Y-%m-%d").to_string();
        let path = self.file_for(&date);

        let mut file = match fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open history file {}: {e}", path.display());
                return;
            }
        };

        match serde_json::to_string(record) {
            Ok(line) => {
                if let Err(e) = writeln!(file, "{line}") {
                    warn!("Failed to write history record: {e}");
                } else {
                    debug!("Saved announcement record to {}", path.display());
                }
            }
            Err(e) => warn!("Failed to serialize history record: {e}"),
        }
    }

    /// All records for a `YYYY-MM-DD` date; malformed lines are skipped.
    pub fn load_records(&self, date: &str) -> Vec<AnnouncementRecord> {
        let Ok(contents) = fs::read_to_string(self.file_for(date)) else {
            return Vec::new();
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Markdown summary of one day's announcements. `date` may be "today".
    pub fn generate_report(&self, date: &str) -> String {
        let date = if date == "today" {
            Local::now().format("%Y-%m-%d").to_string()
        } else {
            date.to_string()
        };

        let records = self.load_records(&date);
        if records.is_empty() {
            return format!("# Mastodon Speaker Report - {date}\n\nNo announcements recorded.");
        }

        let total = records.len();
        let failed = records.iter().filter(|r| !r.spoken).count();
        let avg_latency =
            records.iter().map(|r| r.speech_latency_ms as f64).sum::<f64>() / total as f64;

        let mut type_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for r in &records {
            *type_counts.entry(r.notification_type.as_str()).or_insert(0) += 1;
        }

        let mut lines = vec![
            format!("# Mastodon Speaker Report - {date}"),
            String::new(),
            "## Summary".to_string(),
            format!("- **Announcements**: {total}"),
            format!("- **Speech failures**: {failed}"),
            format!("- **Average speech time**: {avg_latency:.0}ms"),
            String::new(),
            "## Types".to_string(),
        ];
        lines.extend(type_counts.iter().map(|(kind, count)| format!("- {kind}: {count}")));

        lines.extend([
            String::new(),
            "## Log".to_string(),
            String::new(),
            "| Time | Type | Text | Spoken |".to_string(),
            "|------|------|------|--------|".to_string(),
        ]);
        for r in &records {
            let time = r.timestamp.get(11..19).unwrap_or(&r.timestamp);
            let spoken = if r.spoken { "yes" } else { "no" };
            lines.push(format!(
                "| {time} | {} | {} | {spoken} |",
                r.notification_type,
                truncate(&r.text, 40)
            ));
        }

        lines.join("\n")
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
