//! Notification → spoken sentence.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{AnnounceConfig, SpeechConfig};
use crate::html_text::extract_text;
use crate::mastodon::{Notification, NotificationKind};
use crate::speech::history::{AnnouncementHistory, AnnouncementRecord};
use crate::speech::Speaker;

/// The sentence to speak for a notification, if its type is announced at all.
///
/// A mention without an attached status has nothing to read out and is skipped.
pub fn announcement(notification: &Notification) -> Option<String> {
    let name = notification.account.name();

    match notification.kind {
        NotificationKind::Mention => {
            let status = notification.status.as_ref()?;
            Some(format!("{name} mentioned you: {}", extract_text(&status.content)))
        }
        NotificationKind::Favourite => Some(format!("{name} favorited your post")),
        NotificationKind::Reblog => Some(format!("{name} boosted your post")),
        NotificationKind::Follow => Some(format!("{name} started following you")),
        NotificationKind::Other => None,
    }
}

/// Outcome counts for one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub spoken: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct Announcer<S> {
    speaker: S,
    exclude_types: Vec<String>,
    pause: Duration,
    history: Option<AnnouncementHistory>,
}

impl<S: Speaker> Announcer<S> {
    pub fn new(
        speaker: S,
        announce: &AnnounceConfig,
        speech: &SpeechConfig,
        history: Option<AnnouncementHistory>,
    ) -> Self {
        Self {
            speaker,
            exclude_types: announce.exclude_types.clone(),
            pause: Duration::from_millis(speech.pause_ms),
            history,
        }
    }

    #[cfg(test)]
    pub(crate) fn speaker(&self) -> &S {
        &self.speaker
    }

    fn is_excluded(&self, notification: &Notification) -> bool {
        self.exclude_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&notification.type_name))
    }

    /// Speak every notification in the order given. Speech failures are
    /// logged and never stop the batch.
    pub async fn announce_all(&self, notifications: &[Notification]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for notification in notifications {
            if self.is_excluded(notification) {
                debug!("Skipping excluded {} notification {}", notification.type_name, notification.id);
                summary.skipped += 1;
                continue;
            }

            let Some(text) = announcement(notification) else {
                debug!(
                    "Skipping unsupported {:?} notification {}",
                    notification.type_name, notification.id
                );
                summary.skipped += 1;
                continue;
            };

            if summary.spoken + summary.failed > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            info!("Speaking notification {}: {text}", notification.id);
            let t0 = Instant::now();
            let result = self.speaker.speak(&text).await;
            let latency_ms = u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX);

            let error = match result {
                Ok(()) => {
                    summary.spoken += 1;
                    None
                }
                Err(e) => {
                    warn!("Failed to speak notification {}: {e}", notification.id);
                    summary.failed += 1;
                    Some(e.to_string())
                }
            };

            if let Some(history) = &self.history {
                history.save_record(&AnnouncementRecord {
                    timestamp: AnnouncementRecord::now_timestamp(),
                    notification_id: notification.id.clone(),
                    notification_type: notification.type_name.clone(),
                    author: notification.account.name().to_string(),
                    spoken: error.is_none(),
                    error,
                    text,
                    speech_latency_ms: latency_ms,
                });
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryConfig;
    use crate::mastodon::{decode_notifications, Account, Status};
    use crate::speech::testing::RecordingSpeaker;

    fn notification(kind: NotificationKind, type_name: &str, display_name: &str) -> Notification {
        Notification {
            id: "1".into(),
            kind,
            type_name: type_name.into(),
            account: Account {
                username: "ann".into(),
                display_name: display_name.into(),
            },
            status: None,
        }
    }

    fn no_pause() -> SpeechConfig {
        SpeechConfig {
            pause_ms: 0,
            ..SpeechConfig::default()
        }
    }

    fn announcer(speaker: RecordingSpeaker, exclude: &[&str]) -> Announcer<RecordingSpeaker> {
        Announcer::new(
            speaker,
            &AnnounceConfig {
                exclude_types: exclude.iter().map(|s| s.to_string()).collect(),
            },
            &no_pause(),
            None,
        )
    }

    #[test]
    fn favourite_sentence() {
        let n = notification(NotificationKind::Favourite, "favourite", "Ann");
        assert_eq!(announcement(&n).as_deref(), Some("Ann favorited your post"));
    }

    #[test]
    fn reblog_and_follow_sentences() {
        let n = notification(NotificationKind::Reblog, "reblog", "Ann");
        assert_eq!(announcement(&n).as_deref(), Some("Ann boosted your post"));

        let n = notification(NotificationKind::Follow, "follow", "Ann");
        assert_eq!(announcement(&n).as_deref(), Some("Ann started following you"));
    }

    #[test]
    fn mention_falls_back_to_handle_and_extracts_text() {
        let mut n = notification(NotificationKind::Mention, "mention", "");
        n.status = Some(Status {
            content: "<p>Hello <b>world</b></p>".into(),
        });
        assert_eq!(
            announcement(&n).as_deref(),
            Some("ann mentioned you: Hello world")
        );
    }

    #[test]
    fn mention_without_status_is_skipped() {
        let n = notification(NotificationKind::Mention, "mention", "Ann");
        assert_eq!(announcement(&n), None);
    }

    #[test]
    fn unknown_type_produces_nothing() {
        let body = br#"[{"id":"5","type":"poll","account":{"username":"ann","display_name":"Ann"}}]"#;
        let notifications = decode_notifications(body).unwrap();
        assert_eq!(announcement(&notifications[0]), None);
    }

    #[tokio::test]
    async fn unknown_type_has_no_side_effect() {
        let announcer = announcer(RecordingSpeaker::default(), &[]);
        let n = notification(NotificationKind::Other, "poll", "Ann");

        let summary = announcer.announce_all(&[n]).await;

        assert!(announcer.speaker().spoken().is_empty());
        assert_eq!(summary, BatchSummary { spoken: 0, failed: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn speaks_in_received_order() {
        let announcer = announcer(RecordingSpeaker::default(), &[]);
        let batch = [
            notification(NotificationKind::Follow, "follow", "Cy"),
            notification(NotificationKind::Favourite, "favourite", "Bob"),
            notification(NotificationKind::Reblog, "reblog", "Ann"),
        ];

        let summary = announcer.announce_all(&batch).await;

        assert_eq!(
            announcer.speaker().spoken(),
            vec![
                "Cy started following you",
                "Bob favorited your post",
                "Ann boosted your post",
            ]
        );
        assert_eq!(summary.spoken, 3);
    }

    #[tokio::test]
    async fn speech_failure_does_not_stop_the_batch() {
        let announcer = announcer(RecordingSpeaker::failing_on("Bob"), &[]);
        let batch = [
            notification(NotificationKind::Favourite, "favourite", "Bob"),
            notification(NotificationKind::Follow, "follow", "Cy"),
        ];

        let summary = announcer.announce_all(&batch).await;

        assert_eq!(announcer.speaker().spoken().len(), 2);
        assert_eq!(summary, BatchSummary { spoken: 1, failed: 1, skipped: 0 });
    }

    #[tokio::test]
    async fn excluded_types_are_not_spoken() {
        let announcer = announcer(RecordingSpeaker::default(), &["Follow", "reblog"]);
        let batch = [
            notification(NotificationKind::Follow, "follow", "Cy"),
            notification(NotificationKind::Favourite, "favourite", "Bob"),
            notification(NotificationKind::Reblog, "reblog", "Ann"),
        ];

        let summary = announcer.announce_all(&batch).await;

        assert_eq!(announcer.speaker().spoken(), vec!["Bob favorited your post"]);
        assert_eq!(summary.skipped, 2);
    }

    #[tokio::test]
    async fn spoken_and_failed_announcements_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let history = AnnouncementHistory::from_config(&HistoryConfig {
            enabled: true,
            dir: Some(dir.path().to_path_buf()),
        });
        let announcer = Announcer::new(
            RecordingSpeaker::failing_on("Bob"),
            &AnnounceConfig::default(),
            &no_pause(),
            history,
        );
        let batch = [
            notification(NotificationKind::Favourite, "favourite", "Bob"),
            notification(NotificationKind::Follow, "follow", "Cy"),
            notification(NotificationKind::Other, "poll", "Dee"),
        ];

        announcer.announce_all(&batch).await;

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let contents = std::fs::read_to_string(dir.path().join(format!("{today}.jsonl"))).unwrap();
        let records: Vec<AnnouncementRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert!(!records[0].spoken);
        assert_eq!(records[0].author, "Bob");
        assert!(records[1].spoken);
        assert_eq!(records[1].text, "Cy started following you");
    }

    #[tokio::test(start_paused = true)]
    async fn default_pause_separates_spoken_announcements() {
        let announcer = Announcer::new(
            RecordingSpeaker::default(),
            &AnnounceConfig::default(),
            &SpeechConfig::default(),
            None,
        );
        let batch = [
            notification(NotificationKind::Follow, "follow", "Cy"),
            notification(NotificationKind::Other, "poll", "Dee"),
            notification(NotificationKind::Favourite, "favourite", "Bob"),
            notification(NotificationKind::Reblog, "reblog", "Ann"),
        ];

        let t0 = tokio::time::Instant::now();
        announcer.announce_all(&batch).await;

        // Three spoken, so two gaps; nothing before the first or for the skipped poll.
        let elapsed = t0.elapsed();
        assert!(elapsed >= Duration::from_millis(2000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2100), "{elapsed:?}");
        assert_eq!(announcer.speaker().spoken().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn single_announcement_is_not_delayed() {
        let announcer = Announcer::new(
            RecordingSpeaker::default(),
            &AnnounceConfig::default(),
            &SpeechConfig::default(),
            None,
        );

        let t0 = tokio::time::Instant::now();
        announcer
            .announce_all(&[notification(NotificationKind::Follow, "follow", "Cy")])
            .await;

        assert_eq!(t0.elapsed(), Duration::ZERO);
    }
}
