//! One polling cycle: cursor → fetch → announce → cursor.
//!
//! The cursor only moves after the whole batch has been handled, and only to
//! the newest id (the API returns newest first). A fetch or decode error ends
//! the cycle before anything is written.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info};

use crate::announcer::Announcer;
use crate::cursor::CursorStore;
use crate::error::Result;
use crate::mastodon::MastodonClient;
use crate::speech::Speaker;

pub struct Poller<S> {
    client: MastodonClient,
    announcer: Announcer<S>,
    cursor: CursorStore,
    /// When false the cursor is read but never written (`--dry-run`).
    persist_cursor: bool,
}

impl<S: Speaker> Poller<S> {
    pub fn new(
        client: MastodonClient,
        announcer: Announcer<S>,
        cursor: CursorStore,
        persist_cursor: bool,
    ) -> Self {
        Self {
            client,
            announcer,
            cursor,
            persist_cursor,
        }
    }

    pub async fn run_once(&self) -> Result<()> {
        let last_id = self.cursor.read();
        let notifications = self.client.fetch_notifications(&last_id).await?;

        let Some(newest) = notifications.first() else {
            info!("No new notifications");
            return Ok(());
        };

        info!("Processing {} new notification(s)", notifications.len());
        let summary = self.announcer.announce_all(&notifications).await;
        info!(
            "Batch done: {} spoken, {} failed, {} skipped",
            summary.spoken, summary.failed, summary.skipped
        );

        if self.persist_cursor {
            self.cursor.write(&newest.id);
        } else {
            info!("[dry run] Cursor would advance to {}", newest.id);
        }

        Ok(())
    }

    /// Poll every `interval` until `shutdown` resolves. A failed cycle is
    /// logged and the next tick runs as scheduled.
    ///
    /// Shutdown also interrupts a cycle in progress; the cursor is then left
    /// where it was and the interrupted batch is announced again next run.
    pub async fn watch<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            let cycle = async {
                ticker.tick().await;
                self.run_once().await
            };

            tokio::select! {
                result = cycle => {
                    if let Err(e) = result {
                        error!("Polling cycle failed: {e}");
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutting down");
                    break;
                }
            }
        }
    }
}
