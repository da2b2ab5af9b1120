//! Mastodon notifications API: wire types and the fetcher.
//!
//! GET `<instance>/api/v1/notifications[?since_id=<cursor>]` with a bearer
//! token. The instance answers with a JSON array, newest first.

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::InstanceConfig;
use crate::error::{Error, Result};

const NOTIFICATIONS_PATH: &str = "/api/v1/notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Mention,
    Favourite,
    Reblog,
    Follow,
    /// Polls, updates, admin events and anything newer than this client.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

impl Account {
    /// Display name when set, otherwise the handle.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    /// HTML-formatted post body.
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Raw type string, kept for logging and `exclude_types` matching.
    #[serde(skip)]
    pub type_name: String,
    #[serde(default)]
    pub account: Account,
    /// Only mention-like notifications carry a status.
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Deserialize)]
struct RawKind {
    #[serde(rename = "type", default)]
    type_name: String,
}

/// Decode a notifications response body.
///
/// The raw `type` string is recovered alongside the typed kind so unknown
/// types can still be named in logs.
pub fn decode_notifications(body: &[u8]) -> Result<Vec<Notification>> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(body)?;

    values
        .into_iter()
        .map(|value| -> Result<Notification> {
            let RawKind { type_name } = RawKind::deserialize(&value)?;
            let mut notification = Notification::deserialize(value)?;
            notification.type_name = type_name;
            Ok(notification)
        })
        .collect()
}

pub struct MastodonClient {
    client: Client,
    endpoint: Url,
    access_token: String,
}

impl MastodonClient {
    pub fn new(config: &InstanceConfig) -> Result<Self> {
        let base = config.url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}{NOTIFICATIONS_PATH}"))
            .map_err(|e| Error::Config(format!("invalid instance URL {:?}: {e}", config.url)))?;

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch notifications newer than `since_id`, or the latest page when it is empty.
    pub async fn fetch_notifications(&self, since_id: &str) -> Result<Vec<Notification>> {
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(&self.access_token);
        if !since_id.is_empty() {
            request = request.query(&[("since_id", since_id)]);
        }

        debug!("GET {} (since_id: {:?})", self.endpoint, since_id);

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        let body = resp.bytes().await?;
        let notifications = decode_notifications(&body)?;
        info!("Fetched {} notification(s)", notifications.len());

        Ok(notifications)
    }
}
