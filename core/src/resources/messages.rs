//! Conversations and messages.
//!
//! The two reads here soft-fail to an empty list: an empty inbox is a valid
//! display state, and the pages that render history show "no messages"
//! rather than an error banner. This is a deliberate per-endpoint policy,
//! not a general rule — `send` propagates like every other mutation.
//!
//! Messaging is the most volatile resource, so it gets the shortest
//! freshness window plus [`MessagesApi::watch_conversation`] for periodic
//! background refresh while a thread is on screen.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::cache::{QueryCache, QueryKey};
use crate::endpoints;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::types::{ApiResponse, Conversation, Message, NewMessage};

use super::{fetch_cached, to_cache_value};

const RESOURCE: &str = "messages";
const TTL: Duration = Duration::from_secs(15);

fn conversation_key(id: Uuid) -> QueryKey {
    QueryKey::new(RESOURCE, "conversation").with_segment(&id.to_string())
}

#[derive(Clone)]
pub struct MessagesApi {
    client: Arc<HttpClient>,
    cache: Arc<QueryCache>,
}

impl MessagesApi {
    pub(crate) fn new(client: Arc<HttpClient>, cache: Arc<QueryCache>) -> Self {
        Self { client, cache }
    }

    /// All conversations of the current user. Soft-fails to empty.
    pub async fn conversations(&self) -> Vec<Conversation> {
        match self.try_conversations().await {
            Ok(conversations) => conversations,
            Err(err) => {
                debug!(%err, "conversation listing failed; showing empty history");
                Vec::new()
            }
        }
    }

    /// Message history of one conversation. Soft-fails to empty.
    pub async fn conversation_messages(&self, conversation_id: Uuid) -> Vec<Message> {
        match self.try_conversation_messages(conversation_id).await {
            Ok(messages) => messages,
            Err(err) => {
                debug!(%err, %conversation_id, "message listing failed; showing empty history");
                Vec::new()
            }
        }
    }

    async fn try_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let key = QueryKey::new(RESOURCE, "conversations");
        let client = self.client.clone();
        fetch_cached(&self.cache, key, TTL, move || async move {
            let resp: ApiResponse<Vec<Conversation>> =
                client.get(endpoints::messages::CONVERSATIONS, &[]).await?;
            to_cache_value(resp.into_result()?)
        })
        .await
    }

    async fn try_conversation_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, ApiError> {
        let client = self.client.clone();
        let path = endpoints::messages::conversation(conversation_id);
        fetch_cached(
            &self.cache,
            conversation_key(conversation_id),
            TTL,
            move || async move {
                let resp: ApiResponse<Vec<Message>> = client.get(&path, &[]).await?;
                to_cache_value(resp.into_result()?)
            },
        )
        .await
    }

    /// Send a message. Invalidates the messaging namespace after the
    /// response lands so the next read refetches the thread.
    pub async fn send(&self, message: &NewMessage) -> Result<Message, ApiError> {
        let resp: ApiResponse<Message> = self
            .client
            .post(endpoints::messages::SEND, message)
            .await?;
        let sent = resp.into_result()?;
        self.cache.invalidate_resource(RESOURCE);
        Ok(sent)
    }

    /// Refresh one conversation on a fixed interval for as long as the
    /// returned receiver is alive. Each tick bypasses the freshness window
    /// and publishes the latest history (soft-fail semantics included).
    pub fn watch_conversation(
        &self,
        conversation_id: Uuid,
        interval: Duration,
    ) -> watch::Receiver<Vec<Message>> {
        let (tx, rx) = watch::channel(Vec::new());
        let api = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                api.cache.invalidate(&conversation_key(conversation_id));
                let messages = api.conversation_messages(conversation_id).await;
                if tx.send(messages).is_err() {
                    break;
                }
            }
        });
        rx
    }
}
