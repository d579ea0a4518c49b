use tracing::{debug, info, warn};

use super::{keys, require_token, MarketplaceSync, SyncError};
use crate::domain::{Ack, Conversation, ConversationId, Message, Page, UnreadCount, UserId};
use crate::query::{KeyFilter, QueryState, QuerySubscription};

impl MarketplaceSync {
    pub async fn conversations(&self, token: Option<&str>) -> QueryState<Page<Conversation>> {
        self.authed_read(keys::conversations(), token, |api, token| async move {
            api.conversations(&token).await
        })
        .await
    }

    pub async fn conversation_messages(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        page: u32,
    ) -> QueryState<Page<Message>> {
        self.authed_read(
            keys::conversation_messages(conversation_id, page),
            token,
            move |api, token| async move {
                api.conversation_messages(&token, conversation_id, page)
                    .await
            },
        )
        .await
    }

    pub async fn unread_count(&self, token: Option<&str>) -> QueryState<UnreadCount> {
        self.authed_read(keys::unread_count(), token, |api, token| async move {
            api.unread_count(&token).await
        })
        .await
    }

    /// Inbox kept current while mounted (default every 15 s).
    pub fn watch_conversations(&self, token: Option<&str>) -> QuerySubscription<Page<Conversation>> {
        self.authed_watch(
            keys::conversations(),
            token,
            self.config.conversations_poll,
            |api, token| async move { api.conversations(&token).await },
        )
    }

    /// An open thread kept current while mounted (default every 5 s).
    pub fn watch_conversation_messages(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        page: u32,
    ) -> QuerySubscription<Page<Message>> {
        self.authed_watch(
            keys::conversation_messages(conversation_id, page),
            token,
            self.config.messages_poll,
            move |api, token| async move {
                api.conversation_messages(&token, conversation_id, page)
                    .await
            },
        )
    }

    /// Global unread badge (default every 30 s).
    pub fn watch_unread_count(&self, token: Option<&str>) -> QuerySubscription<UnreadCount> {
        self.authed_watch(
            keys::unread_count(),
            token,
            self.config.unread_poll,
            |api, token| async move { api.unread_count(&token).await },
        )
    }

    /// Conversations are created lazily per user pair; an existing one is returned as-is.
    pub async fn get_or_create_conversation(
        &self,
        token: Option<&str>,
        user_id: UserId,
    ) -> Result<Conversation, SyncError> {
        let token = require_token(token)?;
        let conversation = self
            .api
            .get_or_create_conversation(&token, user_id)
            .await
            .inspect_err(|error| warn!(%user_id, error = %error, "could not open conversation"))?;

        debug!(%user_id, conversation_id = %conversation.id, "conversation ready");
        self.invalidate_all(&[KeyFilter::resource(keys::CONVERSATIONS)]);
        Ok(conversation)
    }

    /// Send a message. Blank content is refused before any request is made.
    pub async fn send_message(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
        content: &str,
    ) -> Result<Message, SyncError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SyncError::EmptyMessage);
        }
        let token = require_token(token)?;

        let message = self
            .api
            .send_message(&token, conversation_id, content)
            .await
            .inspect_err(|error| warn!(%conversation_id, error = %error, "send failed"))?;

        info!(%conversation_id, message_id = message.id.0, "message sent");
        self.invalidate_all(&[
            keys::messages_in(conversation_id),
            KeyFilter::resource(keys::CONVERSATIONS),
            KeyFilter::resource(keys::UNREAD),
        ]);
        Ok(message)
    }

    pub async fn mark_conversation_read(
        &self,
        token: Option<&str>,
        conversation_id: ConversationId,
    ) -> Result<Ack, SyncError> {
        let token = require_token(token)?;
        let ack = self
            .api
            .mark_conversation_read(&token, conversation_id)
            .await
            .inspect_err(|error| warn!(%conversation_id, error = %error, "mark read failed"))?;

        debug!(%conversation_id, "conversation marked read");
        self.invalidate_all(&[
            keys::messages_in(conversation_id),
            KeyFilter::resource(keys::CONVERSATIONS),
            KeyFilter::resource(keys::UNREAD),
        ]);
        Ok(ack)
    }
}
