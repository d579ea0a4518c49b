use std::sync::{Arc, Mutex, MutexGuard};

use super::Session;
use crate::domain::{ConversationId, Message};
use crate::sync::{MarketplaceSync, SyncError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(Message),
    /// Nothing was sent: the draft is blank or a send is still in flight.
    Blocked,
}

#[derive(Default)]
struct Draft {
    text: String,
    sending: bool,
}

/// Clears `sending` when the send finishes or its future is dropped.
struct Sending {
    draft: Arc<Mutex<Draft>>,
}

impl Drop for Sending {
    fn drop(&mut self) {
        if let Ok(mut draft) = self.draft.lock() {
            draft.sending = false;
        }
    }
}

/// Message input for one open conversation.
#[derive(Clone)]
pub struct MessageComposer {
    sync: MarketplaceSync,
    session: Session,
    conversation_id: ConversationId,
    draft: Arc<Mutex<Draft>>,
}

impl MessageComposer {
    pub fn new(sync: MarketplaceSync, session: Session, conversation_id: ConversationId) -> Self {
        Self {
            sync,
            session,
            conversation_id,
            draft: Arc::new(Mutex::new(Draft::default())),
        }
    }

    fn draft(&self) -> MutexGuard<'_, Draft> {
        self.draft.lock().expect("draft mutex poisoned")
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.draft().text = text.into();
    }

    pub fn text(&self) -> String {
        self.draft().text.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.draft().sending
    }

    /// State of the send button.
    pub fn can_send(&self) -> bool {
        let draft = self.draft();
        !draft.sending && !draft.text.trim().is_empty()
    }

    /// Send the current draft. The draft is cleared on success and kept on failure so the
    /// user can retry.
    pub async fn send(&self) -> Result<SendOutcome, SyncError> {
        let (text, sending) = {
            let mut draft = self.draft();
            if draft.sending || draft.text.trim().is_empty() {
                return Ok(SendOutcome::Blocked);
            }
            draft.sending = true;
            let sending = Sending {
                draft: self.draft.clone(),
            };
            (draft.text.clone(), sending)
        };

        let result = self
            .sync
            .send_message(self.session.token(), self.conversation_id, &text)
            .await;
        drop(sending);

        let message = result?;
        let mut draft = self.draft();
        if draft.text == text {
            draft.text.clear();
        }
        Ok(SendOutcome::Sent(message))
    }
}
