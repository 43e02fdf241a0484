use std::collections::HashMap;

use shared::{
    domain::{ArticleId, ChannelId, MessageId, UserId},
    model::{MessagePage, User},
    protocol::SendMessageRequest,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{EffectError, Effects, Related};
use crate::action::{Action, MessageBatch, SentMessage};

/// Reshapes a message page into a store batch plus the authors it mentions.
pub(crate) fn message_batch(
    channel_id: ChannelId,
    page: MessagePage,
    is_refresh: bool,
) -> (MessageBatch, HashMap<UserId, User>) {
    let MessagePage {
        items,
        parents,
        has_more,
        curr_oldest_message_id,
    } = page;

    let item_ids: Vec<MessageId> = items.iter().map(|message| message.id.clone()).collect();
    let oldest_message_id = curr_oldest_message_id
        .filter(|id| !id.is_empty())
        .or_else(|| item_ids.last().cloned());

    let mut authors = HashMap::new();
    let mut messages = HashMap::with_capacity(items.len() + parents.len());
    for message in parents.into_iter().chain(items) {
        if !message.author.id.is_empty() {
            authors.insert(message.author.id.clone(), message.author.clone());
        }
        messages.insert(message.id.clone(), message);
    }

    let batch = MessageBatch {
        channel_id,
        item_ids,
        messages,
        has_more,
        oldest_message_id,
        is_refresh,
    };
    (batch, authors)
}

impl Effects {
    /// Loads a page of a chat channel, or of an article's comments when `comments` is set.
    pub(super) async fn fetch_channel_page(
        &self,
        command: &'static str,
        channel_id: ChannelId,
        before: Option<MessageId>,
        comments: bool,
    ) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchMessages {
            token,
            channel_id: channel_id.clone(),
        })?;

        let result = if comments {
            self.api
                .fetch_article_comments(&channel_id, before.as_ref())
                .await
        } else {
            self.api.fetch_messages(&channel_id, before.as_ref()).await
        };
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                return self.fail(
                    command,
                    Action::FetchMessagesFailure { token, channel_id },
                    err,
                )
            }
        };

        let (batch, authors) = message_batch(channel_id, page, before.is_none());
        self.merge(Related {
            users: authors,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchMessagesSuccess {
            token,
            batch,
        })
    }

    /// Optimistic like or unlike of a comment; a rejected call is only logged.
    pub(super) async fn like_comment(
        &self,
        message_id: MessageId,
        like: bool,
    ) -> Result<(), EffectError> {
        let user_id = self.viewer()?;
        let action = if like {
            Action::LikeCommentSuccess {
                message_id: message_id.clone(),
                user_id,
            }
        } else {
            Action::RemoveLikeCommentSuccess {
                message_id: message_id.clone(),
                user_id,
            }
        };
        self.dispatch(action)?;

        let result = if like {
            self.api.like_comment(&message_id).await
        } else {
            self.api.remove_like_comment(&message_id).await
        };
        if let Err(err) = result {
            warn!(message_id = %message_id, like, error = %err, "comment reaction rejected");
        }
        Ok(())
    }

    pub(super) async fn send(
        &self,
        command: &'static str,
        channel_id: ChannelId,
        content: String,
        article_id: Option<ArticleId>,
        parent_message_id: Option<MessageId>,
        upper_message_id: Option<MessageId>,
    ) -> Result<(), EffectError> {
        let token = self.store.next_token();
        let nonce = Uuid::new_v4().to_string();
        self.dispatch(Action::StartSendMessage {
            token,
            channel_id: channel_id.clone(),
            nonce: nonce.clone(),
        })?;

        let request = SendMessageRequest {
            channel_id: channel_id.clone(),
            content,
            nonce: nonce.clone(),
            parent_message_id: parent_message_id.clone(),
            upper_message_id: upper_message_id.clone(),
        };
        let message = match self.api.send_message(&request).await {
            Ok(message) => message,
            Err(err) => {
                return self.fail(
                    command,
                    Action::SendMessageFailure {
                        token,
                        channel_id,
                        nonce,
                    },
                    err,
                )
            }
        };
        debug!(channel_id = %channel_id, message_id = %message.id, "message sent");

        if !message.author.id.is_empty() {
            let mut users = HashMap::new();
            users.insert(message.author.id.clone(), message.author.clone());
            self.merge(Related {
                users,
                ..Related::default()
            })?;
        }
        self.dispatch(Action::SendMessageSuccess {
            token,
            sent: Box::new(SentMessage {
                message,
                channel_id,
                nonce,
                article_id,
                parent_message_id,
                upper_message_id,
            }),
        })
    }
}
