use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ArticleId, ChannelId, EventId, EventMode, MemberId, MemberRole, MessageId, NotificationId,
    OwnerType, PlaceId, TeamId, UserId,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub fullname: String,
    pub avatar: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub followers_count: u32,
    pub following_users_count: u32,
    pub article_count: u32,
    pub like_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub id: TeamId,
    pub slug: String,
    pub name: String,
    pub avatar: Option<String>,
    pub followers_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub subtitle: Option<String>,
    pub thumbnail: Option<String>,
    pub owner_type: OwnerType,
    pub user_id: UserId,
    pub team_id: Option<TeamId>,
    pub channel_id: ChannelId,
    pub view_count: u32,
    pub like_count: u32,
    pub comment_count: u32,
    pub created_time: Option<DateTime<Utc>>,
    pub last_published_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reaction {
    pub kind: String,
    pub user_id: UserId,
}

pub const LIKE_REACTION: &str = "like";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: User,
    pub content: String,
    pub nonce: Option<String>,
    pub parent_message_id: Option<MessageId>,
    pub upper_message_id: Option<MessageId>,
    pub reply_message_ids: Vec<MessageId>,
    pub reactions: Vec<Reaction>,
    pub deleted: bool,
    pub created_time: Option<DateTime<Utc>>,
}

impl Message {
    pub fn like_count(&self) -> usize {
        self.reactions
            .iter()
            .filter(|reaction| reaction.kind == LIKE_REACTION)
            .count()
    }

    pub fn liked_by(&self, user_id: &UserId) -> bool {
        self.reactions
            .iter()
            .any(|reaction| reaction.kind == LIKE_REACTION && &reaction.user_id == user_id)
    }
}

/// One page of a channel's messages, plus parent messages referenced by replies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub parents: Vec<Message>,
    pub has_more: bool,
    pub curr_oldest_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDetail {
    pub article: Article,
    pub body: String,
    pub channel_id: ChannelId,
    pub comments: MessagePage,
    pub like: bool,
    pub user_map: HashMap<UserId, User>,
    pub mention_users: HashMap<UserId, User>,
    pub team_map: HashMap<TeamId, Team>,
    pub follow_map: HashMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveEvent {
    pub id: EventId,
    pub title: String,
    pub short_description: Option<String>,
    pub avatar: Option<String>,
    pub mode: EventMode,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub place_id: Option<PlaceId>,
    pub begin: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub participants_count: u32,
    pub user_is_checked_in: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelView {
    pub id: ChannelId,
    pub name: String,
    pub topic: Option<String>,
    pub thumbnail: Option<String>,
    pub member_count: u32,
    pub is_mute: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMember {
    pub id: MemberId,
    pub channel_id: ChannelId,
    pub user: User,
    pub role: MemberRole,
    pub is_banned: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationData {
    pub id: String,
    pub fullname: String,
    pub project_id: Option<ArticleId>,
    pub project_title: Option<String>,
    pub role: Option<String>,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub read: bool,
    pub seen: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: NotificationData,
    pub created_time: Option<DateTime<Utc>>,
    pub updated_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginInfo {
    pub user_id: UserId,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub authorization_token: Option<String>,
}
