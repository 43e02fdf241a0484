//! Request and response bodies exchanged with the Connect backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ArticleId, ChannelId, MessageId, PlaceId, ReportItemType, TeamId, UserId},
    model::{
        Article, ArticleDetail, ChannelMember, ChannelView, LiveEvent, LoginInfo, MessagePage,
        Notification, Place, Team, User,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub type LoginResponse = LoginInfo;

/// Entry of the "hottest" feed; points into `project_map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub item_id: ArticleId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticlesResponse {
    pub hottests: Vec<FeedItem>,
    pub hottest_has_more: bool,
    pub project_map: HashMap<ArticleId, Article>,
    pub user_map: HashMap<UserId, User>,
    pub team_map: HashMap<TeamId, Team>,
    pub follow_map: HashMap<String, bool>,
    pub like_map: HashMap<ArticleId, bool>,
    pub place_map: HashMap<PlaceId, Place>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowArticlesResponse {
    pub projects: Vec<Article>,
    pub project_has_more: bool,
    pub hottests: Vec<Article>,
    pub hottest_has_more: bool,
    pub page: u32,
    pub user_map: HashMap<UserId, User>,
    pub team_map: HashMap<TeamId, Team>,
    pub follow_map: HashMap<String, bool>,
    pub like_map: HashMap<ArticleId, bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDetailResponse {
    pub project: ArticleDetail,
}

pub type MessagesResponse = MessagePage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub channel_id: ChannelId,
    pub content: String,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsResponse {
    pub items: Vec<LiveEvent>,
    pub has_more: bool,
    pub user_map: HashMap<UserId, User>,
    pub place_map: HashMap<PlaceId, Place>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetailResponse {
    pub event: LiveEvent,
    pub user_map: HashMap<UserId, User>,
    pub place_map: HashMap<PlaceId, Place>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfileResponse {
    pub user: User,
    pub team_map: HashMap<TeamId, Team>,
    pub follow_map: HashMap<String, bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserArticlesResponse {
    pub projects: Vec<Article>,
    pub has_more: bool,
    pub user_map: HashMap<UserId, User>,
    pub team_map: HashMap<TeamId, Team>,
    pub like_map: HashMap<ArticleId, bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsResponse {
    pub page: u32,
    pub page_total: u32,
    pub results: Vec<Notification>,
    pub user_map: HashMap<UserId, User>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMembersResponse {
    pub channel: ChannelView,
    pub members: Vec<ChannelMember>,
    pub total: u32,
    pub follow_map: HashMap<String, bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub item_id: String,
    pub item_type: ReportItemType,
    pub reason: String,
}
