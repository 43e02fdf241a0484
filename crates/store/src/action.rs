//! Every state change the store understands.

use std::collections::HashMap;

use shared::{
    domain::{ArticleId, ChannelId, EventId, EventTab, MessageId, PlaceId, TeamId, UserId},
    model::{
        Article, ArticleDetail, ChannelMember, ChannelView, LiveEvent, LoginInfo, Message,
        Notification, Place, Team, User,
    },
};

use crate::request::RequestToken;

/// A page of channel messages reshaped for the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageBatch {
    pub channel_id: ChannelId,
    /// Top-level message ids in server order (newest first).
    pub item_ids: Vec<MessageId>,
    /// Items plus the parents they reply to.
    pub messages: HashMap<MessageId, Message>,
    pub has_more: bool,
    pub oldest_message_id: Option<MessageId>,
    /// Replace the channel's list instead of appending to it.
    pub is_refresh: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub message: Message,
    pub channel_id: ChannelId,
    pub nonce: String,
    pub article_id: Option<ArticleId>,
    pub parent_message_id: Option<MessageId>,
    pub upper_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddCount {
        number: i64,
    },
    LoginChangeEmail {
        text: String,
    },
    LoginChangePassword {
        text: String,
    },
    StartLogin {
        token: RequestToken,
    },
    LoginSuccess {
        token: RequestToken,
        info: LoginInfo,
    },
    LoginFailure {
        token: RequestToken,
    },
    Logout,
    ShowChatWindow {
        show: bool,
    },
    ChatWindowStatus {
        open: bool,
    },
    NavigateToEvent {
        event_id: EventId,
    },
    ClearEventDetail,

    MergeUsers(HashMap<UserId, User>),
    MergeTeams(HashMap<TeamId, Team>),
    MergePlaces(HashMap<PlaceId, Place>),
    MergeFollows(HashMap<String, bool>),
    MergeLikes(HashMap<ArticleId, bool>),

    StartFetchArticles {
        token: RequestToken,
    },
    FetchArticlesSuccess {
        token: RequestToken,
        offset: u32,
        articles: Vec<Article>,
        has_more: bool,
    },
    FetchArticlesFailure {
        token: RequestToken,
    },
    StartFetchFollowArticles {
        token: RequestToken,
    },
    FetchFollowArticlesSuccess {
        token: RequestToken,
        page: u32,
        projects: Vec<Article>,
        project_has_more: bool,
        hottests: Vec<Article>,
        hottest_has_more: bool,
    },
    FetchFollowArticlesFailure {
        token: RequestToken,
    },
    StartFetchArticleDetail {
        token: RequestToken,
        article_id: ArticleId,
    },
    /// Also carries the first comment page and records the article in the reading history.
    FetchArticleDetailSuccess {
        token: RequestToken,
        article_id: ArticleId,
        detail: Box<ArticleDetail>,
        comments: MessageBatch,
    },
    FetchArticleDetailFailure {
        token: RequestToken,
        article_id: ArticleId,
    },
    DeleteArticleHistory {
        article_id: ArticleId,
    },
    DeleteAllArticleHistory,
    LikeArticleSuccess {
        article_id: ArticleId,
    },
    BlockArticle {
        article_id: ArticleId,
    },

    StartFetchMessages {
        token: RequestToken,
        channel_id: ChannelId,
    },
    FetchMessagesSuccess {
        token: RequestToken,
        batch: MessageBatch,
    },
    FetchMessagesFailure {
        token: RequestToken,
        channel_id: ChannelId,
    },
    LikeCommentSuccess {
        message_id: MessageId,
        user_id: UserId,
    },
    RemoveLikeCommentSuccess {
        message_id: MessageId,
        user_id: UserId,
    },
    StartSendMessage {
        token: RequestToken,
        channel_id: ChannelId,
        nonce: String,
    },
    SendMessageSuccess {
        token: RequestToken,
        sent: Box<SentMessage>,
    },
    SendMessageFailure {
        token: RequestToken,
        channel_id: ChannelId,
        nonce: String,
    },

    StartFetchEvents {
        token: RequestToken,
        tab: EventTab,
    },
    FetchEventsSuccess {
        token: RequestToken,
        tab: EventTab,
        page: u32,
        events: Vec<LiveEvent>,
        has_more: bool,
    },
    FetchEventsFailure {
        token: RequestToken,
        tab: EventTab,
    },
    StartFetchEventDetail {
        token: RequestToken,
        event_id: EventId,
    },
    FetchEventDetailSuccess {
        token: RequestToken,
        event: LiveEvent,
    },
    FetchEventDetailFailure {
        token: RequestToken,
        event_id: EventId,
    },
    StartJoinEvent {
        token: RequestToken,
        event_id: EventId,
    },
    JoinEventSuccess {
        token: RequestToken,
        event_id: EventId,
    },
    JoinEventFailure {
        token: RequestToken,
        event_id: EventId,
    },

    StartFetchUserProfile {
        token: RequestToken,
        user_id: UserId,
    },
    FetchUserProfileSuccess {
        token: RequestToken,
        user_id: UserId,
        user: User,
    },
    FetchUserProfileFailure {
        token: RequestToken,
        user_id: UserId,
    },
    StartFetchUserArticles {
        token: RequestToken,
        user_id: UserId,
    },
    FetchUserArticlesSuccess {
        token: RequestToken,
        user_id: UserId,
        page: u32,
        articles: Vec<Article>,
        has_more: bool,
    },
    FetchUserArticlesFailure {
        token: RequestToken,
        user_id: UserId,
    },
    /// Shared by follow and unfollow; the later request for a user wins.
    StartFollowUser {
        token: RequestToken,
        user_id: UserId,
    },
    FollowUserSuccess {
        token: RequestToken,
        user_id: UserId,
        following: bool,
    },
    FollowUserFailure {
        token: RequestToken,
        user_id: UserId,
    },

    StartFetchNotifications {
        token: RequestToken,
    },
    FetchNotificationsSuccess {
        token: RequestToken,
        page: u32,
        page_total: u32,
        notifications: Vec<Notification>,
    },
    FetchNotificationsFailure {
        token: RequestToken,
    },

    StartFetchChannelMembers {
        token: RequestToken,
        channel_id: ChannelId,
    },
    FetchChannelMembersSuccess {
        token: RequestToken,
        channel: ChannelView,
        offset: u32,
        members: Vec<ChannelMember>,
        total: u32,
    },
    FetchChannelMembersFailure {
        token: RequestToken,
        channel_id: ChannelId,
    },

    StartReportItem {
        token: RequestToken,
        item_id: String,
    },
    ReportItemSuccess {
        token: RequestToken,
        item_id: String,
    },
    ReportItemFailure {
        token: RequestToken,
        item_id: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddCount { .. } => "add_count",
            Action::LoginChangeEmail { .. } => "login_change_email",
            Action::LoginChangePassword { .. } => "login_change_password",
            Action::StartLogin { .. } => "start_login",
            Action::LoginSuccess { .. } => "login_success",
            Action::LoginFailure { .. } => "login_failure",
            Action::Logout => "logout",
            Action::ShowChatWindow { .. } => "show_chat_window",
            Action::ChatWindowStatus { .. } => "chat_window_status",
            Action::NavigateToEvent { .. } => "navigate_to_event",
            Action::ClearEventDetail => "clear_event_detail",
            Action::MergeUsers(_) => "merge_users",
            Action::MergeTeams(_) => "merge_teams",
            Action::MergePlaces(_) => "merge_places",
            Action::MergeFollows(_) => "merge_follows",
            Action::MergeLikes(_) => "merge_likes",
            Action::StartFetchArticles { .. } => "start_fetch_articles",
            Action::FetchArticlesSuccess { .. } => "fetch_articles_success",
            Action::FetchArticlesFailure { .. } => "fetch_articles_failure",
            Action::StartFetchFollowArticles { .. } => "start_fetch_follow_articles",
            Action::FetchFollowArticlesSuccess { .. } => "fetch_follow_articles_success",
            Action::FetchFollowArticlesFailure { .. } => "fetch_follow_articles_failure",
            Action::StartFetchArticleDetail { .. } => "start_fetch_article_detail",
            Action::FetchArticleDetailSuccess { .. } => "fetch_article_detail_success",
            Action::FetchArticleDetailFailure { .. } => "fetch_article_detail_failure",
            Action::DeleteArticleHistory { .. } => "delete_article_history",
            Action::DeleteAllArticleHistory => "delete_all_article_history",
            Action::LikeArticleSuccess { .. } => "like_article_success",
            Action::BlockArticle { .. } => "block_article",
            Action::StartFetchMessages { .. } => "start_fetch_messages",
            Action::FetchMessagesSuccess { .. } => "fetch_messages_success",
            Action::FetchMessagesFailure { .. } => "fetch_messages_failure",
            Action::LikeCommentSuccess { .. } => "like_comment_success",
            Action::RemoveLikeCommentSuccess { .. } => "remove_like_comment_success",
            Action::StartSendMessage { .. } => "start_send_message",
            Action::SendMessageSuccess { .. } => "send_message_success",
            Action::SendMessageFailure { .. } => "send_message_failure",
            Action::StartFetchEvents { .. } => "start_fetch_events",
            Action::FetchEventsSuccess { .. } => "fetch_events_success",
            Action::FetchEventsFailure { .. } => "fetch_events_failure",
            Action::StartFetchEventDetail { .. } => "start_fetch_event_detail",
            Action::FetchEventDetailSuccess { .. } => "fetch_event_detail_success",
            Action::FetchEventDetailFailure { .. } => "fetch_event_detail_failure",
            Action::StartJoinEvent { .. } => "start_join_event",
            Action::JoinEventSuccess { .. } => "join_event_success",
            Action::JoinEventFailure { .. } => "join_event_failure",
            Action::StartFetchUserProfile { .. } => "start_fetch_user_profile",
            Action::FetchUserProfileSuccess { .. } => "fetch_user_profile_success",
            Action::FetchUserProfileFailure { .. } => "fetch_user_profile_failure",
            Action::StartFetchUserArticles { .. } => "start_fetch_user_articles",
            Action::FetchUserArticlesSuccess { .. } => "fetch_user_articles_success",
            Action::FetchUserArticlesFailure { .. } => "fetch_user_articles_failure",
            Action::StartFollowUser { .. } => "start_follow_user",
            Action::FollowUserSuccess { .. } => "follow_user_success",
            Action::FollowUserFailure { .. } => "follow_user_failure",
            Action::StartFetchNotifications { .. } => "start_fetch_notifications",
            Action::FetchNotificationsSuccess { .. } => "fetch_notifications_success",
            Action::FetchNotificationsFailure { .. } => "fetch_notifications_failure",
            Action::StartFetchChannelMembers { .. } => "start_fetch_channel_members",
            Action::FetchChannelMembersSuccess { .. } => "fetch_channel_members_success",
            Action::FetchChannelMembersFailure { .. } => "fetch_channel_members_failure",
            Action::StartReportItem { .. } => "start_report_item",
            Action::ReportItemSuccess { .. } => "report_item_success",
            Action::ReportItemFailure { .. } => "report_item_failure",
        }
    }
}
