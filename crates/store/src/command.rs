//! Asynchronous operations the presentation layer can request from [`crate::effects::Effects`].

use shared::domain::{ArticleId, ChannelId, EventId, EventTab, MessageId, ReportItemType, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddCount {
        number: i64,
    },
    LoginByEmail {
        email: String,
        password: String,
    },
    Logout,

    FetchArticles {
        offset: u32,
    },
    FetchFollowArticles {
        page: u32,
    },
    FetchArticleDetail {
        article_id: ArticleId,
        is_push: bool,
    },
    /// `before: None` reloads the newest page.
    FetchArticleComments {
        channel_id: ChannelId,
        before: Option<MessageId>,
    },
    LikeArticle {
        article_id: ArticleId,
    },
    LikeComment {
        message_id: MessageId,
    },
    RemoveLikeComment {
        message_id: MessageId,
    },
    SendComment {
        article_id: ArticleId,
        channel_id: ChannelId,
        content: String,
        parent_message_id: Option<MessageId>,
        upper_message_id: Option<MessageId>,
    },
    BlockArticle {
        article_id: ArticleId,
    },
    DeleteArticleHistory {
        article_id: ArticleId,
    },
    DeleteAllArticleHistory,

    FetchEvents {
        tab: EventTab,
        page: u32,
    },
    FetchEventDetail {
        event_id: EventId,
    },
    JoinEvent {
        event_id: EventId,
    },
    FetchMessages {
        channel_id: ChannelId,
        before: Option<MessageId>,
    },
    SendMessage {
        channel_id: ChannelId,
        content: String,
    },

    FetchUserProfile {
        user_id: UserId,
    },
    FetchUserArticles {
        user_id: UserId,
        page: u32,
    },
    FollowUser {
        user_id: UserId,
    },
    UnfollowUser {
        user_id: UserId,
    },

    FetchNotifications {
        page: u32,
    },
    FetchChannelMembers {
        channel_id: ChannelId,
        offset: u32,
    },
    ReportItem {
        item_id: String,
        item_type: ReportItemType,
        reason: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddCount { .. } => "add_count",
            Command::LoginByEmail { .. } => "login_by_email",
            Command::Logout => "logout",
            Command::FetchArticles { .. } => "fetch_articles",
            Command::FetchFollowArticles { .. } => "fetch_follow_articles",
            Command::FetchArticleDetail { .. } => "fetch_article_detail",
            Command::FetchArticleComments { .. } => "fetch_article_comments",
            Command::LikeArticle { .. } => "like_article",
            Command::LikeComment { .. } => "like_comment",
            Command::RemoveLikeComment { .. } => "remove_like_comment",
            Command::SendComment { .. } => "send_comment",
            Command::BlockArticle { .. } => "block_article",
            Command::DeleteArticleHistory { .. } => "delete_article_history",
            Command::DeleteAllArticleHistory => "delete_all_article_history",
            Command::FetchEvents { .. } => "fetch_events",
            Command::FetchEventDetail { .. } => "fetch_event_detail",
            Command::JoinEvent { .. } => "join_event",
            Command::FetchMessages { .. } => "fetch_messages",
            Command::SendMessage { .. } => "send_message",
            Command::FetchUserProfile { .. } => "fetch_user_profile",
            Command::FetchUserArticles { .. } => "fetch_user_articles",
            Command::FollowUser { .. } => "follow_user",
            Command::UnfollowUser { .. } => "unfollow_user",
            Command::FetchNotifications { .. } => "fetch_notifications",
            Command::FetchChannelMembers { .. } => "fetch_channel_members",
            Command::ReportItem { .. } => "report_item",
        }
    }

    /// Commands that need a signed-in session.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Command::FetchFollowArticles { .. }
                | Command::LikeArticle { .. }
                | Command::LikeComment { .. }
                | Command::RemoveLikeComment { .. }
                | Command::SendComment { .. }
                | Command::JoinEvent { .. }
                | Command::SendMessage { .. }
                | Command::FollowUser { .. }
                | Command::UnfollowUser { .. }
                | Command::FetchNotifications { .. }
                | Command::ReportItem { .. }
        )
    }
}
