//! Pure projections of [`AppState`] into per-screen snapshots.
//!
//! Ids whose entity is missing are skipped in lists and project to `None` for single lookups.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    domain::{ArticleId, ChannelId, EventId, EventTab, MessageId, UserId},
    model::{
        Article, ChannelMember, ChannelView, LiveEvent, Message, Notification, Place, Team, User,
    },
};

use crate::{
    request::RequestKey,
    state::{AppState, Feed},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleCard {
    pub article: Article,
    pub author: Option<User>,
    pub team: Option<Team>,
    pub liked: bool,
    pub author_followed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub id: MessageId,
    pub author: User,
    pub content: String,
    pub like_count: usize,
    pub liked: bool,
    pub deleted: bool,
    pub created_time: Option<DateTime<Utc>>,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticlesViewModel {
    pub articles: Vec<ArticleCard>,
    pub has_more: bool,
    pub next_offset: u32,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowArticlesViewModel {
    pub is_logged_in: bool,
    pub projects: Vec<ArticleCard>,
    pub project_has_more: bool,
    pub hottests: Vec<ArticleCard>,
    pub hottest_has_more: bool,
    pub page: u32,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleDetailViewModel {
    pub article: Option<ArticleCard>,
    pub body: String,
    pub channel_id: Option<ChannelId>,
    pub comments: Vec<CommentView>,
    pub has_more_comments: bool,
    pub blocked: bool,
    pub is_loading: bool,
    pub is_loading_comments: bool,
    pub is_sending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryViewModel {
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCard {
    pub event: LiveEvent,
    pub host: Option<User>,
    pub place: Option<Place>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsViewModel {
    pub tab: EventTab,
    pub events: Vec<EventCard>,
    pub page: u32,
    pub has_more: bool,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDetailViewModel {
    pub event: Option<EventCard>,
    pub messages: Vec<CommentView>,
    pub has_more_messages: bool,
    pub show_chat_window: bool,
    pub open_chat_window: bool,
    pub is_loading: bool,
    pub is_joining: bool,
    pub is_sending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMessagesViewModel {
    pub channel_id: ChannelId,
    pub messages: Vec<CommentView>,
    pub has_more: bool,
    pub is_loading: bool,
    pub is_sending: bool,
}

/// How a profile screen names its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(UserId),
    Slug(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDetailViewModel {
    pub user: Option<User>,
    pub is_self: bool,
    pub is_following: bool,
    pub articles: Vec<ArticleCard>,
    pub page: u32,
    pub has_more: bool,
    pub is_loading: bool,
    pub is_follow_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalViewModel {
    pub is_logged_in: bool,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub avatar: Option<String>,
    pub user: Option<User>,
    pub count: i64,
    pub history_count: usize,
    pub is_logging_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    pub member: ChannelMember,
    pub is_following: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMembersViewModel {
    pub channel: Option<ChannelView>,
    pub members: Vec<MemberView>,
    pub has_more: bool,
    pub next_offset: u32,
    pub viewer_is_admin: bool,
    pub is_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationView {
    pub notification: Notification,
    pub actor: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationsViewModel {
    pub notifications: Vec<NotificationView>,
    pub unread: usize,
    pub page: u32,
    pub page_total: u32,
    pub has_more: bool,
    pub is_loading: bool,
}

fn viewer(state: &AppState) -> Option<&UserId> {
    state.login.current_user_id()
}

fn is_following(state: &AppState, target: &str) -> bool {
    viewer(state).is_some_and(|viewer| state.follows.is_following(viewer, target))
}

fn article_card(state: &AppState, article: &Article) -> ArticleCard {
    let team = article
        .team_id
        .as_ref()
        .and_then(|team_id| state.teams.get(team_id))
        .cloned();
    let followed_id = match &team {
        Some(team) => team.id.as_str(),
        None => article.user_id.as_str(),
    };
    ArticleCard {
        article: article.clone(),
        author: state.users.user_dict.get(&article.user_id).cloned(),
        author_followed: is_following(state, followed_id),
        team,
        liked: state.articles.is_liked(&article.id),
    }
}

fn article_cards(state: &AppState, feed: &Feed<ArticleId>) -> Vec<ArticleCard> {
    feed.ids
        .iter()
        .filter(|id| !state.articles.blocked.contains(*id))
        .filter_map(|id| state.articles.article_dict.get(id))
        .map(|article| article_card(state, article))
        .collect()
}

fn comment_view(state: &AppState, message: &Message, with_replies: bool) -> CommentView {
    let author = state
        .users
        .user_dict
        .get(&message.author.id)
        .cloned()
        .unwrap_or_else(|| message.author.clone());
    let replies = if with_replies {
        message
            .reply_message_ids
            .iter()
            .filter_map(|id| state.messages.message_dict.get(id))
            .map(|reply| comment_view(state, reply, false))
            .collect()
    } else {
        Vec::new()
    };
    CommentView {
        id: message.id.clone(),
        author,
        content: message.content.clone(),
        like_count: message.like_count(),
        liked: viewer(state).is_some_and(|viewer| message.liked_by(viewer)),
        deleted: message.deleted,
        created_time: message.created_time,
        replies,
    }
}

fn channel_comments(state: &AppState, channel_id: &ChannelId) -> (Vec<CommentView>, bool) {
    let comments = state
        .messages
        .channel_messages
        .get(channel_id)
        .map(|feed| {
            feed.ids
                .iter()
                .filter_map(|id| state.messages.message_dict.get(id))
                .map(|message| comment_view(state, message, true))
                .collect()
        })
        .unwrap_or_default();
    let has_more = state
        .messages
        .cursors
        .get(channel_id)
        .is_some_and(|cursor| cursor.has_more);
    (comments, has_more)
}

fn event_card(state: &AppState, event: &LiveEvent) -> EventCard {
    EventCard {
        event: event.clone(),
        host: state.users.user_dict.get(&event.user_id).cloned(),
        place: event
            .place_id
            .as_ref()
            .and_then(|place_id| state.places.get(place_id))
            .cloned(),
    }
}

pub fn articles_view_model(state: &AppState) -> ArticlesViewModel {
    let feed = &state.articles.recommend;
    ArticlesViewModel {
        articles: article_cards(state, feed),
        has_more: feed.has_more,
        next_offset: feed.next_offset,
        is_loading: state.requests.is_pending(&RequestKey::Articles),
    }
}

pub fn follow_articles_view_model(state: &AppState) -> FollowArticlesViewModel {
    let articles = &state.articles;
    FollowArticlesViewModel {
        is_logged_in: state.login.is_logged_in,
        projects: article_cards(state, &articles.follow_projects),
        project_has_more: articles.follow_projects.has_more,
        hottests: article_cards(state, &articles.follow_hottests),
        hottest_has_more: articles.follow_hottests.has_more,
        page: articles.follow_projects.page,
        is_loading: state.requests.is_pending(&RequestKey::FollowArticles),
    }
}

pub fn article_detail_view_model(state: &AppState, article_id: &ArticleId) -> ArticleDetailViewModel {
    let detail = state.articles.detail_dict.get(article_id);
    let article = state
        .articles
        .article_dict
        .get(article_id)
        .or_else(|| detail.map(|detail| &detail.article));
    let channel_id = detail
        .map(|detail| detail.channel_id.clone())
        .or_else(|| article.map(|article| article.channel_id.clone()))
        .filter(|channel_id| !channel_id.is_empty());
    let (comments, has_more_comments) = channel_id
        .as_ref()
        .map(|channel_id| channel_comments(state, channel_id))
        .unwrap_or_default();

    ArticleDetailViewModel {
        article: article.map(|article| article_card(state, article)),
        body: detail.map(|detail| detail.body.clone()).unwrap_or_default(),
        comments,
        has_more_comments,
        blocked: state.articles.blocked.contains(article_id),
        is_loading: state
            .requests
            .is_pending(&RequestKey::ArticleDetail(article_id.clone())),
        is_loading_comments: channel_id.as_ref().is_some_and(|channel_id| {
            state
                .requests
                .is_pending(&RequestKey::Messages(channel_id.clone()))
        }),
        is_sending: channel_id
            .as_ref()
            .is_some_and(|channel_id| state.requests.is_sending(channel_id)),
        channel_id,
    }
}

pub fn history_view_model(state: &AppState) -> HistoryViewModel {
    HistoryViewModel {
        articles: state.articles.history.clone(),
    }
}

pub fn events_view_model(state: &AppState, tab: EventTab) -> EventsViewModel {
    let feed = state.events.tabs.get(&tab);
    EventsViewModel {
        tab,
        events: feed
            .map(|feed| {
                feed.ids
                    .iter()
                    .filter_map(|id| state.events.event_dict.get(id))
                    .map(|event| event_card(state, event))
                    .collect()
            })
            .unwrap_or_default(),
        page: feed.map_or(0, |feed| feed.page),
        has_more: feed.is_some_and(|feed| feed.has_more),
        is_loading: state.requests.is_pending(&RequestKey::Events(tab)),
    }
}

pub fn event_detail_view_model(state: &AppState, event_id: &EventId) -> EventDetailViewModel {
    let event = state.events.event_dict.get(event_id);
    let channel_id = event
        .map(|event| event.channel_id.clone())
        .filter(|channel_id| !channel_id.is_empty());
    let (messages, has_more_messages) = channel_id
        .as_ref()
        .map(|channel_id| channel_comments(state, channel_id))
        .unwrap_or_default();
    let is_current = state.events.detail_id.as_ref() == Some(event_id);

    EventDetailViewModel {
        event: event.map(|event| event_card(state, event)),
        messages,
        has_more_messages,
        show_chat_window: is_current && state.events.show_chat_window,
        open_chat_window: is_current && state.events.open_chat_window,
        is_loading: state
            .requests
            .is_pending(&RequestKey::EventDetail(event_id.clone())),
        is_joining: state
            .requests
            .is_pending(&RequestKey::JoinEvent(event_id.clone())),
        is_sending: channel_id
            .as_ref()
            .is_some_and(|channel_id| state.requests.is_sending(channel_id)),
    }
}

pub fn channel_messages_view_model(
    state: &AppState,
    channel_id: &ChannelId,
) -> ChannelMessagesViewModel {
    let (messages, has_more) = channel_comments(state, channel_id);
    ChannelMessagesViewModel {
        channel_id: channel_id.clone(),
        messages,
        has_more,
        is_loading: state
            .requests
            .is_pending(&RequestKey::Messages(channel_id.clone())),
        is_sending: state.requests.is_sending(channel_id),
    }
}

pub fn user_detail_view_model(state: &AppState, user: &UserRef) -> UserDetailViewModel {
    let user_id = match user {
        UserRef::Id(user_id) => Some(user_id.clone()),
        UserRef::Slug(slug) => state.users.slug_dict.get(slug).cloned(),
    };
    let Some(user_id) = user_id else {
        return UserDetailViewModel {
            user: None,
            is_self: false,
            is_following: false,
            articles: Vec::new(),
            page: 0,
            has_more: false,
            is_loading: false,
            is_follow_pending: false,
        };
    };
    let feed = state.users.user_articles.get(&user_id);

    UserDetailViewModel {
        user: state.users.user_dict.get(&user_id).cloned(),
        is_self: viewer(state) == Some(&user_id),
        is_following: is_following(state, user_id.as_str()),
        articles: feed
            .map(|feed| article_cards(state, feed))
            .unwrap_or_default(),
        page: feed.map_or(0, |feed| feed.page),
        has_more: feed.is_some_and(|feed| feed.has_more),
        is_loading: state
            .requests
            .is_pending(&RequestKey::UserProfile(user_id.clone()))
            || state
                .requests
                .is_pending(&RequestKey::UserArticles(user_id.clone())),
        is_follow_pending: state.requests.is_pending(&RequestKey::Follow(user_id)),
    }
}

pub fn personal_view_model(state: &AppState) -> PersonalViewModel {
    let info = state.login.info.as_ref().filter(|_| state.login.is_logged_in);
    PersonalViewModel {
        is_logged_in: state.login.is_logged_in,
        user_id: info.map(|info| info.user_id.clone()),
        user_name: info.map(|info| info.user_name.clone()),
        avatar: info.and_then(|info| info.user_avatar.clone()),
        user: info.and_then(|info| state.users.user_dict.get(&info.user_id).cloned()),
        count: state.count,
        history_count: state.articles.history.len(),
        is_logging_in: state.requests.is_pending(&RequestKey::Login),
    }
}

pub fn channel_members_view_model(
    state: &AppState,
    channel_id: &ChannelId,
) -> ChannelMembersViewModel {
    let channels = &state.channels;
    let feed = channels.members.get(channel_id);
    let members: Vec<MemberView> = feed
        .map(|feed| {
            feed.ids
                .iter()
                .filter_map(|id| channels.member_dict.get(id))
                .map(|member| MemberView {
                    member: member.clone(),
                    is_following: is_following(state, member.user.id.as_str()),
                })
                .collect()
        })
        .unwrap_or_default();
    let viewer_is_admin = viewer(state).is_some_and(|viewer| {
        members
            .iter()
            .any(|view| &view.member.user.id == viewer && view.member.role.is_admin())
    });

    ChannelMembersViewModel {
        channel: channels.channel_dict.get(channel_id).cloned(),
        members,
        has_more: feed.is_some_and(|feed| feed.has_more),
        next_offset: feed.map_or(0, |feed| feed.next_offset),
        viewer_is_admin,
        is_loading: state
            .requests
            .is_pending(&RequestKey::ChannelMembers(channel_id.clone())),
    }
}

pub fn notifications_view_model(state: &AppState) -> NotificationsViewModel {
    let slot = &state.notifications;
    let notifications: Vec<NotificationView> = slot
        .feed
        .ids
        .iter()
        .filter_map(|id| slot.notification_dict.get(id))
        .map(|notification| NotificationView {
            actor: notification
                .data
                .user_id
                .as_ref()
                .and_then(|user_id| state.users.user_dict.get(user_id))
                .cloned(),
            notification: notification.clone(),
        })
        .collect();

    NotificationsViewModel {
        unread: notifications
            .iter()
            .filter(|view| !view.notification.read)
            .count(),
        notifications,
        page: slot.feed.page,
        page_total: slot.page_total,
        has_more: slot.feed.has_more,
        is_loading: state.requests.is_pending(&RequestKey::Notifications),
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
