use std::collections::{BTreeSet, HashMap};

use shared::{
    domain::{
        ArticleId, ChannelId, EventId, EventTab, MemberId, MessageId, NotificationId, PlaceId,
        TeamId, UserId,
    },
    model::{
        Article, ArticleDetail, ChannelMember, ChannelView, LiveEvent, LoginInfo, Message,
        Notification, Place, Team, User,
    },
};

use crate::request::RequestTracker;

pub const HISTORY_LIMIT: usize = 50;

/// The whole application state. Only the reducer mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub count: i64,
    pub login: LoginState,
    pub articles: ArticleState,
    pub messages: MessageState,
    pub events: EventState,
    pub users: UserState,
    pub teams: HashMap<TeamId, Team>,
    pub places: HashMap<PlaceId, Place>,
    pub follows: FollowState,
    pub notifications: NotificationState,
    pub channels: ChannelState,
    pub requests: RequestTracker,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub is_logged_in: bool,
    pub info: Option<LoginInfo>,
}

impl LoginState {
    pub fn current_user_id(&self) -> Option<&UserId> {
        if !self.is_logged_in {
            return None;
        }
        self.info.as_ref().map(|info| &info.user_id)
    }
}

/// Ordered ids of a paginated list. Ids only ever get appended or prepended.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed<Id> {
    pub ids: Vec<Id>,
    /// Last page loaded, for lists the server pages by number.
    pub page: u32,
    /// Server offset of the next page, for lists the server pages by offset. Counts every item
    /// the server returned, including ones left out of `ids`.
    pub next_offset: u32,
    pub has_more: bool,
}

impl<Id> Default for Feed<Id> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            page: 0,
            next_offset: 0,
            has_more: false,
        }
    }
}

impl<Id: PartialEq> Feed<Id> {
    /// Starts the list over, as a first-page refresh does.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = Id>) {
        self.ids.clear();
        self.append(ids);
    }

    pub fn append(&mut self, ids: impl IntoIterator<Item = Id>) {
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn prepend(&mut self, id: Id) {
        if !self.ids.contains(&id) {
            self.ids.insert(0, id);
        }
    }

    pub fn remove(&mut self, id: &Id) {
        self.ids.retain(|existing| existing != id);
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleState {
    pub article_dict: HashMap<ArticleId, Article>,
    pub detail_dict: HashMap<ArticleId, ArticleDetail>,
    pub recommend: Feed<ArticleId>,
    pub follow_projects: Feed<ArticleId>,
    pub follow_hottests: Feed<ArticleId>,
    pub like_dict: HashMap<ArticleId, bool>,
    /// Most recently read first.
    pub history: Vec<Article>,
    pub blocked: BTreeSet<ArticleId>,
}

impl ArticleState {
    pub fn is_liked(&self, article_id: &ArticleId) -> bool {
        self.like_dict.get(article_id).copied().unwrap_or(false)
    }
}

/// Paging cursor of one channel's message list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelCursor {
    pub has_more: bool,
    pub oldest_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageState {
    pub message_dict: HashMap<MessageId, Message>,
    /// Top-level messages per channel, newest first.
    pub channel_messages: HashMap<ChannelId, Feed<MessageId>>,
    pub cursors: HashMap<ChannelId, ChannelCursor>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventState {
    pub event_dict: HashMap<EventId, LiveEvent>,
    pub tabs: HashMap<EventTab, Feed<EventId>>,
    pub detail_id: Option<EventId>,
    pub channel_id: Option<ChannelId>,
    pub show_chat_window: bool,
    pub open_chat_window: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserState {
    pub user_dict: HashMap<UserId, User>,
    pub slug_dict: HashMap<String, UserId>,
    pub user_articles: HashMap<UserId, Feed<ArticleId>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowState {
    /// Follow flags per signed-in user, keyed by followed user or team id.
    pub follow_dict: HashMap<UserId, HashMap<String, bool>>,
}

impl FollowState {
    pub fn is_following(&self, viewer: &UserId, target: &str) -> bool {
        self.follow_dict
            .get(viewer)
            .and_then(|map| map.get(target))
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    pub notification_dict: HashMap<NotificationId, Notification>,
    pub feed: Feed<NotificationId>,
    pub page_total: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    pub channel_dict: HashMap<ChannelId, ChannelView>,
    pub member_dict: HashMap<MemberId, ChannelMember>,
    pub members: HashMap<ChannelId, Feed<MemberId>>,
}
