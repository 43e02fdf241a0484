//! The reducer: applies one [`Action`] to the state tree, synchronously and without I/O.

use shared::{
    domain::{ArticleId, UserId},
    model::{Article, Reaction, User, LIKE_REACTION},
};
use tracing::debug;

use crate::{
    action::{Action, MessageBatch, SentMessage},
    request::{RequestKey, RequestToken},
    state::{AppState, ChannelCursor, Feed, LoginState, HISTORY_LIMIT},
};

pub fn reduce(state: &mut AppState, action: Action) {
    let name = action.name();
    match action {
        Action::AddCount { number } => state.count += number,
        Action::LoginChangeEmail { text } => state.login.email = text,
        Action::LoginChangePassword { text } => state.login.password = text,
        Action::StartLogin { token } => start(state, RequestKey::Login, token, name),
        Action::LoginSuccess { token, info } => {
            if finish(state, RequestKey::Login, token, name) {
                state.login.is_logged_in = true;
                state.login.password.clear();
                state.login.info = Some(info);
            }
        }
        // A rejected attempt leaves any existing session alone.
        Action::LoginFailure { token } => {
            finish(state, RequestKey::Login, token, name);
        }
        Action::Logout => {
            if let Some(viewer) = state.login.current_user_id().cloned() {
                state.follows.follow_dict.remove(&viewer);
            }
            state.login = LoginState {
                email: std::mem::take(&mut state.login.email),
                ..LoginState::default()
            };
        }
        Action::ShowChatWindow { show } => {
            state.events.show_chat_window = show;
            if !show {
                state.events.open_chat_window = false;
            }
        }
        Action::ChatWindowStatus { open } => state.events.open_chat_window = open,
        Action::NavigateToEvent { event_id } => {
            state.events.channel_id = state
                .events
                .event_dict
                .get(&event_id)
                .map(|event| event.channel_id.clone());
            state.events.detail_id = Some(event_id);
            state.events.show_chat_window = false;
            state.events.open_chat_window = false;
        }
        Action::ClearEventDetail => {
            state.events.detail_id = None;
            state.events.channel_id = None;
            state.events.show_chat_window = false;
            state.events.open_chat_window = false;
        }

        Action::MergeUsers(users) => merge_users(state, users.into_values()),
        Action::MergeTeams(teams) => state.teams.extend(teams),
        Action::MergePlaces(places) => state.places.extend(places),
        Action::MergeFollows(follows) => match state.login.current_user_id().cloned() {
            Some(viewer) => state
                .follows
                .follow_dict
                .entry(viewer)
                .or_default()
                .extend(follows),
            None => debug!(action = name, "no signed-in user, follow flags dropped"),
        },
        Action::MergeLikes(likes) => state.articles.like_dict.extend(likes),

        Action::StartFetchArticles { token } => start(state, RequestKey::Articles, token, name),
        Action::FetchArticlesSuccess {
            token,
            offset,
            articles,
            has_more,
        } => {
            if finish(state, RequestKey::Articles, token, name) {
                let received = articles.len() as u32;
                let ids = merge_articles(state, articles);
                let feed = &mut state.articles.recommend;
                fill_feed(feed, offset == 0, ids);
                feed.next_offset = offset + received;
                feed.has_more = has_more;
            }
        }
        Action::FetchArticlesFailure { token } => {
            finish(state, RequestKey::Articles, token, name);
        }
        Action::StartFetchFollowArticles { token } => {
            start(state, RequestKey::FollowArticles, token, name)
        }
        Action::FetchFollowArticlesSuccess {
            token,
            page,
            projects,
            project_has_more,
            hottests,
            hottest_has_more,
        } => {
            if finish(state, RequestKey::FollowArticles, token, name) {
                let refresh = page <= 1;
                let project_ids = merge_articles(state, projects);
                let hottest_ids = merge_articles(state, hottests);
                let articles = &mut state.articles;
                fill_feed(&mut articles.follow_projects, refresh, project_ids);
                articles.follow_projects.page = page;
                articles.follow_projects.has_more = project_has_more;
                fill_feed(&mut articles.follow_hottests, refresh, hottest_ids);
                articles.follow_hottests.page = page;
                articles.follow_hottests.has_more = hottest_has_more;
            }
        }
        Action::FetchFollowArticlesFailure { token } => {
            finish(state, RequestKey::FollowArticles, token, name);
        }
        Action::StartFetchArticleDetail { token, article_id } => {
            start(state, RequestKey::ArticleDetail(article_id), token, name)
        }
        Action::FetchArticleDetailSuccess {
            token,
            article_id,
            detail,
            comments,
        } => {
            if finish(state, RequestKey::ArticleDetail(article_id.clone()), token, name) {
                let article = detail.article.clone();
                let articles = &mut state.articles;
                articles.article_dict.insert(article_id.clone(), article.clone());
                articles.like_dict.insert(article_id.clone(), detail.like);
                articles.detail_dict.insert(article_id, *detail);
                apply_message_batch(state, comments);
                save_history(state, article);
            }
        }
        Action::FetchArticleDetailFailure { token, article_id } => {
            finish(state, RequestKey::ArticleDetail(article_id), token, name);
        }
        Action::DeleteArticleHistory { article_id } => state
            .articles
            .history
            .retain(|article| article.id != article_id),
        Action::DeleteAllArticleHistory => state.articles.history.clear(),
        Action::LikeArticleSuccess { article_id } => like_article(state, article_id),
        Action::BlockArticle { article_id } => block_article(state, article_id),

        Action::StartFetchMessages { token, channel_id } => {
            start(state, RequestKey::Messages(channel_id), token, name)
        }
        Action::FetchMessagesSuccess { token, batch } => {
            if finish(state, RequestKey::Messages(batch.channel_id.clone()), token, name) {
                apply_message_batch(state, batch);
            }
        }
        Action::FetchMessagesFailure { token, channel_id } => {
            finish(state, RequestKey::Messages(channel_id), token, name);
        }
        Action::LikeCommentSuccess {
            message_id,
            user_id,
        } => {
            if let Some(message) = state.messages.message_dict.get_mut(&message_id) {
                if !message.liked_by(&user_id) {
                    message.reactions.push(Reaction {
                        kind: LIKE_REACTION.to_string(),
                        user_id,
                    });
                }
            }
        }
        Action::RemoveLikeCommentSuccess {
            message_id,
            user_id,
        } => {
            if let Some(message) = state.messages.message_dict.get_mut(&message_id) {
                message.reactions.retain(|reaction| {
                    !(reaction.kind == LIKE_REACTION && reaction.user_id == user_id)
                });
            }
        }
        Action::StartSendMessage {
            token,
            channel_id,
            nonce,
        } => start(
            state,
            RequestKey::SendMessage { channel_id, nonce },
            token,
            name,
        ),
        Action::SendMessageSuccess { token, sent } => {
            let key = RequestKey::SendMessage {
                channel_id: sent.channel_id.clone(),
                nonce: sent.nonce.clone(),
            };
            if finish(state, key, token, name) {
                apply_sent_message(state, *sent);
            }
        }
        Action::SendMessageFailure {
            token,
            channel_id,
            nonce,
        } => {
            finish(state, RequestKey::SendMessage { channel_id, nonce }, token, name);
        }

        Action::StartFetchEvents { token, tab } => start(state, RequestKey::Events(tab), token, name),
        Action::FetchEventsSuccess {
            token,
            tab,
            page,
            events,
            has_more,
        } => {
            if finish(state, RequestKey::Events(tab), token, name) {
                let ids: Vec<_> = events.iter().map(|event| event.id.clone()).collect();
                state
                    .events
                    .event_dict
                    .extend(events.into_iter().map(|event| (event.id.clone(), event)));
                let feed = state.events.tabs.entry(tab).or_default();
                fill_feed(feed, page <= 1, ids);
                feed.page = page;
                feed.has_more = has_more;
            }
        }
        Action::FetchEventsFailure { token, tab } => {
            finish(state, RequestKey::Events(tab), token, name);
        }
        Action::StartFetchEventDetail { token, event_id } => {
            start(state, RequestKey::EventDetail(event_id), token, name)
        }
        Action::FetchEventDetailSuccess { token, event } => {
            if finish(state, RequestKey::EventDetail(event.id.clone()), token, name) {
                if state.events.detail_id.as_ref() == Some(&event.id) {
                    state.events.channel_id = Some(event.channel_id.clone());
                }
                state.events.event_dict.insert(event.id.clone(), event);
            }
        }
        Action::FetchEventDetailFailure { token, event_id } => {
            finish(state, RequestKey::EventDetail(event_id), token, name);
        }
        Action::StartJoinEvent { token, event_id } => {
            start(state, RequestKey::JoinEvent(event_id), token, name)
        }
        Action::JoinEventSuccess { token, event_id } => {
            if finish(state, RequestKey::JoinEvent(event_id.clone()), token, name) {
                if let Some(event) = state.events.event_dict.get_mut(&event_id) {
                    if !event.user_is_checked_in {
                        event.user_is_checked_in = true;
                        event.participants_count += 1;
                    }
                }
            }
        }
        Action::JoinEventFailure { token, event_id } => {
            finish(state, RequestKey::JoinEvent(event_id), token, name);
        }

        Action::StartFetchUserProfile { token, user_id } => {
            start(state, RequestKey::UserProfile(user_id), token, name)
        }
        Action::FetchUserProfileSuccess {
            token,
            user_id,
            user,
        } => {
            if finish(state, RequestKey::UserProfile(user_id), token, name) {
                merge_users(state, std::iter::once(user));
            }
        }
        Action::FetchUserProfileFailure { token, user_id } => {
            finish(state, RequestKey::UserProfile(user_id), token, name);
        }
        Action::StartFetchUserArticles { token, user_id } => {
            start(state, RequestKey::UserArticles(user_id), token, name)
        }
        Action::FetchUserArticlesSuccess {
            token,
            user_id,
            page,
            articles,
            has_more,
        } => {
            if finish(state, RequestKey::UserArticles(user_id.clone()), token, name) {
                let ids = merge_articles(state, articles);
                let feed = state.users.user_articles.entry(user_id).or_default();
                fill_feed(feed, page <= 1, ids);
                feed.page = page;
                feed.has_more = has_more;
            }
        }
        Action::FetchUserArticlesFailure { token, user_id } => {
            finish(state, RequestKey::UserArticles(user_id), token, name);
        }
        Action::StartFollowUser { token, user_id } => {
            start(state, RequestKey::Follow(user_id), token, name)
        }
        Action::FollowUserSuccess {
            token,
            user_id,
            following,
        } => {
            if finish(state, RequestKey::Follow(user_id.clone()), token, name) {
                set_following(state, user_id, following);
            }
        }
        Action::FollowUserFailure { token, user_id } => {
            finish(state, RequestKey::Follow(user_id), token, name);
        }

        Action::StartFetchNotifications { token } => {
            start(state, RequestKey::Notifications, token, name)
        }
        Action::FetchNotificationsSuccess {
            token,
            page,
            page_total,
            notifications,
        } => {
            if finish(state, RequestKey::Notifications, token, name) {
                let ids: Vec<_> = notifications.iter().map(|item| item.id.clone()).collect();
                let slot = &mut state.notifications;
                slot.notification_dict
                    .extend(notifications.into_iter().map(|item| (item.id.clone(), item)));
                fill_feed(&mut slot.feed, page <= 1, ids);
                slot.feed.page = page;
                slot.feed.has_more = page < page_total;
                slot.page_total = page_total;
            }
        }
        Action::FetchNotificationsFailure { token } => {
            finish(state, RequestKey::Notifications, token, name);
        }

        Action::StartFetchChannelMembers { token, channel_id } => {
            start(state, RequestKey::ChannelMembers(channel_id), token, name)
        }
        Action::FetchChannelMembersSuccess {
            token,
            channel,
            offset,
            members,
            total,
        } => {
            if finish(state, RequestKey::ChannelMembers(channel.id.clone()), token, name) {
                let channel_id = channel.id.clone();
                let received = members.len() as u32;
                let ids: Vec<_> = members.iter().map(|member| member.id.clone()).collect();
                let channels = &mut state.channels;
                channels.channel_dict.insert(channel_id.clone(), channel);
                channels
                    .member_dict
                    .extend(members.into_iter().map(|member| (member.id.clone(), member)));
                let feed = channels.members.entry(channel_id).or_default();
                fill_feed(feed, offset == 0, ids);
                feed.next_offset = offset + received;
                feed.has_more = feed.next_offset < total;
            }
        }
        Action::FetchChannelMembersFailure { token, channel_id } => {
            finish(state, RequestKey::ChannelMembers(channel_id), token, name);
        }

        Action::StartReportItem { token, item_id } => {
            start(state, RequestKey::Report(item_id), token, name)
        }
        Action::ReportItemSuccess { token, item_id }
        | Action::ReportItemFailure { token, item_id } => {
            finish(state, RequestKey::Report(item_id), token, name);
        }
    }
}

fn start(state: &mut AppState, key: RequestKey, token: RequestToken, action: &'static str) {
    if !state.requests.start(key.clone(), token) {
        debug!(action, ?key, token = token.0, "newer request already in flight");
    }
}

/// Completes the request; `false` means the action is stale and must be ignored.
fn finish(state: &mut AppState, key: RequestKey, token: RequestToken, action: &'static str) -> bool {
    let current = state.requests.finish(&key, token);
    if !current {
        debug!(action, ?key, token = token.0, "dropping stale action");
    }
    current
}

fn fill_feed<Id: PartialEq>(feed: &mut Feed<Id>, refresh: bool, ids: Vec<Id>) {
    if refresh {
        feed.replace(ids);
    } else {
        feed.append(ids);
    }
}

fn merge_users(state: &mut AppState, users: impl IntoIterator<Item = User>) {
    for user in users {
        if !user.username.is_empty() {
            state
                .users
                .slug_dict
                .insert(user.username.clone(), user.id.clone());
        }
        state.users.user_dict.insert(user.id.clone(), user);
    }
}

/// Stores the articles and returns the ids of those not blocked, in order.
fn merge_articles(state: &mut AppState, articles: Vec<Article>) -> Vec<ArticleId> {
    let mut ids = Vec::with_capacity(articles.len());
    for article in articles {
        if !state.articles.blocked.contains(&article.id) {
            ids.push(article.id.clone());
        }
        state.articles.article_dict.insert(article.id.clone(), article);
    }
    ids
}

fn save_history(state: &mut AppState, article: Article) {
    if state.articles.blocked.contains(&article.id) {
        return;
    }
    let history = &mut state.articles.history;
    history.retain(|existing| existing.id != article.id);
    history.insert(0, article);
    history.truncate(HISTORY_LIMIT);
}

fn like_article(state: &mut AppState, article_id: ArticleId) {
    if state.articles.is_liked(&article_id) {
        return;
    }
    let articles = &mut state.articles;
    if let Some(article) = articles.article_dict.get_mut(&article_id) {
        article.like_count += 1;
    }
    if let Some(detail) = articles.detail_dict.get_mut(&article_id) {
        detail.like = true;
        detail.article.like_count += 1;
    }
    articles.like_dict.insert(article_id, true);
}

fn block_article(state: &mut AppState, article_id: ArticleId) {
    let articles = &mut state.articles;
    articles.recommend.remove(&article_id);
    articles.follow_projects.remove(&article_id);
    articles.follow_hottests.remove(&article_id);
    articles.history.retain(|article| article.id != article_id);
    for feed in state.users.user_articles.values_mut() {
        feed.remove(&article_id);
    }
    articles.blocked.insert(article_id);
}

fn apply_message_batch(state: &mut AppState, batch: MessageBatch) {
    let MessageBatch {
        channel_id,
        item_ids,
        messages,
        has_more,
        oldest_message_id,
        is_refresh,
    } = batch;
    let slot = &mut state.messages;
    slot.message_dict.extend(messages);
    fill_feed(
        slot.channel_messages.entry(channel_id.clone()).or_default(),
        is_refresh,
        item_ids,
    );
    let cursor: &mut ChannelCursor = slot.cursors.entry(channel_id).or_default();
    cursor.has_more = has_more;
    // An older page without a cursor keeps the previous one.
    if is_refresh || oldest_message_id.is_some() {
        cursor.oldest_message_id = oldest_message_id;
    }
}

fn apply_sent_message(state: &mut AppState, sent: SentMessage) {
    let SentMessage {
        message,
        channel_id,
        article_id,
        parent_message_id,
        ..
    } = sent;
    let message_id = message.id.clone();
    let slot = &mut state.messages;
    slot.message_dict.insert(message_id.clone(), message);

    match parent_message_id.and_then(|parent| slot.message_dict.get_mut(&parent)) {
        Some(parent) => {
            if !parent.reply_message_ids.contains(&message_id) {
                parent.reply_message_ids.push(message_id);
            }
        }
        None => slot
            .channel_messages
            .entry(channel_id)
            .or_default()
            .prepend(message_id),
    }

    if let Some(article_id) = article_id {
        if let Some(article) = state.articles.article_dict.get_mut(&article_id) {
            article.comment_count += 1;
        }
        if let Some(detail) = state.articles.detail_dict.get_mut(&article_id) {
            detail.article.comment_count += 1;
        }
    }
}

fn set_following(state: &mut AppState, target: UserId, following: bool) {
    let Some(viewer) = state.login.current_user_id().cloned() else {
        debug!(user_id = %target, "follow result without a signed-in user");
        return;
    };
    if state.follows.is_following(&viewer, target.as_str()) == following {
        return;
    }
    state
        .follows
        .follow_dict
        .entry(viewer.clone())
        .or_default()
        .insert(target.to_string(), following);

    let users = &mut state.users.user_dict;
    if let Some(user) = users.get_mut(&target) {
        user.followers_count = adjust(user.followers_count, following);
    }
    if let Some(user) = users.get_mut(&viewer) {
        user.following_users_count = adjust(user.following_users_count, following);
    }
}

fn adjust(count: u32, increment: bool) -> u32 {
    if increment {
        count + 1
    } else {
        count.saturating_sub(1)
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
