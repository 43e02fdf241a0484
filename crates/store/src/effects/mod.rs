//! Effects: run one remote call per [`Command`] and turn the outcome into store actions.
//!
//! Effects never touch the state directly. Every command dispatches its start action, awaits the
//! API, dispatches entity merges before the terminal action, and finally flushes the store so the
//! returned future resolves only once all of its actions are applied.

mod articles;
mod events;
mod messages;
mod session;
mod social;

use std::{collections::HashMap, sync::Arc};

use client_core::{ClientError, ConnectApi};
use shared::{
    domain::{ArticleId, PlaceId, TeamId, UserId},
    model::{Place, Team, User},
};
use storage::Preferences;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    action::Action,
    bus::{BusEvent, EventBus, NoticeLevel},
    command::Command,
    runtime::{StoreClosed, StoreHandle},
};

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("sign in required")]
    NotLoggedIn,
    #[error("api request failed: {0}")]
    Api(#[from] ClientError),
    #[error(transparent)]
    StoreClosed(#[from] StoreClosed),
    #[error("failed to persist preferences: {0:#}")]
    Preferences(anyhow::Error),
}

/// Entity maps that ride along with most responses.
#[derive(Debug, Default)]
pub(crate) struct Related {
    pub users: HashMap<UserId, User>,
    pub teams: HashMap<TeamId, Team>,
    pub places: HashMap<PlaceId, Place>,
    pub follows: HashMap<String, bool>,
    pub likes: HashMap<ArticleId, bool>,
}

#[derive(Clone)]
pub struct Effects {
    api: Arc<dyn ConnectApi>,
    store: StoreHandle,
    prefs: Arc<dyn Preferences>,
    bus: EventBus,
}

impl Effects {
    pub fn new(
        api: Arc<dyn ConnectApi>,
        store: StoreHandle,
        prefs: Arc<dyn Preferences>,
        bus: EventBus,
    ) -> Self {
        Self {
            api,
            store,
            prefs,
            bus,
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub async fn run(&self, command: Command) -> Result<(), EffectError> {
        let name = command.name();
        if command.requires_login() {
            self.require_login(name)?;
        }
        debug!(command = name, "running command");

        let result = match command {
            Command::AddCount { number } => self.add_count(number).await,
            Command::LoginByEmail { email, password } => self.login_by_email(email, password).await,
            Command::Logout => self.logout().await,
            Command::FetchArticles { offset } => self.fetch_articles(offset).await,
            Command::FetchFollowArticles { page } => self.fetch_follow_articles(page).await,
            Command::FetchArticleDetail {
                article_id,
                is_push,
            } => self.fetch_article_detail(article_id, is_push).await,
            Command::FetchArticleComments { channel_id, before } => {
                self.fetch_channel_page(name, channel_id, before, true).await
            }
            Command::LikeArticle { article_id } => self.like_article(article_id).await,
            Command::LikeComment { message_id } => self.like_comment(message_id, true).await,
            Command::RemoveLikeComment { message_id } => {
                self.like_comment(message_id, false).await
            }
            Command::SendComment {
                article_id,
                channel_id,
                content,
                parent_message_id,
                upper_message_id,
            } => {
                self.send(
                    name,
                    channel_id,
                    content,
                    Some(article_id),
                    parent_message_id,
                    upper_message_id,
                )
                .await
            }
            Command::BlockArticle { article_id } => self.block_article(article_id).await,
            Command::DeleteArticleHistory { article_id } => {
                self.edit_history(Action::DeleteArticleHistory { article_id })
                    .await
            }
            Command::DeleteAllArticleHistory => {
                self.edit_history(Action::DeleteAllArticleHistory).await
            }
            Command::FetchEvents { tab, page } => self.fetch_events(tab, page).await,
            Command::FetchEventDetail { event_id } => self.fetch_event_detail(event_id).await,
            Command::JoinEvent { event_id } => self.join_event(event_id).await,
            Command::FetchMessages { channel_id, before } => {
                self.fetch_channel_page(name, channel_id, before, false).await
            }
            Command::SendMessage {
                channel_id,
                content,
            } => self.send(name, channel_id, content, None, None, None).await,
            Command::FetchUserProfile { user_id } => self.fetch_user_profile(user_id).await,
            Command::FetchUserArticles { user_id, page } => {
                self.fetch_user_articles(user_id, page).await
            }
            Command::FollowUser { user_id } => self.follow(user_id, true).await,
            Command::UnfollowUser { user_id } => self.follow(user_id, false).await,
            Command::FetchNotifications { page } => self.fetch_notifications(page).await,
            Command::FetchChannelMembers { channel_id, offset } => {
                self.fetch_channel_members(channel_id, offset).await
            }
            Command::ReportItem {
                item_id,
                item_type,
                reason,
            } => self.report_item(item_id, item_type, reason).await,
        };

        self.store.flush().await?;
        result
    }

    fn require_login(&self, command: &'static str) -> Result<(), EffectError> {
        if self.store.state().login.is_logged_in {
            return Ok(());
        }
        info!(command, "command needs a signed-in user");
        self.bus.publish(BusEvent::LoginRequired { command });
        Err(EffectError::NotLoggedIn)
    }

    fn viewer(&self) -> Result<UserId, EffectError> {
        self.store
            .state()
            .login
            .current_user_id()
            .cloned()
            .ok_or(EffectError::NotLoggedIn)
    }

    fn dispatch(&self, action: Action) -> Result<(), EffectError> {
        Ok(self.store.dispatch(action)?)
    }

    fn merge(&self, related: Related) -> Result<(), EffectError> {
        let Related {
            users,
            teams,
            places,
            follows,
            likes,
        } = related;
        if !users.is_empty() {
            self.dispatch(Action::MergeUsers(users))?;
        }
        if !teams.is_empty() {
            self.dispatch(Action::MergeTeams(teams))?;
        }
        if !places.is_empty() {
            self.dispatch(Action::MergePlaces(places))?;
        }
        if !follows.is_empty() {
            self.dispatch(Action::MergeFollows(follows))?;
        }
        if !likes.is_empty() {
            self.dispatch(Action::MergeLikes(likes))?;
        }
        Ok(())
    }

    /// Records a failed API call: failure action, log line, user-facing notice.
    fn fail(
        &self,
        command: &'static str,
        failure: Action,
        err: ClientError,
    ) -> Result<(), EffectError> {
        self.dispatch(failure)?;
        warn!(command, status = ?err.status(), error = %err, "api call failed");
        if err.requires_reauth() {
            self.bus.publish(BusEvent::LoginRequired { command });
        }
        let message = if err.is_network() {
            "network unavailable, check your connection".to_string()
        } else {
            format!("{command} failed: {err}")
        };
        self.bus.notice(NoticeLevel::Error, message);
        Err(EffectError::Api(err))
    }
}

#[cfg(test)]
#[path = "../tests/effects_tests.rs"]
mod tests;
