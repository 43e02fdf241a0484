use shared::domain::UserId;
use tracing::{debug, info, warn};

use super::{EffectError, Effects, Related};
use crate::{
    action::Action,
    bus::{BusEvent, NoticeLevel},
    persist,
};

impl Effects {
    pub(super) async fn login_by_email(
        &self,
        email: String,
        password: String,
    ) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::LoginChangeEmail {
            text: email.clone(),
        })?;
        self.dispatch(Action::StartLogin { token })?;

        match self.api.login_by_email(&email, &password).await {
            Ok(info) => {
                let user_id = info.user_id.clone();
                self.dispatch(Action::LoginSuccess {
                    token,
                    info: info.clone(),
                })?;
                self.store.flush().await?;
                if self.store.state().login.info.as_ref() != Some(&info) {
                    debug!(user_id = %user_id, "superseded login response ignored");
                    return Ok(());
                }

                if let Err(err) = persist::save_login(self.prefs.as_ref(), Some(&info)).await {
                    warn!(error = %err, "failed to persist session");
                }
                info!(user_id = %user_id, "login succeeded");
                self.bus.publish(BusEvent::LoginSucceeded { user_id });
                Ok(())
            }
            Err(err) => self.fail("login_by_email", Action::LoginFailure { token }, err),
        }
    }

    /// Local sign-out always happens, even when the server call fails.
    pub(super) async fn logout(&self) -> Result<(), EffectError> {
        if let Err(err) = self.api.logout().await {
            warn!(error = %err, "server logout failed, clearing session locally");
        }
        self.dispatch(Action::Logout)?;
        if let Err(err) = persist::save_login(self.prefs.as_ref(), None).await {
            warn!(error = %err, "failed to forget persisted session");
        }
        info!("logged out");
        self.bus.publish(BusEvent::LoggedOut);
        Ok(())
    }

    pub(super) async fn fetch_user_profile(&self, user_id: UserId) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchUserProfile {
            token,
            user_id: user_id.clone(),
        })?;

        let response = match self.api.fetch_user_profile(&user_id).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_user_profile",
                    Action::FetchUserProfileFailure { token, user_id },
                    err,
                )
            }
        };

        let mut user = response.user;
        if user.id.is_empty() {
            user.id = user_id.clone();
        }
        self.merge(Related {
            teams: response.team_map,
            follows: response.follow_map,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchUserProfileSuccess {
            token,
            user_id,
            user,
        })
    }

    pub(super) async fn fetch_user_articles(
        &self,
        user_id: UserId,
        page: u32,
    ) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchUserArticles {
            token,
            user_id: user_id.clone(),
        })?;

        let response = match self.api.fetch_user_articles(&user_id, page).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_user_articles",
                    Action::FetchUserArticlesFailure { token, user_id },
                    err,
                )
            }
        };

        self.merge(Related {
            users: response.user_map,
            teams: response.team_map,
            likes: response.like_map,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchUserArticlesSuccess {
            token,
            user_id,
            page,
            articles: response.projects,
            has_more: response.has_more,
        })
    }

    pub(super) async fn follow(&self, user_id: UserId, following: bool) -> Result<(), EffectError> {
        let command = if following { "follow_user" } else { "unfollow_user" };
        let token = self.store.next_token();
        self.dispatch(Action::StartFollowUser {
            token,
            user_id: user_id.clone(),
        })?;

        let result = if following {
            self.api.follow_user(&user_id).await
        } else {
            self.api.unfollow_user(&user_id).await
        };
        match result {
            Ok(true) => self.dispatch(Action::FollowUserSuccess {
                token,
                user_id,
                following,
            }),
            Ok(false) => {
                warn!(command, user_id = %user_id, "server declined follow change");
                self.dispatch(Action::FollowUserFailure { token, user_id })?;
                self.bus
                    .notice(NoticeLevel::Error, format!("{command} was not applied"));
                Ok(())
            }
            Err(err) => self.fail(command, Action::FollowUserFailure { token, user_id }, err),
        }
    }
}
