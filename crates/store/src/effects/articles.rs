use shared::{
    domain::ArticleId,
    protocol::{ArticlesResponse, FollowArticlesResponse},
};
use tracing::warn;

use super::{messages::message_batch, EffectError, Effects, Related};
use crate::{action::Action, bus::BusEvent, persist};

impl Effects {
    pub(super) async fn fetch_articles(&self, offset: u32) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchArticles { token })?;

        let response = match self.api.fetch_articles(offset).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_articles",
                    Action::FetchArticlesFailure { token },
                    err,
                )
            }
        };
        let ArticlesResponse {
            hottests,
            hottest_has_more,
            mut project_map,
            user_map,
            team_map,
            follow_map,
            like_map,
            place_map,
        } = response;

        self.merge(Related {
            users: user_map,
            teams: team_map,
            places: place_map,
            follows: follow_map,
            likes: like_map,
        })?;
        let articles = hottests
            .iter()
            .filter_map(|item| project_map.remove(&item.item_id))
            .collect();
        self.dispatch(Action::FetchArticlesSuccess {
            token,
            offset,
            articles,
            has_more: hottest_has_more,
        })
    }

    pub(super) async fn fetch_follow_articles(&self, page: u32) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchFollowArticles { token })?;

        let response = match self.api.fetch_follow_articles(page).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_follow_articles",
                    Action::FetchFollowArticlesFailure { token },
                    err,
                )
            }
        };
        let FollowArticlesResponse {
            projects,
            project_has_more,
            hottests,
            hottest_has_more,
            user_map,
            team_map,
            follow_map,
            like_map,
            ..
        } = response;

        self.merge(Related {
            users: user_map,
            teams: team_map,
            follows: follow_map,
            likes: like_map,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchFollowArticlesSuccess {
            token,
            page,
            projects,
            project_has_more,
            hottests,
            hottest_has_more,
        })
    }

    /// Loads an article with its first comment page and records it in the reading history.
    pub(super) async fn fetch_article_detail(
        &self,
        article_id: ArticleId,
        is_push: bool,
    ) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchArticleDetail {
            token,
            article_id: article_id.clone(),
        })?;

        let mut detail = match self.api.fetch_article_detail(&article_id, is_push).await {
            Ok(response) => response.project,
            Err(err) => {
                return self.fail(
                    "fetch_article_detail",
                    Action::FetchArticleDetailFailure { token, article_id },
                    err,
                )
            }
        };

        if detail.channel_id.is_empty() {
            detail.channel_id = detail.article.channel_id.clone();
        }
        let mut users = std::mem::take(&mut detail.user_map);
        users.extend(detail.mention_users.clone());
        let comments = std::mem::take(&mut detail.comments);
        let (batch, authors) = message_batch(detail.channel_id.clone(), comments, true);
        users.extend(authors);

        self.merge(Related {
            users,
            teams: std::mem::take(&mut detail.team_map),
            follows: std::mem::take(&mut detail.follow_map),
            ..Related::default()
        })?;
        self.dispatch(Action::FetchArticleDetailSuccess {
            token,
            article_id,
            detail: Box::new(detail),
            comments: batch,
        })?;

        // Writes the history the store holds now; a stale response left it untouched.
        self.store.flush().await?;
        if let Err(err) = persist::save_history(self.prefs.as_ref(), &self.store.state()).await {
            warn!(error = %err, "failed to persist reading history");
        }
        Ok(())
    }

    /// Optimistic: the like shows immediately and a rejected call is only logged.
    pub(super) async fn like_article(&self, article_id: ArticleId) -> Result<(), EffectError> {
        self.dispatch(Action::LikeArticleSuccess {
            article_id: article_id.clone(),
        })?;
        if let Err(err) = self.api.like_article(&article_id).await {
            warn!(article_id = %article_id, error = %err, "like article rejected");
        }
        Ok(())
    }

    pub(super) async fn block_article(&self, article_id: ArticleId) -> Result<(), EffectError> {
        self.dispatch(Action::BlockArticle {
            article_id: article_id.clone(),
        })?;
        self.store.flush().await?;

        let state = self.store.state();
        persist::save_blocked(self.prefs.as_ref(), &state)
            .await
            .map_err(EffectError::Preferences)?;
        persist::save_history(self.prefs.as_ref(), &state)
            .await
            .map_err(EffectError::Preferences)?;
        self.bus.publish(BusEvent::ArticleBlocked { article_id });
        Ok(())
    }

    pub(super) async fn edit_history(&self, action: Action) -> Result<(), EffectError> {
        self.dispatch(action)?;
        self.store.flush().await?;
        persist::save_history(self.prefs.as_ref(), &self.store.state())
            .await
            .map_err(EffectError::Preferences)
    }
}
