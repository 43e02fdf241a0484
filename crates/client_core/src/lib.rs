use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ArticleId, ChannelId, EventId, EventTab, MessageId, ReportItemType, UserId},
    error::{ApiError, ErrorCode},
    model::{LoginInfo, Message},
    protocol::{
        ArticleDetailResponse, ArticlesResponse, ChannelMembersResponse, EventDetailResponse,
        EventsResponse, FollowArticlesResponse, FollowResponse, LoginRequest, MessagesResponse,
        NotificationsResponse, ReportRequest, SendMessageRequest, UserArticlesResponse,
        UserProfileResponse,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

pub mod error;

pub use error::{ClientError, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The remote Connect backend, one method per call.
#[async_trait]
pub trait ConnectApi: Send + Sync {
    async fn login_by_email(&self, email: &str, password: &str) -> Result<LoginInfo>;
    async fn logout(&self) -> Result<()>;
    async fn fetch_articles(&self, offset: u32) -> Result<ArticlesResponse>;
    async fn fetch_follow_articles(&self, page: u32) -> Result<FollowArticlesResponse>;
    async fn fetch_article_detail(
        &self,
        article_id: &ArticleId,
        is_push: bool,
    ) -> Result<ArticleDetailResponse>;
    async fn fetch_article_comments(
        &self,
        channel_id: &ChannelId,
        before: Option<&MessageId>,
    ) -> Result<MessagesResponse>;
    async fn like_article(&self, article_id: &ArticleId) -> Result<()>;
    async fn like_comment(&self, message_id: &MessageId) -> Result<Message>;
    async fn remove_like_comment(&self, message_id: &MessageId) -> Result<Message>;
    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message>;
    async fn fetch_events(&self, tab: EventTab, page: u32) -> Result<EventsResponse>;
    async fn fetch_event_detail(&self, event_id: &EventId) -> Result<EventDetailResponse>;
    async fn join_event(&self, event_id: &EventId) -> Result<()>;
    async fn fetch_messages(
        &self,
        channel_id: &ChannelId,
        before: Option<&MessageId>,
    ) -> Result<MessagesResponse>;
    async fn fetch_user_profile(&self, user_id: &UserId) -> Result<UserProfileResponse>;
    async fn fetch_user_articles(&self, user_id: &UserId, page: u32)
        -> Result<UserArticlesResponse>;
    async fn follow_user(&self, user_id: &UserId) -> Result<bool>;
    async fn unfollow_user(&self, user_id: &UserId) -> Result<bool>;
    async fn fetch_notifications(&self, page: u32) -> Result<NotificationsResponse>;
    async fn fetch_channel_members(
        &self,
        channel_id: &ChannelId,
        offset: u32,
    ) -> Result<ChannelMembersResponse>;
    async fn report_item(
        &self,
        item_id: &str,
        item_type: ReportItemType,
        reason: &str,
    ) -> Result<()>;
}

pub struct HttpConnectApi {
    http: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpConnectApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http)
    }

    pub fn with_client(base_url: &str, http: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::CannotBeABase(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    #[cfg(test)]
    pub(crate) async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::CannotBeABase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        let response = self.send(self.http.get(url).query(query)).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        let response = self.send(self.http.post(url).json(body)).await?;
        Ok(response.json().await?)
    }

    async fn post_empty(&self, segments: &[&str]) -> Result<()> {
        let url = self.endpoint(segments)?;
        self.send(self.http.post(url)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let request = match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let error = decode_error_body(status.as_u16(), &body);
        debug!(status = status.as_u16(), error = %error, "api request failed");
        Err(ClientError::Status {
            status: status.as_u16(),
            error,
        })
    }
}

fn decode_error_body(status: u16, body: &[u8]) -> ApiError {
    serde_json::from_slice::<ApiError>(body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(body).trim().to_string();
        let message = if text.is_empty() {
            format!("request failed with status {status}")
        } else {
            text
        };
        ApiError::new(ErrorCode::from_status(status), message)
    })
}

fn page_query(name: &str, value: u32) -> Vec<(&str, String)> {
    vec![(name, value.to_string())]
}

fn before_query(before: Option<&MessageId>) -> Vec<(&'static str, String)> {
    before
        .filter(|id| !id.is_empty())
        .map(|id| vec![("before", id.to_string())])
        .unwrap_or_default()
}

#[async_trait]
impl ConnectApi for HttpConnectApi {
    async fn login_by_email(&self, email: &str, password: &str) -> Result<LoginInfo> {
        let info: LoginInfo = self
            .post(
                &["auth", "login"],
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        if let Some(token) = &info.authorization_token {
            self.set_token(Some(token.clone())).await;
        }
        info!(user_id = %info.user_id, "signed in");
        Ok(info)
    }

    async fn logout(&self) -> Result<()> {
        let result = self.post_empty(&["auth", "logout"]).await;
        self.set_token(None).await;
        result
    }

    async fn fetch_articles(&self, offset: u32) -> Result<ArticlesResponse> {
        self.get(&["articles"], &page_query("offset", offset)).await
    }

    async fn fetch_follow_articles(&self, page: u32) -> Result<FollowArticlesResponse> {
        self.get(&["articles", "following"], &page_query("page", page))
            .await
    }

    async fn fetch_article_detail(
        &self,
        article_id: &ArticleId,
        is_push: bool,
    ) -> Result<ArticleDetailResponse> {
        self.get(
            &["articles", article_id.as_str()],
            &[("isPush", is_push.to_string())],
        )
        .await
    }

    async fn fetch_article_comments(
        &self,
        channel_id: &ChannelId,
        before: Option<&MessageId>,
    ) -> Result<MessagesResponse> {
        self.get(
            &["channels", channel_id.as_str(), "comments"],
            &before_query(before),
        )
        .await
    }

    async fn like_article(&self, article_id: &ArticleId) -> Result<()> {
        self.post_empty(&["articles", article_id.as_str(), "like"])
            .await
    }

    async fn like_comment(&self, message_id: &MessageId) -> Result<Message> {
        self.post(&["messages", message_id.as_str(), "like"], &())
            .await
    }

    async fn remove_like_comment(&self, message_id: &MessageId) -> Result<Message> {
        self.post(&["messages", message_id.as_str(), "unlike"], &())
            .await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message> {
        self.post(
            &["channels", request.channel_id.as_str(), "messages"],
            request,
        )
        .await
    }

    async fn fetch_events(&self, tab: EventTab, page: u32) -> Result<EventsResponse> {
        self.get(
            &["events"],
            &[("tab", tab.as_str().to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn fetch_event_detail(&self, event_id: &EventId) -> Result<EventDetailResponse> {
        self.get(&["events", event_id.as_str()], &[]).await
    }

    async fn join_event(&self, event_id: &EventId) -> Result<()> {
        self.post_empty(&["events", event_id.as_str(), "join"]).await
    }

    async fn fetch_messages(
        &self,
        channel_id: &ChannelId,
        before: Option<&MessageId>,
    ) -> Result<MessagesResponse> {
        self.get(
            &["channels", channel_id.as_str(), "messages"],
            &before_query(before),
        )
        .await
    }

    async fn fetch_user_profile(&self, user_id: &UserId) -> Result<UserProfileResponse> {
        self.get(&["users", user_id.as_str()], &[]).await
    }

    async fn fetch_user_articles(
        &self,
        user_id: &UserId,
        page: u32,
    ) -> Result<UserArticlesResponse> {
        self.get(
            &["users", user_id.as_str(), "articles"],
            &page_query("page", page),
        )
        .await
    }

    async fn follow_user(&self, user_id: &UserId) -> Result<bool> {
        let response: FollowResponse = self
            .post(&["users", user_id.as_str(), "follow"], &())
            .await?;
        Ok(response.success)
    }

    async fn unfollow_user(&self, user_id: &UserId) -> Result<bool> {
        let response: FollowResponse = self
            .post(&["users", user_id.as_str(), "unfollow"], &())
            .await?;
        Ok(response.success)
    }

    async fn fetch_notifications(&self, page: u32) -> Result<NotificationsResponse> {
        self.get(&["notifications"], &page_query("page", page))
            .await
    }

    async fn fetch_channel_members(
        &self,
        channel_id: &ChannelId,
        offset: u32,
    ) -> Result<ChannelMembersResponse> {
        self.get(
            &["channels", channel_id.as_str(), "members"],
            &page_query("offset", offset),
        )
        .await
    }

    async fn report_item(
        &self,
        item_id: &str,
        item_type: ReportItemType,
        reason: &str,
    ) -> Result<()> {
        let url = self.endpoint(&["reports"])?;
        self.send(self.http.post(url).json(&ReportRequest {
            item_id: item_id.to_string(),
            item_type,
            reason: reason.to_string(),
        }))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
