use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use client_core::Result as ClientResult;
use shared::{
    domain::{ChannelId, EventId, EventTab, MessageId, ReportItemType},
    error::{ApiError, ErrorCode},
    model::{Article, ArticleDetail, LiveEvent, LoginInfo, Message, MessagePage},
    protocol::{
        ArticleDetailResponse, ArticlesResponse, ChannelMembersResponse, EventDetailResponse,
        EventsResponse, FeedItem, FollowArticlesResponse, MessagesResponse,
        NotificationsResponse, SendMessageRequest, UserArticlesResponse, UserProfileResponse,
    },
};
use storage::MemoryPreferences;
use tokio::sync::{broadcast, Notify};

use super::*;
use crate::{
    persist,
    request::RequestKey,
    runtime::spawn_store,
    state::AppState,
    view_model::{article_detail_view_model, articles_view_model, personal_view_model},
};

#[derive(Default)]
struct FakeApi {
    calls: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    article_pages: Mutex<VecDeque<ArticlesResponse>>,
    hold_first_articles: AtomicBool,
    hold_first_login: AtomicBool,
    release: Notify,
    sent: Mutex<Vec<SendMessageRequest>>,
}

impl FakeApi {
    fn fail(&self, name: &'static str) {
        self.failing.lock().unwrap().insert(name);
    }

    fn called(&self, name: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|call| *call == name)
    }

    fn check(&self, name: &'static str) -> ClientResult<()> {
        self.calls.lock().unwrap().push(name);
        if self.failing.lock().unwrap().contains(name) {
            return Err(ClientError::Status {
                status: 503,
                error: ApiError::new(ErrorCode::Internal, "backend unavailable"),
            });
        }
        Ok(())
    }
}

fn article(id: &str) -> Article {
    Article {
        id: ArticleId::from(id),
        title: format!("article {id}"),
        user_id: UserId::from("author"),
        channel_id: ChannelId::from("c-1"),
        ..Article::default()
    }
}

fn articles_page(ids: &[&str]) -> ArticlesResponse {
    let mut response = ArticlesResponse {
        hottest_has_more: true,
        ..ArticlesResponse::default()
    };
    for id in ids {
        response.hottests.push(FeedItem {
            id: format!("h-{id}"),
            item_id: ArticleId::from(*id),
        });
        response.project_map.insert(ArticleId::from(*id), article(id));
    }
    response.user_map.insert(
        UserId::from("author"),
        User {
            id: UserId::from("author"),
            fullname: "Ada".to_string(),
            ..User::default()
        },
    );
    response
}

#[async_trait]
impl ConnectApi for FakeApi {
    async fn login_by_email(&self, email: &str, password: &str) -> ClientResult<LoginInfo> {
        self.check("login_by_email")?;
        if self.hold_first_login.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
        if password != "secret" {
            return Err(ClientError::Status {
                status: 401,
                error: ApiError::new(ErrorCode::Unauthorized, "bad credentials"),
            });
        }
        let name = email.split('@').next().unwrap_or_default();
        Ok(LoginInfo {
            user_id: UserId::from(name),
            user_name: name.to_string(),
            authorization_token: Some("tok".to_string()),
            ..LoginInfo::default()
        })
    }

    async fn logout(&self) -> ClientResult<()> {
        self.check("logout")
    }

    async fn fetch_articles(&self, _offset: u32) -> ClientResult<ArticlesResponse> {
        self.check("fetch_articles")?;
        let page = self
            .article_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        if self.hold_first_articles.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
        Ok(page)
    }

    async fn fetch_follow_articles(&self, page: u32) -> ClientResult<FollowArticlesResponse> {
        self.check("fetch_follow_articles")?;
        Ok(FollowArticlesResponse {
            projects: vec![article("f1")],
            page,
            ..FollowArticlesResponse::default()
        })
    }

    async fn fetch_article_detail(
        &self,
        article_id: &ArticleId,
        _is_push: bool,
    ) -> ClientResult<ArticleDetailResponse> {
        self.check("fetch_article_detail")?;
        let comment = Message {
            id: MessageId::from("m1"),
            channel_id: ChannelId::from("c-1"),
            author: User {
                id: UserId::from("commenter"),
                fullname: "Grace".to_string(),
                ..User::default()
            },
            content: "great read".to_string(),
            ..Message::default()
        };
        Ok(ArticleDetailResponse {
            project: ArticleDetail {
                article: article(article_id.as_str()),
                body: "full text".to_string(),
                comments: MessagePage {
                    items: vec![comment],
                    has_more: true,
                    ..MessagePage::default()
                },
                like: false,
                ..ArticleDetail::default()
            },
        })
    }

    async fn fetch_article_comments(
        &self,
        channel_id: &ChannelId,
        _before: Option<&MessageId>,
    ) -> ClientResult<MessagesResponse> {
        self.check("fetch_article_comments")?;
        Ok(MessagePage {
            items: vec![Message {
                id: MessageId::from("m0"),
                channel_id: channel_id.clone(),
                ..Message::default()
            }],
            ..MessagePage::default()
        })
    }

    async fn like_article(&self, _article_id: &ArticleId) -> ClientResult<()> {
        self.check("like_article")
    }

    async fn like_comment(&self, message_id: &MessageId) -> ClientResult<Message> {
        self.check("like_comment")?;
        Ok(Message {
            id: message_id.clone(),
            ..Message::default()
        })
    }

    async fn remove_like_comment(&self, message_id: &MessageId) -> ClientResult<Message> {
        self.check("remove_like_comment")?;
        Ok(Message {
            id: message_id.clone(),
            ..Message::default()
        })
    }

    async fn send_message(&self, request: &SendMessageRequest) -> ClientResult<Message> {
        self.check("send_message")?;
        self.sent.lock().unwrap().push(request.clone());
        Ok(Message {
            id: MessageId::from("m-new"),
            channel_id: request.channel_id.clone(),
            content: request.content.clone(),
            nonce: Some(request.nonce.clone()),
            parent_message_id: request.parent_message_id.clone(),
            ..Message::default()
        })
    }

    async fn fetch_events(&self, _tab: EventTab, _page: u32) -> ClientResult<EventsResponse> {
        self.check("fetch_events")?;
        Ok(EventsResponse {
            items: vec![LiveEvent {
                id: EventId::from("e1"),
                participants_count: 4,
                ..LiveEvent::default()
            }],
            ..EventsResponse::default()
        })
    }

    async fn fetch_event_detail(&self, event_id: &EventId) -> ClientResult<EventDetailResponse> {
        self.check("fetch_event_detail")?;
        Ok(EventDetailResponse {
            event: LiveEvent {
                id: event_id.clone(),
                ..LiveEvent::default()
            },
            ..EventDetailResponse::default()
        })
    }

    async fn join_event(&self, _event_id: &EventId) -> ClientResult<()> {
        self.check("join_event")
    }

    async fn fetch_messages(
        &self,
        channel_id: &ChannelId,
        before: Option<&MessageId>,
    ) -> ClientResult<MessagesResponse> {
        self.fetch_article_comments(channel_id, before).await
    }

    async fn fetch_user_profile(&self, user_id: &UserId) -> ClientResult<UserProfileResponse> {
        self.check("fetch_user_profile")?;
        Ok(UserProfileResponse {
            user: User {
                id: user_id.clone(),
                username: "ada".to_string(),
                followers_count: 10,
                ..User::default()
            },
            ..UserProfileResponse::default()
        })
    }

    async fn fetch_user_articles(
        &self,
        _user_id: &UserId,
        _page: u32,
    ) -> ClientResult<UserArticlesResponse> {
        self.check("fetch_user_articles")?;
        Ok(UserArticlesResponse {
            projects: vec![article("u-a1")],
            ..UserArticlesResponse::default()
        })
    }

    async fn follow_user(&self, _user_id: &UserId) -> ClientResult<bool> {
        self.check("follow_user")?;
        Ok(true)
    }

    async fn unfollow_user(&self, _user_id: &UserId) -> ClientResult<bool> {
        self.check("unfollow_user")?;
        Ok(false)
    }

    async fn fetch_notifications(&self, page: u32) -> ClientResult<NotificationsResponse> {
        self.check("fetch_notifications")?;
        Ok(NotificationsResponse {
            page,
            page_total: 1,
            ..NotificationsResponse::default()
        })
    }

    async fn fetch_channel_members(
        &self,
        _channel_id: &ChannelId,
        _offset: u32,
    ) -> ClientResult<ChannelMembersResponse> {
        self.check("fetch_channel_members")?;
        Ok(ChannelMembersResponse::default())
    }

    async fn report_item(
        &self,
        _item_id: &str,
        _item_type: ReportItemType,
        _reason: &str,
    ) -> ClientResult<()> {
        self.check("report_item")
    }
}

struct Harness {
    api: Arc<FakeApi>,
    prefs: Arc<MemoryPreferences>,
    effects: Effects,
    events: broadcast::Receiver<BusEvent>,
}

fn harness() -> Harness {
    let api = Arc::new(FakeApi::default());
    let prefs = Arc::new(MemoryPreferences::new());
    let (store, _task) = spawn_store(AppState::default());
    let bus = EventBus::default();
    let events = bus.subscribe();
    let effects = Effects::new(api.clone(), store, prefs.clone(), bus);
    Harness {
        api,
        prefs,
        effects,
        events,
    }
}

async fn login(harness: &Harness) {
    harness
        .effects
        .run(Command::LoginByEmail {
            email: "me@example.com".to_string(),
            password: "secret".to_string(),
        })
        .await
        .expect("login");
}

#[tokio::test]
async fn fetch_articles_populates_feed_and_users() {
    let harness = harness();
    harness
        .api
        .article_pages
        .lock()
        .unwrap()
        .push_back(articles_page(&["a1", "a2"]));

    harness
        .effects
        .run(Command::FetchArticles { offset: 0 })
        .await
        .expect("fetch");

    let view = articles_view_model(&harness.effects.store().state());
    let ids: Vec<&str> = view
        .articles
        .iter()
        .map(|card| card.article.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert!(view.articles[0].author.is_some());
    assert!(!view.is_loading);
}

#[tokio::test]
async fn failed_fetch_dispatches_failure_and_notifies() {
    let mut harness = harness();
    harness.api.fail("fetch_articles");

    let err = harness
        .effects
        .run(Command::FetchArticles { offset: 0 })
        .await
        .expect_err("must fail");

    assert!(matches!(err, EffectError::Api(_)));
    let state = harness.effects.store().state();
    assert!(!state.requests.is_pending(&RequestKey::Articles));
    assert!(state.articles.article_dict.is_empty());
    assert!(matches!(
        harness.events.recv().await.expect("notice"),
        BusEvent::Notice {
            level: NoticeLevel::Error,
            ..
        }
    ));
}

#[tokio::test]
async fn superseded_fetch_does_not_overwrite_newer_feed() {
    let harness = harness();
    {
        let mut pages = harness.api.article_pages.lock().unwrap();
        pages.push_back(articles_page(&["old"]));
        pages.push_back(articles_page(&["new"]));
    }
    harness.api.hold_first_articles.store(true, Ordering::SeqCst);

    let slow = {
        let effects = harness.effects.clone();
        tokio::spawn(async move { effects.run(Command::FetchArticles { offset: 0 }).await })
    };
    while !harness.api.called("fetch_articles") {
        tokio::task::yield_now().await;
    }

    harness
        .effects
        .run(Command::FetchArticles { offset: 0 })
        .await
        .expect("fast fetch");
    harness.api.release.notify_one();
    slow.await.expect("join").expect("slow fetch");

    let state = harness.effects.store().state();
    let ids: Vec<&str> = state
        .articles
        .recommend
        .ids
        .iter()
        .map(ArticleId::as_str)
        .collect();
    assert_eq!(ids, vec!["new"]);
    assert!(!state.requests.is_pending(&RequestKey::Articles));
}

#[tokio::test]
async fn privileged_command_without_session_dispatches_nothing() {
    let mut harness = harness();

    let err = harness
        .effects
        .run(Command::LikeArticle {
            article_id: ArticleId::from("a1"),
        })
        .await
        .expect_err("needs login");

    assert!(matches!(err, EffectError::NotLoggedIn));
    assert!(!harness.api.called("like_article"));
    assert!(harness.effects.store().state().articles.like_dict.is_empty());
    assert_eq!(
        harness.events.recv().await.expect("event"),
        BusEvent::LoginRequired {
            command: "like_article"
        }
    );
}

#[tokio::test]
async fn login_then_logout_updates_session_and_bus() {
    let mut harness = harness();
    login(&harness).await;

    let view = personal_view_model(&harness.effects.store().state());
    assert!(view.is_logged_in);
    assert_eq!(view.user_id, Some(UserId::from("me")));
    assert_eq!(
        harness.events.recv().await.expect("event"),
        BusEvent::LoginSucceeded {
            user_id: UserId::from("me")
        }
    );

    harness.api.fail("logout");
    harness.effects.run(Command::Logout).await.expect("logout");
    assert!(!harness.effects.store().state().login.is_logged_in);
    assert_eq!(harness.events.recv().await.expect("event"), BusEvent::LoggedOut);
}

#[tokio::test]
async fn wrong_password_leaves_session_signed_out() {
    let harness = harness();
    let err = harness
        .effects
        .run(Command::LoginByEmail {
            email: "me@example.com".to_string(),
            password: "nope".to_string(),
        })
        .await
        .expect_err("login must fail");

    assert!(matches!(err, EffectError::Api(ref inner) if inner.requires_reauth()));
    let state = harness.effects.store().state();
    assert!(!state.login.is_logged_in);
    assert_eq!(state.login.email, "me@example.com");
    assert!(!state.requests.is_pending(&RequestKey::Login));
}

#[tokio::test]
async fn failed_login_keeps_existing_session_and_saved_login() {
    let harness = harness();
    login(&harness).await;

    harness
        .effects
        .run(Command::LoginByEmail {
            email: "me@example.com".to_string(),
            password: "nope".to_string(),
        })
        .await
        .expect_err("login must fail");

    let state = harness.effects.store().state();
    assert!(state.login.is_logged_in);
    assert_eq!(state.login.current_user_id(), Some(&UserId::from("me")));
    let stored = persist::load_persisted(harness.prefs.as_ref())
        .await
        .expect("load");
    assert_eq!(
        stored.login.map(|info| info.user_id),
        Some(UserId::from("me"))
    );
}

#[tokio::test]
async fn superseded_login_is_neither_saved_nor_announced() {
    let mut harness = harness();
    harness.api.hold_first_login.store(true, Ordering::SeqCst);

    let slow = {
        let effects = harness.effects.clone();
        tokio::spawn(async move {
            effects
                .run(Command::LoginByEmail {
                    email: "old@example.com".to_string(),
                    password: "secret".to_string(),
                })
                .await
        })
    };
    while !harness.api.called("login_by_email") {
        tokio::task::yield_now().await;
    }

    login(&harness).await;
    harness.api.release.notify_one();
    slow.await.expect("join").expect("slow login");

    let state = harness.effects.store().state();
    assert_eq!(state.login.current_user_id(), Some(&UserId::from("me")));
    assert!(!state.requests.is_pending(&RequestKey::Login));
    let stored = persist::load_persisted(harness.prefs.as_ref())
        .await
        .expect("load");
    assert_eq!(
        stored.login.map(|info| info.user_id),
        Some(UserId::from("me"))
    );
    assert_eq!(
        harness.events.recv().await.expect("event"),
        BusEvent::LoginSucceeded {
            user_id: UserId::from("me")
        }
    );
    assert!(matches!(
        harness.events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn article_detail_loads_comments_and_records_history() {
    let harness = harness();
    harness
        .effects
        .run(Command::FetchArticleDetail {
            article_id: ArticleId::from("a1"),
            is_push: false,
        })
        .await
        .expect("detail");

    let state = harness.effects.store().state();
    let view = article_detail_view_model(&state, &ArticleId::from("a1"));
    assert_eq!(view.body, "full text");
    assert_eq!(view.comments.len(), 1);
    assert_eq!(view.comments[0].author.fullname, "Grace");
    assert!(view.has_more_comments);
    assert_eq!(state.articles.history[0].id, ArticleId::from("a1"));

    let stored = persist::load_persisted(harness.prefs.as_ref())
        .await
        .expect("load");
    assert_eq!(stored.history.len(), 1);
}

#[tokio::test]
async fn optimistic_like_survives_api_failure() {
    let harness = harness();
    login(&harness).await;
    harness.api.fail("like_article");

    harness
        .effects
        .run(Command::LikeArticle {
            article_id: ArticleId::from("a1"),
        })
        .await
        .expect("optimistic like never fails");

    assert!(harness
        .effects
        .store()
        .state()
        .articles
        .is_liked(&ArticleId::from("a1")));
}

#[tokio::test]
async fn comment_likes_use_the_signed_in_user() {
    let harness = harness();
    login(&harness).await;
    harness
        .effects
        .run(Command::FetchArticleDetail {
            article_id: ArticleId::from("a1"),
            is_push: false,
        })
        .await
        .expect("detail");

    harness
        .effects
        .run(Command::LikeComment {
            message_id: MessageId::from("m1"),
        })
        .await
        .expect("like");
    let view = article_detail_view_model(&harness.effects.store().state(), &ArticleId::from("a1"));
    assert!(view.comments[0].liked);

    harness
        .effects
        .run(Command::RemoveLikeComment {
            message_id: MessageId::from("m1"),
        })
        .await
        .expect("unlike");
    let view = article_detail_view_model(&harness.effects.store().state(), &ArticleId::from("a1"));
    assert_eq!(view.comments[0].like_count, 0);
}

#[tokio::test]
async fn send_comment_posts_with_nonce_and_updates_thread() {
    let harness = harness();
    login(&harness).await;
    harness
        .effects
        .run(Command::FetchArticleDetail {
            article_id: ArticleId::from("a1"),
            is_push: false,
        })
        .await
        .expect("detail");

    harness
        .effects
        .run(Command::SendComment {
            article_id: ArticleId::from("a1"),
            channel_id: ChannelId::from("c-1"),
            content: "agreed".to_string(),
            parent_message_id: Some(MessageId::from("m1")),
            upper_message_id: None,
        })
        .await
        .expect("send");

    let sent = harness.api.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].nonce.is_empty());

    let state = harness.effects.store().state();
    assert!(!state.requests.is_sending(&ChannelId::from("c-1")));
    let view = article_detail_view_model(&state, &ArticleId::from("a1"));
    assert_eq!(view.comments[0].replies[0].content, "agreed");
    assert_eq!(view.article.map(|card| card.article.comment_count), Some(1));
}

#[tokio::test]
async fn block_article_persists_and_announces() {
    let mut harness = harness();
    harness
        .effects
        .run(Command::BlockArticle {
            article_id: ArticleId::from("a9"),
        })
        .await
        .expect("block");

    let stored = persist::load_persisted(harness.prefs.as_ref())
        .await
        .expect("load");
    assert!(stored.blocked.contains(&ArticleId::from("a9")));
    assert_eq!(
        harness.events.recv().await.expect("event"),
        BusEvent::ArticleBlocked {
            article_id: ArticleId::from("a9")
        }
    );
}

#[tokio::test]
async fn add_count_is_persisted() {
    let harness = harness();
    harness
        .effects
        .run(Command::AddCount { number: 2 })
        .await
        .expect("add");
    harness
        .effects
        .run(Command::AddCount { number: 3 })
        .await
        .expect("add");

    assert_eq!(harness.effects.store().state().count, 5);
    assert_eq!(harness.prefs.get_int(persist::COUNT_KEY).await.expect("get"), Some(5));
}

#[tokio::test]
async fn follow_then_unfollow_round_trips_flag() {
    let harness = harness();
    login(&harness).await;
    let target = UserId::from("author");
    harness
        .effects
        .run(Command::FetchUserProfile {
            user_id: target.clone(),
        })
        .await
        .expect("profile");

    harness
        .effects
        .run(Command::FollowUser {
            user_id: target.clone(),
        })
        .await
        .expect("follow");
    let state = harness.effects.store().state();
    assert!(state.follows.is_following(&UserId::from("me"), "author"));
    assert_eq!(state.users.user_dict[&target].followers_count, 11);

    // The fake reports the unfollow as not applied.
    harness
        .effects
        .run(Command::UnfollowUser {
            user_id: target.clone(),
        })
        .await
        .expect("unfollow");
    let state = harness.effects.store().state();
    assert!(state.follows.is_following(&UserId::from("me"), "author"));
    assert!(!state.requests.is_pending(&RequestKey::Follow(target)));
}

#[tokio::test]
async fn join_event_marks_check_in() {
    let harness = harness();
    login(&harness).await;
    harness
        .effects
        .run(Command::FetchEvents {
            tab: EventTab::Ongoing,
            page: 1,
        })
        .await
        .expect("events");
    harness
        .effects
        .run(Command::JoinEvent {
            event_id: EventId::from("e1"),
        })
        .await
        .expect("join");

    let state = harness.effects.store().state();
    let event = &state.events.event_dict[&EventId::from("e1")];
    assert!(event.user_is_checked_in);
    assert_eq!(event.participants_count, 5);
}

#[tokio::test]
async fn channel_members_response_without_channel_id_is_keyed_by_request() {
    let harness = harness();
    harness
        .effects
        .run(Command::FetchChannelMembers {
            channel_id: ChannelId::from("c-7"),
            offset: 0,
        })
        .await
        .expect("members");

    let state = harness.effects.store().state();
    assert!(state.channels.channel_dict.contains_key(&ChannelId::from("c-7")));
    assert!(state.requests.is_empty());
}

#[test]
fn message_batch_collects_parents_and_authors() {
    let author = User {
        id: UserId::from("u1"),
        ..User::default()
    };
    let page = MessagePage {
        items: vec![
            Message {
                id: MessageId::from("m3"),
                author: author.clone(),
                ..Message::default()
            },
            Message {
                id: MessageId::from("m2"),
                ..Message::default()
            },
        ],
        parents: vec![Message {
            id: MessageId::from("m1"),
            author,
            ..Message::default()
        }],
        has_more: true,
        curr_oldest_message_id: None,
    };

    let (batch, authors) = super::messages::message_batch(ChannelId::from("c"), page, false);

    assert_eq!(batch.item_ids, vec![MessageId::from("m3"), MessageId::from("m2")]);
    assert_eq!(batch.messages.len(), 3);
    assert_eq!(batch.oldest_message_id, Some(MessageId::from("m2")));
    assert_eq!(authors.len(), 1);
}
