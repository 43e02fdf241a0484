use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::HttpConnectApi;
use serde::Serialize;
use shared::domain::{ArticleId, ChannelId, EventId, EventTab, MessageId, ReportItemType, UserId};
use storage::Storage;
use store::{
    persist::load_persisted,
    spawn_store,
    view_model::{
        article_detail_view_model, articles_view_model, channel_members_view_model,
        channel_messages_view_model, event_detail_view_model, events_view_model,
        follow_articles_view_model, history_view_model, notifications_view_model,
        personal_view_model, user_detail_view_model, UserRef,
    },
    Action, BusEvent, Command, Effects, EventBus, NoticeLevel,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "connect", about = "Browse and act on a Connect community from the terminal")]
struct Args {
    /// Config file to read instead of ./connect.toml
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TabArg {
    Ongoing,
    Completed,
}

impl From<TabArg> for EventTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Ongoing => EventTab::Ongoing,
            TabArg::Completed => EventTab::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportKind {
    Article,
    Comment,
    User,
}

impl From<ReportKind> for ReportItemType {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Article => ReportItemType::Article,
            ReportKind::Comment => ReportItemType::Comment,
            ReportKind::User => ReportItemType::User,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Recommended articles
    Feed {
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Articles from followed users and teams
    Following {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Article {
        id: String,
        #[arg(long)]
        push: bool,
    },
    Comments {
        article_id: String,
        #[arg(long)]
        before: Option<String>,
    },
    Like {
        article_id: String,
    },
    Comment {
        article_id: String,
        content: String,
        #[arg(long)]
        reply_to: Option<String>,
    },
    Block {
        article_id: String,
    },
    History {
        #[arg(long)]
        delete: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    Events {
        #[arg(long, value_enum, default_value_t = TabArg::Ongoing)]
        tab: TabArg,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Event {
        id: String,
        #[arg(long)]
        join: bool,
    },
    Messages {
        channel_id: String,
        #[arg(long)]
        before: Option<String>,
    },
    Send {
        channel_id: String,
        content: String,
    },
    User {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        follow: bool,
        #[arg(long, conflicts_with = "follow")]
        unfollow: bool,
    },
    Notifications {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Members {
        channel_id: String,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    Report {
        item_id: String,
        #[arg(long, value_enum)]
        kind: ReportKind,
        #[arg(long)]
        reason: String,
    },
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the counter, or add to it
    Count {
        #[arg(long, allow_hyphen_values = true)]
        add: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;
    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let prefs = Storage::new(&settings.preferences_url)
        .await
        .map_err(|error| {
            error!(
                preferences_url = %settings.preferences_url,
                %error,
                "failed to open preferences database"
            );
            error
        })?;
    let persisted = load_persisted(&prefs).await?;

    let api = Arc::new(HttpConnectApi::new(
        &settings.api_url,
        settings.request_timeout(),
    )?);
    let token = settings.auth_token.clone().or_else(|| {
        persisted
            .login
            .as_ref()
            .and_then(|info| info.authorization_token.clone())
    });
    api.set_token(token).await;

    let (store, task) = spawn_store(persisted.into_state());
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let effects = Effects::new(api, store, Arc::new(prefs), bus);
    info!(api_url = %settings.api_url, "connect client ready");

    let outcome = execute(&effects, args.command).await;

    while let Ok(event) = events.try_recv() {
        match event {
            BusEvent::Notice { level, message } => match level {
                NoticeLevel::Info => eprintln!("{message}"),
                NoticeLevel::Error => eprintln!("error: {message}"),
            },
            BusEvent::LoginRequired { command } => {
                eprintln!("`{command}` needs a session, run `connect login` first")
            }
            other => debug!(event = ?other, "bus event"),
        }
    }

    let output = outcome?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    drop(effects);
    task.await?;
    Ok(())
}

fn project(view: impl Serialize) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(view)?)
}

/// Runs the commands behind one subcommand and returns the screen it would show.
async fn execute(effects: &Effects, command: CliCommand) -> Result<serde_json::Value> {
    let state = || effects.store().state();

    match command {
        CliCommand::Feed { offset } => {
            effects.run(Command::FetchArticles { offset }).await?;
            project(articles_view_model(&state()))
        }
        CliCommand::Following { page } => {
            effects.run(Command::FetchFollowArticles { page }).await?;
            project(follow_articles_view_model(&state()))
        }
        CliCommand::Article { id, push } => {
            let article_id = ArticleId::from(id);
            effects
                .run(Command::FetchArticleDetail {
                    article_id: article_id.clone(),
                    is_push: push,
                })
                .await?;
            project(article_detail_view_model(&state(), &article_id))
        }
        CliCommand::Comments { article_id, before } => {
            let article_id = ArticleId::from(article_id);
            let channel_id = article_channel(effects, &article_id).await?;
            effects
                .run(Command::FetchArticleComments {
                    channel_id,
                    before: before.map(MessageId::from),
                })
                .await?;
            project(article_detail_view_model(&state(), &article_id))
        }
        CliCommand::Like { article_id } => {
            let article_id = ArticleId::from(article_id);
            effects
                .run(Command::LikeArticle {
                    article_id: article_id.clone(),
                })
                .await?;
            project(article_detail_view_model(&state(), &article_id))
        }
        CliCommand::Comment {
            article_id,
            content,
            reply_to,
        } => {
            let article_id = ArticleId::from(article_id);
            let channel_id = article_channel(effects, &article_id).await?;
            let parent_message_id = reply_to.map(MessageId::from);
            effects
                .run(Command::SendComment {
                    article_id: article_id.clone(),
                    channel_id,
                    content,
                    upper_message_id: parent_message_id.clone(),
                    parent_message_id,
                })
                .await?;
            project(article_detail_view_model(&state(), &article_id))
        }
        CliCommand::Block { article_id } => {
            effects
                .run(Command::BlockArticle {
                    article_id: ArticleId::from(article_id),
                })
                .await?;
            project(history_view_model(&state()))
        }
        CliCommand::History { delete, clear } => {
            if clear {
                effects.run(Command::DeleteAllArticleHistory).await?;
            } else if let Some(article_id) = delete {
                effects
                    .run(Command::DeleteArticleHistory {
                        article_id: ArticleId::from(article_id),
                    })
                    .await?;
            }
            project(history_view_model(&state()))
        }
        CliCommand::Events { tab, page } => {
            let tab = EventTab::from(tab);
            effects.run(Command::FetchEvents { tab, page }).await?;
            project(events_view_model(&state(), tab))
        }
        CliCommand::Event { id, join } => {
            let event_id = EventId::from(id);
            effects
                .run(Command::FetchEventDetail {
                    event_id: event_id.clone(),
                })
                .await?;
            effects.store().dispatch(Action::NavigateToEvent {
                event_id: event_id.clone(),
            })?;
            effects.store().flush().await?;
            if let Some(channel_id) = state().events.channel_id.clone() {
                if !channel_id.is_empty() {
                    effects
                        .run(Command::FetchMessages {
                            channel_id,
                            before: None,
                        })
                        .await?;
                }
            }
            if join {
                effects
                    .run(Command::JoinEvent {
                        event_id: event_id.clone(),
                    })
                    .await?;
            }
            project(event_detail_view_model(&state(), &event_id))
        }
        CliCommand::Messages { channel_id, before } => {
            let channel_id = ChannelId::from(channel_id);
            effects
                .run(Command::FetchMessages {
                    channel_id: channel_id.clone(),
                    before: before.map(MessageId::from),
                })
                .await?;
            project(channel_messages_view_model(&state(), &channel_id))
        }
        CliCommand::Send {
            channel_id,
            content,
        } => {
            let channel_id = ChannelId::from(channel_id);
            effects
                .run(Command::SendMessage {
                    channel_id: channel_id.clone(),
                    content,
                })
                .await?;
            project(channel_messages_view_model(&state(), &channel_id))
        }
        CliCommand::User {
            id,
            page,
            follow,
            unfollow,
        } => {
            let user_id = UserId::from(id);
            effects
                .run(Command::FetchUserProfile {
                    user_id: user_id.clone(),
                })
                .await?;
            effects
                .run(Command::FetchUserArticles {
                    user_id: user_id.clone(),
                    page,
                })
                .await?;
            if follow {
                effects
                    .run(Command::FollowUser {
                        user_id: user_id.clone(),
                    })
                    .await?;
            } else if unfollow {
                effects
                    .run(Command::UnfollowUser {
                        user_id: user_id.clone(),
                    })
                    .await?;
            }
            project(user_detail_view_model(&state(), &UserRef::Id(user_id)))
        }
        CliCommand::Notifications { page } => {
            effects.run(Command::FetchNotifications { page }).await?;
            project(notifications_view_model(&state()))
        }
        CliCommand::Members { channel_id, offset } => {
            let channel_id = ChannelId::from(channel_id);
            effects
                .run(Command::FetchChannelMembers {
                    channel_id: channel_id.clone(),
                    offset,
                })
                .await?;
            project(channel_members_view_model(&state(), &channel_id))
        }
        CliCommand::Report {
            item_id,
            kind,
            reason,
        } => {
            effects
                .run(Command::ReportItem {
                    item_id: item_id.clone(),
                    item_type: kind.into(),
                    reason,
                })
                .await?;
            Ok(serde_json::json!({ "reported": item_id }))
        }
        CliCommand::Login { email, password } => {
            effects
                .run(Command::LoginByEmail { email, password })
                .await?;
            project(personal_view_model(&state()))
        }
        CliCommand::Logout => {
            effects.run(Command::Logout).await?;
            project(personal_view_model(&state()))
        }
        CliCommand::Count { add } => {
            if let Some(number) = add {
                effects.run(Command::AddCount { number }).await?;
            }
            Ok(serde_json::json!({ "count": state().count }))
        }
    }
}

/// Comment channel of an article, loading the article when it is not known yet.
async fn article_channel(effects: &Effects, article_id: &ArticleId) -> Result<ChannelId> {
    let known = article_detail_view_model(&effects.store().state(), article_id).channel_id;
    if let Some(channel_id) = known {
        return Ok(channel_id);
    }
    effects
        .run(Command::FetchArticleDetail {
            article_id: article_id.clone(),
            is_push: false,
        })
        .await?;
    article_detail_view_model(&effects.store().state(), article_id)
        .channel_id
        .ok_or_else(|| anyhow::anyhow!("article {article_id} has no comment channel"))
}
