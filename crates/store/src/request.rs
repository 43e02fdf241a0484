//! In-flight request tracking.
//!
//! Every asynchronous operation registers a [`RequestToken`] under a [`RequestKey`] when it
//! starts. Only the most recently issued token for a key is current; terminal actions carrying
//! any other token are stale and must not touch the state. Loading flags are derived from the
//! tracker, so a key is "loading" exactly while it has a current token.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use shared::domain::{ArticleId, ChannelId, EventId, EventTab, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
    Login,
    Articles,
    FollowArticles,
    ArticleDetail(ArticleId),
    Messages(ChannelId),
    SendMessage { channel_id: ChannelId, nonce: String },
    Events(EventTab),
    EventDetail(EventId),
    JoinEvent(EventId),
    UserProfile(UserId),
    UserArticles(UserId),
    Follow(UserId),
    Notifications,
    ChannelMembers(ChannelId),
    Report(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTracker {
    in_flight: HashMap<RequestKey, RequestToken>,
}

impl RequestTracker {
    /// Registers `token` as the current request for `key`.
    ///
    /// Returns `false` and leaves the tracker untouched when a newer token is already current.
    pub fn start(&mut self, key: RequestKey, token: RequestToken) -> bool {
        match self.in_flight.get(&key) {
            Some(current) if *current > token => false,
            _ => {
                self.in_flight.insert(key, token);
                true
            }
        }
    }

    /// Completes the request if `token` is current for `key`.
    pub fn finish(&mut self, key: &RequestKey, token: RequestToken) -> bool {
        if self.in_flight.get(key) == Some(&token) {
            self.in_flight.remove(key);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, key: &RequestKey) -> bool {
        self.in_flight.contains_key(key)
    }

    #[cfg(test)]
    pub(crate) fn current(&self, key: &RequestKey) -> Option<RequestToken> {
        self.in_flight.get(key).copied()
    }

    pub fn is_sending(&self, channel_id: &ChannelId) -> bool {
        self.in_flight.keys().any(|key| {
            matches!(key, RequestKey::SendMessage { channel_id: pending, .. } if pending == channel_id)
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Hands out strictly increasing request tokens.
#[derive(Debug, Default)]
pub struct TokenSource {
    last: AtomicU64,
}

impl TokenSource {
    pub fn next(&self) -> RequestToken {
        RequestToken(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
