use shared::domain::{EventId, EventTab};

use super::{EffectError, Effects, Related};
use crate::action::Action;

impl Effects {
    pub(super) async fn fetch_events(&self, tab: EventTab, page: u32) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchEvents { token, tab })?;

        let response = match self.api.fetch_events(tab, page).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_events",
                    Action::FetchEventsFailure { token, tab },
                    err,
                )
            }
        };

        self.merge(Related {
            users: response.user_map,
            places: response.place_map,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchEventsSuccess {
            token,
            tab,
            page,
            events: response.items,
            has_more: response.has_more,
        })
    }

    pub(super) async fn fetch_event_detail(&self, event_id: EventId) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchEventDetail {
            token,
            event_id: event_id.clone(),
        })?;

        let response = match self.api.fetch_event_detail(&event_id).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_event_detail",
                    Action::FetchEventDetailFailure { token, event_id },
                    err,
                )
            }
        };

        let mut event = response.event;
        if event.id.is_empty() {
            event.id = event_id;
        }
        self.merge(Related {
            users: response.user_map,
            places: response.place_map,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchEventDetailSuccess { token, event })
    }

    pub(super) async fn join_event(&self, event_id: EventId) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartJoinEvent {
            token,
            event_id: event_id.clone(),
        })?;

        match self.api.join_event(&event_id).await {
            Ok(()) => self.dispatch(Action::JoinEventSuccess { token, event_id }),
            Err(err) => self.fail(
                "join_event",
                Action::JoinEventFailure { token, event_id },
                err,
            ),
        }
    }
}
