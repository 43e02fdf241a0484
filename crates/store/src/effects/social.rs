use std::collections::HashMap;

use shared::domain::{ChannelId, ReportItemType};
use tracing::info;

use super::{EffectError, Effects, Related};
use crate::{action::Action, bus::NoticeLevel, persist};

impl Effects {
    pub(super) async fn fetch_notifications(&self, page: u32) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchNotifications { token })?;

        let response = match self.api.fetch_notifications(page).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_notifications",
                    Action::FetchNotificationsFailure { token },
                    err,
                )
            }
        };

        self.merge(Related {
            users: response.user_map,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchNotificationsSuccess {
            token,
            page,
            page_total: response.page_total,
            notifications: response.results,
        })
    }

    pub(super) async fn fetch_channel_members(
        &self,
        channel_id: ChannelId,
        offset: u32,
    ) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartFetchChannelMembers {
            token,
            channel_id: channel_id.clone(),
        })?;

        let response = match self.api.fetch_channel_members(&channel_id, offset).await {
            Ok(response) => response,
            Err(err) => {
                return self.fail(
                    "fetch_channel_members",
                    Action::FetchChannelMembersFailure { token, channel_id },
                    err,
                )
            }
        };

        let mut channel = response.channel;
        if channel.id.is_empty() {
            channel.id = channel_id;
        }
        let users: HashMap<_, _> = response
            .members
            .iter()
            .filter(|member| !member.user.id.is_empty())
            .map(|member| (member.user.id.clone(), member.user.clone()))
            .collect();
        self.merge(Related {
            users,
            follows: response.follow_map,
            ..Related::default()
        })?;
        self.dispatch(Action::FetchChannelMembersSuccess {
            token,
            channel,
            offset,
            members: response.members,
            total: response.total,
        })
    }

    pub(super) async fn report_item(
        &self,
        item_id: String,
        item_type: ReportItemType,
        reason: String,
    ) -> Result<(), EffectError> {
        let token = self.store.next_token();
        self.dispatch(Action::StartReportItem {
            token,
            item_id: item_id.clone(),
        })?;

        match self.api.report_item(&item_id, item_type, &reason).await {
            Ok(()) => {
                info!(item_id = %item_id, item_type = item_type.as_str(), "report submitted");
                self.dispatch(Action::ReportItemSuccess { token, item_id })?;
                self.bus
                    .notice(NoticeLevel::Info, "thanks, the report was submitted");
                Ok(())
            }
            Err(err) => self.fail(
                "report_item",
                Action::ReportItemFailure { token, item_id },
                err,
            ),
        }
    }

    pub(super) async fn add_count(&self, number: i64) -> Result<(), EffectError> {
        self.dispatch(Action::AddCount { number })?;
        self.store.flush().await?;
        persist::save_count(self.prefs.as_ref(), self.store.state().count)
            .await
            .map_err(EffectError::Preferences)
    }
}
