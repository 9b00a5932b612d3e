//! The calls the bot makes to the chat platform outside of replying to a
//! command. Tasks are written against [`ChatApi`] instead of the raw client.
use async_trait::async_trait;
use serenity::client::Context as RawContext;
use serenity::model::id::{ChannelId, RoleId};

use std::fmt::Display;

/// Maximum number of members returned per request.
const MEMBERS_PAGE_SIZE: u64 = 1000;

#[async_trait]
pub trait ChatApi: Send + Sync {
    type Error: Display + Send;

    /// Posts a new text message into a channel.
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), Self::Error>;

    /// Returns the ids of all members of a guild having a role.
    async fn role_members(&self, guild_id: u64, role_id: u64) -> Result<Vec<u64>, Self::Error>;

    async fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), Self::Error>;

    async fn remove_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), Self::Error>;
}

#[async_trait]
impl ChatApi for RawContext {
    type Error = serenity::Error;

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), Self::Error> {
        ChannelId(channel_id).say(self, content).await?;
        Ok(())
    }

    async fn role_members(&self, guild_id: u64, role_id: u64) -> Result<Vec<u64>, Self::Error> {
        let role_id = RoleId(role_id);

        let mut members = Vec::new();
        let mut after = None;

        loop {
            let page = self
                .http
                .get_guild_members(guild_id, Some(MEMBERS_PAGE_SIZE), after)
                .await?;

            let len = page.len() as u64;
            after = page.last().map(|m| m.user.id.0);

            members.extend(
                page.into_iter()
                    .filter(|m| m.roles.contains(&role_id))
                    .map(|m| m.user.id.0),
            );

            if len < MEMBERS_PAGE_SIZE {
                return Ok(members);
            }
        }
    }

    async fn add_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), Self::Error> {
        self.http.add_member_role(guild_id, user_id, role_id).await
    }

    async fn remove_member_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), Self::Error> {
        self.http.remove_member_role(guild_id, user_id, role_id).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::ChatApi;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use std::collections::{BTreeMap, BTreeSet, HashSet};

    /// An in-memory [`ChatApi`] recording every call.
    #[derive(Debug, Default)]
    pub struct MockChat {
        /// Channels rejecting every message.
        pub broken_channels: HashSet<u64>,
        pub sent: Mutex<Vec<(u64, String)>>,
        /// Roles per `(guild, user)`.
        pub roles: Mutex<BTreeMap<(u64, u64), BTreeSet<u64>>>,
    }

    impl MockChat {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_broken_channel(mut self, channel_id: u64) -> Self {
            self.broken_channels.insert(channel_id);
            self
        }

        pub fn give_role(&self, guild_id: u64, user_id: u64, role_id: u64) {
            self.roles
                .lock()
                .entry((guild_id, user_id))
                .or_default()
                .insert(role_id);
        }

        pub fn sent(&self) -> Vec<(u64, String)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl ChatApi for MockChat {
        type Error = String;

        async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), Self::Error> {
            if self.broken_channels.contains(&channel_id) {
                return Err(String::from("Missing Access"));
            }

            self.sent.lock().push((channel_id, content.to_owned()));
            Ok(())
        }

        async fn role_members(
            &self,
            guild_id: u64,
            role_id: u64,
        ) -> Result<Vec<u64>, Self::Error> {
            Ok(self
                .roles
                .lock()
                .iter()
                .filter(|((guild, _), roles)| *guild == guild_id && roles.contains(&role_id))
                .map(|((_, user), _)| *user)
                .collect())
        }

        async fn add_member_role(
            &self,
            guild_id: u64,
            user_id: u64,
            role_id: u64,
        ) -> Result<(), Self::Error> {
            self.give_role(guild_id, user_id, role_id);
            Ok(())
        }

        async fn remove_member_role(
            &self,
            guild_id: u64,
            user_id: u64,
            role_id: u64,
        ) -> Result<(), Self::Error> {
            if let Some(roles) = self.roles.lock().get_mut(&(guild_id, user_id)) {
                roles.remove(&role_id);
            }
            Ok(())
        }
    }
}
