//! Platform entity resolution.
//!
//! The argument parser never talks to the chat platform directly. Whenever an
//! argument is declared with a platform type (a user, a role, a message, ...)
//! the raw token is handed to an injected [`Resolver`] together with the
//! [`EntityKind`] that was requested.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BoxError;
use crate::payload::Payload;

/// What a resolution needs from the payload before the resolver is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Only a resolver (the platform client) is required.
    Client,
    /// The payload must originate from a guild.
    Guild,
    /// The payload must originate from a channel.
    Channel,
}

/// Platform entity kinds that argument types can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Member,
    Channel,
    TextChannel,
    VoiceChannel,
    Role,
    Emoji,
    Guild,
    Message,
    ChannelMessage,
    GuildMessage,
    Invite,
}

impl EntityKind {
    /// Every entity kind, in declaration order.
    pub const ALL: [EntityKind; 12] = [
        EntityKind::User,
        EntityKind::Member,
        EntityKind::Channel,
        EntityKind::TextChannel,
        EntityKind::VoiceChannel,
        EntityKind::Role,
        EntityKind::Emoji,
        EntityKind::Guild,
        EntityKind::Message,
        EntityKind::ChannelMessage,
        EntityKind::GuildMessage,
        EntityKind::Invite,
    ];

    /// Returns the type tag used to declare this kind on an argument.
    pub fn tag(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Member => "member",
            Self::Channel => "channel",
            Self::TextChannel => "textChannel",
            Self::VoiceChannel => "voiceChannel",
            Self::Role => "role",
            Self::Emoji => "emoji",
            Self::Guild => "guild",
            Self::Message => "message",
            Self::ChannelMessage => "channelMessage",
            Self::GuildMessage => "guildMessage",
            Self::Invite => "invite",
        }
    }

    /// Returns the payload context this kind needs to be resolvable.
    pub fn requirement(self) -> Requirement {
        match self {
            Self::User | Self::Guild | Self::Invite | Self::Emoji => Requirement::Client,
            Self::Member
            | Self::Channel
            | Self::TextChannel
            | Self::VoiceChannel
            | Self::Role
            | Self::GuildMessage => Requirement::Guild,
            Self::Message | Self::ChannelMessage => Requirement::Channel,
        }
    }

    /// Returns `true` if `payload` carries the context this kind requires.
    pub fn is_satisfied_by(self, payload: &dyn Payload) -> bool {
        match self.requirement() {
            Requirement::Client => true,
            Requirement::Guild => payload.guild_id().is_some(),
            Requirement::Channel => payload.channel_id().is_some(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or(())
    }
}

/// Resolves raw tokens into platform entities.
///
/// Implementations are usually thin wrappers around the platform client.
/// Returning `Ok(None)` means "not found"; returning `Err` is treated as a
/// thrown value and routed to the owning command's exception handlers.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolves `token` as an entity of `kind` in the scope of `payload`.
    async fn resolve(
        &self,
        kind: EntityKind,
        token: &str,
        payload: &dyn Payload,
    ) -> Result<Option<Value>, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::TextPayload;

    #[test]
    fn test_tag_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.tag().parse::<EntityKind>(), Ok(kind));
        }
        assert!("string".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_requirements() {
        let dm = TextPayload::new("hi").author("1").channel("9");
        assert!(EntityKind::User.is_satisfied_by(&dm));
        assert!(EntityKind::Message.is_satisfied_by(&dm));
        assert!(!EntityKind::Role.is_satisfied_by(&dm));

        let bare = TextPayload::new("hi");
        assert!(!EntityKind::ChannelMessage.is_satisfied_by(&bare));
    }
}
