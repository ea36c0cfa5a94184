//! Guild channels.

use std::sync::atomic::AtomicU64;

use serde_json::Value;

use super::{impl_cached, Snowflake};
use crate::utils::json::{bool_not_null, int_not_null, snowflake_not_null, string_not_null};

/// Bitmask flags for a channel.
pub mod channel_flags {
    pub const NSFW: u32 = 1 << 0;
    pub const TEXT: u32 = 1 << 1;
    pub const VOICE: u32 = 1 << 2;
    pub const CATEGORY: u32 = 1 << 3;
    pub const NEWS: u32 = 1 << 4;
    pub const STORE: u32 = 1 << 5;
}

/// A channel within a guild.
#[derive(Debug, Default)]
pub struct Channel {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    /// Parent category; 0 when top-level.
    pub parent_id: Snowflake,
    pub name: String,
    pub topic: String,
    pub position: u16,
    /// Slowmode interval in seconds; 0 when off.
    pub rate_limit_per_user: u16,
    /// Bitmask of [`channel_flags`] values.
    pub flags: u32,
    deleted_at: AtomicU64,
}

/// Wire channel types map onto flag bits; unknown types get no kind bit.
fn kind_flag(kind: u64) -> u32 {
    match kind {
        0 => channel_flags::TEXT,
        2 => channel_flags::VOICE,
        4 => channel_flags::CATEGORY,
        5 => channel_flags::NEWS,
        6 => channel_flags::STORE,
        _ => 0,
    }
}

impl Channel {
    /// Build a channel from a parsed JSON object.
    pub fn fill_from_json(value: &Value) -> Self {
        let mut flags = kind_flag(int_not_null(value, "type"));
        if bool_not_null(value, "nsfw") {
            flags |= channel_flags::NSFW;
        }

        Self {
            id: snowflake_not_null(value, "id"),
            guild_id: snowflake_not_null(value, "guild_id"),
            parent_id: snowflake_not_null(value, "parent_id"),
            name: string_not_null(value, "name"),
            topic: string_not_null(value, "topic"),
            position: int_not_null(value, "position") as u16,
            rate_limit_per_user: int_not_null(value, "rate_limit_per_user") as u16,
            flags,
            deleted_at: AtomicU64::new(0),
        }
    }

    pub fn is_nsfw(&self) -> bool {
        self.flags & channel_flags::NSFW != 0
    }

    pub fn is_text_channel(&self) -> bool {
        self.flags & channel_flags::TEXT != 0
    }

    pub fn is_voice_channel(&self) -> bool {
        self.flags & channel_flags::VOICE != 0
    }

    pub fn is_category(&self) -> bool {
        self.flags & channel_flags::CATEGORY != 0
    }
}

impl_cached!(Channel);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fills_from_json() {
        let value = json!({
            "id": "900",
            "guild_id": "7",
            "parent_id": "800",
            "name": "general",
            "topic": "anything goes",
            "type": 0,
            "position": 2,
            "nsfw": false,
            "rate_limit_per_user": 5,
        });
        let channel = Channel::fill_from_json(&value);
        assert_eq!(channel.id, 900);
        assert_eq!(channel.guild_id, 7);
        assert_eq!(channel.parent_id, 800);
        assert_eq!(channel.name, "general");
        assert_eq!(channel.rate_limit_per_user, 5);
        assert!(channel.is_text_channel());
        assert!(!channel.is_voice_channel());
        assert!(!channel.is_nsfw());
    }

    #[test]
    fn unknown_type_gets_no_kind_bit() {
        let value = json!({ "id": "1", "type": 99 });
        let channel = Channel::fill_from_json(&value);
        assert!(!channel.is_text_channel());
        assert!(!channel.is_voice_channel());
        assert!(!channel.is_category());
    }
}
