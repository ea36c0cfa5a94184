//! Custom emoji.

use std::sync::atomic::AtomicU64;

use serde_json::Value;

use super::{impl_cached, Snowflake};
use crate::utils::json::{bool_not_null, snowflake_not_null, string_not_null};

/// Bitmask flags for an emoji.
pub mod emoji_flags {
    pub const REQUIRE_COLONS: u32 = 1 << 0;
    pub const MANAGED: u32 = 1 << 1;
    pub const ANIMATED: u32 = 1 << 2;
    pub const AVAILABLE: u32 = 1 << 3;
}

/// A custom emoji uploaded to a guild.
#[derive(Debug, Default)]
pub struct Emoji {
    pub id: Snowflake,
    pub name: String,
    /// User that uploaded the emoji; 0 when not included in the payload.
    pub user_id: Snowflake,
    /// Bitmask of [`emoji_flags`] values.
    pub flags: u32,
    deleted_at: AtomicU64,
}

impl Emoji {
    /// Build an emoji from a parsed JSON object.
    pub fn fill_from_json(value: &Value) -> Self {
        let mut flags = 0;
        if bool_not_null(value, "require_colons") {
            flags |= emoji_flags::REQUIRE_COLONS;
        }
        if bool_not_null(value, "managed") {
            flags |= emoji_flags::MANAGED;
        }
        if bool_not_null(value, "animated") {
            flags |= emoji_flags::ANIMATED;
        }
        if bool_not_null(value, "available") {
            flags |= emoji_flags::AVAILABLE;
        }

        let user_id = value
            .get("user")
            .map(|user| snowflake_not_null(user, "id"))
            .unwrap_or(0);

        Self {
            id: snowflake_not_null(value, "id"),
            name: string_not_null(value, "name"),
            user_id,
            flags,
            deleted_at: AtomicU64::new(0),
        }
    }

    pub fn requires_colons(&self) -> bool {
        self.flags & emoji_flags::REQUIRE_COLONS != 0
    }

    pub fn is_managed(&self) -> bool {
        self.flags & emoji_flags::MANAGED != 0
    }

    pub fn is_animated(&self) -> bool {
        self.flags & emoji_flags::ANIMATED != 0
    }
}

impl_cached!(Emoji);
