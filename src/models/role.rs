//! Guild roles.

use std::sync::atomic::AtomicU64;

use serde_json::Value;

use super::{impl_cached, Snowflake};
use crate::utils::json::{bool_not_null, int_not_null, snowflake_not_null, string_not_null};

/// Bitmask flags for a role.
pub mod role_flags {
    pub const HOIST: u32 = 1 << 0;
    pub const MANAGED: u32 = 1 << 1;
    pub const MENTIONABLE: u32 = 1 << 2;
}

/// A role within a guild.
#[derive(Debug, Default)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub colour: u32,
    pub position: i16,
    /// Permission bitmask, sent as a decimal string.
    pub permissions: u64,
    /// Bitmask of [`role_flags`] values.
    pub flags: u32,
    deleted_at: AtomicU64,
}

impl Role {
    /// Build a role from a parsed JSON object. Role payloads do not carry
    /// the owning guild; the caller supplies it.
    pub fn fill_from_json(value: &Value, guild_id: Snowflake) -> Self {
        let mut flags = 0;
        if bool_not_null(value, "hoist") {
            flags |= role_flags::HOIST;
        }
        if bool_not_null(value, "managed") {
            flags |= role_flags::MANAGED;
        }
        if bool_not_null(value, "mentionable") {
            flags |= role_flags::MENTIONABLE;
        }

        Self {
            id: snowflake_not_null(value, "id"),
            guild_id,
            name: string_not_null(value, "name"),
            colour: int_not_null(value, "color") as u32,
            position: int_not_null(value, "position") as i16,
            permissions: string_not_null(value, "permissions").parse().unwrap_or(0),
            flags,
            deleted_at: AtomicU64::new(0),
        }
    }

    pub fn is_hoisted(&self) -> bool {
        self.flags & role_flags::HOIST != 0
    }

    pub fn is_managed(&self) -> bool {
        self.flags & role_flags::MANAGED != 0
    }

    pub fn is_mentionable(&self) -> bool {
        self.flags & role_flags::MENTIONABLE != 0
    }
}

impl_cached!(Role);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fills_from_json() {
        let value = json!({
            "id": "50",
            "name": "moderator",
            "color": 0xFF00FF,
            "position": 3,
            "permissions": "268435456",
            "hoist": true,
            "mentionable": true,
        });
        let role = Role::fill_from_json(&value, 7);
        assert_eq!(role.id, 50);
        assert_eq!(role.guild_id, 7);
        assert_eq!(role.colour, 0xFF00FF);
        assert_eq!(role.position, 3);
        assert_eq!(role.permissions, 268435456);
        assert!(role.is_hoisted());
        assert!(!role.is_managed());
        assert!(role.is_mentionable());
    }
}
