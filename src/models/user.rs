//! Users and their flag bitmask.

use std::sync::atomic::AtomicU64;

use serde_json::Value;

use super::{impl_cached, Snowflake};
use crate::utils::json::{bool_not_null, snowflake_not_null, string_not_null};

/// Bitmask flags describing a user account.
pub mod user_flags {
    pub const BOT: u32 = 1 << 0;
    pub const SYSTEM: u32 = 1 << 1;
    pub const MFA_ENABLED: u32 = 1 << 2;
    pub const VERIFIED: u32 = 1 << 3;
    pub const NITRO_FULL: u32 = 1 << 4;
    pub const NITRO_CLASSIC: u32 = 1 << 5;
    pub const DISCORD_EMPLOYEE: u32 = 1 << 6;
    pub const PARTNERED_OWNER: u32 = 1 << 7;
    pub const HYPESQUAD_EVENTS: u32 = 1 << 8;
    pub const BUGHUNTER_1: u32 = 1 << 9;
    pub const HOUSE_BRAVERY: u32 = 1 << 10;
    pub const HOUSE_BRILLIANCE: u32 = 1 << 11;
    pub const HOUSE_BALANCE: u32 = 1 << 12;
    pub const EARLY_SUPPORTER: u32 = 1 << 13;
    pub const TEAM_USER: u32 = 1 << 14;
    pub const BUGHUNTER_2: u32 = 1 << 15;
    pub const VERIFIED_BOT: u32 = 1 << 16;
    pub const VERIFIED_BOT_DEV: u32 = 1 << 17;
}

/// A user account. May or may not be a member of any guild.
#[derive(Debug, Default)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    /// Four-digit tag shown after the username.
    pub discriminator: u16,
    /// Avatar hash.
    pub avatar: String,
    /// Bitmask of [`user_flags`] values.
    pub flags: u32,
    deleted_at: AtomicU64,
}

impl User {
    /// Build a user from a parsed JSON object.
    pub fn fill_from_json(value: &Value) -> Self {
        let mut flags = 0;
        if bool_not_null(value, "bot") {
            flags |= user_flags::BOT;
        }
        if bool_not_null(value, "system") {
            flags |= user_flags::SYSTEM;
        }
        if bool_not_null(value, "mfa_enabled") {
            flags |= user_flags::MFA_ENABLED;
        }
        if bool_not_null(value, "verified") {
            flags |= user_flags::VERIFIED;
        }

        Self {
            id: snowflake_not_null(value, "id"),
            username: string_not_null(value, "username"),
            discriminator: string_not_null(value, "discriminator").parse().unwrap_or(0),
            avatar: string_not_null(value, "avatar"),
            flags,
            deleted_at: AtomicU64::new(0),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.flags & user_flags::BOT != 0
    }

    pub fn is_system(&self) -> bool {
        self.flags & user_flags::SYSTEM != 0
    }

    pub fn is_mfa_enabled(&self) -> bool {
        self.flags & user_flags::MFA_ENABLED != 0
    }

    pub fn is_verified(&self) -> bool {
        self.flags & user_flags::VERIFIED != 0
    }

    pub fn is_verified_bot(&self) -> bool {
        self.flags & user_flags::VERIFIED_BOT != 0
    }
}

impl_cached!(User);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fills_from_json() {
        let value = json!({
            "id": "123456789",
            "username": "clyde",
            "discriminator": "0001",
            "avatar": "a1b2c3",
            "bot": true,
            "mfa_enabled": true,
        });
        let user = User::fill_from_json(&value);
        assert_eq!(user.id, 123456789);
        assert_eq!(user.username, "clyde");
        assert_eq!(user.discriminator, 1);
        assert_eq!(user.avatar, "a1b2c3");
        assert!(user.is_bot());
        assert!(user.is_mfa_enabled());
        assert!(!user.is_system());
    }

    #[test]
    fn flag_bits_are_distinct_and_nonzero() {
        use user_flags::*;
        let all = [
            BOT,
            SYSTEM,
            MFA_ENABLED,
            VERIFIED,
            NITRO_FULL,
            NITRO_CLASSIC,
            DISCORD_EMPLOYEE,
            PARTNERED_OWNER,
            HYPESQUAD_EVENTS,
            BUGHUNTER_1,
            HOUSE_BRAVERY,
            HOUSE_BRILLIANCE,
            HOUSE_BALANCE,
            EARLY_SUPPORTER,
            TEAM_USER,
            BUGHUNTER_2,
            VERIFIED_BOT,
            VERIFIED_BOT_DEV,
        ];
        for (i, a) in all.iter().enumerate() {
            assert_ne!(*a, 0, "flag {} must be a real bit", i);
            for b in &all[i + 1..] {
                assert_ne!(a, b, "flags must not collide");
            }
        }
    }
}
