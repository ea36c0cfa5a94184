//! Guilds, guild membership and their flag bitmasks.

use std::sync::atomic::AtomicU64;

use serde_json::{json, Value};

use super::{impl_cached, Snowflake};
use crate::utils::json::{
    bool_not_null, int_not_null, snowflake_not_null, string_not_null, timestamp_not_null,
};

/// Bitmask flags for a guild.
pub mod guild_flags {
    pub const LARGE: u32 = 1 << 0;
    pub const UNAVAILABLE: u32 = 1 << 1;
    pub const WIDGET_ENABLED: u32 = 1 << 2;
    pub const INVITE_SPLASH: u32 = 1 << 3;
    pub const VIP_REGIONS: u32 = 1 << 4;
    pub const VANITY_URL: u32 = 1 << 5;
    pub const VERIFIED: u32 = 1 << 6;
    pub const PARTNERED: u32 = 1 << 7;
    pub const COMMUNITY: u32 = 1 << 8;
    pub const COMMERCE: u32 = 1 << 9;
    pub const NEWS: u32 = 1 << 10;
    pub const DISCOVERABLE: u32 = 1 << 11;
    pub const FEATUREABLE: u32 = 1 << 12;
    pub const ANIMATED_ICON: u32 = 1 << 13;
    pub const BANNER: u32 = 1 << 14;
    pub const WELCOME_SCREEN_ENABLED: u32 = 1 << 15;
    pub const MEMBER_VERIFICATION_GATE: u32 = 1 << 16;
    pub const PREVIEW_ENABLED: u32 = 1 << 17;
    pub const NO_JOIN_NOTIFICATIONS: u32 = 1 << 18;
    pub const NO_BOOST_NOTIFICATIONS: u32 = 1 << 19;
}

/// Bitmask flags for a guild member.
pub mod member_flags {
    pub const DEAF: u32 = 1 << 0;
    pub const MUTE: u32 = 1 << 1;
    pub const PENDING: u32 = 1 << 2;
}

/// Voice region of a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    Brazil,
    CentralEurope,
    HongKong,
    India,
    Japan,
    Russia,
    Singapore,
    SouthAfrica,
    Sydney,
    #[default]
    UsCentral,
    UsEast,
    UsSouth,
    UsWest,
    WesternEurope,
}

impl Region {
    /// Region names drift as the service adds datacentres; unmapped names
    /// leave the field at its default.
    fn from_api(name: &str) -> Option<Self> {
        Some(match name {
            "brazil" => Self::Brazil,
            "central-europe" => Self::CentralEurope,
            "hong-kong" => Self::HongKong,
            "india" => Self::India,
            "japan" => Self::Japan,
            "russia" => Self::Russia,
            "singapore" => Self::Singapore,
            "south-africa" => Self::SouthAfrica,
            "sydney" => Self::Sydney,
            "us-central" => Self::UsCentral,
            "us-east" => Self::UsEast,
            "us-south" => Self::UsSouth,
            "us-west" => Self::UsWest,
            "western-europe" => Self::WesternEurope,
            _ => return None,
        })
    }
}

/// Feature strings map onto flag bits; unknown strings are ignored.
fn feature_flag(feature: &str) -> u32 {
    match feature {
        "INVITE_SPLASH" => guild_flags::INVITE_SPLASH,
        "VIP_REGIONS" => guild_flags::VIP_REGIONS,
        "VANITY_URL" => guild_flags::VANITY_URL,
        "VERIFIED" => guild_flags::VERIFIED,
        "PARTNERED" => guild_flags::PARTNERED,
        "COMMUNITY" => guild_flags::COMMUNITY,
        "COMMERCE" => guild_flags::COMMERCE,
        "NEWS" => guild_flags::NEWS,
        "DISCOVERABLE" => guild_flags::DISCOVERABLE,
        "FEATUREABLE" => guild_flags::FEATUREABLE,
        "ANIMATED_ICON" => guild_flags::ANIMATED_ICON,
        "BANNER" => guild_flags::BANNER,
        "WELCOME_SCREEN_ENABLED" => guild_flags::WELCOME_SCREEN_ENABLED,
        "MEMBER_VERIFICATION_GATE_ENABLED" => guild_flags::MEMBER_VERIFICATION_GATE,
        "PREVIEW_ENABLED" => guild_flags::PREVIEW_ENABLED,
        _ => 0,
    }
}

/// A guild (server).
#[derive(Debug, Default)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub icon: String,
    pub discovery_splash: String,
    pub owner_id: Snowflake,
    pub voice_region: Region,
    pub afk_channel_id: Snowflake,
    pub afk_timeout: u16,
    pub widget_channel_id: Snowflake,
    pub verification_level: u8,
    pub default_message_notifications: u8,
    pub explicit_content_filter: u8,
    pub mfa_level: u8,
    pub application_id: Snowflake,
    pub system_channel_id: Snowflake,
    pub rules_channel_id: Snowflake,
    pub member_count: u32,
    pub vanity_url_code: String,
    pub description: String,
    pub banner: String,
    pub premium_tier: u8,
    pub premium_subscription_count: u16,
    pub public_updates_channel_id: Snowflake,
    pub max_video_channel_users: u32,
    /// Bitmask of [`guild_flags`] values.
    pub flags: u32,
    deleted_at: AtomicU64,
}

impl Guild {
    /// Build a guild from a parsed JSON object. An unavailable guild
    /// carries only its id and the unavailable flag.
    pub fn fill_from_json(value: &Value) -> Self {
        let mut guild = Guild {
            id: snowflake_not_null(value, "id"),
            ..Default::default()
        };

        if bool_not_null(value, "unavailable") {
            guild.flags |= guild_flags::UNAVAILABLE;
            return guild;
        }

        guild.name = string_not_null(value, "name");
        guild.icon = string_not_null(value, "icon");
        guild.discovery_splash = string_not_null(value, "discovery_splash");
        guild.owner_id = snowflake_not_null(value, "owner_id");
        if let Some(region) = value
            .get("region")
            .and_then(Value::as_str)
            .and_then(Region::from_api)
        {
            guild.voice_region = region;
        }
        if bool_not_null(value, "large") {
            guild.flags |= guild_flags::LARGE;
        }
        if bool_not_null(value, "widget_enabled") {
            guild.flags |= guild_flags::WIDGET_ENABLED;
        }
        if let Some(features) = value.get("features").and_then(Value::as_array) {
            for feature in features {
                if let Some(name) = feature.as_str() {
                    guild.flags |= feature_flag(name);
                }
            }
        }
        let system_channel_flags = int_not_null(value, "system_channel_flags");
        if system_channel_flags & 1 != 0 {
            guild.flags |= guild_flags::NO_JOIN_NOTIFICATIONS;
        }
        if system_channel_flags & 2 != 0 {
            guild.flags |= guild_flags::NO_BOOST_NOTIFICATIONS;
        }
        guild.afk_channel_id = snowflake_not_null(value, "afk_channel_id");
        guild.afk_timeout = int_not_null(value, "afk_timeout") as u16;
        guild.widget_channel_id = snowflake_not_null(value, "widget_channel_id");
        guild.verification_level = int_not_null(value, "verification_level") as u8;
        guild.default_message_notifications =
            int_not_null(value, "default_message_notifications") as u8;
        guild.explicit_content_filter = int_not_null(value, "explicit_content_filter") as u8;
        guild.mfa_level = int_not_null(value, "mfa_level") as u8;
        guild.application_id = snowflake_not_null(value, "application_id");
        guild.system_channel_id = snowflake_not_null(value, "system_channel_id");
        guild.rules_channel_id = snowflake_not_null(value, "rules_channel_id");
        guild.member_count = int_not_null(value, "member_count") as u32;
        guild.vanity_url_code = string_not_null(value, "vanity_url_code");
        guild.description = string_not_null(value, "description");
        guild.banner = string_not_null(value, "banner");
        guild.premium_tier = int_not_null(value, "premium_tier") as u8;
        guild.premium_subscription_count =
            int_not_null(value, "premium_subscription_count") as u16;
        guild.public_updates_channel_id = snowflake_not_null(value, "public_updates_channel_id");
        guild.max_video_channel_users = int_not_null(value, "max_video_channel_users") as u32;
        guild
    }

    /// Serialize the writable fields for API create/modify calls.
    pub fn build_json(&self, with_id: bool) -> String {
        let mut j = json!({});
        if with_id {
            j["id"] = json!(self.id.to_string());
        }
        if !self.name.is_empty() {
            j["name"] = json!(self.name);
        }
        j["widget_enabled"] = json!(self.widget_enabled());
        if self.afk_channel_id != 0 {
            j["afk_channel_id"] = json!(self.afk_channel_id);
            j["afk_timeout"] = json!(self.afk_timeout);
        }
        if self.widget_enabled() {
            j["widget_channel_id"] = json!(self.widget_channel_id);
        }
        j["default_message_notifications"] = json!(self.default_message_notifications);
        j["explicit_content_filter"] = json!(self.explicit_content_filter);
        j["mfa_level"] = json!(self.mfa_level);
        if self.system_channel_id != 0 {
            j["system_channel_id"] = json!(self.system_channel_id);
        }
        if self.rules_channel_id != 0 {
            j["rules_channel_id"] = json!(self.rules_channel_id);
        }
        if !self.vanity_url_code.is_empty() {
            j["vanity_url_code"] = json!(self.vanity_url_code);
        }
        if !self.description.is_empty() {
            j["description"] = json!(self.description);
        }
        j.to_string()
    }

    pub fn is_large(&self) -> bool {
        self.flags & guild_flags::LARGE != 0
    }

    pub fn is_unavailable(&self) -> bool {
        self.flags & guild_flags::UNAVAILABLE != 0
    }

    pub fn widget_enabled(&self) -> bool {
        self.flags & guild_flags::WIDGET_ENABLED != 0
    }

    pub fn is_verified(&self) -> bool {
        self.flags & guild_flags::VERIFIED != 0
    }

    pub fn is_partnered(&self) -> bool {
        self.flags & guild_flags::PARTNERED != 0
    }

    pub fn is_community(&self) -> bool {
        self.flags & guild_flags::COMMUNITY != 0
    }

    pub fn has_banner(&self) -> bool {
        self.flags & guild_flags::BANNER != 0
    }
}

impl_cached!(Guild);

/// Membership of a user in one guild.
#[derive(Debug, Default, Clone)]
pub struct GuildMember {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nickname: String,
    pub roles: Vec<Snowflake>,
    /// Unix seconds the member joined.
    pub joined_at: i64,
    /// Unix seconds the member started boosting; 0 when not boosting.
    pub premium_since: i64,
    /// Bitmask of [`member_flags`] values.
    pub flags: u32,
}

impl GuildMember {
    /// Build a membership record from a parsed JSON object. The guild and
    /// user are supplied by the caller; member payloads do not repeat them.
    pub fn fill_from_json(value: &Value, guild_id: Snowflake, user_id: Snowflake) -> Self {
        let mut roles = Vec::new();
        if let Some(entries) = value.get("roles").and_then(Value::as_array) {
            for role in entries {
                if let Some(id) = role.as_str().and_then(|s| s.parse().ok()) {
                    roles.push(id);
                }
            }
        }

        let mut flags = 0;
        if bool_not_null(value, "deaf") {
            flags |= member_flags::DEAF;
        }
        if bool_not_null(value, "mute") {
            flags |= member_flags::MUTE;
        }
        if bool_not_null(value, "pending") {
            flags |= member_flags::PENDING;
        }

        Self {
            guild_id,
            user_id,
            nickname: string_not_null(value, "nickname"),
            roles,
            joined_at: timestamp_not_null(value, "joined_at"),
            premium_since: timestamp_not_null(value, "premium_since"),
            flags,
        }
    }

    pub fn is_deaf(&self) -> bool {
        self.flags & member_flags::DEAF != 0
    }

    pub fn is_muted(&self) -> bool {
        self.flags & member_flags::MUTE != 0
    }

    pub fn is_pending(&self) -> bool {
        self.flags & member_flags::PENDING != 0
    }
}
