//! # discord-rest
//!
//! Asynchronous REST core for the Discord API: a rate-limited request
//! pipeline plus an in-memory cache of domain objects.
//!
//! ## Architecture
//!
//! ```text
//! caller ── post_request ──▶ pending map ──▶ dispatcher task ──▶ HTTPS
//!                                               │  (rate-limit buckets)
//!                                               ▼
//!                                        completion queue
//!                                               │
//!                                               ▼
//!                                        completer task ──▶ user callback
//! ```
//!
//! The dispatcher and completer are decoupled so a slow callback never
//! delays network dispatch and a slow round-trip never delays callbacks
//! for requests that already finished. Completion handlers fire exactly
//! once per submitted request, in FIFO order within an endpoint.

pub mod cache;
pub mod cluster;
pub mod error;
pub mod logger;
pub mod models;
pub mod rest;
pub mod utils;

pub use cache::{garbage_collection, Cache, CacheRegistry, Cached};
pub use cluster::{Cluster, RestConfig};
pub use error::{Error, Result};
pub use models::{Channel, Emoji, Guild, GuildMember, Role, Snowflake, User};
pub use rest::queue::RequestQueue;
pub use rest::request::{
    HttpCompletionEvent, HttpError, HttpMethod, HttpRequest, HttpRequestCompletion,
};
pub use utils::url_encode;
