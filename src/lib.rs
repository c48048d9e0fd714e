//! Remote configuration and feature-flag client for browser-facing learning
//! applications. The client resolves flag and configuration values for a
//! caller-supplied [`EvaluationContext`], caches results with a
//! time-to-live, and retries transient network failures with bounded
//! exponential backoff.
//!
//! # Overview
//!
//! [`EvaluationContext`] describes the caller: identity, tenant, role, grade
//! band, tenant tier, variation tag, and free-form attributes. The backend
//! uses it to resolve values; the client encodes it as request headers and
//! derives cache keys from it.
//!
//! [`ConfigClient`] is the entry point. It consults an in-memory TTL cache
//! before any network call, coalesces concurrent lookups of the same key and
//! context into one request, and converts terminal network failures into
//! conservative defaults instead of errors. Construct one client at
//! application composition time and share it (`Arc<ConfigClient>`) with
//! every consumer.
//!
//! [`Resolution`] is the return type of every lookup. It distinguishes an
//! authoritative backend answer from a fail-open default, so callers can
//! choose their own degradation policy, or ignore the difference entirely
//! via [`Resolution::into_value`].
//!
//! The [`registry`] module holds an optional process-wide default instance
//! for legacy call sites that cannot take an injected client.
//!
//! # Fail-open behavior
//!
//! Flag resolution is never critical enough to break a page. When the
//! backend stays unreachable after the retry budget, single-flag lookups
//! resolve to absent, batch lookups to an empty map, listings to an empty
//! list, and the domain configuration endpoints
//! ([`ConfigClient::get_chat_config`] and friends) to hard-coded
//! conservative defaults. A cached absent flag and an outage fallback are
//! different things; [`Resolution::is_fallback`] tells them apart.
//!
//! # Logging
//!
//! The crate logs through [`log`](https://docs.rs/log/latest/log/) under the
//! `edflags` target. Failures that were converted into fallbacks are logged
//! at warn level.
//!
//! # Examples
//!
//! ```no_run
//! # use edflags::{ClientConfig, ConfigClient, EvaluationContext, GradeBand};
//! # async fn demo() -> edflags::Result<()> {
//! let client = ConfigClient::new(
//!     ClientConfig::new("https://flags.example.com").api_key("server-key"),
//! )?;
//!
//! let context = EvaluationContext::new()
//!     .tenant_id("district-42")
//!     .role("teacher")
//!     .grade_band(GradeBand::Middle);
//!
//! if client
//!     .evaluate_boolean("library.search", &context)
//!     .await
//!     .into_value()
//!     .unwrap_or(false)
//! {
//!     // render the new library search
//! }
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod registry;

mod cache;
mod client;
mod config;
mod context;
mod domain_config;
mod error;
mod flags;
mod resolution;
mod transport;

pub use client::{ConfigClient, ListFlagsFilter};
pub use config::ClientConfig;
pub use context::{AttributeValue, Attributes, EvaluationContext, GradeBand};
pub use domain_config::{ChatConfig, GamesConfig, SelConfig, SlpConfig};
pub use error::{Error, Result};
pub use flags::{FlagDefinition, FlagKind, FlagValue};
pub use resolution::Resolution;
