//! Core of a payments front-door.
//!
//! A browser-facing payments service never talks to a payment provider or
//! stores payment state itself. Everything lives in a firewalled
//! downstream resource service; this crate is the layer in between that
//! makes exposing that downstream safe:
//!
//! - [`resource`] is the calling convention: dotted-path addressing
//!   ([`ResourceLocator`]), the verb trait ([`ResourceService`]) with its
//!   single-record reads, the HTTP client built once from a
//!   [`ServiceConfig`], and spec-bounded cross-resource
//!   [`expansion`](resource::expand).
//! - [`proxy`] exposes a downstream resource to clients under a verb
//!   whitelist and a server-side argument rewrite, so a client can never
//!   widen a query past its own records or update a record it does not
//!   own.
//! - [`session`] and [`transaction`] carry per-buyer state: the
//!   authenticated [`Principal`] and the at-most-one live transaction per
//!   session enforced by the [`TransactionLedger`].
//! - [`flows`] composes these into the buyer-facing operations: sign-in,
//!   stored pay methods, subscriptions, one-off sales, and transaction
//!   history.
//!
//! # Quick start
//!
//! ```no_run
//! use payfront::config::ServiceConfig;
//! use payfront::flows::buyers;
//! use payfront::resource::HttpResourceService;
//! use payfront::session::{MemorySession, Principal};
//!
//! # async fn example() -> payfront::error::Result<()> {
//! let config = ServiceConfig::from_toml(
//!     r#"
//!     base_url = "https://resources.internal/api/"
//!     key = "front-door"
//!     secret = "s3cret"
//!     "#,
//! )?;
//! let service = HttpResourceService::new(&config)?;
//!
//! let signed_in = buyers::sign_in(&service, "idp:9f1c").await?;
//! let uri = signed_in.buyer["resource_uri"].as_str().unwrap_or_default();
//!
//! let mut session = MemorySession::new();
//! Principal::new("idp:9f1c", uri).store(&mut session);
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! [`GatewayError`] is split by how a failure must be routed, not where
//! it occurred. A missing record is the only variant meant for control
//! flow; downstream rejections carry their payload back to the client as
//! a structured 400; downstream failures stay loud all the way up.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod flows;
pub mod proxy;
pub mod resource;
pub mod session;
pub mod transaction;

pub use config::ServiceConfig;
pub use error::{GatewayError, Result};
pub use proxy::{ProxyDescriptor, ProxyResponse, ResourceProxy, Verb};
pub use resource::{ExpansionSpec, HttpResourceService, Query, ResourceLocator, ResourceService};
pub use session::{MemorySession, Principal, SessionStore};
pub use transaction::{TransactionLedger, TransactionStatus, TransactionType};
