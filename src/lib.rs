//! # Replica Router
//!
//! Read/write splitting in front of one primary database connection and a set
//! of read replicas.
//!
//! ## Features
//!
//! - **Query classification** - read-only queries go to replicas, everything else to the primary
//! - **Round robin** - replicas are used in turn through a shared cursor
//! - **Auto failover** - a background health monitor pings replicas and unhealthy ones are skipped
//! - **Maintenance mode** - the primary can be taken out of rotation; writes fail fast
//! - **Force primary** - per-call override for read-your-writes
//!
//! The router does not open sockets or execute statements itself. It drives any
//! type implementing [`Connection`], typically a thin wrapper around an existing
//! connection pool.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use replica_router::{Context, Router, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new(primary, vec![replica1, replica2], RouterConfig::from_env()?).await?;
//!
//!     // Read-only: round robin over healthy replicas
//!     let rows = router.query("SELECT * FROM users WHERE id = ?", &[42.into()]).await?;
//!
//!     // Writes and transactions: primary
//!     router.exec("DELETE FROM sessions WHERE expired", &[]).await?;
//!     let tx = router.begin().await?;
//!
//!     // Read your own write from the primary
//!     let ctx = Context::background().with_primary();
//!     let rows = router.query_context(&ctx, "SELECT * FROM users", &[]).await?;
//!
//!     router.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! [`RouterConfig`] is read once at construction, either from the builder or
//! from `REPLICA_ROUTER_*` environment variables:
//!
//! ```rust
//! use replica_router::RouterConfig;
//! use std::time::Duration;
//!
//! let config = RouterConfig::builder()
//!     .with_validate_on_new(true)
//!     .with_health_check_interval(Duration::from_secs(10))
//!     .build();
//!
//! assert!(config.auto_failover());
//! ```
//!
//! ## Query Classification
//!
//! The default classifier treats a query as read-only when it starts with
//! `select` (case-insensitive, no whitespace trimming). Inject another one with
//! [`RouterBuilder::classifier`]:
//!
//! ```rust
//! use replica_router::routing::{PrefixClassifier, QueryClassifier};
//!
//! let classifier = PrefixClassifier::default();
//! assert!(classifier.is_read_only("SELECT 1"));
//! assert!(!classifier.is_read_only(" select 1"));
//! assert!(!classifier.is_read_only("insert into t values (1)"));
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`RouterResult`]. Routing failures are reported
//! before any call reaches a connection:
//!
//! ```rust
//! use replica_router::RouterError;
//!
//! let err = RouterError::NoReplicaAvailable;
//! assert!(err.is_retryable());
//! assert!(!err.is_configuration_error());
//! ```
//!
//! ## Modules
//!
//! - [`db`] - Router, configuration, connection trait and error types
//! - [`routing`] - Classifier, replica selector and health monitor
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod db;

pub use db::routing;

// Re-exports for convenience
pub use db::{
    Connection, Context, IsolationLevel, Router, RouterBuilder, RouterConfig,
    RouterConfigBuilder, RouterError, RouterMetrics, RouterResult, TxOptions, Value,
};

/// Config alias for convenience
pub type Config = RouterConfig;
