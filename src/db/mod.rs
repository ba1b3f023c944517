//! DB Module
//!
//! 프라이머리 1개 + 레플리카 N개 읽기/쓰기 분리 라우터
//!
//! # 구성
//!
//! - 연결 핸들 (`Connection`) - 외부 구현체가 제공하는 DB 엔드포인트
//! - 쿼리 분류기 (`QueryClassifier`, `PrefixClassifier`)
//! - 레플리카 선택기 (`ReplicaSelector`) - 라운드 로빈 + 페일오버
//! - 헬스 모니터 (`HealthMonitor`)
//! - 라우터 (`Router`) - 공개 진입점
//!
//! # Example
//!
//! ```ignore
//! use replica_router::{Context, Router, RouterConfig};
//!
//! let router = Router::new(primary, vec![replica1, replica2], RouterConfig::from_env()?).await?;
//!
//! // 레플리카로 라우팅
//! let rows = router.query("SELECT * FROM users", &[]).await?;
//!
//! // 프라이머리로 라우팅
//! router.exec("UPDATE users SET name = ?", &["alice".into()]).await?;
//!
//! // 방금 쓴 데이터를 읽을 때는 프라이머리 강제
//! let ctx = Context::background().with_primary();
//! let rows = router.query_context(&ctx, "SELECT * FROM users", &[]).await?;
//!
//! router.close().await?;
//! ```

pub mod routing;
mod config;
mod connection;
mod context;
mod error;
mod router;
mod types;

#[cfg(test)]
pub(crate) mod mock;

// Re-exports
pub use config::{
    RouterConfig, RouterConfigBuilder, ENV_DEBUG, ENV_DISABLE_REPLICA_AUTO_FAILOVER,
    ENV_HEALTH_CHECK_INTERVAL_SECS, ENV_PRIMARY_IN_MAINTENANCE, ENV_VALIDATE_ON_NEW,
};
pub use connection::Connection;
pub use context::Context;
pub use error::{RouterError, RouterResult};
pub use router::{Router, RouterBuilder, RouterMetrics};
pub use types::{IsolationLevel, TxOptions, Value};
