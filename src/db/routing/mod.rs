//! 라우팅 모듈
//!
//! 쿼리 분류, 레플리카 선택(라운드 로빈 + 페일오버), 레플리카 헬스 모니터.
//!
//! # 개요
//!
//! 읽기 전용 쿼리는 레플리카로, 그 외는 프라이머리로 보냅니다. 헬스 모니터가
//! 주기적으로 게시하는 사용 불가 집합을 선택기가 참고해 죽은 레플리카를
//! 건너뜁니다.

mod classifier;
mod health;
mod policy;

pub use classifier::{PrefixClassifier, QueryClassifier};
pub use health::{check_replicas, refresh, HealthMonitor, DEFAULT_HEALTH_CHECK_INTERVAL};
pub use policy::{ReplicaSelector, SelectorMetrics};
