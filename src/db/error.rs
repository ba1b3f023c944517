//! Router Error Types
//!
//! 라우터 에러 정의

use std::error::Error as StdError;
use thiserror::Error;

// ============================================================================
// RouterError - 라우터 에러
// ============================================================================

/// 라우터 에러
#[derive(Error, Debug)]
pub enum RouterError {
    /// 프라이머리 DB가 제공되지 않음
    #[error("Primary DB is not provided")]
    PrimaryNotConfigured,

    /// 레플리카 DB가 하나도 제공되지 않음
    #[error("No replica DB is provided")]
    ReplicasNotConfigured,

    /// 읽기 전용이 아닌 쿼리를 레플리카로 보내려 함
    #[error("Provided SQL is not a read-only query")]
    NotReadOnlyQuery,

    /// 사용 가능한 레플리카 없음
    ///
    /// 프라이머리가 살아 있어도 반환됩니다. 프라이머리로 넘기지 않습니다.
    #[error("No replica DB is available now")]
    NoReplicaAvailable,

    /// 프라이머리 점검 모드
    #[error("Primary DB is in maintenance mode")]
    PrimaryInMaintenance,

    /// 연결 에러
    #[error("Connection error: {0}")]
    Connection(String),

    /// 타임아웃 에러
    #[error("Timeout: {0}")]
    Timeout(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 연결 구현체가 돌려준 에러
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),

    /// 이미 닫힌 라우터
    #[error("Router is closed")]
    Closed,

    /// 여러 에러 묶음 (close)
    #[error("{} errors occurred: {}", .0.len(), join_messages(.0))]
    Multiple(Vec<RouterError>),
}

impl RouterError {
    /// 연결 에러 생성
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 타임아웃 에러 생성
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 백엔드 에러 생성
    pub fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }

    /// 에러 목록을 하나로 합침
    ///
    /// 비어 있으면 `None`, 하나면 그 에러 그대로 반환합니다.
    pub fn combine(mut errors: Vec<RouterError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// 설정 오류 여부
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::PrimaryNotConfigured | Self::ReplicasNotConfigured | Self::Configuration(_)
        )
    }

    /// 재시도 가능 여부
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NoReplicaAvailable | Self::Connection(_) | Self::Timeout(_) => true,
            Self::Multiple(errors) => errors.iter().all(|e| e.is_retryable()),
            _ => false,
        }
    }

    /// 묶인 에러 목록 (단일 에러는 자기 자신)
    pub fn errors(&self) -> Vec<&RouterError> {
        match self {
            Self::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

fn join_messages(errors: &[RouterError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Result Type
// ============================================================================

/// 라우터 결과 타입
pub type RouterResult<T> = Result<T, RouterError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_router_error_display() {
        assert_eq!(
            RouterError::PrimaryInMaintenance.to_string(),
            "Primary DB is in maintenance mode"
        );
        assert_eq!(
            RouterError::connection("refused").to_string(),
            "Connection error: refused"
        );
    }

    #[test]
    fn test_combine() {
        assert!(RouterError::combine(vec![]).is_none());

        let single = RouterError::combine(vec![RouterError::connection("a")]).unwrap();
        assert!(matches!(single, RouterError::Connection(_)));

        let many = RouterError::combine(vec![
            RouterError::connection("a"),
            RouterError::connection("b"),
        ])
        .unwrap();
        assert_eq!(many.errors().len(), 2);
        assert_eq!(
            many.to_string(),
            "2 errors occurred: Connection error: a; Connection error: b"
        );
    }

    #[test]
    fn test_configuration_errors() {
        assert!(RouterError::PrimaryNotConfigured.is_configuration_error());
        assert!(RouterError::ReplicasNotConfigured.is_configuration_error());
        assert!(RouterError::configuration("bad interval").is_configuration_error());
        assert!(!RouterError::NoReplicaAvailable.is_configuration_error());
    }

    #[test]
    fn test_retryable() {
        assert!(RouterError::NoReplicaAvailable.is_retryable());
        assert!(RouterError::timeout("ping").is_retryable());
        assert!(!RouterError::NotReadOnlyQuery.is_retryable());
        assert!(!RouterError::PrimaryInMaintenance.is_retryable());

        let mixed = RouterError::Multiple(vec![
            RouterError::connection("a"),
            RouterError::Closed,
        ]);
        assert!(!mixed.is_retryable());
    }

    #[test]
    fn test_backend_source() {
        let err = RouterError::backend(io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(err.to_string(), "Backend error: disk");
        assert!(std::error::Error::source(&err).is_some());
    }
}
