//! 라우터 설정
//!
//! 생성 시 한 번 읽히며 이후 바뀌지 않습니다.

use std::time::Duration;

use super::error::{RouterError, RouterResult};
use super::routing::DEFAULT_HEALTH_CHECK_INTERVAL;

/// 프라이머리 점검 모드 환경 변수
pub const ENV_PRIMARY_IN_MAINTENANCE: &str = "REPLICA_ROUTER_PRIMARY_IN_MAINTENANCE";
/// 디버그 로그 환경 변수
pub const ENV_DEBUG: &str = "REPLICA_ROUTER_DEBUG";
/// 생성 시 검증 환경 변수
pub const ENV_VALIDATE_ON_NEW: &str = "REPLICA_ROUTER_VALIDATE_ON_NEW";
/// 레플리카 자동 페일오버 비활성화 환경 변수
pub const ENV_DISABLE_REPLICA_AUTO_FAILOVER: &str = "REPLICA_ROUTER_DISABLE_REPLICA_AUTO_FAILOVER";
/// 헬스 체크 주기(초) 환경 변수
pub const ENV_HEALTH_CHECK_INTERVAL_SECS: &str = "REPLICA_ROUTER_HEALTH_CHECK_INTERVAL_SECS";

// ============================================================================
// RouterConfig - 라우터 설정
// ============================================================================

/// 라우터 설정
///
/// # 필드
///
/// | 필드 | 기본값 | 설명 |
/// |------|--------|------|
/// | `primary_in_maintenance` | false | 프라이머리 점검 모드 |
/// | `debug` | false | 라우팅 결정 디버그 로그 |
/// | `validate_on_new` | false | 생성 시 프라이머리/레플리카 존재 검증 |
/// | `disable_replica_auto_failover` | false | 헬스 모니터와 페일오버 끄기 |
/// | `health_check_interval` | 30초 | 헬스 체크 주기 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// 프라이머리 점검 모드
    pub primary_in_maintenance: bool,
    /// 디버그 로그
    pub debug: bool,
    /// 생성 시 검증
    pub validate_on_new: bool,
    /// 레플리카 자동 페일오버 비활성화
    pub disable_replica_auto_failover: bool,
    /// 헬스 체크 주기
    pub health_check_interval: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            primary_in_maintenance: false,
            debug: false,
            validate_on_new: false,
            disable_replica_auto_failover: false,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
        }
    }
}

impl RouterConfig {
    /// 빌더 시작
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }

    /// 환경 변수에서 설정 로드
    ///
    /// 불리언 값은 대소문자 구분 없이 `true`일 때만 켜집니다.
    pub fn from_env() -> RouterResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> RouterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        let disable_replica_auto_failover = flag(ENV_DISABLE_REPLICA_AUTO_FAILOVER);

        let health_check_interval = match lookup(ENV_HEALTH_CHECK_INTERVAL_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    RouterError::configuration(format!(
                        "{} must be a number of seconds, got {:?}",
                        ENV_HEALTH_CHECK_INTERVAL_SECS, raw
                    ))
                })?;
                // 모니터를 띄울 때만 0을 거부
                if secs == 0 && !disable_replica_auto_failover {
                    return Err(RouterError::configuration(format!(
                        "{} must be greater than zero",
                        ENV_HEALTH_CHECK_INTERVAL_SECS
                    )));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_HEALTH_CHECK_INTERVAL,
        };

        Ok(Self {
            primary_in_maintenance: flag(ENV_PRIMARY_IN_MAINTENANCE),
            debug: flag(ENV_DEBUG),
            validate_on_new: flag(ENV_VALIDATE_ON_NEW),
            disable_replica_auto_failover,
            health_check_interval,
        })
    }

    /// 자동 페일오버(헬스 모니터) 사용 여부
    pub fn auto_failover(&self) -> bool {
        !self.disable_replica_auto_failover
    }
}

// ============================================================================
// RouterConfigBuilder - 설정 빌더
// ============================================================================

/// 라우터 설정 빌더
#[derive(Debug, Clone, Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    /// 프라이머리 점검 모드 설정
    pub fn with_primary_in_maintenance(mut self, enabled: bool) -> Self {
        self.config.primary_in_maintenance = enabled;
        self
    }

    /// 디버그 로그 설정
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// 생성 시 검증 설정
    pub fn with_validate_on_new(mut self, enabled: bool) -> Self {
        self.config.validate_on_new = enabled;
        self
    }

    /// 레플리카 자동 페일오버 비활성화 설정
    pub fn with_disable_replica_auto_failover(mut self, disabled: bool) -> Self {
        self.config.disable_replica_auto_failover = disabled;
        self
    }

    /// 헬스 체크 주기 설정
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    /// 빌드
    pub fn build(self) -> RouterConfig {
        self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
