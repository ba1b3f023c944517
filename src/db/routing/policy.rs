//! 레플리카 선택기
//!
//! 라운드 로빈으로 다음 레플리카를 고르고, 헬스 체크 결과(사용 불가 집합)를
//! 반영해 죽은 레플리카를 건너뜁니다.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::super::error::{RouterError, RouterResult};

/// 커서와 사용 불가 집합
///
/// 하나의 락으로 함께 보호됩니다.
#[derive(Debug, Default)]
struct SelectorState {
    /// 다음 선택에 쓸 커서 (단조 증가)
    cursor: u64,
    /// 사용 불가 레플리카 인덱스 (마지막 헬스 체크 기준)
    unavailable: HashSet<usize>,
}

/// 선택기 메트릭
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorMetrics {
    /// 레플리카 수
    pub replica_count: usize,
    /// 현재 커서 값 (지금까지의 선택 횟수)
    pub cursor: u64,
    /// 헬스 체크를 거친 선택 시도 횟수
    pub health_checked_attempts: u64,
    /// 사용 불가 레플리카 인덱스 (정렬됨)
    pub unavailable: Vec<usize>,
}

/// 레플리카 선택기
pub struct ReplicaSelector<C> {
    /// 레플리카 목록 (생성 후 불변)
    replicas: Vec<Arc<C>>,
    /// 커서 + 사용 불가 집합
    state: RwLock<SelectorState>,
    /// 자동 페일오버 (false면 순수 라운드 로빈)
    auto_failover: bool,
    /// 디버그 로그
    debug: bool,
    /// 헬스 체크 시도 카운터
    attempts: AtomicU64,
}

impl<C> ReplicaSelector<C> {
    /// 새 선택기 생성
    pub fn new(replicas: Vec<Arc<C>>, auto_failover: bool) -> Self {
        Self {
            replicas,
            state: RwLock::new(SelectorState::default()),
            auto_failover,
            debug: false,
            attempts: AtomicU64::new(0),
        }
    }

    /// 선택 결과 디버그 로그 활성화
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 다음 레플리카 선택
    ///
    /// `skip_health_check`가 true이거나 자동 페일오버가 꺼져 있으면 사용 가능
    /// 여부를 보지 않습니다. 그 외에는 최대 레플리카 수만큼 시도하고, 모두
    /// 사용 불가면 [`RouterError::NoReplicaAvailable`]를 반환합니다.
    pub fn next(&self, skip_health_check: bool) -> RouterResult<Arc<C>> {
        let count = self.replicas.len();
        if count == 0 {
            return Err(RouterError::ReplicasNotConfigured);
        }

        if skip_health_check || !self.auto_failover {
            let index = self.advance();
            return Ok(self.replicas[index].clone());
        }

        for attempt in 1..=count {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            let index = self.advance();
            if self.state.read().unavailable.contains(&index) {
                if self.debug {
                    debug!(index, attempt, "replica unavailable, trying next");
                }
                continue;
            }
            return Ok(self.replicas[index].clone());
        }

        Err(RouterError::NoReplicaAvailable)
    }

    /// 커서 전진, 이번 인덱스 반환
    fn advance(&self) -> usize {
        let index = {
            let mut state = self.state.write();
            let index = (state.cursor % self.replicas.len() as u64) as usize;
            state.cursor = state.cursor.wrapping_add(1);
            index
        };
        if self.debug {
            debug!(index, "replica selected by round robin");
        }
        index
    }

    /// 사용 불가 집합 교체
    ///
    /// 범위를 벗어난 인덱스는 버립니다.
    pub fn publish_unavailable(&self, unavailable: HashSet<usize>) {
        let count = self.replicas.len();
        let unavailable: HashSet<usize> =
            unavailable.into_iter().filter(|&i| i < count).collect();
        self.state.write().unavailable = unavailable;
    }

    /// 레플리카가 사용 가능한지 (마지막 헬스 체크 기준)
    pub fn is_available(&self, index: usize) -> bool {
        index < self.replicas.len() && !self.state.read().unavailable.contains(&index)
    }

    /// 사용 불가 인덱스 스냅샷 (정렬됨)
    pub fn unavailable(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.state.read().unavailable.iter().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// 레플리카 목록
    pub fn replicas(&self) -> &[Arc<C>] {
        &self.replicas
    }

    /// 레플리카 수
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// 레플리카가 없는지
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// 자동 페일오버 여부
    pub fn auto_failover(&self) -> bool {
        self.auto_failover
    }

    /// 메트릭 조회
    pub fn metrics(&self) -> SelectorMetrics {
        let cursor = self.state.read().cursor;
        SelectorMetrics {
            replica_count: self.replicas.len(),
            cursor,
            health_checked_attempts: self.attempts.load(Ordering::Relaxed),
            unavailable: self.unavailable(),
        }
    }
}

impl<C> std::fmt::Debug for ReplicaSelector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaSelector")
            .field("replicas", &self.replicas.len())
            .field("auto_failover", &self.auto_failover)
            .field("unavailable", &self.unavailable())
            .finish()
    }
}
