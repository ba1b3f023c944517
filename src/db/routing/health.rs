//! 레플리카 헬스 모니터
//!
//! 주기적으로 모든 레플리카에 ping을 보내고, 실패한 레플리카로 새 사용 불가
//! 집합을 만들어 선택기에 통째로 게시합니다. 응답하지 않는 레플리카가 검사를
//! 막지 않도록 ping마다 마감 시간을 둡니다.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::super::connection::Connection;
use super::super::context::Context;
use super::super::error::RouterError;
use super::policy::ReplicaSelector;

/// 기본 헬스 체크 주기
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// 모든 레플리카에 ping, 실패한 인덱스 집합 반환
///
/// ping은 동시에 보내며, 집합은 모든 응답을 받은 뒤 완성됩니다. `deadline`
/// 안에 응답하지 않은 레플리카도 사용 불가로 봅니다.
pub async fn check_replicas<C: Connection>(
    replicas: &[Arc<C>],
    deadline: Duration,
) -> HashSet<usize> {
    let ctx = &Context::background().with_timeout(deadline);
    let pings = replicas.iter().map(|replica| async move {
        tokio::time::timeout(deadline, replica.ping_context(ctx))
            .await
            .unwrap_or_else(|_| {
                Err(RouterError::timeout(format!(
                    "no ping response within {:?}",
                    deadline
                )))
            })
    });
    let results = join_all(pings).await;

    results
        .into_iter()
        .enumerate()
        .filter_map(|(index, result)| match result {
            Ok(()) => None,
            Err(e) => {
                warn!(index, error = %e, "replica ping failed, marking unavailable");
                Some(index)
            }
        })
        .collect()
}

/// 한 번 검사하고 결과를 게시
pub async fn refresh<C: Connection>(
    selector: &ReplicaSelector<C>,
    deadline: Duration,
) -> HashSet<usize> {
    let unavailable = check_replicas(selector.replicas(), deadline).await;
    selector.publish_unavailable(unavailable.clone());
    unavailable
}

/// 헬스 모니터 핸들
///
/// [`HealthMonitor::stop`]은 `self`를 소비하므로 두 번 멈출 수 없습니다.
#[derive(Debug)]
pub struct HealthMonitor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    interval: Duration,
}

impl HealthMonitor {
    /// 백그라운드 모니터 시작
    ///
    /// 첫 검사는 `interval` 뒤에 실행됩니다. 생성 시점의 동기 검사는 호출자가
    /// [`refresh`]로 먼저 수행합니다. tokio 런타임 안에서 호출해야 합니다.
    pub fn spawn<C: Connection>(selector: Arc<ReplicaSelector<C>>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_monitor_loop(selector, interval, cancel.clone()));

        Self {
            cancel,
            handle,
            interval,
        }
    }

    /// 모니터 중지
    ///
    /// 취소 신호만 보내고 진행 중인 ping은 기다리지 않습니다. 태스크는 다음에
    /// 깨어날 때 종료됩니다.
    pub fn stop(self) {
        self.cancel.cancel();
    }

    /// 태스크 종료 여부
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 검사 주기
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

async fn run_monitor_loop<C: Connection>(
    selector: Arc<ReplicaSelector<C>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval_secs = period.as_secs(),
        replicas = selector.len(),
        "replica health monitor started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("replica health monitor shutting down");
                break;
            }
            _ = ticker.tick() => {
                let unavailable = refresh(&selector, period).await;
                debug!(unavailable = unavailable.len(), "replica health check completed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockConnection;

    fn replicas(names: &[&str]) -> Vec<Arc<MockConnection>> {
        names.iter().map(|n| Arc::new(MockConnection::new(*n))).collect()
    }

    #[tokio::test]
    async fn test_check_replicas_marks_failed_pings() {
        let replicas = replicas(&["r0", "r1", "r2"]);
        replicas[1].set_healthy(false);

        let unavailable = check_replicas(&replicas, DEFAULT_HEALTH_CHECK_INTERVAL).await;
        assert_eq!(unavailable, HashSet::from([1]));
        assert!(replicas.iter().all(|r| r.ping_count() == 1));
    }

    #[tokio::test]
    async fn test_refresh_replaces_set() {
        let replicas = replicas(&["r0", "r1"]);
        let selector = ReplicaSelector::new(replicas.clone(), true);

        replicas[0].set_healthy(false);
        refresh(&selector, DEFAULT_HEALTH_CHECK_INTERVAL).await;
        assert_eq!(selector.unavailable(), vec![0]);

        replicas[0].set_healthy(true);
        replicas[1].set_healthy(false);
        refresh(&selector, DEFAULT_HEALTH_CHECK_INTERVAL).await;
        assert_eq!(selector.unavailable(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_ticks_on_interval() {
        let replicas = replicas(&["r0", "r1"]);
        let selector = Arc::new(ReplicaSelector::new(replicas.clone(), true));
        let monitor = HealthMonitor::spawn(selector.clone(), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(replicas[0].ping_count(), 0);

        replicas[1].set_healthy(false);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(replicas[0].ping_count(), 1);
        assert_eq!(selector.unavailable(), vec![1]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(replicas[0].ping_count(), 2);

        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_stops_on_cancel() {
        let replicas = replicas(&["r0"]);
        let selector = Arc::new(ReplicaSelector::new(replicas.clone(), true));
        let monitor = HealthMonitor::spawn(selector, Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(replicas[0].ping_count(), 1);

        let cancel = monitor.cancel.clone();
        monitor.stop();
        assert!(cancel.is_cancelled());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(replicas[0].ping_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_replicas_times_out_silent_replica() {
        let replicas = replicas(&["r0", "r1", "r2"]);
        replicas[0].set_hanging(true);
        replicas[2].set_healthy(false);

        let started = Instant::now();
        let unavailable = check_replicas(&replicas, Duration::from_secs(5)).await;

        assert_eq!(unavailable, HashSet::from([0, 2]));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
        assert_eq!(replicas[1].last_ping_timeout(), Some(Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_keeps_publishing_with_silent_replica() {
        let replicas = replicas(&["r0", "r1"]);
        let selector = Arc::new(ReplicaSelector::new(replicas.clone(), true));
        let monitor = HealthMonitor::spawn(selector.clone(), Duration::from_secs(10));

        replicas[0].set_hanging(true);
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(selector.unavailable(), vec![0]);

        // 다른 레플리카의 상태 변화도 계속 반영
        replicas[1].set_healthy(false);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(selector.unavailable(), vec![0, 1]);

        replicas[0].set_hanging(false);
        replicas[1].set_healthy(true);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(selector.unavailable().is_empty());

        monitor.stop();
    }
}
