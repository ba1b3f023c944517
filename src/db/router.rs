//! 읽기/쓰기 분리 라우터
//!
//! 프라이머리 하나와 레플리카 여러 개 앞에 놓여, 호출마다 대상 핸들을 고른 뒤
//! 그대로 위임합니다.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use super::config::RouterConfig;
use super::connection::Connection;
use super::context::Context;
use super::error::{RouterError, RouterResult};
use super::routing::{
    self, HealthMonitor, PrefixClassifier, QueryClassifier, ReplicaSelector,
    DEFAULT_HEALTH_CHECK_INTERVAL,
};
use super::types::{TxOptions, Value};

/// `debug` 설정이 켜져 있을 때만 남기는 라우팅 로그
macro_rules! route_debug {
    ($router:expr, $($arg:tt)+) => {
        if $router.config.debug {
            tracing::debug!($($arg)+);
        }
    };
}

// ============================================================================
// RouterBuilder - 라우터 빌더
// ============================================================================

/// 라우터 빌더
pub struct RouterBuilder<C> {
    primary: Option<C>,
    replicas: Vec<C>,
    config: RouterConfig,
    classifier: Option<Arc<dyn QueryClassifier>>,
}

impl<C: Connection> RouterBuilder<C> {
    fn new() -> Self {
        Self {
            primary: None,
            replicas: Vec::new(),
            config: RouterConfig::default(),
            classifier: None,
        }
    }

    /// 프라이머리 설정
    pub fn primary(mut self, primary: C) -> Self {
        self.primary = Some(primary);
        self
    }

    /// 레플리카 추가 (추가 순서가 라운드 로빈 순서)
    pub fn replica(mut self, replica: C) -> Self {
        self.replicas.push(replica);
        self
    }

    /// 레플리카 여러 개 추가
    pub fn replicas(mut self, replicas: impl IntoIterator<Item = C>) -> Self {
        self.replicas.extend(replicas);
        self
    }

    /// 설정 지정
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// 쿼리 분류기 지정 (기본: [`PrefixClassifier`])
    pub fn classifier(mut self, classifier: Arc<dyn QueryClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// 라우터 생성
    ///
    /// 자동 페일오버가 켜져 있으면 모든 레플리카를 한 번 검사한 뒤 헬스
    /// 모니터를 띄웁니다. 검사 주기 안에 ping에 응답하지 않는 레플리카는
    /// 사용 불가로 표시됩니다. tokio 런타임 안에서 호출해야 합니다.
    pub async fn build(self) -> RouterResult<Router<C>> {
        let config = self.config;

        if config.validate_on_new {
            if self.primary.is_none() {
                return Err(RouterError::PrimaryNotConfigured);
            }
            if self.replicas.is_empty() {
                return Err(RouterError::ReplicasNotConfigured);
            }
        }

        if config.auto_failover() && config.health_check_interval.is_zero() {
            return Err(RouterError::configuration(
                "health check interval must be greater than zero",
            ));
        }

        let replicas: Vec<Arc<C>> = self.replicas.into_iter().map(Arc::new).collect();
        let selector = Arc::new(
            ReplicaSelector::new(replicas, config.auto_failover()).with_debug(config.debug),
        );

        let monitor = if config.auto_failover() {
            let unavailable =
                routing::refresh(&selector, config.health_check_interval).await;
            if !unavailable.is_empty() {
                warn!(
                    unavailable = unavailable.len(),
                    replicas = selector.len(),
                    "replicas unavailable at startup"
                );
            }
            Some(HealthMonitor::spawn(
                selector.clone(),
                config.health_check_interval,
            ))
        } else {
            None
        };

        info!(
            replicas = selector.len(),
            primary = self.primary.is_some(),
            primary_in_maintenance = config.primary_in_maintenance,
            auto_failover = config.auto_failover(),
            "router initialized"
        );

        Ok(Router {
            primary: self.primary.map(Arc::new),
            selector,
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(PrefixClassifier::default())),
            config,
            monitor: Mutex::new(monitor),
            open: RwLock::new(true),
        })
    }
}

// ============================================================================
// Router - 라우터
// ============================================================================

/// 읽기/쓰기 분리 라우터
///
/// 읽기 전용 쿼리는 라운드 로빈으로 고른 레플리카로, 쓰기/트랜잭션은
/// 프라이머리로 보냅니다. 사용 가능한 레플리카가 없으면 프라이머리로 넘기지
/// 않고 [`RouterError::NoReplicaAvailable`]를 반환합니다.
pub struct Router<C: Connection> {
    /// 프라이머리 (검증을 끈 경우에만 없을 수 있음)
    primary: Option<Arc<C>>,
    /// 레플리카 선택기
    selector: Arc<ReplicaSelector<C>>,
    /// 쿼리 분류기
    classifier: Arc<dyn QueryClassifier>,
    /// 설정
    config: RouterConfig,
    /// 헬스 모니터 (자동 페일오버가 꺼졌거나 닫힌 뒤에는 없음)
    monitor: Mutex<Option<HealthMonitor>>,
    /// 열린 상태
    open: RwLock<bool>,
}

impl<C: Connection> Router<C> {
    /// 빌더 시작
    pub fn builder() -> RouterBuilder<C> {
        RouterBuilder::new()
    }

    /// 프라이머리와 레플리카로 라우터 생성
    pub async fn new(
        primary: C,
        replicas: impl IntoIterator<Item = C>,
        config: RouterConfig,
    ) -> RouterResult<Self> {
        Self::builder()
            .primary(primary)
            .replicas(replicas)
            .config(config)
            .build()
            .await
    }

    // ------------------------------------------------------------------------
    // 대상 결정
    // ------------------------------------------------------------------------

    fn ensure_open(&self, op: &str) -> RouterResult<()> {
        if *self.open.read() {
            return Ok(());
        }
        route_debug!(self, op, error = %RouterError::Closed, "routing failed");
        Err(RouterError::Closed)
    }

    /// 쓰기/트랜잭션 대상 (닫힘 → 점검 모드 → 존재 여부 순으로 확인)
    fn write_target(&self, op: &str) -> RouterResult<&Arc<C>> {
        self.ensure_open(op)?;
        if self.config.primary_in_maintenance {
            route_debug!(self, op, error = %RouterError::PrimaryInMaintenance, "routing failed");
            return Err(RouterError::PrimaryInMaintenance);
        }
        self.primary_target(op)
    }

    fn primary_target(&self, op: &str) -> RouterResult<&Arc<C>> {
        self.ensure_open(op)?;
        match &self.primary {
            Some(primary) => {
                route_debug!(self, op, route = "primary", "routed");
                Ok(primary)
            }
            None => {
                route_debug!(self, op, error = %RouterError::PrimaryNotConfigured, "routing failed");
                Err(RouterError::PrimaryNotConfigured)
            }
        }
    }

    fn replica_target(&self, op: &str, skip_health_check: bool) -> RouterResult<Arc<C>> {
        self.ensure_open(op)?;
        self.selector.next(skip_health_check).map_err(|e| {
            route_debug!(self, op, error = %e, "replica selection failed");
            e
        })
    }

    fn validate_read_only(&self, op: &str, query: &str) -> RouterResult<()> {
        self.ensure_open(op)?;
        if self.classifier.is_read_only(query) {
            Ok(())
        } else {
            route_debug!(self, op, error = %RouterError::NotReadOnlyQuery, "validation failed");
            Err(RouterError::NotReadOnlyQuery)
        }
    }

    /// 프라이머리 강제 + 점검 모드 아님
    fn forces_primary(&self, ctx: &Context) -> bool {
        ctx.uses_primary() && !self.config.primary_in_maintenance
    }

    /// 브로드캐스트 연산 전 존재 여부 확인
    fn ensure_configured(&self, op: &str) -> RouterResult<()> {
        self.ensure_open(op)?;
        let err = if self.primary.is_none() {
            RouterError::PrimaryNotConfigured
        } else if self.selector.is_empty() {
            RouterError::ReplicasNotConfigured
        } else {
            return Ok(());
        };
        route_debug!(self, op, error = %err, "configuration check failed");
        Err(err)
    }

    /// 점검 모드가 아니면 프라이머리, 이어서 모든 레플리카 (목록 순서)
    fn broadcast_targets(&self) -> impl Iterator<Item = &Arc<C>> {
        let in_maintenance = self.config.primary_in_maintenance;
        self.primary
            .iter()
            .filter(move |_| !in_maintenance)
            .chain(self.selector.replicas().iter())
    }

    // ------------------------------------------------------------------------
    // Ping
    // ------------------------------------------------------------------------

    /// 프라이머리와 모든 레플리카 연결 확인, 첫 에러 반환
    pub async fn ping(&self) -> RouterResult<()> {
        self.ping_context(&Context::background()).await
    }

    /// 프라이머리와 모든 레플리카 연결 확인, 첫 에러 반환
    ///
    /// 점검 모드에서는 프라이머리를 건너뜁니다.
    pub async fn ping_context(&self, ctx: &Context) -> RouterResult<()> {
        self.ensure_configured("ping")?;

        for (i, target) in self.broadcast_targets().enumerate() {
            if let Err(e) = target.ping_context(ctx).await {
                route_debug!(self, handle = i, error = %e, "ping failed");
                return Err(e);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------------

    /// 읽기 전용 쿼리를 레플리카에서 실행
    pub async fn query(&self, query: &str, args: &[Value]) -> RouterResult<C::Rows> {
        self.query_context(&Context::background(), query, args).await
    }

    /// 읽기 전용 쿼리를 레플리카에서 실행
    ///
    /// `ctx`에 프라이머리 강제 표식이 있고 점검 모드가 아니면 분류 검사 없이
    /// 프라이머리에서 실행합니다.
    pub async fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> RouterResult<C::Rows> {
        if self.forces_primary(ctx) {
            let target = self.primary_target("query")?;
            return target.query_context(ctx, query, args).await;
        }

        self.validate_read_only("query", query)?;
        let target = self.replica_target("query", false)?;
        target.query_context(ctx, query, args).await
    }

    /// 최대 한 행을 반환하는 쿼리를 레플리카에서 실행
    ///
    /// 가용성 검사 없이 순수 라운드 로빈으로 고릅니다. 쿼리 에러는 행 안에
    /// 담기고, 라우팅 실패만 `Err`로 돌아옵니다.
    pub async fn query_row(&self, query: &str, args: &[Value]) -> RouterResult<C::Row> {
        self.query_row_context(&Context::background(), query, args)
            .await
    }

    /// 최대 한 행을 반환하는 쿼리 실행 (프라이머리 강제 지원)
    pub async fn query_row_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> RouterResult<C::Row> {
        if self.forces_primary(ctx) {
            let target = self.primary_target("query_row")?;
            return Ok(target.query_row_context(ctx, query, args).await);
        }

        let target = self.replica_target("query_row", true)?;
        Ok(target.query_row_context(ctx, query, args).await)
    }

    // ------------------------------------------------------------------------
    // Exec / Prepare / Begin
    // ------------------------------------------------------------------------

    /// 구문을 프라이머리에서 실행
    pub async fn exec(&self, query: &str, args: &[Value]) -> RouterResult<C::ExecResult> {
        self.exec_context(&Context::background(), query, args).await
    }

    /// 구문을 프라이머리에서 실행
    pub async fn exec_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> RouterResult<C::ExecResult> {
        let target = self.write_target("exec")?;
        target.exec_context(ctx, query, args).await
    }

    /// 구문 준비
    ///
    /// 읽기 전용이면 레플리카, 아니면 프라이머리에서 준비합니다.
    pub async fn prepare(&self, query: &str) -> RouterResult<C::Statement> {
        self.prepare_context(&Context::background(), query).await
    }

    /// 구문 준비 (프라이머리 강제 지원)
    pub async fn prepare_context(&self, ctx: &Context, query: &str) -> RouterResult<C::Statement> {
        if self.classifier.is_read_only(query) && !ctx.uses_primary() {
            let target = self.replica_target("prepare", false)?;
            return target.prepare_context(ctx, query).await;
        }

        let target = self.write_target("prepare")?;
        target.prepare_context(ctx, query).await
    }

    /// 프라이머리에서 트랜잭션 시작
    pub async fn begin(&self) -> RouterResult<C::Transaction> {
        self.begin_tx(&Context::background(), None).await
    }

    /// 프라이머리에서 옵션을 지정해 트랜잭션 시작
    pub async fn begin_tx(
        &self,
        ctx: &Context,
        opts: Option<&TxOptions>,
    ) -> RouterResult<C::Transaction> {
        let target = self.write_target("begin")?;
        target.begin_tx(ctx, opts).await
    }

    // ------------------------------------------------------------------------
    // 풀 설정
    // ------------------------------------------------------------------------

    /// 모든 핸들의 연결 최대 재사용 시간 설정
    pub fn set_conn_max_lifetime(&self, lifetime: Duration) -> RouterResult<()> {
        self.ensure_configured("set_conn_max_lifetime")?;
        for target in self.broadcast_targets() {
            target.set_conn_max_lifetime(lifetime);
        }
        route_debug!(self, ?lifetime, "conn max lifetime applied");
        Ok(())
    }

    /// 모든 핸들의 최대 유휴 연결 수 설정
    pub fn set_max_idle_conns(&self, n: usize) -> RouterResult<()> {
        self.ensure_configured("set_max_idle_conns")?;
        for target in self.broadcast_targets() {
            target.set_max_idle_conns(n);
        }
        route_debug!(self, n, "max idle conns applied");
        Ok(())
    }

    /// 모든 핸들의 최대 열린 연결 수 설정
    pub fn set_max_open_conns(&self, n: usize) -> RouterResult<()> {
        self.ensure_configured("set_max_open_conns")?;
        for target in self.broadcast_targets() {
            target.set_max_open_conns(n);
        }
        route_debug!(self, n, "max open conns applied");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // 종료
    // ------------------------------------------------------------------------

    /// 라우터 종료
    ///
    /// 헬스 모니터를 멈추고 프라이머리(점검 모드 제외)와 모든 레플리카를
    /// 닫습니다. 중간에 실패해도 나머지를 계속 닫고 에러를 모아 반환합니다.
    /// 닫힌 뒤의 모든 호출(두 번째 `close` 포함)은 [`RouterError::Closed`]를
    /// 반환합니다.
    pub async fn close(&self) -> RouterResult<()> {
        {
            let mut open = self.open.write();
            if !*open {
                return Err(RouterError::Closed);
            }
            *open = false;
        }

        let monitor = self.monitor.lock().take();
        if let Some(monitor) = monitor {
            monitor.stop();
        }

        let mut errors = Vec::new();
        for target in self.broadcast_targets() {
            if let Err(e) = target.close().await {
                errors.push(e);
            }
        }

        match RouterError::combine(errors) {
            None => {
                info!("router closed");
                Ok(())
            }
            Some(err) => {
                warn!(error = %err, "router closed with errors");
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // 상태 조회
    // ------------------------------------------------------------------------

    /// 레플리카 헬스 체크를 즉시 한 번 수행하고 사용 불가 인덱스 반환
    ///
    /// ping 마감 시간은 검사 주기이며, 주기가 0이면 기본값을 씁니다.
    pub async fn check_replica_health(&self) -> Vec<usize> {
        let deadline = match self.config.health_check_interval {
            d if d.is_zero() => DEFAULT_HEALTH_CHECK_INTERVAL,
            d => d,
        };
        routing::refresh(&self.selector, deadline).await;
        self.selector.unavailable()
    }

    /// 설정
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// 프라이머리 핸들
    pub fn primary(&self) -> Option<&Arc<C>> {
        self.primary.as_ref()
    }

    /// 레플리카 핸들 (라운드 로빈 순서)
    pub fn replicas(&self) -> &[Arc<C>] {
        self.selector.replicas()
    }

    /// 프라이머리 점검 모드 여부
    pub fn is_primary_in_maintenance(&self) -> bool {
        self.config.primary_in_maintenance
    }

    /// 헬스 모니터 동작 여부
    pub fn is_health_monitoring(&self) -> bool {
        self.monitor.lock().is_some()
    }

    /// 열린 상태 여부
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    /// 사용 불가 레플리카 인덱스 (마지막 헬스 체크 기준)
    pub fn unavailable_replicas(&self) -> Vec<usize> {
        self.selector.unavailable()
    }

    /// 라우터 메트릭
    pub fn metrics(&self) -> RouterMetrics {
        let selector = self.selector.metrics();
        RouterMetrics {
            replica_count: selector.replica_count,
            unavailable_replicas: selector.unavailable.len(),
            selections: selector.cursor,
            health_checked_attempts: selector.health_checked_attempts,
            primary_in_maintenance: self.config.primary_in_maintenance,
            health_monitoring: self.is_health_monitoring(),
        }
    }
}

impl<C: Connection> Drop for Router<C> {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.get_mut().take() {
            monitor.stop();
        }
    }
}

impl<C: Connection> fmt::Debug for Router<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("primary", &self.primary.is_some())
            .field("selector", &self.selector)
            .field("primary_in_maintenance", &self.config.primary_in_maintenance)
            .field("open", &*self.open.read())
            .finish()
    }
}

// ============================================================================
// RouterMetrics - 라우터 메트릭
// ============================================================================

/// 라우터 메트릭
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterMetrics {
    /// 레플리카 수
    pub replica_count: usize,
    /// 사용 불가 레플리카 수
    pub unavailable_replicas: usize,
    /// 지금까지의 레플리카 선택(커서 전진) 횟수
    pub selections: u64,
    /// 헬스 체크를 거친 선택 시도 횟수
    pub health_checked_attempts: u64,
    /// 프라이머리 점검 모드
    pub primary_in_maintenance: bool,
    /// 헬스 모니터 동작 여부
    pub health_monitoring: bool,
}

// ============================================================================
// Tests
// ============================================================================
