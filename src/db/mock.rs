//! 테스트용 연결 핸들
//!
//! 호출 내역을 기록하고 ping/close 실패를 주입할 수 있습니다.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::connection::Connection;
use super::context::Context;
use super::error::{RouterError, RouterResult};
use super::types::{TxOptions, Value};

/// 어느 핸들이 처리했는지 담는 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub by: String,
    pub query: String,
}

#[derive(Debug)]
pub struct MockConnection {
    name: String,
    healthy: AtomicBool,
    hanging: AtomicBool,
    fail_close: AtomicBool,
    pings: AtomicUsize,
    closes: AtomicUsize,
    ping_timeout: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
    max_lifetime: Mutex<Option<Duration>>,
    max_idle: Mutex<Option<usize>>,
    max_open: Mutex<Option<usize>>,
}

impl MockConnection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            healthy: AtomicBool::new(true),
            hanging: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            pings: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            ping_timeout: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            max_lifetime: Mutex::new(None),
            max_idle: Mutex::new(None),
            max_open: Mutex::new(None),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// ping이 응답하지 않는 상태 (패킷 유실)
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// 마지막 ping에 전달된 컨텍스트 타임아웃
    pub fn last_ping_timeout(&self) -> Option<Duration> {
        *self.ping_timeout.lock()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        *self.max_lifetime.lock()
    }

    pub fn max_idle(&self) -> Option<usize> {
        *self.max_idle.lock()
    }

    pub fn max_open(&self) -> Option<usize> {
        *self.max_open.lock()
    }

    fn record(&self, op: &str, query: &str) -> Served {
        self.calls.lock().push(format!("{} {}", op, query));
        Served {
            by: self.name.clone(),
            query: query.to_string(),
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    type Rows = Served;
    type Row = Served;
    type ExecResult = Served;
    type Statement = Served;
    type Transaction = Served;

    async fn ping_context(&self, ctx: &Context) -> RouterResult<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        *self.ping_timeout.lock() = ctx.timeout();
        if self.hanging.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RouterError::connection(format!("{} is down", self.name)))
        }
    }

    async fn query_context(
        &self,
        _ctx: &Context,
        query: &str,
        _args: &[Value],
    ) -> RouterResult<Served> {
        Ok(self.record("query", query))
    }

    async fn query_row_context(&self, _ctx: &Context, query: &str, _args: &[Value]) -> Served {
        self.record("query_row", query)
    }

    async fn exec_context(
        &self,
        _ctx: &Context,
        query: &str,
        _args: &[Value],
    ) -> RouterResult<Served> {
        Ok(self.record("exec", query))
    }

    async fn prepare_context(&self, _ctx: &Context, query: &str) -> RouterResult<Served> {
        Ok(self.record("prepare", query))
    }

    async fn begin_tx(&self, _ctx: &Context, _opts: Option<&TxOptions>) -> RouterResult<Served> {
        Ok(self.record("begin", ""))
    }

    async fn close(&self) -> RouterResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            Err(RouterError::connection(format!("{} failed to close", self.name)))
        } else {
            Ok(())
        }
    }

    fn set_conn_max_lifetime(&self, lifetime: Duration) {
        *self.max_lifetime.lock() = Some(lifetime);
    }

    fn set_max_idle_conns(&self, n: usize) {
        *self.max_idle.lock() = Some(n);
    }

    fn set_max_open_conns(&self, n: usize) {
        *self.max_open.lock() = Some(n);
    }
}
