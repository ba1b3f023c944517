//! 연결 핸들
//!
//! 라우터가 호출하는 하나의 DB 엔드포인트. 소켓, 구문 실행, 트랜잭션,
//! 연결 수 제한은 구현체의 몫이며 라우터는 이 트레이트만 봅니다.

use std::time::Duration;

use async_trait::async_trait;

use super::context::Context;
use super::error::RouterResult;
use super::types::{TxOptions, Value};

/// DB 연결 핸들
///
/// 결과 타입은 구현체가 연관 타입으로 정합니다. 라우터는 결과를 해석하지 않고
/// 호출자에게 그대로 돌려줍니다.
///
/// 컨텍스트 없는 메서드는 [`Context::background`]로 `*_context` 메서드를
/// 호출하는 기본 구현을 가집니다.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// 쿼리 결과 행 집합
    type Rows: Send;
    /// 단일 행 결과 (에러는 행 안에 지연됨)
    type Row: Send;
    /// exec 결과
    type ExecResult: Send;
    /// 준비된 구문
    type Statement: Send;
    /// 트랜잭션
    type Transaction: Send;

    /// 연결 확인
    async fn ping_context(&self, ctx: &Context) -> RouterResult<()>;

    /// 행을 반환하는 쿼리 실행
    async fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> RouterResult<Self::Rows>;

    /// 최대 한 행을 반환하는 쿼리 실행
    async fn query_row_context(&self, ctx: &Context, query: &str, args: &[Value]) -> Self::Row;

    /// 행을 반환하지 않는 구문 실행
    async fn exec_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[Value],
    ) -> RouterResult<Self::ExecResult>;

    /// 구문 준비
    async fn prepare_context(&self, ctx: &Context, query: &str) -> RouterResult<Self::Statement>;

    /// 트랜잭션 시작
    async fn begin_tx(
        &self,
        ctx: &Context,
        opts: Option<&TxOptions>,
    ) -> RouterResult<Self::Transaction>;

    /// 연결 닫기
    async fn close(&self) -> RouterResult<()>;

    /// 연결 최대 재사용 시간 설정
    fn set_conn_max_lifetime(&self, lifetime: Duration);

    /// 최대 유휴 연결 수 설정
    fn set_max_idle_conns(&self, n: usize);

    /// 최대 열린 연결 수 설정
    fn set_max_open_conns(&self, n: usize);

    /// 연결 확인
    async fn ping(&self) -> RouterResult<()> {
        self.ping_context(&Context::background()).await
    }

    /// 행을 반환하는 쿼리 실행
    async fn query(&self, query: &str, args: &[Value]) -> RouterResult<Self::Rows> {
        self.query_context(&Context::background(), query, args).await
    }

    /// 최대 한 행을 반환하는 쿼리 실행
    async fn query_row(&self, query: &str, args: &[Value]) -> Self::Row {
        self.query_row_context(&Context::background(), query, args).await
    }

    /// 행을 반환하지 않는 구문 실행
    async fn exec(&self, query: &str, args: &[Value]) -> RouterResult<Self::ExecResult> {
        self.exec_context(&Context::background(), query, args).await
    }

    /// 구문 준비
    async fn prepare(&self, query: &str) -> RouterResult<Self::Statement> {
        self.prepare_context(&Context::background(), query).await
    }

    /// 기본 옵션으로 트랜잭션 시작
    async fn begin(&self) -> RouterResult<Self::Transaction> {
        self.begin_tx(&Context::background(), None).await
    }
}
