//! 호출 컨텍스트
//!
//! 호출 단위 라우팅 지시자("프라이머리 강제")와 선택적 데드라인을 담습니다.

use std::time::Duration;

/// 호출 컨텍스트
///
/// `*_context` 계열 메서드에 명시적으로 전달됩니다. 프라이머리 강제 표식은
/// 존재 여부만 의미가 있습니다.
///
/// ```rust
/// use replica_router::Context;
///
/// let ctx = Context::background();
/// assert!(!ctx.uses_primary());
///
/// let ctx = ctx.with_primary();
/// assert!(ctx.uses_primary());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Context {
    use_primary: bool,
    timeout: Option<Duration>,
}

impl Context {
    /// 빈 컨텍스트
    pub fn background() -> Self {
        Self::default()
    }

    /// 프라이머리 강제 표식을 붙인 복사본
    pub fn with_primary(mut self) -> Self {
        self.use_primary = true;
        self
    }

    /// 데드라인을 붙인 복사본
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 프라이머리 강제 여부
    pub fn uses_primary(&self) -> bool {
        self.use_primary
    }

    /// 데드라인
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
