//! 쿼리 분류기
//!
//! 쿼리 문자열이 읽기 전용인지 판별합니다. 파싱은 하지 않고 접두어만 봅니다.

use std::fmt;

/// 읽기 전용 쿼리 판별기
///
/// 라우터 생성 시 주입됩니다. 같은 `Arc`를 공유하는 라우터들은 같은 판별
/// 규칙을 따릅니다. `Fn(&str) -> bool` 클로저도 그대로 쓸 수 있습니다.
pub trait QueryClassifier: Send + Sync {
    /// 읽기 전용 여부
    fn is_read_only(&self, query: &str) -> bool;
}

impl<F> QueryClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_read_only(&self, query: &str) -> bool {
        self(query)
    }
}

/// 접두어 기반 분류기 (기본값)
///
/// 쿼리가 대소문자 구분 없이 `select`로 시작하면 읽기 전용입니다.
/// 앞쪽 공백은 제거하지 않습니다.
#[derive(Debug, Clone)]
pub struct PrefixClassifier {
    prefix: String,
}

impl PrefixClassifier {
    /// 기본 접두어
    pub const DEFAULT_PREFIX: &'static str = "select";

    /// 새 분류기 생성
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// 접두어
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for PrefixClassifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl QueryClassifier for PrefixClassifier {
    fn is_read_only(&self, query: &str) -> bool {
        query
            .as_bytes()
            .get(..self.prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(self.prefix.as_bytes()))
    }
}

impl fmt::Display for PrefixClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prefix({})", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_select_is_read_only() {
        let classifier = PrefixClassifier::default();
        assert!(classifier.is_read_only("select * from t"));
        assert!(classifier.is_read_only("SELECT * FROM t"));
        assert!(classifier.is_read_only("SeLeCt 1"));
    }

    #[test]
    fn test_writes_are_not_read_only() {
        let classifier = PrefixClassifier::default();
        assert!(!classifier.is_read_only("insert into t values (1)"));
        assert!(!classifier.is_read_only("update t set x=1"));
        assert!(!classifier.is_read_only("delete from t"));
    }

    #[test]
    fn test_leading_whitespace_is_not_trimmed() {
        let classifier = PrefixClassifier::default();
        assert!(!classifier.is_read_only(" select 1"));
        assert!(!classifier.is_read_only("\nselect 1"));
    }

    #[test]
    fn test_short_and_multibyte_queries() {
        let classifier = PrefixClassifier::default();
        assert!(!classifier.is_read_only(""));
        assert!(!classifier.is_read_only("sel"));
        assert!(!classifier.is_read_only("séléct 1"));
    }

    #[test]
    fn test_closure_classifier() {
        let classifier: Arc<dyn QueryClassifier> =
            Arc::new(|q: &str| q.trim_start().to_lowercase().starts_with("with"));

        assert!(classifier.is_read_only("  WITH x AS (select 1) select * from x"));
        assert!(!classifier.is_read_only("select 1"));
    }

    #[test]
    fn test_custom_prefix() {
        let classifier = PrefixClassifier::new("show");
        assert!(classifier.is_read_only("SHOW TABLES"));
        assert_eq!(classifier.to_string(), "prefix(show)");
    }
}
