use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use archive_api::FetchError;

// ═══════════════════════════════════════════════════════════════
//  Sleeper
// ═══════════════════════════════════════════════════════════════

/// Источник задержки между попытками. Подменяется в тестах.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Реальная задержка через `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(delay))
    }
}

// ═══════════════════════════════════════════════════════════════
//  RetryPolicy
// ═══════════════════════════════════════════════════════════════

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Экспоненциальный backoff: задержка удваивается от `base_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Максимум попыток, включая первую.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Задержка перед повтором номер `retry` (с нуля): base · 2^retry.
    pub fn delay(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

// ═══════════════════════════════════════════════════════════════
//  retry loop
// ═══════════════════════════════════════════════════════════════

/// Итог одной попытки.
pub enum Attempt<T> {
    Done(T),
    /// Транзиентная ошибка: подождать и повторить.
    Retry(FetchError),
    /// Фатальная ошибка: вернуть сразу, без задержки.
    Fail(FetchError),
}

/// Выполнять `op` до успеха, фатальной ошибки или исчерпания попыток.
///
/// После последней попытки задержки нет.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Attempt::Done(value) => return Ok(value),
            Attempt::Fail(e) => return Err(e),
            Attempt::Retry(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    tracing::error!(attempts = attempt, error = %e, "giving up");
                    return Err(FetchError::RetryExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                let delay = policy.delay(attempt - 1);
                tracing::warn!(error = %e, retry = attempt, ?delay, "will retry");
                sleeper.sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, delay: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
            self.delays.lock().unwrap().push(delay);
            Box::pin(async {})
        }
    }

    #[test]
    fn delays_double_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(2));
        assert_eq!(policy.delay(1), Duration::from_secs(4));
        assert_eq!(policy.delay(2), Duration::from_secs(8));
        assert_eq!(policy.delay(9), Duration::from_secs(1024));
        assert_eq!(policy.delay(200), Duration::MAX);
    }

    #[tokio::test]
    async fn succeeds_after_three_server_errors() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let result = retry(&policy, &sleeper, |_| {
            calls += 1;
            let n = calls;
            async move {
                if n <= 3 {
                    Attempt::Retry(FetchError::Server { status: 500 })
                } else {
                    Attempt::Done("payload")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls, 4);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn fatal_error_returns_without_sleeping() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: Result<(), _> = retry(&RetryPolicy::default(), &sleeper, |_| {
            calls += 1;
            async {
                Attempt::Fail(FetchError::Client {
                    status: 404,
                    url: "u".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(FetchError::Client { status: 404, .. })));
        assert_eq!(calls, 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(10),
        };
        let mut calls = 0;
        let result: Result<(), _> = retry(&policy, &sleeper, |_| {
            calls += 1;
            async { Attempt::Retry(FetchError::Transport("refused".into())) }
        })
        .await;
        match result {
            Err(FetchError::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, FetchError::Transport(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(calls, 4);
        assert_eq!(sleeper.delays.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn attempt_index_is_passed_to_op() {
        let sleeper = RecordingSleeper::default();
        let mut seen = Vec::new();
        let _ = retry(&RetryPolicy::default(), &sleeper, |attempt| {
            seen.push(attempt);
            async move {
                if attempt < 2 {
                    Attempt::Retry(FetchError::Server { status: 503 })
                } else {
                    Attempt::Done(())
                }
            }
        })
        .await;
        assert_eq!(seen, vec![0, 1, 2]);
    }
}
