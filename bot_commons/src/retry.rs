//! Retrying things that fail for boring reasons, like the network hiccuping.

use std::{fmt::Display, future::Future, time::Duration};

/// How many times to try something, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    retries: u32,
    delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("'retries' must be a natural number.")]
pub struct InvalidRetries;

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed. `source` is the error from the last one.
    #[error("Failed after {retries} {}.", retry_noun(.retries))]
    Exhausted {
        retries: u32,
        #[source]
        source: E,
    },
    /// Failed with an error that isn't worth retrying.
    #[error(transparent)]
    NotRetried(E),
}

fn retry_noun(retries: &u32) -> &'static str {
    if *retries == 1 {
        "retry"
    } else {
        "retries"
    }
}

impl<E> RetryError<E> {
    /// The error that made us give up.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } => source,
            RetryError::NotRetried(e) => e,
        }
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(3),
        }
    }
}

impl Retry {
    /// `retries` is the maximum amount of attempts, so at least 1.
    ///
    /// # Errors
    ///
    /// Errors if `retries` is zero.
    pub fn new(retries: u32, delay: Duration) -> Result<Self, InvalidRetries> {
        if retries < 1 {
            return Err(InvalidRetries);
        }
        Ok(Self { retries, delay })
    }

    /// What every Telegram request of ours gets: 3 attempts, 3 seconds apart.
    pub fn telegram() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(3),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `operation` until it succeeds or we run out of attempts,
    /// sleeping between attempts.
    ///
    /// # Errors
    ///
    /// [`RetryError::Exhausted`] with the last error if no attempt succeeded.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(|_| true, operation).await
    }

    /// Same as [`Retry::run`], except only errors for which `should_retry`
    /// returns `true` are retried. Anything else is returned right away.
    ///
    /// # Errors
    ///
    /// [`RetryError::NotRetried`] on an error we shouldn't retry,
    /// [`RetryError::Exhausted`] if no attempt succeeded.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        should_retry: P,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !should_retry(&err) {
                return Err(RetryError::NotRetried(err));
            }

            if attempt >= self.retries {
                return Err(RetryError::Exhausted {
                    retries: self.retries,
                    source: err,
                });
            }

            log::warn!(
                "{err}. Retrying in {:?}, attempt {attempt} of {}.",
                self.delay,
                self.retries
            );
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::{cell::Cell, error::Error};

    use tokio::time::Instant;

    use super::*;

    #[derive(Debug, PartialEq, Eq, thiserror::Error)]
    #[error("error #{0}")]
    struct Flake(u32);

    /// Fails `failures` times with a numbered error, then returns "success".
    fn flaky(failures: u32, calls: &Cell<u32>) -> impl Future<Output = Result<&'static str, Flake>> {
        calls.set(calls.get() + 1);
        let call = calls.get();
        async move {
            if call <= failures {
                Err(Flake(call))
            } else {
                Ok("success")
            }
        }
    }

    #[test]
    fn zero_retries_is_invalid() {
        assert_eq!(Retry::new(0, Duration::from_secs(1)), Err(InvalidRetries));
        assert_eq!(
            InvalidRetries.to_string(),
            "'retries' must be a natural number."
        );
    }

    #[test]
    fn default_is_one_attempt_three_seconds() {
        let retry = Retry::default();
        assert_eq!(retry.retries(), 1);
        assert_eq!(retry.delay(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn telegram_is_three_attempts_three_seconds_apart() {
        let retry = Retry::telegram();
        assert_eq!(retry, Retry::new(3, Duration::from_secs(3)).unwrap());

        let calls = Cell::new(0);
        let start = Instant::now();
        retry.run(|| flaky(u32::MAX, &calls)).await.unwrap_err();

        assert_eq!(calls.get(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn first_try_success_does_not_sleep() {
        let calls = Cell::new(0);
        let start = Instant::now();

        let result = Retry::default().run(|| flaky(0, &calls)).await.unwrap();

        assert_eq!(result, "success");
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures_sleeping_twice() {
        let calls = Cell::new(0);
        let delay = Duration::from_secs(3);
        let retry = Retry::new(3, delay).unwrap();
        let start = Instant::now();

        let result = retry.run(|| flaky(2, &calls)).await.unwrap();

        assert_eq!(result, "success");
        assert_eq!(calls.get(), 3);
        // Paused clock only moves when we sleep, so this is exactly two sleeps.
        assert_eq!(start.elapsed(), delay * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_delay_is_respected() {
        let calls = Cell::new(0);
        let retry = Retry::new(2, Duration::from_secs(5)).unwrap();
        let start = Instant::now();

        retry.run(|| flaky(1, &calls)).await.unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_all_attempts() {
        for (retries, message) in [
            (1, "Failed after 1 retry."),
            (2, "Failed after 2 retries."),
            (5, "Failed after 5 retries."),
        ] {
            let calls = Cell::new(0);
            let retry = Retry::new(retries, Duration::from_secs(1)).unwrap();

            let err = retry.run(|| flaky(u32::MAX, &calls)).await.unwrap_err();

            assert_eq!(calls.get(), retries);
            assert_eq!(err.to_string(), message);
            // The last error is kept as the source.
            assert_eq!(
                err.source().map(ToString::to_string),
                Some(format!("error #{retries}"))
            );
            assert_eq!(err.into_inner(), Flake(retries));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unretryable_errors_are_returned_right_away() {
        let calls = Cell::new(0);
        let retry = Retry::new(3, Duration::from_secs(1)).unwrap();
        let start = Instant::now();

        let err = retry
            .run_if(|e: &Flake| e.0 != 1, || flaky(u32::MAX, &calls))
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::NotRetried(_)));
        assert_eq!(err.to_string(), "error #1");
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_then_unretryable() {
        let calls = Cell::new(0);
        let retry = Retry::new(5, Duration::from_secs(1)).unwrap();

        let err = retry
            .run_if(|e: &Flake| e.0 < 3, || flaky(u32::MAX, &calls))
            .await
            .unwrap_err();

        assert_eq!(calls.get(), 3);
        assert_eq!(err.into_inner(), Flake(3));
    }
}
