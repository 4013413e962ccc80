use std::time::Duration;

use super::classify::Outcome;

/// Decision returned by the retry policy after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The attempt succeeded.
    Complete,
    /// Terminal failure; do not retry.
    Fail,
    /// Retryable failure with budget left: wait, then attempt again.
    RetryAfter(Duration),
    /// Retryable failure, but the retry budget is spent.
    Exhausted,
}

/// Exponential backoff policy without a cap: the delay doubles on every
/// retry of the same item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt (total attempts = max_retries + 1).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// `initial * 2^attempt`, exact in nanoseconds; saturates at `Duration::MAX`
/// only when the product does not fit.
pub fn next_delay(attempt: u32, initial: Duration) -> Duration {
    let nanos = initial.as_nanos();
    if nanos == 0 {
        return Duration::ZERO;
    }
    if attempt >= u128::BITS || nanos.leading_zeros() < attempt {
        return Duration::MAX;
    }
    let total = nanos << attempt;
    match u64::try_from(total / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (total % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// Backoff before the attempt following `attempt` (0-based).
    pub fn next_delay(&self, attempt: u32) -> Duration {
        next_delay(attempt, self.initial_backoff)
    }

    /// Decide what to do after attempt number `attempt` (0-based) produced `outcome`.
    pub fn decide<B>(&self, attempt: u32, outcome: &Outcome<B>) -> RetryDecision {
        match outcome {
            Outcome::Success(_) => RetryDecision::Complete,
            Outcome::TerminalFailure(_) => RetryDecision::Fail,
            Outcome::RetryableFailure(_) if attempt >= self.max_retries => RetryDecision::Exhausted,
            Outcome::RetryableFailure(_) => RetryDecision::RetryAfter(self.next_delay(attempt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::ItemError;

    fn retryable() -> Outcome<()> {
        Outcome::RetryableFailure(ItemError::ServerError { status: 500 })
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let initial = Duration::from_millis(250);
        assert_eq!(next_delay(0, initial), Duration::from_millis(250));
        assert_eq!(next_delay(1, initial), Duration::from_millis(500));
        assert_eq!(next_delay(2, initial), Duration::from_secs(1));
        for k in 0..20 {
            assert_eq!(next_delay(k + 1, initial), next_delay(k, initial) * 2);
        }
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        assert_eq!(next_delay(63, Duration::from_secs(u64::MAX / 2)), Duration::MAX);
        assert_eq!(next_delay(64, Duration::from_secs(1)), Duration::MAX);
        assert_eq!(next_delay(200, Duration::from_nanos(1)), Duration::MAX);
    }

    #[test]
    fn large_attempts_stay_exact_while_they_fit() {
        assert_eq!(next_delay(32, Duration::from_nanos(1)), Duration::from_nanos(1 << 32));
        assert_eq!(next_delay(40, Duration::from_secs(1)), Duration::from_secs(1 << 40));
        assert_eq!(
            next_delay(33, Duration::from_millis(1500)),
            Duration::from_millis(1500 * (1 << 33))
        );
    }

    #[test]
    fn zero_initial_delay_stays_zero() {
        for attempt in [0, 31, 32, 64, 127, 128, u32::MAX] {
            assert_eq!(next_delay(attempt, Duration::ZERO), Duration::ZERO);
        }
    }

    #[test]
    fn success_and_terminal_stop() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(0, &Outcome::Success(())), RetryDecision::Complete);
        assert_eq!(
            p.decide(0, &Outcome::<()>::TerminalFailure(ItemError::ClientError { status: 404 })),
            RetryDecision::Fail
        );
    }

    #[test]
    fn respects_max_retries() {
        let p = RetryPolicy::new(2, Duration::from_millis(100));
        assert_eq!(
            p.decide(0, &retryable()),
            RetryDecision::RetryAfter(Duration::from_millis(100))
        );
        assert_eq!(
            p.decide(1, &retryable()),
            RetryDecision::RetryAfter(Duration::from_millis(200))
        );
        assert_eq!(p.decide(2, &retryable()), RetryDecision::Exhausted);
    }

    #[test]
    fn zero_retries_exhausts_immediately() {
        let p = RetryPolicy::new(0, Duration::from_millis(100));
        assert_eq!(p.decide(0, &retryable()), RetryDecision::Exhausted);
    }
}
