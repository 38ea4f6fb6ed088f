use super::backend::{BackendError, NarrativeBackend};
use crate::cache::SummaryCache;
use crate::clock::{elapsed_between, Clock};
use crate::config::{NarrativeConfig, RetryPolicy};
use crate::errors::{InfraLensError, Result};
use crate::fingerprint::Fingerprint;
use crate::prompt::Prompt;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound of the jitter added to a backoff delay
const MAX_JITTER_FRACTION: f64 = 0.25;

/// Bounded-retry wrapper around a [`NarrativeBackend`]
pub struct RetryingSummarizer {
    backend: Arc<dyn NarrativeBackend>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl RetryingSummarizer {
    pub fn new(backend: Arc<dyn NarrativeBackend>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            clock,
            policy,
        }
    }

    /// Generate a narrative for `prompt`, storing it in `cache` on success.
    ///
    /// Makes at most `max_attempts` backend calls. Rate limits and
    /// transport errors are retried; a blank response counts as a
    /// transport error.
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded` on the first quota refusal, without retrying
    /// - `SummarizationUnavailable` when attempts run out or the next
    ///   backoff wait would pass the deadline; nothing is cached
    pub fn summarize(
        &self,
        fingerprint: &Fingerprint,
        prompt: &Prompt,
        narrative: &NarrativeConfig,
        cache: &SummaryCache,
    ) -> Result<String> {
        let max_attempts = self.policy.max_attempts.max(1);
        let started = self.clock.now();
        let mut last_error = BackendError::transport("no attempt made");

        for attempt in 1..=max_attempts {
            tracing::debug!(
                component = module_path!(),
                op = "summarize",
                backend = self.backend.name(),
                attempt = attempt,
                max_attempts = max_attempts,
                "calling narrative backend"
            );

            let err = match self.backend.generate(prompt, narrative) {
                Ok(text) if !text.trim().is_empty() => {
                    cache.store(fingerprint, &text);
                    return Ok(text);
                }
                Ok(_) => BackendError::transport("empty narrative returned"),
                Err(BackendError::QuotaExceeded { message }) => {
                    return Err(InfraLensError::QuotaExceeded { message });
                }
                Err(err) => err,
            };

            if attempt == max_attempts {
                last_error = err;
                break;
            }

            let delay = backoff_delay(&self.policy, attempt - 1, fingerprint, err.retry_after());
            if let Some(deadline) = self.policy.deadline() {
                let elapsed = elapsed_between(started, self.clock.now());
                if elapsed.saturating_add(delay) > deadline {
                    return Err(InfraLensError::SummarizationUnavailable {
                        attempts: attempt,
                        reason: format!(
                            "deadline of {} ms reached; last error: {}",
                            deadline.as_millis(),
                            err
                        ),
                    });
                }
            }

            tracing::warn!(
                component = module_path!(),
                op = "summarize",
                attempt = attempt,
                max_attempts = max_attempts,
                backoff_ms = delay.as_millis() as u64,
                error = %err,
                "retrying narrative call after transient error"
            );
            self.clock.sleep(delay);
            last_error = err;
        }

        Err(InfraLensError::SummarizationUnavailable {
            attempts: max_attempts,
            reason: last_error.to_string(),
        })
    }
}

/// Delay before retry number `retry` (0-based).
///
/// `base_delay * 2^retry`, plus up to 25 % jitter derived from the
/// fingerprint and retry number, raised to `retry_after` when the server
/// asked for more; never above `max_delay`.
pub fn backoff_delay(
    policy: &RetryPolicy,
    retry: u32,
    fingerprint: &Fingerprint,
    retry_after: Option<Duration>,
) -> Duration {
    let cap = policy.max_delay();
    let exponential = policy
        .base_delay()
        .saturating_mul(2u32.saturating_pow(retry))
        .min(cap);

    let mut delay = exponential;
    if policy.jitter {
        let jitter = exponential.mul_f64(MAX_JITTER_FRACTION * jitter_fraction(fingerprint, retry));
        delay = exponential.saturating_add(jitter).min(cap);
    }
    if let Some(hint) = retry_after {
        delay = delay.max(hint).min(cap);
    }
    delay
}

/// Stable value in `[0, 1]` for one fingerprint and retry number
fn jitter_fraction(fingerprint: &Fingerprint, retry: u32) -> f64 {
    let digest = Sha256::digest(format!("{}:{}", fingerprint, retry).as_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(word) as f64 / u64::MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeSet;

    fn fp() -> Fingerprint {
        Fingerprint::compute(&ChangeSet::new(), &NarrativeConfig::default()).unwrap()
    }

    fn policy(jitter: bool) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            jitter,
            deadline_ms: None,
        }
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let p = policy(false);
        let delays: Vec<u128> = (0..6)
            .map(|r| backoff_delay(&p, r, &fp(), None).as_millis())
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
    }

    #[test]
    fn test_jitter_is_bounded_and_deterministic() {
        let p = policy(true);
        for retry in 0..6 {
            let plain = backoff_delay(&policy(false), retry, &fp(), None);
            let jittered = backoff_delay(&p, retry, &fp(), None);
            assert!(jittered >= plain);
            assert!(jittered <= plain.mul_f64(1.0 + MAX_JITTER_FRACTION) + Duration::from_millis(1));
            assert!(jittered <= p.max_delay());
            assert_eq!(jittered, backoff_delay(&p, retry, &fp(), None));
        }
    }

    #[test]
    fn test_retry_after_raises_delay_within_cap() {
        let p = policy(false);
        assert_eq!(
            backoff_delay(&p, 0, &fp(), Some(Duration::from_millis(700))),
            Duration::from_millis(700)
        );
        assert_eq!(
            backoff_delay(&p, 0, &fp(), Some(Duration::from_secs(60))),
            Duration::from_millis(1_000)
        );
    }

    #[test]
    fn test_huge_retry_number_saturates() {
        let p = policy(true);
        assert_eq!(backoff_delay(&p, 200, &fp(), None), p.max_delay());
    }

    #[test]
    fn test_jitter_fraction_range() {
        for retry in 0..32 {
            let f = jitter_fraction(&fp(), retry);
            assert!((0.0..=1.0).contains(&f));
        }
    }
}
