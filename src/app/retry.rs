//! Blocking retry loop driven by a [`RetryPolicy`].
//!
//! Used by WiFi bring-up and broker reconnect.  An attempt is made first;
//! only after a failure does the loop sleep, so a healthy link costs nothing.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::config::RetryPolicy;

/// Returned when a bounded policy runs out of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryError<E> {
    Exhausted { attempts: u32, last: E },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { attempts, last } => {
                write!(f, "gave up after {attempts} attempts (last error: {last})")
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Run `op` until it succeeds or `policy` stops allowing attempts.
///
/// `op` receives the 1-based attempt number.  On success returns the value
/// and the number of attempts it took.
pub fn retry<T, E: fmt::Display>(
    policy: &RetryPolicy,
    delay: &mut impl DelayNs,
    label: &str,
    mut op: impl FnMut(u32) -> Result<T, E>,
) -> Result<(T, u32), RetryError<E>> {
    let mut attempt: u32 = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok((value, attempt)),
            Err(e) => {
                if !policy.allows_retry(attempt) {
                    warn!("{}: attempt {} failed ({}), giving up", label, attempt, e);
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }
                let wait_ms = policy.delay_for(attempt);
                warn!("{}: attempt {} failed ({}), retrying in {} ms", label, attempt, e, wait_ms);
                delay.delay_ms(wait_ms);
                attempt = attempt.saturating_add(1);
            }
        }
    }
}
