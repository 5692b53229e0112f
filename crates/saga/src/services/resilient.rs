//! Timeout, retry and circuit breaking around a room service.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{
    AvailabilityConfirmation, ConfirmAvailability, HotelId, RequestId, RoomId, RoomSummary,
    RoomType,
};

use crate::error::SagaError;
use crate::services::room::RoomService;

/// Upper bound on a single retry delay.
const BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Message returned while the circuit is open.
pub const HOTEL_SERVICE_UNAVAILABLE: &str =
    "Hotel service is temporarily unavailable. Please try again later.";

/// Tuning of [`ResilientRoomService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt. Only `ServiceUnavailable` is retried.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub retry_backoff: Duration,
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call is let through.
    pub open_duration: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3_000),
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
        }
    }
}

/// State of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls fail fast until the cool-down elapses.
    Open,
    /// One trial call is in flight; its result closes or reopens the circuit.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    changed_at: Instant,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    failure_threshold: u32,
    open_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_duration: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                changed_at: Instant::now(),
            }),
            failure_threshold: failure_threshold.max(1),
            open_duration,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Returns true if a call may proceed.
    ///
    /// After the cool-down an open circuit lets exactly one trial call
    /// through. A trial that never reports back is replaced after another
    /// cool-down.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open | CircuitState::HalfOpen => {
                if inner.changed_at.elapsed() >= self.open_duration {
                    inner.state = CircuitState::HalfOpen;
                    inner.changed_at = Instant::now();
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!("hotel service circuit closed");
            inner.changed_at = Instant::now();
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        let trip = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.consecutive_failures >= self.failure_threshold,
            CircuitState::Open => false,
        };
        if trip {
            inner.state = CircuitState::Open;
            inner.changed_at = Instant::now();
            metrics::counter!("room_service_circuit_open_total").increment(1);
            tracing::warn!(
                failures = inner.consecutive_failures,
                "hotel service circuit opened"
            );
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wraps a room service with a per-call timeout, retries with exponential
/// backoff and a circuit breaker.
///
/// Only `ServiceUnavailable` (including timeouts) is retried and counted as a
/// failure by the breaker; any other error means the hotel service answered.
/// Reads and `confirm` are idempotent and retried; `release` is attempted
/// once.
pub struct ResilientRoomService<S>
where
    S: RoomService,
{
    inner: S,
    config: ResilienceConfig,
    breaker: CircuitBreaker,
}

impl<S> ResilientRoomService<S>
where
    S: RoomService,
{
    pub fn new(inner: S, config: ResilienceConfig) -> Self {
        let breaker = CircuitBreaker::new(config.failure_threshold, config.open_duration);
        Self {
            inner,
            config,
            breaker,
        }
    }

    /// Returns the circuit breaker state.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Returns the wrapped service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Runs `attempt_fn` behind the breaker with the configured retries.
    async fn call<T, F, Fut>(&self, operation: &'static str, attempt_fn: F) -> Result<T, SagaError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, SagaError>>,
    {
        self.call_with_retries(operation, self.config.max_retries, attempt_fn)
            .await
    }

    async fn call_with_retries<T, F, Fut>(
        &self,
        operation: &'static str,
        max_retries: u32,
        attempt_fn: F,
    ) -> Result<T, SagaError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, SagaError>>,
    {
        let mut retries = 0;
        let mut backoff = self.config.retry_backoff;

        loop {
            if !self.breaker.allow_request() {
                tracing::warn!(operation, "hotel service circuit open, failing fast");
                return Err(SagaError::ServiceUnavailable(
                    HOTEL_SERVICE_UNAVAILABLE.to_string(),
                ));
            }

            let result = match tokio::time::timeout(self.config.timeout, attempt_fn()).await {
                Ok(result) => result,
                Err(_) => Err(SagaError::ServiceUnavailable(format!(
                    "hotel service {operation} timed out after {:?}",
                    self.config.timeout
                ))),
            };

            match result {
                Err(SagaError::ServiceUnavailable(reason)) => {
                    self.breaker.record_failure();
                    if retries >= max_retries {
                        tracing::error!(operation, retries, %reason, "hotel service call failed");
                        return Err(SagaError::ServiceUnavailable(reason));
                    }
                    retries += 1;
                    metrics::counter!("room_service_retries_total").increment(1);
                    tracing::warn!(operation, retries, %reason, "retrying hotel service call");
                    tokio::time::sleep(backoff.min(BACKOFF_MAX)).await;
                    backoff = backoff.saturating_mul(2);
                }
                other => {
                    self.breaker.record_success();
                    return other;
                }
            }
        }
    }
}

#[async_trait]
impl<S> RoomService for ResilientRoomService<S>
where
    S: RoomService,
{
    async fn get_room(&self, room_id: RoomId) -> Result<RoomSummary, SagaError> {
        self.call("get_room", || self.inner.get_room(room_id)).await
    }

    async fn recommend(&self) -> Result<Vec<RoomSummary>, SagaError> {
        self.call("recommend", || self.inner.recommend()).await
    }

    async fn select_room(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
    ) -> Result<RoomSummary, SagaError> {
        self.call("select_room", || self.inner.select_room(hotel_id, room_type))
            .await
    }

    async fn confirm(
        &self,
        room_id: RoomId,
        request: ConfirmAvailability,
    ) -> Result<AvailabilityConfirmation, SagaError> {
        self.call("confirm", || self.inner.confirm(room_id, request.clone()))
            .await
    }

    /// Single attempt. The room owner decrements on every release, so a
    /// release applied remotely but timed out locally must not be resent.
    async fn release(&self, room_id: RoomId, request_id: &RequestId) -> Result<(), SagaError> {
        self.call_with_retries("release", 0, || self.inner.release(room_id, request_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Fails the first `failures` calls, optionally hanging instead.
    #[derive(Default)]
    struct FlakyRoomService {
        failures: AtomicUsize,
        calls: AtomicUsize,
        hang: AtomicBool,
        not_found: AtomicBool,
        releases: AtomicUsize,
        slow_release: AtomicBool,
    }

    impl FlakyRoomService {
        fn failing(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures: AtomicUsize::new(failures),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn summary(room_id: RoomId) -> RoomSummary {
        RoomSummary {
            id: room_id,
            hotel_id: HotelId::new(1),
            room_number: "101".to_string(),
            room_type: RoomType::Single,
            price_cents: 5_000,
            available: true,
            times_booked: 0,
        }
    }

    #[async_trait]
    impl RoomService for FlakyRoomService {
        async fn get_room(&self, room_id: RoomId) -> Result<RoomSummary, SagaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.not_found.load(Ordering::SeqCst) {
                return Err(SagaError::NotFound("missing".to_string()));
            }
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(SagaError::ServiceUnavailable("connection refused".to_string()));
            }
            Ok(summary(room_id))
        }

        async fn recommend(&self) -> Result<Vec<RoomSummary>, SagaError> {
            Ok(vec![])
        }

        async fn select_room(
            &self,
            _hotel_id: HotelId,
            _room_type: RoomType,
        ) -> Result<RoomSummary, SagaError> {
            Ok(summary(RoomId::new(1)))
        }

        async fn confirm(
            &self,
            room_id: RoomId,
            request: ConfirmAvailability,
        ) -> Result<AvailabilityConfirmation, SagaError> {
            Ok(AvailabilityConfirmation::confirmed(request.request_id, room_id))
        }

        async fn release(
            &self,
            _room_id: RoomId,
            _request_id: &RequestId,
        ) -> Result<(), SagaError> {
            // Applied before the reply is delayed.
            self.releases.fetch_add(1, Ordering::SeqCst);
            if self.slow_release.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(SagaError::ServiceUnavailable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn config() -> ResilienceConfig {
        ResilienceConfig {
            timeout: Duration::from_millis(50),
            max_retries: 2,
            retry_backoff: Duration::from_millis(10),
            failure_threshold: 3,
            open_duration: Duration::from_secs(60),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let flaky = FlakyRoomService::failing(2);
        let service = ResilientRoomService::new(Arc::clone(&flaky), config());

        let room = service.get_room(RoomId::new(7)).await.unwrap();
        assert_eq!(room.id, RoomId::new(7));
        assert_eq!(flaky.calls(), 3);
        assert_eq!(service.circuit_state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let flaky = FlakyRoomService::failing(10);
        let service = ResilientRoomService::new(Arc::clone(&flaky), config());

        let result = service.get_room(RoomId::new(7)).await;
        assert!(matches!(result, Err(SagaError::ServiceUnavailable(_))));
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let flaky = FlakyRoomService::failing(0);
        flaky.not_found.store(true, Ordering::SeqCst);
        let service = ResilientRoomService::new(Arc::clone(&flaky), config());

        let result = service.get_room(RoomId::new(7)).await;
        assert!(matches!(result, Err(SagaError::NotFound(_))));
        assert_eq!(flaky.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_service_unavailable() {
        let flaky = FlakyRoomService::failing(0);
        flaky.hang.store(true, Ordering::SeqCst);
        let service = ResilientRoomService::new(Arc::clone(&flaky), config());

        let result = service.get_room(RoomId::new(7)).await;
        assert!(matches!(result, Err(SagaError::ServiceUnavailable(ref m)) if m.contains("timed out")));
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_circuit_opens_and_fails_fast() {
        let flaky = FlakyRoomService::failing(100);
        let service = ResilientRoomService::new(Arc::clone(&flaky), config());

        // Three failed attempts reach the threshold.
        let _ = service.get_room(RoomId::new(1)).await;
        assert_eq!(service.circuit_state(), CircuitState::Open);
        let calls = flaky.calls();

        let result = service.get_room(RoomId::new(1)).await;
        assert!(
            matches!(result, Err(SagaError::ServiceUnavailable(ref m)) if m == HOTEL_SERVICE_UNAVAILABLE)
        );
        assert_eq!(flaky.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_release_is_not_resent() {
        let flaky = FlakyRoomService::failing(0);
        flaky.slow_release.store(true, Ordering::SeqCst);
        let service = ResilientRoomService::new(Arc::clone(&flaky), config());

        let result = service
            .release(RoomId::new(1), &RequestId::new("req-1"))
            .await;
        assert!(matches!(result, Err(SagaError::ServiceUnavailable(ref m)) if m.contains("timed out")));
        assert_eq!(flaky.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_release_is_not_retried_but_counts_against_circuit() {
        let flaky = FlakyRoomService::failing(10);
        let service = ResilientRoomService::new(
            Arc::clone(&flaky),
            ResilienceConfig {
                failure_threshold: 1,
                ..config()
            },
        );

        let result = service
            .release(RoomId::new(1), &RequestId::new("req-1"))
            .await;
        assert!(matches!(result, Err(SagaError::ServiceUnavailable(_))));
        assert_eq!(flaky.releases.load(Ordering::SeqCst), 1);
        assert_eq!(service.circuit_state(), CircuitState::Open);
    }

    #[test]
    fn test_breaker_half_open_trial() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(breaker.allow_request());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_breaker_blocks_during_cool_down() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        breaker.record_failure();
        assert!(breaker.allow_request());
        breaker.record_failure();
        assert!(!breaker.allow_request());
    }
}
