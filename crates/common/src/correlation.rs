//! Task-scoped correlation ID.
//!
//! The HTTP layer runs each request inside [`scope`]; anything awaited within
//! that future (including outbound calls to the other service) can read the
//! current ID with [`current`]. The value is dropped when the future completes.

use std::future::Future;

use crate::types::CorrelationId;

tokio::task_local! {
    static CORRELATION_ID: CorrelationId;
}

/// Runs `fut` with `id` as the current correlation ID.
pub async fn scope<F: Future>(id: CorrelationId, fut: F) -> F::Output {
    CORRELATION_ID.scope(id, fut).await
}

/// Returns the correlation ID of the current task, if one is set.
pub fn current() -> Option<CorrelationId> {
    CORRELATION_ID.try_with(CorrelationId::clone).ok()
}
