use crate::exceptions::ChatError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the probe reports completion.
    pub deadline: Option<Duration>,
}

impl PollSettings {
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Calls `probe` until it yields `Some`, sleeping `interval` between attempts.
///
/// Probe errors are returned immediately. Exceeding the deadline yields a
/// `Provider` error mentioning `what`.
pub async fn poll_until<T, F, Fut>(
    settings: PollSettings,
    what: &str,
    mut probe: F,
) -> Result<T, ChatError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, ChatError>>,
{
    let started = Instant::now();
    loop {
        if let Some(done) = probe().await? {
            return Ok(done);
        }
        if let Some(limit) = settings.deadline
            && started.elapsed() >= limit
        {
            return Err(ChatError::Provider(format!(
                "Timed out after {}s waiting for {}.",
                limit.as_secs(),
                what
            )));
        }
        tokio::time::sleep(settings.interval).await;
    }
}
