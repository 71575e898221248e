//! Session lifecycle: probe before use, recreate when dead.

use std::time::Duration;

use super::{BrowserSession, SessionFactory};
use crate::error::SessionError;
use crate::retry::{retry_with_backoff_if, RetryPolicy};

/// Owns at most one live session and hands it out only after a health probe.
///
/// A session is healthy when `current_url` answers within `probe_timeout`.
/// An unhealthy session is closed (errors ignored) and replaced through the
/// factory, retrying creation per the policy. Creation failures other than
/// [`SessionError::UnsupportedEnvironment`] are retried.
pub struct ManagedSession<F: SessionFactory> {
    factory: F,
    policy: RetryPolicy,
    probe_timeout: Duration,
    session: Option<F::Session>,
}

impl<F: SessionFactory> ManagedSession<F> {
    #[must_use]
    pub fn new(factory: F, policy: RetryPolicy, probe_timeout: Duration) -> Self {
        Self {
            factory,
            policy,
            probe_timeout,
            session: None,
        }
    }

    /// Returns a session that just passed its health probe, creating or
    /// recreating it when needed.
    ///
    /// # Errors
    ///
    /// Returns the factory error once creation retries are exhausted, or
    /// immediately for a non-transient error.
    pub async fn session(&mut self) -> Result<&F::Session, SessionError> {
        let healthy = match &self.session {
            Some(session) => is_healthy(session, self.probe_timeout).await,
            None => false,
        };

        if !healthy {
            if let Some(stale) = self.session.take() {
                tracing::warn!("session failed health check, recreating");
                if let Err(e) = stale.close().await {
                    tracing::debug!(error = %e, "ignoring error while closing stale session");
                }
            }
            let factory = &self.factory;
            let fresh =
                retry_with_backoff_if(&self.policy, SessionError::is_transient, || factory.create())
                    .await?;
            tracing::debug!("session created");
            self.session = Some(fresh);
        }

        self.session.as_ref().ok_or(SessionError::Closed)
    }

    /// Whether a session is currently held (without probing it).
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Closes the held session, if any.
    ///
    /// # Errors
    ///
    /// Propagates the session's close error.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }
}

async fn is_healthy<S: BrowserSession>(session: &S, probe_timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(probe_timeout, session.current_url()).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
#[path = "managed_test.rs"]
mod tests;
