//! Scanning surface abstraction.
//!
//! A [`Scanner`] wraps whatever turns camera frames (or typed input) into
//! decoded QR strings. The reconciler only ever touches it through a
//! [`ScanSession`], which releases the surface when dropped, so an early
//! return, an error, or a cancelled future can't leave the camera running.

use std::future::Future;

use thiserror::Error;
use tracing::debug;

/// Failures of the scanning surface itself.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// The surface could not be acquired (no camera, permission refused).
    #[error("Scanner unavailable: {0}")]
    Unavailable(String),

    /// The surface failed while running.
    #[error("Scanner failed: {0}")]
    Failed(String),
}

/// A source of decoded QR payloads.
pub trait Scanner: Send {
    /// Acquire the surface and begin decoding.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::Unavailable` if the surface cannot be acquired.
    fn start(&mut self) -> impl Future<Output = Result<(), ScannerError>> + Send;

    /// Wait for the next decoded payload.
    ///
    /// `None` means the operator stopped scanning.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::Failed` if decoding broke down.
    fn next_payload(
        &mut self,
    ) -> impl Future<Output = Result<Option<String>, ScannerError>> + Send;

    /// Stop delivering payloads until [`resume`](Self::resume).
    fn pause(&mut self);

    fn resume(&mut self);

    /// Release the surface. Called exactly once per started session.
    fn release(&mut self);
}

/// A started scanner, released on drop.
pub struct ScanSession<'a, S: Scanner> {
    scanner: &'a mut S,
}

impl<'a, S: Scanner> ScanSession<'a, S> {
    /// Start `scanner` and tie its release to the returned handle.
    ///
    /// # Errors
    ///
    /// Returns the scanner's error if it cannot start; nothing is released
    /// in that case since nothing was acquired.
    pub async fn acquire(scanner: &'a mut S) -> Result<Self, ScannerError> {
        scanner.start().await?;
        debug!("Scanner acquired");
        Ok(Self { scanner })
    }

    /// Next decoded payload, or `None` once the operator stops.
    ///
    /// # Errors
    ///
    /// Propagates scanner failures.
    pub async fn next_payload(&mut self) -> Result<Option<String>, ScannerError> {
        self.scanner.next_payload().await
    }

    pub fn pause(&mut self) {
        self.scanner.pause();
    }

    pub fn resume(&mut self) {
        self.scanner.resume();
    }
}

impl<S: Scanner> Drop for ScanSession<'_, S> {
    fn drop(&mut self) {
        self.scanner.release();
        debug!("Scanner released");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Scanner that replays fixed payloads and records lifecycle calls.
    #[derive(Default)]
    pub(crate) struct ScriptedScanner {
        pub payloads: VecDeque<String>,
        pub fail_start: bool,
        pub log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ScriptedScanner {
        pub(crate) fn new<I, P>(payloads: I) -> Self
        where
            I: IntoIterator<Item = P>,
            P: Into<String>,
        {
            Self {
                payloads: payloads.into_iter().map(Into::into).collect(),
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.log.lock().unwrap().push(call);
        }
    }

    impl Scanner for ScriptedScanner {
        fn start(&mut self) -> impl Future<Output = Result<(), ScannerError>> + Send {
            self.record("start");
            let result = if self.fail_start {
                Err(ScannerError::Unavailable("no camera".to_string()))
            } else {
                Ok(())
            };
            async move { result }
        }

        fn next_payload(
            &mut self,
        ) -> impl Future<Output = Result<Option<String>, ScannerError>> + Send {
            let next = self.payloads.pop_front();
            async move { Ok(next) }
        }

        fn pause(&mut self) {
            self.record("pause");
        }

        fn resume(&mut self) {
            self.record("resume");
        }

        fn release(&mut self) {
            self.record("release");
        }
    }

    #[tokio::test]
    async fn test_session_releases_on_drop() {
        let mut scanner = ScriptedScanner::new(["a"]);
        {
            let mut session = ScanSession::acquire(&mut scanner).await.unwrap();
            assert_eq!(session.next_payload().await.unwrap().as_deref(), Some("a"));
            assert_eq!(session.next_payload().await.unwrap(), None);
        }
        assert_eq!(scanner.calls(), vec!["start", "release"]);
    }

    #[tokio::test]
    async fn test_failed_start_releases_nothing() {
        let mut scanner = ScriptedScanner {
            fail_start: true,
            ..ScriptedScanner::default()
        };
        assert!(ScanSession::acquire(&mut scanner).await.is_err());
        assert_eq!(scanner.calls(), vec!["start"]);
    }
}
