use crate::lifecycle::LifecycleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SvcError>;

#[derive(Debug, Error)]
pub enum SvcError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SvcError {
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        SvcError::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

// Hooks of either phase surface infrastructure failures with `?`, so the
// conversion does not pick a phase.
impl From<SvcError> for LifecycleError {
    fn from(err: SvcError) -> Self {
        LifecycleError::component(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{Result as LifecycleResult, Stoppable};
    use async_trait::async_trait;
    use std::io;

    struct Spool;

    fn drain_spool() -> crate::Result<()> {
        Err(io::Error::other("disk full").into())
    }

    #[async_trait]
    impl Stoppable for Spool {
        async fn shutdown(&self) -> LifecycleResult<()> {
            drain_spool()?;
            Ok(())
        }
    }

    #[test]
    fn test_conversion_is_phase_neutral() {
        let err = LifecycleError::from(SvcError::invalid_config("PORT", "x", "not a number"));
        assert_eq!(
            err,
            LifecycleError::component("Invalid value \"x\" for PORT: not a number")
        );
    }

    #[tokio::test]
    async fn test_stop_hook_error_is_not_reported_as_init_failure() {
        let err = Spool.shutdown().await.unwrap_err();
        assert_eq!(err, LifecycleError::component("I/O error: disk full"));
        assert!(!matches!(err, LifecycleError::InitializationFailed(_)));
    }
}
