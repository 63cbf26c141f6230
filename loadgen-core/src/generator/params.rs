use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::error::ValidationError;
use super::sink::ResultSender;

/// Everything a [`super::Generator`] needs for a run.
///
/// Fields are checked independently; [`ParamSet::check`] reports every violation at once.
pub struct ParamSet<C> {
    pub caller: Option<Arc<C>>,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Target load, in calls per second.
    pub lps: u32,
    /// Total run duration.
    pub duration: Duration,
    pub result_sink: Option<ResultSender>,
}

impl<C> Default for ParamSet<C> {
    fn default() -> Self {
        Self {
            caller: None,
            timeout: Duration::ZERO,
            lps: 0,
            duration: Duration::ZERO,
            result_sink: None,
        }
    }
}

impl<C> Clone for ParamSet<C> {
    fn clone(&self) -> Self {
        Self {
            caller: self.caller.clone(),
            timeout: self.timeout,
            lps: self.lps,
            duration: self.duration,
            result_sink: self.result_sink.clone(),
        }
    }
}

pub(crate) struct Validated<C> {
    pub(crate) caller: Arc<C>,
    pub(crate) timeout: Duration,
    pub(crate) lps: u32,
    pub(crate) duration: Duration,
    pub(crate) result_sink: ResultSender,
}

impl<C> ParamSet<C> {
    pub fn new(
        caller: C,
        timeout: Duration,
        lps: u32,
        duration: Duration,
        result_sink: ResultSender,
    ) -> Self {
        Self {
            caller: Some(Arc::new(caller)),
            timeout,
            lps,
            duration,
            result_sink: Some(result_sink),
        }
    }

    pub fn check(&self) -> Result<(), ValidationError> {
        self.clone().validate().map(drop)
    }

    pub(crate) fn validate(self) -> Result<Validated<C>, ValidationError> {
        let mut violations = Vec::new();
        if self.caller.is_none() {
            violations.push("invalid `caller` (missing)".to_string());
        }
        if self.timeout.is_zero() {
            violations.push("invalid `timeout` (must be > 0)".to_string());
        }
        if self.lps == 0 {
            violations.push("invalid `lps` (load per second, must be > 0)".to_string());
        }
        if self.duration.is_zero() {
            violations.push("invalid `duration` (must be > 0)".to_string());
        }
        if self.result_sink.is_none() {
            violations.push("invalid `result_sink` (missing)".to_string());
        }

        match (self.caller, self.result_sink) {
            (Some(caller), Some(result_sink)) if violations.is_empty() => {
                info!(
                    timeout = ?self.timeout,
                    lps = self.lps,
                    duration = ?self.duration,
                    "parameter check passed"
                );
                Ok(Validated {
                    caller,
                    timeout: self.timeout,
                    lps: self.lps,
                    duration: self.duration,
                    result_sink,
                })
            }
            _ => {
                let err = ValidationError::new(violations);
                info!(error = %err, "parameter check failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::sink::result_channel;

    struct NoopCaller;

    #[test]
    fn valid_params_pass() {
        let (tx, _rx) = result_channel(1);
        let params = ParamSet::new(
            NoopCaller,
            Duration::from_millis(100),
            10,
            Duration::from_secs(1),
            tx,
        );
        assert!(params.check().is_ok());
    }

    #[test]
    fn every_violation_is_reported() {
        let params: ParamSet<NoopCaller> = ParamSet::default();
        let err = match params.check() {
            Ok(()) => panic!("expected validation failure"),
            Err(err) => err,
        };

        assert_eq!(err.violations().len(), 5);
        let msg = err.to_string();
        for field in ["caller", "timeout", "lps", "duration", "result_sink"] {
            assert!(msg.contains(field), "missing `{field}` in: {msg}");
        }
    }

    #[test]
    fn zero_rate_and_timeout_fail_together() {
        let (tx, _rx) = result_channel(1);
        let params = ParamSet::new(NoopCaller, Duration::ZERO, 0, Duration::from_secs(1), tx);

        let err = match params.validate() {
            Ok(_) => panic!("expected validation failure"),
            Err(err) => err,
        };
        assert_eq!(err.violations().len(), 2);
        assert!(err.to_string().contains("timeout"));
        assert!(err.to_string().contains("lps"));
    }

    #[test]
    fn missing_sink_alone_is_reported() {
        let (tx, _rx) = result_channel(1);
        let mut params = ParamSet::new(
            NoopCaller,
            Duration::from_millis(100),
            10,
            Duration::from_secs(1),
            tx,
        );
        params.result_sink = None;

        let err = match params.validate() {
            Ok(_) => panic!("expected validation failure"),
            Err(err) => err,
        };
        assert_eq!(err.violations(), ["invalid `result_sink` (missing)".to_string()]);
    }
}
