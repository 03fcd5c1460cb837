//! Which transport errors the scheduler surfaces.
//!
//! Losing ownership of a device and a device sitting in tilt are expected
//! races during normal play. Those two are always suppressed; filters can only
//! add to that list.

use crate::host::{ErrorCategory, LightError, LightErrorCode};

/// Extra suppression rules on top of the base rule.
pub trait ErrorFilter {
    /// Return true to drop `err` in addition to the always-suppressed codes.
    fn suppresses(&self, err: &LightError) -> bool;
}

/// Suppresses nothing beyond the base rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseErrorFilter;

impl ErrorFilter for BaseErrorFilter {
    fn suppresses(&self, _err: &LightError) -> bool {
        false
    }
}

/// Also suppresses the listed light-protocol codes.
#[derive(Debug, Clone, Default)]
pub struct SuppressCodes {
    codes: Vec<LightErrorCode>,
}

impl SuppressCodes {
    pub fn new(codes: Vec<LightErrorCode>) -> SuppressCodes {
        SuppressCodes { codes }
    }
}

impl ErrorFilter for SuppressCodes {
    fn suppresses(&self, err: &LightError) -> bool {
        err.category == ErrorCategory::Light && self.codes.contains(&err.code)
    }
}

/// Ownership and tilt races, suppressed regardless of the filter.
pub fn is_expected_race(err: &LightError) -> bool {
    err.category == ErrorCategory::Light
        && matches!(
            err.code,
            LightErrorCode::ClientDoesNotOwnResource | LightErrorCode::DeviceInTiltState
        )
}

/// Whether `err` must reach the caller, given the base rule plus `filter`.
pub fn should_report_error<F: ErrorFilter + ?Sized>(filter: &F, err: &LightError) -> bool {
    !is_expected_race(err) && !filter.suppresses(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_filter() {
        let filter = BaseErrorFilter;
        let light = LightError::light;
        assert!(!should_report_error(&filter, &light(LightErrorCode::ClientDoesNotOwnResource)));
        assert!(!should_report_error(&filter, &light(LightErrorCode::DeviceInTiltState)));
        assert!(should_report_error(&filter, &light(LightErrorCode::InvalidFeatureId)));
        assert!(should_report_error(&filter, &light(LightErrorCode::Other(7))));
    }

    #[test]
    fn test_transport_errors_are_reported() {
        let err = LightError::new(ErrorCategory::Transport, LightErrorCode::DeviceInTiltState);
        assert!(should_report_error(&BaseErrorFilter, &err));
    }

    #[test]
    fn test_extension_is_cumulative() {
        let filter = SuppressCodes::new(vec![LightErrorCode::InvalidFeatureId]);
        let light = LightError::light;
        assert!(!should_report_error(&filter, &light(LightErrorCode::InvalidFeatureId)));
        // The base codes stay suppressed even though the list omits them.
        assert!(!should_report_error(&filter, &light(LightErrorCode::DeviceInTiltState)));
        assert!(!should_report_error(&filter, &light(LightErrorCode::ClientDoesNotOwnResource)));
        assert!(should_report_error(&filter, &light(LightErrorCode::InvalidGroup)));
    }
}
