//! FIPS mode status.
//!
//! This build has no validated provider, so FIPS mode can be queried and
//! turned off but never turned on.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Reason;
use crate::error_stack::{ClearErrorOnReturn, CryptoErrorList, put_error};

static FIPS_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn is_fips_enabled() -> bool {
    FIPS_ENABLED.load(Ordering::Acquire)
}

/// Requests FIPS mode on or off.
///
/// Returns `true` when the mode already is as requested. Enabling fails: the
/// "fips mode not supported" record is reported through `errors` and the
/// queue is cleared on return.
pub fn set_fips_enabled(enabled: bool, errors: Option<&mut CryptoErrorList>) -> bool {
    if is_fips_enabled() == enabled {
        return true;
    }
    // Only enabling can get here: the flag is never set.
    let _guard = ClearErrorOnReturn::new(errors);
    tracing::warn!("FIPS mode requested but no FIPS provider is available");
    put_error(Reason::CRYPTO_FIPS_MODE_NOT_SUPPORTED);
    false
}

/// Whether FIPS mode is both enabled and backed by a working provider.
pub fn test_fips_enabled() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_stack::{clear_errors, error_depth, put_error};

    #[test]
    fn enabling_is_reported() {
        put_error(Reason::PEM_NO_START_LINE);
        let mut errors = CryptoErrorList::new();
        assert!(!set_fips_enabled(true, Some(&mut errors)));
        assert!(!is_fips_enabled());
        assert_eq!(error_depth(), 0);
        assert_eq!(
            errors.peek_back(),
            Some("error:07800073:common libcrypto routines::fips mode not supported")
        );
    }

    #[test]
    fn disabling_is_a_success() {
        clear_errors();
        put_error(Reason::PEM_NO_START_LINE);
        assert!(set_fips_enabled(false, None));
        // Nothing changes, so the queue is left alone.
        assert_eq!(error_depth(), 1);
        clear_errors();
        assert!(!test_fips_enabled());
    }
}
