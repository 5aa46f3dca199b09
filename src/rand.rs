use rand_core::{OsRng, RngCore};

use crate::error::Reason;
use crate::error_stack::put_error;

/// Fills `buffer` from the operating system's CSPRNG.
///
/// Returns `false` if the OS could not supply entropy, leaving a record on the
/// queue. The contents of `buffer` are unspecified in that case.
#[must_use]
pub fn csprng(buffer: &mut [u8]) -> bool {
    match OsRng.try_fill_bytes(buffer) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, len = buffer.len(), "entropy source failed");
            put_error(Reason::RAND_ERROR_RETRIEVING_ENTROPY);
            false
        }
    }
}
