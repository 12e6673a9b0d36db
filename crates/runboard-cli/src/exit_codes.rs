//! Exit codes for the runboard binary.
//! These codes are part of the public contract; scripts branch on them.

use runboard_core::StoreError;
use runboard_jenkins::JenkinsError;

pub const SUCCESS: i32 = 0;
pub const NOT_FOUND: i32 = 1; // Unknown project / repository / route
pub const CONFIG_ERROR: i32 = 2; // Bad configuration or request input
pub const RUNTIME_ERROR: i32 = 3; // Store or upstream failure

/// Exit code for an API response status.
pub fn for_status(status: u16) -> i32 {
    match status {
        200..=299 => SUCCESS,
        404 => NOT_FOUND,
        400..=499 => CONFIG_ERROR,
        _ => RUNTIME_ERROR,
    }
}

/// Exit code for an error that escaped command dispatch.
pub fn for_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(StoreError::Config { .. }) = cause.downcast_ref::<StoreError>() {
            return CONFIG_ERROR;
        }
        if let Some(e) = cause.downcast_ref::<JenkinsError>() {
            if e.is_config() {
                return CONFIG_ERROR;
            }
        }
    }
    RUNTIME_ERROR
}
