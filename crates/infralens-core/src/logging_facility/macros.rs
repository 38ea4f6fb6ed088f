//! Operation boundary macros
//!
//! Every public pipeline stage logs exactly one start and one end (or
//! end_error) event carrying `component`, `op` and `event`.

/// Log the start of an operation
///
/// ```
/// # use infralens_core::log_op_start;
/// log_op_start!("parse_diff");
/// log_op_start!("parse_diff", input_bytes = 512);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use infralens_core::log_op_end;
/// log_op_end!("score_risk", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation with its stable error code
///
/// Accepts anything convertible into `ExError`; the value is cloned.
///
/// ```
/// # use infralens_core::{log_op_error, errors::InfraLensError};
/// let err = InfraLensError::malformed("$", "root must be an object");
/// log_op_error!("parse_diff", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = ($err).clone().into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            error = %ex_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = ($err).clone().into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::__types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            error = %ex_err,
            $($field)*
        );
    }};
}
