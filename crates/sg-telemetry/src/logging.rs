//! Structured log macros.
//!
//! Every event carries a `subsystem` field so filtered output from a large
//! simulation can be sliced per concern.

/// Log an event tagged with its subsystem.
#[macro_export]
macro_rules! log_event {
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (trace, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::trace!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a peer-related event with standard fields.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $subsystem:expr, $msg:expr, $node:expr, $peer:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            node = %$node,
            peer = %$peer,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a protocol drop: a frame or payment that was silently discarded.
#[macro_export]
macro_rules! log_drop {
    ($subsystem:expr, $node:expr, $reason:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            node = %$node,
            reason = %$reason,
            $($($field)*,)?
            "dropped"
        )
    };
}
