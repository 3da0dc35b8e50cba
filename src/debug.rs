pub(crate) mod macros {
    /// Format and log message at TRACE level, but only if feature `trace` is enabled
    #[allow(unused_macros)]
    macro_rules! log_trace {
        ($fmt: expr) => {
            #[cfg(feature = "trace")]
            {
                log::trace!($fmt);
            }
        };
        ($fmt: expr, $( $args:expr ),*) => {
            #[cfg(feature = "trace")]
            {
                log::trace!($fmt, $($args),*);
            }
        };
    }

    /// Format and log message at ERROR level, but only if feature `debug` is enabled
    #[allow(unused_macros)]
    macro_rules! log_error {
        ($fmt: expr) => {
            #[cfg(feature = "debug")]
            {
                log::error!($fmt);
            }
        };
        ($fmt: expr, $( $args:expr ),*) => {
            #[cfg(feature = "debug")]
            {
                log::error!($fmt, $($args),*);
            }
        };
    }

    // re-exports for crate
    pub(crate) use {log_error, log_trace};
}
