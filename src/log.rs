//! Logging macros that forward to the `log` crate when the `log` feature
//! is enabled and compile to nothing otherwise.

#[cfg(feature = "log")]
macro_rules! info {
    ($($args:tt)+) => {
        ::log::info!($($args)+)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! info {
    ($($args:tt)+) => {{
        let _ = format_args!($($args)+);
    }};
}

#[cfg(feature = "log")]
macro_rules! trace {
    ($($args:tt)+) => {
        ::log::trace!($($args)+)
    };
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($args:tt)+) => {{
        let _ = format_args!($($args)+);
    }};
}
