//! Counters for copy-on-write activity. The macros wrap those of the `metrics` crate when the
//! `metrics` feature is enabled, and expand to nothing otherwise.

#[cfg(feature = "metrics")]
macro_rules! increment {
    ( $counter:expr ) => {
        $crate::metrics::increment!($counter, 1)
    };
    ( $counter:expr, $count:expr ) => {
        ::metrics::counter!($counter).increment($count)
    };
}

#[cfg(not(feature = "metrics"))]
macro_rules! increment {
    ( $( $args:expr ),+ ) => {};
}

pub(crate) use increment;
