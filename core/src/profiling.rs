//! Tracy instrumentation for the binding layer.
//!
//! Everything here compiles to nothing unless the `profiling` feature is
//! enabled. The macros only forward to [`Scope`], [`mark_frame`] and [`plot`],
//! so the feature is decided once, in this crate, rather than in every caller.
//!
//! ```ignore
//! use vbind_core::profiling::{frame_mark, profile_scope};
//!
//! fn rebind() {
//!     profile_scope!("rebind");
//! }
//!
//! frame_mark!();
//! ```

#[cfg(feature = "profiling")]
use std::collections::HashMap;

#[cfg(feature = "profiling")]
use parking_lot::Mutex;

/// Span guard. The span closes when the guard drops.
#[must_use = "the span closes as soon as the guard is dropped"]
pub struct Scope {
    #[cfg(feature = "profiling")]
    _span: Option<tracy_client::Span>,
}

impl Scope {
    /// Open a span named `name` at `file:line`.
    #[inline]
    pub fn enter(name: &'static str, file: &'static str, line: u32) -> Self {
        #[cfg(feature = "profiling")]
        {
            Self {
                _span: tracy_client::Client::running().map(|client| client.span_alloc(Some(name), "", file, line, 0)),
            }
        }
        #[cfg(not(feature = "profiling"))]
        {
            let _ = (name, file, line);
            Self {}
        }
    }
}

/// Tell the profiler a frame ended.
#[inline]
pub fn mark_frame() {
    #[cfg(feature = "profiling")]
    if let Some(client) = tracy_client::Client::running() {
        client.frame_mark();
    }
}

#[cfg(feature = "profiling")]
static PLOT_NAMES: Mutex<Option<HashMap<&'static str, tracy_client::PlotName>>> = Mutex::new(None);

/// Record `value` on the plot `name`.
#[inline]
pub fn plot(name: &'static str, value: f64) {
    #[cfg(feature = "profiling")]
    if let Some(client) = tracy_client::Client::running() {
        let plot_name = *PLOT_NAMES
            .lock()
            .get_or_insert_with(HashMap::new)
            .entry(name)
            .or_insert_with(|| tracy_client::PlotName::new_leak(name.to_owned()));
        client.plot(plot_name, value);
    }
    #[cfg(not(feature = "profiling"))]
    let _ = (name, value);
}

/// Open a span lasting until the end of the enclosing scope.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_scope = $crate::profiling::Scope::enter($name, file!(), line!());
    };
}

/// Open a span named after the enclosing module.
#[macro_export]
macro_rules! profile_function {
    () => {
        let _profile_scope = $crate::profiling::Scope::enter(module_path!(), file!(), line!());
    };
}

/// Mark the end of a rendered frame.
#[macro_export]
macro_rules! frame_mark {
    () => {
        $crate::profiling::mark_frame()
    };
}

/// Plot a counter over time, e.g. rebinds per frame.
#[macro_export]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::plot($name, $value as f64)
    };
}

pub use frame_mark;
pub use profile_function;
pub use profile_plot;
pub use profile_scope;
