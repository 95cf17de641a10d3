//! Compiler configuration: the parse-time duration budget and its clock.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default budget for compiling one grammar.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_millis(1000);

/// Default bound on parenthesised group nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Monotonic time source consulted by the compiler's duration guard.
///
/// `now` returns the time elapsed since an arbitrary, fixed origin. Only
/// differences between readings are meaningful.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Options for [`compile_with`](super::compile_with).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use gbnf::grammar::{compile_with, CompileOptions};
///
/// let options = CompileOptions::default().with_time_limit(Duration::from_millis(50));
/// let table = compile_with(r#"root ::= "yes" | "no""#, &options).unwrap();
/// assert_eq!(table.num_rules(), 1);
/// ```
#[derive(Clone)]
pub struct CompileOptions {
    /// Wall-clock budget for one compilation.
    pub time_limit: Duration,
    /// Time source for the budget.
    pub clock: Arc<dyn Clock>,
    /// Deepest group nesting accepted; the compiler recurses once per level.
    pub max_depth: usize,
}

impl CompileOptions {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            clock: Arc::new(MonotonicClock::new()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("time_limit", &self.time_limit)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
