/// Classification for retry policy.
///
/// The engine has no retry queue: a failed gateway call leaves the affected
/// order or user untouched and the next scheduled run is the retry. The class
/// only decides how loudly the failure is reported.
///
/// | Class | Picked up by next run? | Logged as |
/// |-------|------------------------|-----------|
/// | `Never` | Yes, but will fail again until data changes | error |
/// | `WithBackoff` | Yes | warning |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Bad symbol, validation error, or another terminal failure.
    Never,

    /// Transient failure such as rate limiting (429), timeout or a 5xx answer.
    WithBackoff,
}

impl RetryClass {
    /// Returns true if a later attempt can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RetryClass::WithBackoff)
    }
}
