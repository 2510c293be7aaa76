/// One-shot latch bounding the extra seal pass
///
/// The first compilation rewrites placeholder modules, which only takes effect
/// if the host seals the graph again. The guard lets that happen once per
/// session; a new session gets a new guard.
#[derive(Debug, Default)]
pub struct ResealGuard {
    tripped: bool,
}

impl ResealGuard {
    /// Create an untripped guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the guard, returning true only on the first call
    pub fn trip_if_untripped(&mut self) -> bool {
        !std::mem::replace(&mut self.tripped, true)
    }

    /// Whether the extra pass has already been granted
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}
