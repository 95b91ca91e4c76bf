//! Edge detection over successive boolean samples

/// Transition observed between two consecutive samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Edge {
    /// false → true
    pub rising: bool,
    /// true → false
    pub falling: bool,
}

impl Edge {
    /// No transition
    pub const NONE: Edge = Edge {
        rising: false,
        falling: false,
    };

    /// Compare a sample against the previous one
    ///
    /// With no previous sample there is never an edge, whatever the current
    /// value is.
    pub fn detect(previous: Option<bool>, current: bool) -> Self {
        match previous {
            None => Edge::NONE,
            Some(previous) => Edge {
                rising: !previous && current,
                falling: previous && !current,
            },
        }
    }

    /// True if either transition happened
    pub fn any(self) -> bool {
        self.rising || self.falling
    }
}

/// Last observed value of one tracked signal
///
/// Reading and updating happen in the same call, so no two samples can be
/// compared against the same previous value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeMemory {
    last: Option<bool>,
}

impl EdgeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `current` and report the transition from the previous sample
    pub fn observe(&mut self, current: bool) -> Edge {
        let edge = Edge::detect(self.last, current);
        self.last = Some(current);
        edge
    }

    /// Last observed value, if any
    pub fn last(&self) -> Option<bool> {
        self.last
    }
}
