//! Directed lane identity.

use std::fmt;

use fm_core::VertexId;

/// A lane as travelled: from `from` towards `to`.
///
/// `LaneKey(a, b)` and `LaneKey(b, a)` are distinct keys for holders and
/// queues, but they name the same corridor and exclude each other.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneKey {
    pub from: VertexId,
    pub to: VertexId,
}

impl LaneKey {
    #[inline]
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }

    /// The same corridor travelled the other way.
    #[inline]
    pub fn reversed(self) -> Self {
        Self { from: self.to, to: self.from }
    }

    /// Both keys of the corridor, this direction first.
    #[inline]
    pub fn both_ways(self) -> [LaneKey; 2] {
        [self, self.reversed()]
    }
}

impl From<(VertexId, VertexId)> for LaneKey {
    fn from((from, to): (VertexId, VertexId)) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from.0, self.to.0)
    }
}
