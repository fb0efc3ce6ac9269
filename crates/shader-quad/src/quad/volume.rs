use crate::coords::ActorBox;

/// Screen-space region a drawable may touch when painted.
///
/// Hosts use it for culling and clipping.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PaintVolume {
    pub bounds: ActorBox,
}

impl PaintVolume {
    /// Volume covering exactly the allocation, no padding.
    #[inline]
    pub fn from_allocation(allocation: ActorBox) -> Self {
        Self { bounds: allocation.normalized() }
    }
}
