//! Counting of climbable trigger volumes overlapping a bird's bounding box.
//!
//! The count gates jumping and makes movement fall back to the avoidance
//! velocity. It only tracks volumes while the bird is in a ground or water
//! state; entering a volume in any other state clears the tracker.
use hashbrown::HashMap;

/// Identifier of a trigger volume supplied by the collision world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VolumeId(pub u32);

/// Tag carried by a trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeTag {
    /// Ledges and rocks the bird may hop onto.
    Climbable,
    /// Any other trigger; ignored by the tracker.
    Other,
}

/// Per-bird overlap counter.
#[derive(Debug, Clone, Default)]
pub struct BoundsTracker {
    triggered: HashMap<VolumeId, bool>,
    exceeded: u32,
}

impl BoundsTracker {
    /// Number of climbable volumes currently overlapping.
    #[must_use]
    pub const fn exceeded(&self) -> u32 {
        self.exceeded
    }

    /// Records a volume entering the bounding box.
    ///
    /// When `tracking` is `false` the tracker is cleared instead. Entering a
    /// volume that is already marked as triggered is ignored. Returns `true`
    /// when the count went up.
    pub fn enter(&mut self, volume: VolumeId, tracking: bool) -> bool {
        if !tracking {
            self.clear();
            return false;
        }
        let slot = self.triggered.entry(volume).or_insert(false);
        if *slot {
            return false;
        }
        *slot = true;
        self.exceeded += 1;
        true
    }

    /// Records a volume leaving the bounding box. Returns `true` when the
    /// count went down; volumes that never counted are ignored.
    pub fn exit(&mut self, volume: VolumeId) -> bool {
        match self.triggered.get_mut(&volume) {
            Some(slot) if *slot => {
                *slot = false;
                self.exceeded = self.exceeded.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Forgets every volume.
    pub fn clear(&mut self) {
        self.triggered.clear();
        self.exceeded = 0;
    }
}
