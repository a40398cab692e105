/// Which silhouette a detector is tuned for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    /// Head and shoulders.
    Face,
    /// Full body.
    Body,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Face => "face",
            DetectorKind::Body => "body",
        }
    }
}

/// Candidate person region in image-pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Axis-aligned overlap test.
    ///
    /// Both the x-intervals and the y-intervals must intersect. Rectangles that
    /// only share an edge do not overlap.
    pub fn overlaps(&self, other: &Region) -> bool {
        (self.x as u64) < other.right()
            && self.right() > other.x as u64
            && (self.y as u64) < other.bottom()
            && self.bottom() > other.y as u64
    }
}

impl From<(u32, u32, u32, u32)> for Region {
    fn from((x, y, width, height): (u32, u32, u32, u32)) -> Self {
        Self::new(x, y, width, height)
    }
}

/// Regions from one detector run on one frame, in detector scan order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionBatch {
    pub kind: DetectorKind,
    pub regions: Vec<Region>,
}

impl DetectionBatch {
    pub fn new(kind: DetectorKind, regions: Vec<Region>) -> Self {
        Self { kind, regions }
    }

    pub fn empty(kind: DetectorKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Deduplicated regions for one frame. Its length is the crowd count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniqueDetectionSet {
    regions: Vec<Region>,
}

impl UniqueDetectionSet {
    pub(crate) fn from_accepted(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
