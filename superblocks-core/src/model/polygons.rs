use geo::Polygon;

pub type SuperblockId = i64;

/// Superblock reference of a block when there are no superblocks at all
pub const NO_SUPERBLOCK: SuperblockId = -1;

/// Minimal face enclosed by internal streets
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: usize,
    pub geometry: Polygon<f64>,
    pub superblock_id: SuperblockId,
}

/// Cell enclosed by boundary streets
#[derive(Debug, Clone, PartialEq)]
pub struct Superblock {
    pub id: SuperblockId,
    pub geometry: Polygon<f64>,
}
