pub mod access_control;
mod assignment;
mod blocks;
pub mod quantile;
mod superblocks;

pub use assignment::assign_blocks_to_superblocks;
pub use blocks::build_blocks;
pub use quantile::quantile;
pub use superblocks::build_superblocks;
