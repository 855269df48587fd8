pub mod identity_hash;
pub mod scratch_set;

pub use scratch_set::{
    PooledScratch, ScratchRepresentation, ScratchSet, ScratchSetCache, ScratchSetPool,
};
