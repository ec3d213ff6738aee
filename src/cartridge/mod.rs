mod base;
mod mapper;
mod mapper_000;
mod rom;

pub use base::{BaseMapper, ChrMemoryType, MemoryAccess, MemorySource, PrgMemoryType};
pub use mapper::{Cartridge, Mapper, MemoryOperation, MemoryRanges};
pub use rom::{MirroringType, RomData};

use crate::error::CartridgeError;

/// Builds the board for an iNES mapper id. Only boards this crate ships;
/// hosts with their own mapper library construct `Cartridge` directly.
pub fn create_mapper(mapper_id: u16) -> Result<Box<dyn Mapper>, CartridgeError> {
    match mapper_id {
        000 => Ok(Box::new(mapper_000::State::default())),
        _ => Err(CartridgeError::UnsupportedMapper(mapper_id)),
    }
}
