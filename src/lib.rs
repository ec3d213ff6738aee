#[macro_use]
extern crate bitflags;

mod cartridge;
mod cheats;
mod error;

pub use cartridge::{
    create_mapper, BaseMapper, Cartridge, ChrMemoryType, Mapper, MemoryAccess, MemoryOperation,
    MemoryRanges, MemorySource, MirroringType, PrgMemoryType, RomData,
};
pub use cheats::{CheatEngine, Notification};
pub use error::{CartridgeError, SnapshotError};
