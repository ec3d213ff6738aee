use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirroringType {
    Horizontal,
    Vertical,
    FourScreens,
    ScreenAOnly,
    ScreenBOnly,
}

/// ROM contents and header facts, as produced by the host's iNES/NES 2.0
/// loader. Only the fields the mapping core consumes.
#[derive(Clone)]
pub struct RomData {
    pub filename: String,
    pub mirroring: MirroringType,
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
    pub has_battery: bool,
    pub is_pal_rom: bool,
    pub crc32: u32,
}
