use crate::cartridge::base::{BaseMapper, ChrMemoryType, PrgMemoryType};
use crate::cartridge::mapper::Mapper;

/// NROM: no registers, 16K PRG pages, one fixed 8K CHR page. ROMs smaller
/// than the CPU window repeat through the base's small-ROM fallback.
#[derive(Default)]
pub struct State;

impl Mapper for State {
    fn prg_page_size(&self) -> usize {
        0x4000
    }

    fn chr_page_size(&self) -> usize {
        0x2000
    }

    fn init(&mut self, base: &mut BaseMapper) {
        base.select_prg_page(0, 0, PrgMemoryType::PrgRom);
        base.select_prg_page(1, 1, PrgMemoryType::PrgRom);
        base.select_chr_page(0, 0, ChrMemoryType::Default);
    }
}
