use std::path::Path;
use std::rc::Rc;

use log::info;

use crate::cartridge::base::{BaseMapper, BaseMapperState};
use crate::cartridge::rom::RomData;
use crate::cheats::{CheatEngine, Notification};
use crate::error::SnapshotError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryOperation {
    Read,
    Write,
}

/// CPU bus ranges a cartridge claims read/write handling for.
#[derive(Debug, Default)]
pub struct MemoryRanges {
    read: Vec<(u16, u16)>,
    write: Vec<(u16, u16)>,
}

impl MemoryRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, operation: MemoryOperation, start_addr: u16, end_addr: u16) {
        match operation {
            MemoryOperation::Read => self.read.push((start_addr, end_addr)),
            MemoryOperation::Write => self.write.push((start_addr, end_addr)),
        }
    }

    pub fn read_ranges(&self) -> &[(u16, u16)] {
        &self.read
    }

    pub fn write_ranges(&self) -> &[(u16, u16)] {
        &self.write
    }
}

/// Board-specific behavior layered over [`BaseMapper`]: memory geometry, the
/// register window, policy flags, and the register logic itself. Defaults
/// are the conservative NROM-style values; a board overrides only what its
/// hardware changes. Geometry hooks are sampled once when the cartridge is
/// built.
pub trait Mapper {
    fn prg_page_size(&self) -> usize {
        0x8000
    }

    fn chr_page_size(&self) -> usize {
        0x2000
    }

    fn save_ram_size(&self) -> usize {
        0x2000
    }

    fn save_ram_page_size(&self) -> usize {
        0x2000
    }

    fn work_ram_size(&self) -> usize {
        0x2000
    }

    fn work_ram_page_size(&self) -> usize {
        0x2000
    }

    fn chr_ram_size(&self) -> usize {
        0x2000
    }

    fn chr_ram_page_size(&self) -> usize {
        0x2000
    }

    fn register_start_address(&self) -> u16 {
        0x8000
    }

    fn register_end_address(&self) -> u16 {
        0xFFFF
    }

    fn allow_register_read(&self) -> bool {
        false
    }

    fn has_bus_conflicts(&self) -> bool {
        false
    }

    fn force_battery(&self) -> bool {
        false
    }

    /// Installs the board's initial banking. Runs after the base has built
    /// its arenas and the default 0x6000-0x7FFF window.
    fn init(&mut self, base: &mut BaseMapper);

    fn init_with_rom(&mut self, _base: &mut BaseMapper, _rom: &RomData) {}

    fn write_register(&mut self, _base: &mut BaseMapper, _addr: u16, _value: u8) {}

    fn read_register(&mut self, _base: &mut BaseMapper, _addr: u16) -> u8 {
        0
    }

    /// Called when the address on the PPU memory bus changes; IRQ-counting
    /// boards watch A12 through this.
    fn notify_vram_address_change(&mut self, _base: &mut BaseMapper, _addr: u16) {}

    fn get_memory_ranges(&self, ranges: &mut MemoryRanges) {
        ranges.add_handler(MemoryOperation::Read, 0x4018, 0xFFFF);
        ranges.add_handler(MemoryOperation::Write, 0x4018, 0xFFFF);
    }

    /// Board state appended after the base snapshot.
    fn save_state(&self) -> Vec<u8> {
        Vec::new()
    }

    fn load_state(&mut self, _state: &[u8]) -> Result<(), SnapshotError> {
        Ok(())
    }
}

/// A loaded cartridge: the bank-switching core plus its board, presenting
/// the bus facade the CPU and PPU cores call on every memory cycle.
pub struct Cartridge {
    base: BaseMapper,
    mapper: Box<dyn Mapper>,
    cheats: Option<Rc<dyn CheatEngine>>,
}

impl Cartridge {
    pub fn new(
        mut mapper: Box<dyn Mapper>,
        rom: RomData,
        save_folder: &Path,
        cheats: Option<Rc<dyn CheatEngine>>,
    ) -> Cartridge {
        let mut base = BaseMapper::new(mapper.as_ref(), &rom, save_folder);
        mapper.init(&mut base);
        mapper.init_with_rom(&mut base, &rom);

        let chr_is_ram = base.chr_size(true) > 0;
        info!(
            "cartridge up: PRG-ROM {}K, CHR {} {}K, mirroring {:?}, battery: {}",
            base.prg_size() / 1024,
            if chr_is_ram { "RAM" } else { "ROM" },
            base.chr_size(chr_is_ram) / 1024,
            base.mirroring_type(),
            base.has_battery(),
        );

        let mut cartridge = Cartridge { base, mapper, cheats };
        cartridge.apply_cheats();
        cartridge
    }

    pub fn read_ram(&mut self, addr: u16) -> u8 {
        if self.base.allow_register_read() && self.base.is_register_addr(addr) {
            self.mapper.read_register(&mut self.base, addr)
        } else {
            self.base.read_prg(addr)
        }
    }

    pub fn write_ram(&mut self, addr: u16, mut value: u8) {
        if self.base.is_register_addr(addr) {
            if self.base.has_bus_conflicts() {
                // Both the CPU and the ROM drive the data bus; the lines AND.
                value &= self.base.internal_read_ram(addr);
            }
            self.mapper.write_register(&mut self.base, addr, value);
        } else {
            self.base.write_prg_ram(addr, value);
        }
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        self.base.read_chr(addr)
    }

    pub fn write_vram(&mut self, addr: u16, value: u8) {
        self.base.write_chr(addr, value);
    }

    pub fn notify_vram_address_change(&mut self, addr: u16) {
        self.mapper.notify_vram_address_change(&mut self.base, addr);
    }

    pub fn get_memory_ranges(&self, ranges: &mut MemoryRanges) {
        self.mapper.get_memory_ranges(ranges);
    }

    pub fn process_notification(&mut self, notification: Notification) {
        match notification {
            Notification::CheatAdded | Notification::CheatRemoved => self.apply_cheats(),
        }
    }

    /// Re-derives the live PRG-ROM from the pristine copy plus the current
    /// cheat list.
    pub fn apply_cheats(&mut self) {
        self.base.restore_original_prg_rom();
        if let Some(cheats) = &self.cheats {
            cheats.apply_prg_codes(self.base.prg_rom_mut());
        }
    }

    pub fn save_state(&self) -> Result<Vec<u8>, SnapshotError> {
        let state = (self.base.snapshot(), self.mapper.save_state());
        Ok(bincode::serialize(&state)?)
    }

    /// Applies a snapshot: arenas are copied back, then the page tables are
    /// rebuilt by replaying the recorded page selections. The board's own
    /// init hooks do not run again.
    pub fn load_state(&mut self, state: &[u8]) -> Result<(), SnapshotError> {
        let (base_state, mapper_state): (BaseMapperState, Vec<u8>) =
            bincode::deserialize(state)?;
        self.base.restore(base_state)?;
        self.mapper.load_state(&mapper_state)
    }

    pub fn base(&self) -> &BaseMapper {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseMapper {
        &mut self.base
    }
}

impl Drop for Cartridge {
    fn drop(&mut self) {
        if self.base.has_battery() {
            self.base.save_battery();
        }
    }
}
