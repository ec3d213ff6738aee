use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cartridge::mapper::Mapper;
use crate::cartridge::rom::{MirroringType, RomData};
use crate::error::SnapshotError;

/// CPU window the PRG selectors cover (0x8000-0xFFFF).
pub const PRG_ADDRESS_RANGE_SIZE: usize = 0x8000;

const NAMETABLE_SIZE: usize = 0x400;
const PAGE_COUNT: usize = 256;
const SELECTOR_SLOTS: usize = 64;

/// Marks a selector slot that has never been driven; such slots are not
/// replayed when a save state is applied.
const PAGE_NUMBER_SENTINEL: u32 = 0xEEEE_EEEE;

bitflags! {
    pub struct MemoryAccess: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrgMemoryType {
    PrgRom,
    SaveRam,
    WorkRam,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChrMemoryType {
    /// CHR-ROM normally, CHR-RAM on carts that ship none.
    Default,
    ChrRom,
    ChrRam,
}

/// Which arena a page-table entry dereferences into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemorySource {
    PrgRom,
    SaveRam,
    WorkRam,
    ChrRom,
    ChrRam,
    Nametable(u8),
}

/// One 256-byte window of the CPU or PPU address space.
#[derive(Clone, Copy)]
struct PageEntry {
    source: Option<MemorySource>,
    offset: u32,
    access: MemoryAccess,
}

impl Default for PageEntry {
    fn default() -> Self {
        PageEntry {
            source: None,
            offset: 0,
            access: MemoryAccess::empty(),
        }
    }
}

/// Which CPU addresses trigger mapper register dispatch on write.
struct RegisterAddrSet {
    words: Box<[u64]>,
}

impl RegisterAddrSet {
    fn new() -> Self {
        RegisterAddrSet {
            words: vec![0u64; 0x1_0000 / 64].into_boxed_slice(),
        }
    }

    fn set_range(&mut self, start: u16, end: u16, value: bool) {
        for addr in start..=end {
            let word = &mut self.words[(addr >> 6) as usize];
            let bit = 1u64 << (addr & 63);
            if value {
                *word |= bit;
            } else {
                *word &= !bit;
            }
        }
    }

    #[inline]
    fn contains(&self, addr: u16) -> bool {
        self.words[(addr >> 6) as usize] & (1u64 << (addr & 63)) != 0
    }
}

/// Base-mapper snapshot, field order matching the stream layout that
/// concrete boards append their own state to.
#[derive(Serialize, Deserialize)]
pub(crate) struct BaseMapperState {
    chr_ram: Vec<u8>,
    mirroring: MirroringType,
    work_ram: Vec<u8>,
    save_ram: Vec<u8>,
    prg_page_numbers: Vec<u32>,
    chr_page_numbers: Vec<u32>,
    nametable_indexes: [u8; 4],
}

/// The bank-switching core every board drives: owned memory arenas, the two
/// 256-entry page tables translating CPU/PPU addresses at 256-byte
/// granularity, and the register-address set consulted by the bus facade.
pub struct BaseMapper {
    prg_rom: Vec<u8>,
    original_prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    chr_ram: Vec<u8>,
    save_ram: Vec<u8>,
    work_ram: Vec<u8>,
    // 0/1: internal A/B, 2/3: cart RAM (lazy), 4+: board-supplied
    nametables: Vec<Option<Vec<u8>>>,
    nametable_indexes: [u8; 4],

    prg_pages: [PageEntry; PAGE_COUNT],
    chr_pages: [PageEntry; PAGE_COUNT],
    prg_page_numbers: [u32; SELECTOR_SLOTS],
    chr_page_numbers: [u32; SELECTOR_SLOTS],

    register_addrs: RegisterAddrSet,

    prg_size: usize,
    chr_rom_size: usize,
    chr_ram_size: usize,
    save_ram_size: usize,
    work_ram_size: usize,

    prg_page_size: usize,
    chr_page_size: usize,
    save_ram_page_size: usize,
    work_ram_page_size: usize,
    chr_ram_page_size: usize,

    allow_register_read: bool,
    has_bus_conflicts: bool,
    has_battery: bool,
    only_chr_ram: bool,
    is_pal_rom: bool,
    crc32: u32,
    mirroring: MirroringType,

    battery_filename: PathBuf,
}

impl BaseMapper {
    /// Builds the arenas and empty page tables from the ROM, loads battery
    /// RAM, and installs the default 0x6000-0x7FFF window and the header's
    /// mirroring. Board hooks are sampled once here; the board's own init
    /// runs afterwards, from `Cartridge::new`.
    pub(crate) fn new(board: &dyn Mapper, rom: &RomData, save_folder: &Path) -> BaseMapper {
        let basename = Path::new(&rom.filename)
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_default();
        let mut battery_filename = save_folder.join(basename);
        battery_filename.set_extension("sav");

        let save_ram_size = board.save_ram_size();
        let work_ram_size = board.work_ram_size();

        let mut mapper = BaseMapper {
            prg_rom: rom.prg_rom.clone(),
            original_prg_rom: rom.prg_rom.clone(),
            chr_rom: rom.chr_rom.clone(),
            chr_ram: Vec::new(),
            save_ram: vec![0; save_ram_size],
            work_ram: vec![0; work_ram_size],
            nametables: vec![
                Some(vec![0; NAMETABLE_SIZE]),
                Some(vec![0; NAMETABLE_SIZE]),
                None,
                None,
            ],
            nametable_indexes: [0; 4],

            prg_pages: [PageEntry::default(); PAGE_COUNT],
            chr_pages: [PageEntry::default(); PAGE_COUNT],
            prg_page_numbers: [PAGE_NUMBER_SENTINEL; SELECTOR_SLOTS],
            chr_page_numbers: [PAGE_NUMBER_SENTINEL; SELECTOR_SLOTS],

            register_addrs: RegisterAddrSet::new(),

            prg_size: rom.prg_rom.len(),
            chr_rom_size: rom.chr_rom.len(),
            chr_ram_size: 0,
            save_ram_size,
            work_ram_size,

            prg_page_size: board.prg_page_size(),
            chr_page_size: board.chr_page_size(),
            save_ram_page_size: board.save_ram_page_size(),
            work_ram_page_size: board.work_ram_page_size(),
            chr_ram_page_size: board.chr_ram_page_size(),

            allow_register_read: board.allow_register_read(),
            has_bus_conflicts: board.has_bus_conflicts(),
            has_battery: rom.has_battery || board.force_battery(),
            only_chr_ram: false,
            is_pal_rom: rom.is_pal_rom,
            crc32: rom.crc32,
            mirroring: rom.mirroring,

            battery_filename,
        };

        mapper.add_register_range(board.register_start_address(), board.register_end_address());

        if mapper.has_battery {
            mapper.load_battery();
        }

        if mapper.chr_rom_size == 0 {
            // Assume CHR-RAM when the cart ships no CHR-ROM, and let the
            // Default page count arithmetic run against its size.
            mapper.only_chr_ram = true;
            mapper.chr_ram_size = board.chr_ram_size();
            mapper.chr_ram = vec![0; mapper.chr_ram_size];
            mapper.chr_rom_size = mapper.chr_ram_size;
        }

        let default_type = if mapper.has_battery {
            PrgMemoryType::SaveRam
        } else {
            PrgMemoryType::WorkRam
        };
        mapper.set_cpu_memory_mapping(0x6000, 0x7FFF, 0, default_type, None);

        mapper.set_mirroring_type(rom.mirroring);

        mapper
    }

    fn arena(&self, source: MemorySource) -> &[u8] {
        match source {
            MemorySource::PrgRom => &self.prg_rom,
            MemorySource::SaveRam => &self.save_ram,
            MemorySource::WorkRam => &self.work_ram,
            MemorySource::ChrRom => &self.chr_rom,
            MemorySource::ChrRam => &self.chr_ram,
            MemorySource::Nametable(index) => match &self.nametables[index as usize] {
                Some(page) => page,
                None => panic!("nametable {} mapped but never allocated", index),
            },
        }
    }

    fn arena_mut(&mut self, source: MemorySource) -> &mut [u8] {
        match source {
            MemorySource::PrgRom => &mut self.prg_rom,
            MemorySource::SaveRam => &mut self.save_ram,
            MemorySource::WorkRam => &mut self.work_ram,
            MemorySource::ChrRom => &mut self.chr_rom,
            MemorySource::ChrRam => &mut self.chr_ram,
            MemorySource::Nametable(index) => match &mut self.nametables[index as usize] {
                Some(page) => page,
                None => panic!("nametable {} mapped but never allocated", index),
            },
        }
    }

    #[inline]
    fn read_page(&self, entry: PageEntry, addr: u16) -> u8 {
        match entry.source {
            Some(source) => self.arena(source)[entry.offset as usize + (addr & 0xFF) as usize],
            None => 0,
        }
    }

    #[inline]
    fn write_page(&mut self, entry: PageEntry, addr: u16, value: u8) {
        if let Some(source) = entry.source {
            let offset = entry.offset as usize + (addr & 0xFF) as usize;
            self.arena_mut(source)[offset] = value;
        }
    }

    pub(crate) fn read_prg(&self, addr: u16) -> u8 {
        let entry = self.prg_pages[(addr >> 8) as usize];
        if entry.access.contains(MemoryAccess::READ) {
            self.read_page(entry, addr)
        } else {
            // Open bus: the last value driven is the address high byte.
            (addr >> 8) as u8
        }
    }

    /// Write path once register dispatch has been ruled out. Boards also
    /// call this directly for writes they want to land in mapped RAM.
    pub fn write_prg_ram(&mut self, addr: u16, value: u8) {
        let entry = self.prg_pages[(addr >> 8) as usize];
        if entry.access.contains(MemoryAccess::WRITE) {
            self.write_page(entry, addr, value);
        }
    }

    /// Reads through the PRG table without the register or access checks;
    /// boards use this to peek at the code bytes a register write landed on.
    pub fn internal_read_ram(&self, addr: u16) -> u8 {
        self.read_page(self.prg_pages[(addr >> 8) as usize], addr)
    }

    pub(crate) fn read_chr(&self, addr: u16) -> u8 {
        let entry = self.chr_pages[(addr >> 8) as usize];
        if entry.access.contains(MemoryAccess::READ) {
            self.read_page(entry, addr)
        } else {
            0
        }
    }

    pub(crate) fn write_chr(&mut self, addr: u16, value: u8) {
        let entry = self.chr_pages[(addr >> 8) as usize];
        if entry.access.contains(MemoryAccess::WRITE) {
            self.write_page(entry, addr, value);
        }
    }

    pub fn add_register_range(&mut self, start_addr: u16, end_addr: u16) {
        self.register_addrs.set_range(start_addr, end_addr, true);
    }

    pub fn remove_register_range(&mut self, start_addr: u16, end_addr: u16) {
        self.register_addrs.set_range(start_addr, end_addr, false);
    }

    #[inline]
    pub(crate) fn is_register_addr(&self, addr: u16) -> bool {
        self.register_addrs.contains(addr)
    }

    pub(crate) fn allow_register_read(&self) -> bool {
        self.allow_register_read
    }

    pub(crate) fn has_bus_conflicts(&self) -> bool {
        self.has_bus_conflicts
    }

    // Page sizes are clamped so a ROM smaller than the board's page still
    // yields valid offsets.
    fn internal_prg_page_size(&self) -> usize {
        self.prg_page_size.min(self.prg_size)
    }

    fn internal_chr_page_size(&self) -> usize {
        self.chr_page_size.min(self.chr_rom_size)
    }

    pub fn prg_page_count(&self) -> usize {
        self.prg_size / self.internal_prg_page_size()
    }

    pub fn chr_page_count(&self) -> usize {
        self.chr_rom_size / self.internal_chr_page_size()
    }

    /// Installs `page_number` of the chosen arena into every 256-byte slot
    /// of `start_addr..=end_addr`. Negative page numbers count back from the
    /// end of the arena; page counts are not always powers of two, so this
    /// is not a modulo.
    pub fn set_cpu_memory_mapping(
        &mut self,
        start_addr: u16,
        end_addr: u16,
        page_number: i16,
        memory_type: PrgMemoryType,
        access: Option<MemoryAccess>,
    ) {
        debug_assert!(
            start_addr & 0xFF == 0 && end_addr & 0xFF == 0xFF,
            "mapping range must span whole 256-byte pages: {:04X}-{:04X}",
            start_addr,
            end_addr
        );

        let (source, arena_size, page_size, default_access) = match memory_type {
            PrgMemoryType::PrgRom => (
                MemorySource::PrgRom,
                self.prg_size,
                self.internal_prg_page_size(),
                MemoryAccess::READ,
            ),
            PrgMemoryType::SaveRam => (
                MemorySource::SaveRam,
                self.save_ram_size,
                self.save_ram_page_size,
                MemoryAccess::READ | MemoryAccess::WRITE,
            ),
            PrgMemoryType::WorkRam => (
                MemorySource::WorkRam,
                self.work_ram_size,
                self.work_ram_page_size,
                MemoryAccess::READ | MemoryAccess::WRITE,
            ),
        };

        let page_count = if page_size == 0 { 0 } else { arena_size / page_size };
        if page_count == 0 {
            warn!(
                "ignoring {:?} mapping at {:04X}-{:04X}: arena is empty",
                memory_type, start_addr, end_addr
            );
            return;
        }

        let page = if page_number < 0 {
            let page = page_count as isize + page_number as isize;
            debug_assert!(page >= 0, "bank {} from the end exceeds {} banks", -page_number, page_count);
            page as usize
        } else {
            page_number as usize % page_count
        };

        let access = access.unwrap_or(default_access);
        let mut offset = (page * page_size) as u32;
        for i in (start_addr >> 8)..=(end_addr >> 8) {
            self.prg_pages[i as usize] = PageEntry {
                source: Some(source),
                offset,
                access,
            };
            offset += 0x100;
        }
    }

    pub fn set_ppu_memory_mapping(
        &mut self,
        start_addr: u16,
        end_addr: u16,
        page_number: u16,
        chr_type: ChrMemoryType,
        access: Option<MemoryAccess>,
    ) {
        let (source, arena_size, page_size, default_access) = match chr_type {
            ChrMemoryType::Default if self.only_chr_ram => (
                MemorySource::ChrRam,
                self.chr_rom_size,
                self.internal_chr_page_size(),
                MemoryAccess::READ | MemoryAccess::WRITE,
            ),
            ChrMemoryType::Default | ChrMemoryType::ChrRom => (
                MemorySource::ChrRom,
                self.chr_rom_size,
                self.internal_chr_page_size(),
                MemoryAccess::READ,
            ),
            ChrMemoryType::ChrRam => (
                MemorySource::ChrRam,
                self.chr_ram_size,
                self.chr_ram_page_size,
                MemoryAccess::READ | MemoryAccess::WRITE,
            ),
        };

        let page_count = if page_size == 0 { 0 } else { arena_size / page_size };
        if page_count == 0 {
            warn!(
                "ignoring {:?} mapping at {:04X}-{:04X}: arena is empty",
                chr_type, start_addr, end_addr
            );
            return;
        }

        let page = page_number as usize % page_count;
        self.set_ppu_memory_source(
            start_addr,
            end_addr,
            Some((source, (page * page_size) as u32)),
            access.unwrap_or(default_access),
        );
    }

    /// Raw PPU mapping: installs `source` (arena tag plus starting offset)
    /// across the range, or unmaps it when `source` is `None`.
    pub fn set_ppu_memory_source(
        &mut self,
        start_addr: u16,
        end_addr: u16,
        source: Option<(MemorySource, u32)>,
        access: MemoryAccess,
    ) {
        debug_assert!(
            start_addr & 0xFF == 0 && end_addr & 0xFF == 0xFF,
            "mapping range must span whole 256-byte pages: {:04X}-{:04X}",
            start_addr,
            end_addr
        );

        match source {
            Some((source, start_offset)) => {
                let mut offset = start_offset;
                for i in (start_addr >> 8)..=(end_addr >> 8) {
                    self.chr_pages[i as usize] = PageEntry {
                        source: Some(source),
                        offset,
                        access,
                    };
                    offset += 0x100;
                }
            }
            None => {
                for i in (start_addr >> 8)..=(end_addr >> 8) {
                    self.chr_pages[i as usize] = PageEntry::default();
                }
            }
        }
    }

    /// Unmaps a PPU range, leaving open-bus behavior behind.
    pub fn remove_ppu_memory_mapping(&mut self, start_addr: u16, end_addr: u16) {
        self.set_ppu_memory_source(start_addr, end_addr, None, MemoryAccess::empty());
    }

    pub fn select_prg_page(&mut self, slot: u16, page: i16, memory_type: PrgMemoryType) {
        self.prg_page_numbers[slot as usize] = page as u16 as u32;

        if self.prg_size < PRG_ADDRESS_RANGE_SIZE {
            // The whole ROM is smaller than the CPU window; repeat it across
            // 0x8000-0xFFFF the way NROM mirrors a 16K image.
            for i in 0..PRG_ADDRESS_RANGE_SIZE / self.prg_size {
                let start_addr = 0x8000 + i * self.prg_size;
                let end_addr = start_addr + self.prg_size - 1;
                self.set_cpu_memory_mapping(start_addr as u16, end_addr as u16, 0, memory_type, None);
            }
        } else {
            let page_size = self.internal_prg_page_size();
            let start_addr = 0x8000 + slot as usize * page_size;
            let end_addr = start_addr + page_size - 1;
            self.set_cpu_memory_mapping(start_addr as u16, end_addr as u16, page, memory_type, None);
        }
    }

    pub fn select_prg_page_2x(&mut self, slot: u16, page: i16, memory_type: PrgMemoryType) {
        self.select_prg_page(slot * 2, page, memory_type);
        self.select_prg_page(slot * 2 + 1, page + 1, memory_type);
    }

    pub fn select_prg_page_4x(&mut self, slot: u16, page: i16, memory_type: PrgMemoryType) {
        self.select_prg_page_2x(slot * 2, page, memory_type);
        self.select_prg_page_2x(slot * 2 + 1, page + 2, memory_type);
    }

    pub fn select_chr_page(&mut self, slot: u16, page: u16, chr_type: ChrMemoryType) {
        self.chr_page_numbers[slot as usize] = page as u32;

        let page_size = self.internal_chr_page_size();
        if page_size == 0 {
            warn!("ignoring CHR page selection: cart has no CHR memory");
            return;
        }
        let start_addr = slot as usize * page_size;
        let end_addr = start_addr + page_size - 1;
        self.set_ppu_memory_mapping(start_addr as u16, end_addr as u16, page, chr_type, None);
    }

    pub fn select_chr_page_2x(&mut self, slot: u16, page: u16, chr_type: ChrMemoryType) {
        self.select_chr_page(slot * 2, page, chr_type);
        self.select_chr_page(slot * 2 + 1, page + 1, chr_type);
    }

    pub fn select_chr_page_4x(&mut self, slot: u16, page: u16, chr_type: ChrMemoryType) {
        self.select_chr_page_2x(slot * 2, page, chr_type);
        self.select_chr_page_2x(slot * 2 + 1, page + 2, chr_type);
    }

    pub fn select_chr_page_8x(&mut self, slot: u16, page: u16, chr_type: ChrMemoryType) {
        self.select_chr_page_4x(slot * 2, page, chr_type);
        self.select_chr_page_4x(slot * 2 + 1, page + 4, chr_type);
    }

    /// Registers a board-owned nametable page under `index`. Indexes 0-3 are
    /// reserved for the internal pair and the two cart RAM pages.
    pub fn add_nametable(&mut self, index: u8, nametable: Vec<u8>) {
        assert!(index >= 4, "nametable indexes below 4 are reserved");
        assert_eq!(nametable.len(), NAMETABLE_SIZE);
        if self.nametables.len() <= index as usize {
            self.nametables.resize(index as usize + 1, None);
        }
        self.nametables[index as usize] = Some(nametable);
    }

    /// Points one of the four PPU nametable slots (0x2000/0x2400/0x2800/
    /// 0x2C00) at the physical page `index`. Cart RAM pages 2 and 3 are
    /// allocated on first use.
    pub fn set_nametable(&mut self, slot: u8, index: u8) {
        if (index == 2 || index == 3) && self.nametables[index as usize].is_none() {
            self.nametables[index as usize] = Some(vec![0; NAMETABLE_SIZE]);
        }
        let present = self
            .nametables
            .get(index as usize)
            .map_or(false, Option::is_some);
        if !present {
            warn!("nametable {} was never added, slot {} left untouched", index, slot);
            return;
        }

        self.nametable_indexes[slot as usize] = index;

        let start_addr = 0x2000 + slot as u16 * NAMETABLE_SIZE as u16;
        self.set_ppu_memory_source(
            start_addr,
            start_addr + NAMETABLE_SIZE as u16 - 1,
            Some((MemorySource::Nametable(index), 0)),
            MemoryAccess::READ | MemoryAccess::WRITE,
        );
    }

    pub fn set_nametables(&mut self, index0: u8, index1: u8, index2: u8, index3: u8) {
        self.set_nametable(0, index0);
        self.set_nametable(1, index1);
        self.set_nametable(2, index2);
        self.set_nametable(3, index3);
    }

    pub fn set_mirroring_type(&mut self, mirroring: MirroringType) {
        self.mirroring = mirroring;
        match mirroring {
            MirroringType::Vertical => self.set_nametables(0, 1, 0, 1),
            MirroringType::Horizontal => self.set_nametables(0, 0, 1, 1),
            MirroringType::FourScreens => self.set_nametables(0, 1, 2, 3),
            MirroringType::ScreenAOnly => self.set_nametables(0, 0, 0, 0),
            MirroringType::ScreenBOnly => self.set_nametables(1, 1, 1, 1),
        }
    }

    pub fn mirroring_type(&self) -> MirroringType {
        self.mirroring
    }

    /// PRG-ROM byte offset currently visible at `addr`, if any.
    pub fn to_absolute_address(&self, addr: u16) -> Option<u32> {
        let entry = self.prg_pages[(addr >> 8) as usize];
        match entry.source {
            Some(MemorySource::PrgRom) => Some(entry.offset + (addr & 0xFF) as u32),
            _ => None,
        }
    }

    pub fn to_absolute_ram_address(&self, addr: u16) -> Option<u32> {
        let entry = self.prg_pages[(addr >> 8) as usize];
        match entry.source {
            Some(MemorySource::WorkRam) => Some(entry.offset + (addr & 0xFF) as u32),
            _ => None,
        }
    }

    pub fn to_absolute_chr_address(&self, addr: u16) -> Option<u32> {
        let entry = self.chr_pages[(addr >> 8) as usize];
        match entry.source {
            Some(MemorySource::ChrRom) => Some(entry.offset + (addr & 0xFF) as u32),
            _ => None,
        }
    }

    /// Finds the lowest CPU address whose installed page covers the given
    /// PRG-ROM offset, if that byte is mapped anywhere right now.
    pub fn from_absolute_address(&self, prg_offset: u32) -> Option<u16> {
        for (i, entry) in self.prg_pages.iter().enumerate() {
            if entry.source == Some(MemorySource::PrgRom)
                && prg_offset >= entry.offset
                && prg_offset <= entry.offset + 0xFF
            {
                return Some(((i as u16) << 8) | (prg_offset - entry.offset) as u16);
            }
        }
        None
    }

    fn load_battery(&mut self) {
        match fs::read(&self.battery_filename) {
            Ok(data) => {
                let len = data.len().min(self.save_ram.len());
                self.save_ram[..len].copy_from_slice(&data[..len]);
            }
            Err(_) => {
                debug!(
                    "no battery file at {}, save RAM starts blank",
                    self.battery_filename.display()
                );
            }
        }

        // The mapping most battery games expect; boards can override it.
        self.set_cpu_memory_mapping(0x6000, 0x7FFF, 0, PrgMemoryType::SaveRam, None);
    }

    pub(crate) fn save_battery(&self) {
        if let Err(err) = fs::write(&self.battery_filename, &self.save_ram) {
            warn!(
                "failed to write battery file {}: {}",
                self.battery_filename.display(),
                err
            );
        }
    }

    pub(crate) fn snapshot(&self) -> BaseMapperState {
        BaseMapperState {
            chr_ram: self.chr_ram.clone(),
            mirroring: self.mirroring,
            work_ram: self.work_ram.clone(),
            save_ram: self.save_ram.clone(),
            prg_page_numbers: self.prg_page_numbers.to_vec(),
            chr_page_numbers: self.chr_page_numbers.to_vec(),
            nametable_indexes: self.nametable_indexes,
        }
    }

    pub(crate) fn restore(&mut self, state: BaseMapperState) -> Result<(), SnapshotError> {
        fn check(field: &'static str, found: usize, expected: usize) -> Result<(), SnapshotError> {
            if found == expected {
                Ok(())
            } else {
                Err(SnapshotError::Geometry { field, found, expected })
            }
        }
        check("CHR-RAM", state.chr_ram.len(), self.chr_ram.len())?;
        check("work RAM", state.work_ram.len(), self.work_ram.len())?;
        check("save RAM", state.save_ram.len(), self.save_ram.len())?;
        check("PRG page numbers", state.prg_page_numbers.len(), SELECTOR_SLOTS)?;
        check("CHR page numbers", state.chr_page_numbers.len(), SELECTOR_SLOTS)?;

        self.chr_ram = state.chr_ram;
        self.mirroring = state.mirroring;
        self.work_ram = state.work_ram;
        self.save_ram = state.save_ram;
        self.prg_page_numbers.copy_from_slice(&state.prg_page_numbers);
        self.chr_page_numbers.copy_from_slice(&state.chr_page_numbers);
        self.nametable_indexes = state.nametable_indexes;

        // Rebuild the page tables by replaying every selection that was ever
        // driven, then re-point the four nametable slots.
        for slot in 0..SELECTOR_SLOTS {
            let page = self.prg_page_numbers[slot];
            if page != PAGE_NUMBER_SENTINEL {
                self.select_prg_page(slot as u16, page as u16 as i16, PrgMemoryType::PrgRom);
            }
            let page = self.chr_page_numbers[slot];
            if page != PAGE_NUMBER_SENTINEL {
                self.select_chr_page(slot as u16, page as u16, ChrMemoryType::Default);
            }
        }
        let indexes = self.nametable_indexes;
        for (slot, index) in indexes.iter().enumerate() {
            self.set_nametable(slot as u8, *index);
        }

        Ok(())
    }

    pub(crate) fn restore_original_prg_rom(&mut self) {
        self.prg_rom.copy_from_slice(&self.original_prg_rom);
    }

    pub(crate) fn prg_rom_mut(&mut self) -> &mut [u8] {
        &mut self.prg_rom
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    pub fn chr_rom(&self) -> &[u8] {
        &self.chr_rom
    }

    pub fn chr_ram(&self) -> &[u8] {
        &self.chr_ram
    }

    pub fn work_ram(&self) -> &[u8] {
        &self.work_ram
    }

    pub fn save_ram(&self) -> &[u8] {
        &self.save_ram
    }

    pub fn prg_size(&self) -> usize {
        self.prg_size
    }

    pub fn chr_size(&self, ram: bool) -> usize {
        if ram {
            self.chr_ram_size
        } else {
            self.chr_rom_size
        }
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    pub fn is_pal_rom(&self) -> bool {
        self.is_pal_rom
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }
}
