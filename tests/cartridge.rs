use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use nescart::{
    create_mapper, BaseMapper, Cartridge, CartridgeError, CheatEngine, ChrMemoryType, Mapper,
    MemoryRanges, MirroringType, Notification, PrgMemoryType, RomData,
};

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn rom(filename: &str, prg_len: usize, chr_len: usize) -> RomData {
    RomData {
        filename: filename.to_string(),
        mirroring: MirroringType::Horizontal,
        prg_rom: patterned(prg_len),
        chr_rom: patterned(chr_len),
        has_battery: false,
        is_pal_rom: false,
        crc32: 0,
    }
}

fn save_folder(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nescart-{}-{}", tag, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn nrom_mirrors_a_16k_image() {
    let rom = rom("nrom16.nes", 0x4000, 0x2000);
    let prg = rom.prg_rom.clone();
    let mut cart = Cartridge::new(create_mapper(0).unwrap(), rom, &save_folder("nrom"), None);

    assert_eq!(cart.read_ram(0x8000), prg[0]);
    assert_eq!(cart.read_ram(0xC000), prg[0]);
    assert_eq!(cart.read_ram(0xFFFF), prg[0x3FFF]);
}

struct BankBoard;

impl Mapper for BankBoard {
    fn prg_page_size(&self) -> usize {
        0x4000
    }

    fn init(&mut self, base: &mut BaseMapper) {
        base.select_prg_page(0, 0, PrgMemoryType::PrgRom);
        base.select_prg_page(1, -1, PrgMemoryType::PrgRom);
        base.select_chr_page(0, 0, ChrMemoryType::Default);
    }
}

#[test]
fn negative_bank_select_maps_the_last_bank() {
    let rom = rom("banks.nes", 0x20000, 0x2000);
    let prg = rom.prg_rom.clone();
    let mut cart = Cartridge::new(Box::new(BankBoard), rom, &save_folder("banks"), None);

    assert_eq!(cart.read_ram(0xC001), prg[0x20000 - 0x4000 + 1]);
    assert_eq!(cart.read_ram(0xC001), prg[114689]);
}

#[test]
fn battery_ram_survives_teardown() {
    let folder = save_folder("battery");
    let _ = fs::remove_file(folder.join("persist.sav"));

    let mut rom_data = rom("persist.nes", 0x8000, 0x2000);
    rom_data.has_battery = true;

    let mut cart = Cartridge::new(create_mapper(0).unwrap(), rom_data.clone(), &folder, None);
    cart.write_ram(0x6000, 0x42);
    assert_eq!(cart.read_ram(0x6000), 0x42);
    drop(cart);

    let saved = fs::read(folder.join("persist.sav")).unwrap();
    assert_eq!(saved.len(), 0x2000);

    let mut revived = Cartridge::new(create_mapper(0).unwrap(), rom_data, &folder, None);
    assert_eq!(revived.read_ram(0x6000), 0x42);
}

#[test]
fn work_ram_is_not_persisted() {
    let folder = save_folder("workram");
    let _ = fs::remove_file(folder.join("volatile.sav"));

    let mut cart = Cartridge::new(
        create_mapper(0).unwrap(),
        rom("volatile.nes", 0x8000, 0x2000),
        &folder,
        None,
    );
    cart.write_ram(0x6000, 0x42);
    drop(cart);

    assert!(!folder.join("volatile.sav").exists());
}

#[test]
fn unmapped_cpu_reads_return_open_bus() {
    let mut cart = Cartridge::new(
        create_mapper(0).unwrap(),
        rom("openbus.nes", 0x8000, 0x2000),
        &save_folder("openbus"),
        None,
    );
    assert_eq!(cart.read_ram(0x50A0), 0x50);
    cart.write_ram(0x50A0, 0xFF);
    assert_eq!(cart.read_ram(0x50A0), 0x50);
}

struct ConflictBoard {
    writes: Rc<RefCell<Vec<(u16, u8)>>>,
}

impl Mapper for ConflictBoard {
    fn has_bus_conflicts(&self) -> bool {
        true
    }

    fn init(&mut self, base: &mut BaseMapper) {
        base.select_prg_page(0, 0, PrgMemoryType::PrgRom);
        base.select_chr_page(0, 0, ChrMemoryType::Default);
    }

    fn write_register(&mut self, _base: &mut BaseMapper, addr: u16, value: u8) {
        self.writes.borrow_mut().push((addr, value));
    }
}

#[test]
fn bus_conflict_ands_with_the_rom_byte() {
    let mut rom_data = rom("conflict.nes", 0x8000, 0x2000);
    rom_data.prg_rom[0] = 0b1011_0000;
    let writes = Rc::new(RefCell::new(Vec::new()));
    let board = ConflictBoard {
        writes: writes.clone(),
    };
    let mut cart = Cartridge::new(Box::new(board), rom_data, &save_folder("conflict"), None);

    cart.write_ram(0x8000, 0b1100_1111);
    assert_eq!(writes.borrow().as_slice(), &[(0x8000, 0b1000_0000)]);
}

#[test]
fn register_writes_dispatch_even_over_readonly_rom() {
    let rom_data = rom("dispatch.nes", 0x8000, 0x2000);
    let prg0 = rom_data.prg_rom[0];
    let writes = Rc::new(RefCell::new(Vec::new()));
    let board = ConflictBoard {
        writes: writes.clone(),
    };
    let mut cart = Cartridge::new(Box::new(board), rom_data, &save_folder("dispatch"), None);

    cart.write_ram(0x9123, 0xFF);
    assert_eq!(writes.borrow().len(), 1);
    // the ROM byte itself is untouched
    assert_eq!(cart.read_ram(0x8000), prg0);
}

struct SwitchBoard;

impl Mapper for SwitchBoard {
    fn prg_page_size(&self) -> usize {
        0x2000
    }

    fn chr_page_size(&self) -> usize {
        0x2000
    }

    fn init(&mut self, base: &mut BaseMapper) {
        for slot in 0..4 {
            base.select_prg_page(slot, slot as i16, PrgMemoryType::PrgRom);
        }
        base.select_chr_page(0, 0, ChrMemoryType::Default);
    }
}

#[test]
fn save_state_replays_bank_selections() {
    let rom_data = rom("state.nes", 0x20000, 0x2000);
    let folder = save_folder("state");

    let mut cart = Cartridge::new(Box::new(SwitchBoard), rom_data.clone(), &folder, None);
    cart.base_mut().select_prg_page(2, 5, PrgMemoryType::PrgRom);
    assert_eq!(cart.base().to_absolute_address(0xC000), Some(5 * 0x2000));
    let state = cart.save_state().unwrap();

    // a fresh cartridge still has the board's own banking
    let mut fresh = Cartridge::new(Box::new(SwitchBoard), rom_data, &folder, None);
    assert_eq!(fresh.base().to_absolute_address(0xC000), Some(2 * 0x2000));

    fresh.load_state(&state).unwrap();
    assert_eq!(fresh.base().to_absolute_address(0xC000), Some(5 * 0x2000));
    assert_eq!(fresh.read_ram(0xC001), cart.read_ram(0xC001));
}

#[test]
fn horizontal_mirroring_pairs_the_low_slots() {
    let mut cart = Cartridge::new(
        create_mapper(0).unwrap(),
        rom("mirror.nes", 0x8000, 0x2000),
        &save_folder("mirror"),
        None,
    );
    cart.write_vram(0x2000, 0x5A);
    assert_eq!(cart.read_vram(0x2400), 0x5A);
    assert_eq!(cart.read_vram(0x2800), 0x00);
    assert_eq!(cart.read_vram(0x2C00), 0x00);
}

struct PatchList {
    codes: RefCell<Vec<(usize, u8)>>,
}

impl CheatEngine for PatchList {
    fn apply_prg_codes(&self, prg_rom: &mut [u8]) {
        for &(offset, value) in self.codes.borrow().iter() {
            prg_rom[offset] = value;
        }
    }
}

#[test]
fn cheats_patch_and_unpatch_prg_rom() {
    let rom_data = rom("cheats.nes", 0x8000, 0x2000);
    let original = rom_data.prg_rom[0];
    let engine = Rc::new(PatchList {
        codes: RefCell::new(vec![(0, 0xAA)]),
    });
    let cheats: Rc<dyn CheatEngine> = engine.clone();
    let mut cart = Cartridge::new(
        create_mapper(0).unwrap(),
        rom_data,
        &save_folder("cheats"),
        Some(cheats),
    );

    assert_eq!(cart.read_ram(0x8000), 0xAA);

    engine.codes.borrow_mut().clear();
    cart.process_notification(Notification::CheatRemoved);
    assert_eq!(cart.read_ram(0x8000), original);
}

#[test]
fn default_memory_ranges_claim_the_cartridge_space() {
    let cart = Cartridge::new(
        create_mapper(0).unwrap(),
        rom("ranges.nes", 0x8000, 0x2000),
        &save_folder("ranges"),
        None,
    );
    let mut ranges = MemoryRanges::new();
    cart.get_memory_ranges(&mut ranges);
    assert_eq!(ranges.read_ranges(), &[(0x4018, 0xFFFF)]);
    assert_eq!(ranges.write_ranges(), &[(0x4018, 0xFFFF)]);
}

#[test]
fn unknown_mapper_ids_are_rejected() {
    match create_mapper(283) {
        Err(CartridgeError::UnsupportedMapper(283)) => {}
        _ => panic!("expected an unsupported-mapper error"),
    }
}
