//! Contracts for the host's cheat engine. The engine itself lives outside
//! this crate; the cartridge only re-patches PRG-ROM through it.

/// Patches the live PRG-ROM arena with the currently active PRG codes.
/// Called against a freshly restored copy of the original ROM bytes.
pub trait CheatEngine {
    fn apply_prg_codes(&self, prg_rom: &mut [u8]);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    CheatAdded,
    CheatRemoved,
}
