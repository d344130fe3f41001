use crate::palette::Palette;
use bitflags::bitflags;

bitflags! {
    /// Represents LCDC at `0xFF40`.
    #[derive(Copy, Clone, Default)]
    pub struct LCDControl: u8 {
        const BG_WIN_EN  = 0b0000_0001; // BG/window enable (bit 0)
        const OBJ_EN     = 0b0000_0010; // sprite enable
        const OBJ_SIZE   = 0b0000_0100; // 1 = 8x16 sprites
        const BG_MAP     = 0b0000_1000; // BG tile map select
        const TILE_SEL   = 0b0001_0000; // BG/window addressing mode, 1 = 0x8000 unsigned
        const WIN_EN     = 0b0010_0000; // window enable
        const WIN_MAP    = 0b0100_0000; // window tile map select
        const LCD_EN     = 0b1000_0000; // display enable
    }

    /// Represents the CPU-writable bits of STAT at `0xFF41` (interrupt
    /// enables). The mode bits and the coincidence flag are derived by the
    /// scheduler rather than stored here, see [`crate::ppu::Ppu::stat`].
    #[derive(Copy, Clone, Default)]
    pub struct LCDStatusInterrupts: u8 {
        const H_BLANK_INT = 0b0000_1000;
        const V_BLANK_INT = 0b0001_0000;
        const OAM_INT     = 0b0010_0000;
        const LY_INT      = 0b0100_0000;
    }
}

impl LCDControl {
    /// `0x9C00` if the BG map bit is set, else `0x9800`.
    #[inline]
    pub const fn bg_tile_map_area(&self) -> u16 {
        match self.contains(LCDControl::BG_MAP) {
            true => 0x9C00,
            false => 0x9800,
        }
    }

    /// `0x9C00` if the window map bit is set, else `0x9800`.
    #[inline]
    pub const fn window_tile_map_area(&self) -> u16 {
        match self.contains(LCDControl::WIN_MAP) {
            true => 0x9C00,
            false => 0x9800,
        }
    }

    #[inline]
    pub const fn tall_sprites(&self) -> bool {
        self.contains(LCDControl::OBJ_SIZE)
    }
}

/// The PPU mode state machine. `LY` and the counters that drive transitions
/// between these live on [`crate::ppu::Ppu`], not here.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    HBlank = 0b00,
    VBlank = 0b01,
    OamScan = 0b10,
    Draw = 0b11,
}

impl From<Mode> for u8 {
    #[inline]
    fn from(value: Mode) -> u8 {
        value as u8
    }
}

/// Holds every PPU register that is written by the CPU and read back by the
/// PPU combinationally. `LY` is owned by [`crate::ppu::Ppu`] since it is an
/// output, not an input.
#[derive(Clone, Copy, Default)]
pub struct Registers {
    pub lcd_control: LCDControl,
    pub lcd_status_interrupts: LCDStatusInterrupts,
    pub scy: u8,
    pub scx: u8,
    pub lyc: u8,
    pub wy: u8,
    pub wx: u8,
    pub bg_palette: Palette,
    pub obj_palette0: Palette,
    pub obj_palette1: Palette,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_map_area_follows_lcdc_bits() {
        let mut lcdc = LCDControl::empty();
        assert_eq!(lcdc.bg_tile_map_area(), 0x9800);
        assert_eq!(lcdc.window_tile_map_area(), 0x9800);

        lcdc.insert(LCDControl::BG_MAP);
        assert_eq!(lcdc.bg_tile_map_area(), 0x9C00);

        lcdc.insert(LCDControl::WIN_MAP);
        assert_eq!(lcdc.window_tile_map_area(), 0x9C00);
    }

    #[test]
    fn registers_are_plain_latches() {
        let mut regs = Registers::default();
        regs.lcd_control = LCDControl::from_bits_truncate(0x91);
        assert_eq!(regs.lcd_control.bits(), 0x91);
    }
}
