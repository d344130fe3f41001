//! Screen geometry, timing budgets and memory map addresses shared across
//! the PPU's sub-components.

/// Visible pixel columns per scanline.
pub const SCREEN_WIDTH: u8 = 160;
/// Visible scanlines per frame.
pub const SCREEN_HEIGHT: u8 = 144;
/// Last scanline number, including the ten V-Blank lines.
pub const VERTICAL_BLANK_SCAN_LINE_MAX: u8 = 153;

/// T-cycles spent in mode 2 (OAM scan) every scanline.
pub const OAM_SCAN_CYCLES: u16 = 80;
/// T-cycles in a full scanline, mode 2 + mode 3 + mode 0.
pub const T_CYCLES_PER_LINE: u16 = 456;
/// T-cycles in a full frame: 456 * 154.
pub const FRAME_T_CYCLES: u32 = T_CYCLES_PER_LINE as u32 * (VERTICAL_BLANK_SCAN_LINE_MAX as u32 + 1);

/// Value read back from an address nobody drives, the hardware convention
/// for an undriven bus.
pub const UNDEFINED_READ: u8 = 0xFF;

/// OAM: 40 entries of 4 bytes (Y, X, tile, flags) each.
pub const OAM_BEGIN: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;
pub const OAM_SIZE: usize = (OAM_END - OAM_BEGIN + 1) as usize;
pub const OAM_ENTRY_COUNT: u8 = 40;
pub const OAM_ENTRY_SIZE: u16 = 4;

/// VRAM: tile data and the two 32x32 tile maps.
pub const VRAM_BEGIN: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;
pub const VRAM_SIZE: usize = (VRAM_END - VRAM_BEGIN + 1) as usize;

/// Tile data addressing bases, selected by `LCDC.4`.
pub const TILE_DATA_UNSIGNED_BASE: u16 = 0x8000;
pub const TILE_DATA_SIGNED_BASE: u16 = 0x9000;
/// Sprites always use the unsigned (`0x8000`) addressing mode.
pub const SPRITE_TILE_DATA_BASE: u16 = 0x8000;

/// Background/window tile map bases, selected by `LCDC.3`/`LCDC.6`.
pub const TILE_MAP_LOW: u16 = 0x9800;
pub const TILE_MAP_HIGH: u16 = 0x9C00;
pub const TILE_MAP_ROW_SIZE: u16 = 32;
