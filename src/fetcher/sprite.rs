use crate::constants::{OAM_BEGIN, SPRITE_TILE_DATA_BASE};
use crate::fetcher::{pixels_from_row, FetchPhase};
use crate::fifo::{SpriteFifo, SpritePixel};
use crate::memory::MemoryMap;
use crate::oam::{SpriteBuffer, SpriteBufferEntry};
use crate::registers::Registers;

/// Inputs the scheduler supplies to the sprite fetcher every Draw tick.
pub struct SpriteFetchContext {
    pub x: u8,
    /// True unless the background fetcher currently owns the memory port;
    /// the sprite fetcher may not leave `Pause` to start a new hit while
    /// this is false.
    pub mem_free: bool,
}

/// 4-phase state machine fetching a single sprite's tile row into the
/// sprite FIFO. Idle (`Pause`) between hits; a hit is taken from the
/// [`SpriteBuffer`] as soon as the draw cursor reaches it.
#[derive(Debug, Clone)]
pub struct SpriteFetcher {
    phase: FetchPhase,
    awaiting_idle_tick: bool,
    oam_index: u8,
    row: u8,
    palette_select: u8,
    mirror_h: bool,
    bg_priority: bool,
    tile_row: u8,
    row_base: u16,
    tile_data_low: u8,
    tile_data_high: u8,
}

impl Default for SpriteFetcher {
    fn default() -> Self {
        Self {
            phase: FetchPhase::Pause,
            awaiting_idle_tick: true,
            oam_index: 0,
            row: 0,
            palette_select: 0,
            mirror_h: false,
            bg_priority: false,
            tile_row: 0,
            row_base: 0,
            tile_data_low: 0,
            tile_data_high: 0,
        }
    }
}

impl SpriteFetcher {
    pub fn reset(&mut self) {
        self.phase = FetchPhase::Pause;
        self.awaiting_idle_tick = true;
    }

    /// Whether a sprite hit is currently being fetched. The background
    /// fetcher must not start a new tile while this holds.
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, FetchPhase::Pause)
    }

    pub fn step(
        &mut self,
        mem: &dyn MemoryMap,
        regs: &Registers,
        ctx: &SpriteFetchContext,
        buffer: &mut SpriteBuffer,
        fifo: &mut SpriteFifo,
    ) {
        if self.phase == FetchPhase::Pause {
            if ctx.mem_free && regs.lcd_control.contains(crate::registers::LCDControl::OBJ_EN) {
                if let Some(entry) = buffer.take_hit(ctx.x) {
                    self.start(entry);
                }
            }
            return;
        }

        if self.awaiting_idle_tick {
            self.awaiting_idle_tick = false;
            return;
        }
        self.awaiting_idle_tick = true;

        match self.phase {
            FetchPhase::FetchTileNum => {
                self.fetch_tile_num(mem, regs);
                self.phase = FetchPhase::FetchTileDataLow;
            }
            FetchPhase::FetchTileDataLow => {
                let address = self.row_base + u16::from(self.tile_row) * 2;
                self.tile_data_low = mem.read(address);
                self.phase = FetchPhase::FetchTileDataHigh;
            }
            FetchPhase::FetchTileDataHigh => {
                let address = self.row_base + u16::from(self.tile_row) * 2 + 1;
                self.tile_data_high = mem.read(address);
                self.phase = FetchPhase::Push2Fifo;
            }
            FetchPhase::Push2Fifo => {
                self.push(fifo);
                self.phase = FetchPhase::Pause;
            }
            FetchPhase::Pause => unreachable!(),
        }
    }

    fn start(&mut self, entry: SpriteBufferEntry) {
        self.oam_index = entry.oam_index;
        self.row = entry.row;
        self.phase = FetchPhase::FetchTileNum;
        self.awaiting_idle_tick = true;
    }

    fn fetch_tile_num(&mut self, mem: &dyn MemoryMap, regs: &Registers) {
        let tall = regs.lcd_control.tall_sprites();
        let height: u8 = if tall { 16 } else { 8 };

        let oam_base = OAM_BEGIN + u16::from(self.oam_index) * 4;
        let raw_tile_num = mem.read(oam_base + 2);
        let flags = mem.read(oam_base + 3);

        self.palette_select = (flags >> 4) & 1;
        self.mirror_h = flags & 0b0010_0000 != 0;
        let mirror_v = flags & 0b0100_0000 != 0;
        self.bg_priority = flags & 0b1000_0000 != 0;

        let mut row = self.row & (height - 1);
        if mirror_v {
            row = height - 1 - row;
        }

        // 8x16 sprites address two consecutive tiles; the LSB of the tile
        // number is ignored and the top/bottom half picked by row.
        let tile_num = if tall {
            let base = raw_tile_num & 0xFE;
            if row >= 8 {
                base | 0x01
            } else {
                base
            }
        } else {
            raw_tile_num
        };

        self.tile_row = row & 7;
        // Sprites always use 0x8000 unsigned addressing regardless of LCDC.4.
        self.row_base = SPRITE_TILE_DATA_BASE + u16::from(tile_num) * 16;
    }

    fn push(&mut self, fifo: &mut SpriteFifo) {
        let pixels = pixels_from_row(self.tile_data_low, self.tile_data_high, self.mirror_h);
        let row = pixels.map(|color| SpritePixel {
            color,
            palette_select: self.palette_select,
            bg_priority: self.bg_priority,
        });
        fifo.push_row(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ArrayMemoryMap;
    use crate::registers::LCDControl;

    fn write_oam_entry(mem: &mut ArrayMemoryMap, index: u8, tile_num: u8, flags: u8) {
        let base = OAM_BEGIN + u16::from(index) * 4;
        mem.write(base + 2, tile_num);
        mem.write(base + 3, flags);
    }

    fn run_to_push(
        fetcher: &mut SpriteFetcher,
        mem: &ArrayMemoryMap,
        regs: &Registers,
        buffer: &mut SpriteBuffer,
        fifo: &mut SpriteFifo,
    ) {
        let ctx = SpriteFetchContext { x: 9, mem_free: true };
        for _ in 0..12 {
            fetcher.step(mem, regs, &ctx, buffer, fifo);
        }
    }

    #[test]
    fn stays_paused_while_memory_port_is_not_free() {
        let mem = ArrayMemoryMap::new();
        let mut regs = Registers::default();
        regs.lcd_control = LCDControl::OBJ_EN;
        let mut buffer = SpriteBuffer::default();
        buffer.push(SpriteBufferEntry {
            x: 9,
            oam_index: 0,
            row: 0,
        });
        let mut fifo = SpriteFifo::default();
        let mut fetcher = SpriteFetcher::default();

        let busy_ctx = SpriteFetchContext { x: 9, mem_free: false };
        for _ in 0..4 {
            fetcher.step(&mem, &regs, &busy_ctx, &mut buffer, &mut fifo);
        }
        assert!(!fetcher.is_active(), "sprite fetcher must not start while the background owns the port");
        assert_eq!(buffer.len(), 1, "the hit must remain buffered, not be taken");

        let free_ctx = SpriteFetchContext { x: 9, mem_free: true };
        fetcher.step(&mem, &regs, &free_ctx, &mut buffer, &mut fifo);
        assert!(fetcher.is_active(), "sprite fetcher should start once the port is free");
        assert!(buffer.is_empty());
    }

    #[test]
    fn tall_sprite_clears_tile_lsb_and_picks_half_by_row() {
        let mut mem = ArrayMemoryMap::new();
        write_oam_entry(&mut mem, 0, 0x05, 0);
        let tile_data_base = SPRITE_TILE_DATA_BASE + u16::from(0x04u8) * 16 + 8 * 2;
        mem.write(tile_data_base, 0xFF);
        mem.write(tile_data_base + 1, 0x00);

        let mut regs = Registers::default();
        regs.lcd_control = LCDControl::OBJ_SIZE | LCDControl::OBJ_EN;

        let mut buffer = SpriteBuffer::default();
        buffer.push(SpriteBufferEntry {
            x: 9,
            oam_index: 0,
            row: 8,
        });
        let mut fifo = SpriteFifo::default();
        let mut fetcher = SpriteFetcher::default();
        run_to_push(&mut fetcher, &mem, &regs, &mut buffer, &mut fifo);

        let pixel = fifo.pop().unwrap();
        assert_eq!(pixel.color, crate::palette::Pixel::One);
    }

    #[test]
    fn horizontal_mirror_reverses_column_order() {
        let mut mem = ArrayMemoryMap::new();
        write_oam_entry(&mut mem, 1, 0x10, 0b0010_0000);
        let tile_data_base = SPRITE_TILE_DATA_BASE + u16::from(0x10u8) * 16;
        mem.write(tile_data_base, 0b0000_0001);
        mem.write(tile_data_base + 1, 0x00);

        let mut regs = Registers::default();
        regs.lcd_control = LCDControl::OBJ_EN;
        let mut buffer = SpriteBuffer::default();
        buffer.push(SpriteBufferEntry {
            x: 9,
            oam_index: 1,
            row: 0,
        });
        let mut fifo = SpriteFifo::default();
        let mut fetcher = SpriteFetcher::default();
        run_to_push(&mut fetcher, &mem, &regs, &mut buffer, &mut fifo);

        let pixel = fifo.pop().unwrap();
        assert_eq!(pixel.color, crate::palette::Pixel::One);
    }
}
