use crate::constants::{TILE_DATA_SIGNED_BASE, TILE_DATA_UNSIGNED_BASE};
use crate::fetcher::{pixels_from_row, FetchPhase};
use crate::fifo::BackgroundFifo;
use crate::memory::MemoryMap;
use crate::registers::Registers;

/// Inputs the scheduler supplies to the background fetcher every Draw tick.
pub struct BackgroundFetchContext {
    pub x: u8,
    pub ly: u8,
    pub wy_latch: bool,
    pub window_line: u8,
    /// True once the sprite fetcher has taken the memory port; the
    /// background fetcher may not start a new tile while this holds.
    pub sprite_active: bool,
    /// True if a buffered sprite currently qualifies for the draw cursor,
    /// checked by peeking the sprite buffer rather than the sprite
    /// fetcher's own state, so the background fetcher can yield the port
    /// *before* the sprite fetcher has had a chance to become active.
    pub sprite_pending: bool,
}

/// 4-phase state machine fetching background/window tile rows into the
/// background FIFO, two T-cycles per phase. A fifth `Pause` phase is
/// entered at the end of a row if the sprite fetcher needs the port.
#[derive(Debug, Clone)]
pub struct BackgroundFetcher {
    phase: FetchPhase,
    /// Each phase spans two T-cycles: the first is idle, the second does
    /// the phase's work and advances to the next phase.
    awaiting_idle_tick: bool,
    fetcher_x: u8,
    window_tile_x: u8,
    in_window: bool,
    tile_id: u8,
    row_base: u16,
    tile_data_low: u8,
    tile_data_high: u8,
}

impl Default for BackgroundFetcher {
    fn default() -> Self {
        Self {
            phase: FetchPhase::FetchTileNum,
            awaiting_idle_tick: true,
            fetcher_x: 0,
            window_tile_x: 0,
            in_window: false,
            tile_id: 0,
            row_base: 0,
            tile_data_low: 0,
            tile_data_high: 0,
        }
    }
}

impl BackgroundFetcher {
    /// Resets the fetcher at the start of a new scanline's Draw phase.
    pub fn start_scanline(&mut self) {
        self.phase = FetchPhase::FetchTileNum;
        self.awaiting_idle_tick = true;
        self.fetcher_x = 0;
        self.window_tile_x = 0;
        self.in_window = false;
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, FetchPhase::Pause)
    }

    /// Whether `(x + 7) >= wx && window enabled && wy_latch` held the last
    /// time this fetcher computed tile coordinates.
    #[inline]
    pub fn in_window(&self) -> bool {
        self.in_window
    }

    pub fn step(
        &mut self,
        mem: &dyn MemoryMap,
        regs: &Registers,
        ctx: &BackgroundFetchContext,
        fifo: &mut BackgroundFifo,
    ) {
        if self.phase == FetchPhase::Pause {
            if !ctx.sprite_active {
                self.phase = FetchPhase::FetchTileNum;
                self.awaiting_idle_tick = true;
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
                self.fetch_tile_num(mem, regs, ctx);
                self.phase = FetchPhase::FetchTileDataLow;
            }
            FetchPhase::FetchTileDataLow => {
                let address = self.row_base + ((self.y_coord(regs, ctx) & 7) << 1);
                self.tile_data_low = mem.read(address);
                self.phase = FetchPhase::FetchTileDataHigh;
            }
            FetchPhase::FetchTileDataHigh => {
                let address = self.row_base + ((self.y_coord(regs, ctx) & 7) << 1) + 1;
                self.tile_data_high = mem.read(address);
                self.phase = FetchPhase::Push2Fifo;
            }
            FetchPhase::Push2Fifo => {
                // Retries every other tick until the FIFO is drainable.
                self.retry_push(ctx, fifo);
            }
            FetchPhase::Pause => unreachable!(),
        }
    }

    fn is_inside_window(&self, regs: &Registers, ctx: &BackgroundFetchContext) -> bool {
        regs.lcd_control.contains(crate::registers::LCDControl::WIN_EN)
            && ctx.wy_latch
            && u16::from(ctx.x) + 7 >= u16::from(regs.wx)
    }

    fn y_coord(&self, regs: &Registers, ctx: &BackgroundFetchContext) -> u16 {
        if self.in_window {
            u16::from(ctx.window_line)
        } else {
            u16::from(regs.scy.wrapping_add(ctx.ly))
        }
    }

    fn fetch_tile_num(&mut self, mem: &dyn MemoryMap, regs: &Registers, ctx: &BackgroundFetchContext) {
        self.in_window = self.is_inside_window(regs, ctx);

        let (map_base, x_coord, y_coord) = if self.in_window {
            (
                regs.lcd_control.window_tile_map_area(),
                u16::from(self.window_tile_x),
                u16::from(ctx.window_line),
            )
        } else {
            let x_coord = ((u16::from(regs.scx) >> 3) + u16::from(self.fetcher_x)) & 0x1F;
            let y_coord = u16::from(regs.scy.wrapping_add(ctx.ly));
            (regs.lcd_control.bg_tile_map_area(), x_coord, y_coord)
        };

        let address = map_base + x_coord + ((y_coord >> 3) << 5);
        self.tile_id = mem.read(address);

        self.row_base = if regs.lcd_control.contains(crate::registers::LCDControl::TILE_SEL) {
            TILE_DATA_UNSIGNED_BASE + u16::from(self.tile_id) * 16
        } else {
            let signed_id = self.tile_id as i8 as i32;
            (TILE_DATA_SIGNED_BASE as i32 + signed_id * 16) as u16
        };
    }

    fn retry_push(&mut self, ctx: &BackgroundFetchContext, fifo: &mut BackgroundFifo) {
        if !fifo.can_accept_row() {
            return;
        }
        let pixels = pixels_from_row(self.tile_data_low, self.tile_data_high, false);
        fifo.push_row(pixels);
        if self.in_window {
            self.window_tile_x = self.window_tile_x.wrapping_add(1);
        } else {
            self.fetcher_x = self.fetcher_x.wrapping_add(1);
        }
        self.phase = if ctx.sprite_pending {
            FetchPhase::Pause
        } else {
            FetchPhase::FetchTileNum
        };
        self.awaiting_idle_tick = true;
    }
}
