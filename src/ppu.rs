use crate::config::PpuConfig;
use crate::constants::{
    OAM_SCAN_CYCLES, SCREEN_HEIGHT, SCREEN_WIDTH, T_CYCLES_PER_LINE, VERTICAL_BLANK_SCAN_LINE_MAX,
};
use crate::display::DisplaySink;
use crate::fetcher::background::{BackgroundFetchContext, BackgroundFetcher};
use crate::fetcher::sprite::{SpriteFetchContext, SpriteFetcher};
use crate::fifo::{BackgroundFifo, SpriteFifo};
use crate::memory::MemoryMap;
use crate::mixer::PixelMixer;
use crate::oam::{OamScanner, SpriteBuffer};
use crate::registers::{LCDControl, Mode, Registers};

/// Top-level PPU scheduler. Owns `LY`/`X`/`T` and the current [`Mode`],
/// drives every sub-component once per T-cycle through [`Self::step_t_cycle`],
/// and is the only thing in the crate that persists state across ticks.
pub struct Ppu {
    t: u16,
    x: u8,
    ly: u8,
    mode: Mode,
    wy_latch: bool,
    window_line: u8,
    /// Set once per scanline the first time the background fetcher renders
    /// from the window; drives the internal window-line counter below.
    window_used_this_line: bool,
    regs: Registers,
    oam_scanner: OamScanner,
    sprite_buffer: SpriteBuffer,
    bg_fetcher: BackgroundFetcher,
    sprite_fetcher: SpriteFetcher,
    bg_fifo: BackgroundFifo,
    sprite_fifo: SpriteFifo,
    mixer: PixelMixer,
}

impl Ppu {
    pub fn new(config: PpuConfig) -> Self {
        let mut regs = Registers::default();
        regs.lcd_control = LCDControl::from_bits_truncate(config.initial_lcdc);
        Self {
            t: 0,
            x: 0,
            ly: 0,
            mode: Mode::OamScan,
            wy_latch: false,
            window_line: 0,
            window_used_this_line: false,
            regs,
            oam_scanner: OamScanner::default(),
            sprite_buffer: SpriteBuffer::default(),
            bg_fetcher: BackgroundFetcher::default(),
            sprite_fetcher: SpriteFetcher::default(),
            bg_fifo: BackgroundFifo::default(),
            sprite_fifo: SpriteFifo::default(),
            mixer: PixelMixer,
        }
    }

    #[inline]
    pub fn ly(&self) -> u8 {
        self.ly
    }

    #[inline]
    pub fn hblank(&self) -> bool {
        self.mode == Mode::HBlank
    }

    #[inline]
    pub fn vblank(&self) -> bool {
        self.mode == Mode::VBlank
    }

    #[inline]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    #[inline]
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn sprite_buffer(&self) -> &crate::oam::SpriteBuffer {
        &self.sprite_buffer
    }

    #[inline]
    pub fn bg_fifo(&self) -> &crate::fifo::BackgroundFifo {
        &self.bg_fifo
    }

    #[inline]
    pub fn sprite_fifo(&self) -> &crate::fifo::SpriteFifo {
        &self.sprite_fifo
    }

    /// Full `0xFF41` value: CPU-writable interrupt-enable bits plus the
    /// mode and LY==LYC coincidence bits the scheduler derives.
    pub fn stat(&self) -> u8 {
        let coincidence = u8::from(self.ly == self.regs.lyc) << 2;
        u8::from(self.mode) | coincidence | self.regs.lcd_status_interrupts.bits()
    }

    /// Resets the scheduler to power-on state. Registers are left
    /// untouched; the caller owns their lifecycle.
    pub fn reset(&mut self) {
        self.t = 0;
        self.x = 0;
        self.ly = 0;
        self.mode = Mode::OamScan;
        self.wy_latch = false;
        self.window_line = 0;
        self.window_used_this_line = false;
        self.oam_scanner.reset();
        self.sprite_buffer.clear();
        self.bg_fetcher.start_scanline();
        self.sprite_fetcher.reset();
        self.bg_fifo.clear();
        self.sprite_fifo.clear();
    }

    /// Advances the PPU by one T-cycle. `mem` answers the address the
    /// active sub-component needs this tick; `sink` receives any pixel
    /// the mixer resolves and the HBlank/VBlank level signals.
    pub fn step_t_cycle(&mut self, mem: &dyn MemoryMap, sink: &mut dyn DisplaySink) {
        if self.regs.lcd_control.contains(LCDControl::LCD_EN) {
            self.step_mode(mem, sink);
        }
        self.advance_t(sink);
    }

    fn step_mode(&mut self, mem: &dyn MemoryMap, sink: &mut dyn DisplaySink) {
        match self.mode {
            Mode::OamScan => {
                let tall = self.regs.lcd_control.tall_sprites();
                self.oam_scanner
                    .step(self.t, self.ly, tall, mem, &mut self.sprite_buffer);
                if self.t == OAM_SCAN_CYCLES - 1 {
                    if !self.wy_latch && self.ly == self.regs.wy {
                        self.wy_latch = true;
                    }
                    self.mode = Mode::Draw;
                }
            }
            Mode::Draw => {
                self.mixer
                    .route(self.bg_fetcher.is_busy(), self.sprite_fetcher.is_active());

                // Peeked before either fetcher steps this tick: drives the
                // background fetcher's decision to yield the port at its
                // current row boundary, independent of whether the sprite
                // fetcher has had a chance to become active yet.
                let sprite_pending = self.regs.lcd_control.contains(LCDControl::OBJ_EN)
                    && self.sprite_buffer.has_hit(self.x);

                // Background steps first so a same-tick Pause transition
                // (on sprite_pending) is reflected in is_busy() before the
                // sprite fetcher below reads it as mem_free; otherwise the
                // sprite would start a tick late and the mixer would emit
                // one background pixel solo before the sprite caught up.
                let bg_ctx = BackgroundFetchContext {
                    x: self.x,
                    ly: self.ly,
                    wy_latch: self.wy_latch,
                    window_line: self.window_line,
                    sprite_active: self.sprite_fetcher.is_active(),
                    sprite_pending,
                };
                self.bg_fetcher.step(mem, &self.regs, &bg_ctx, &mut self.bg_fifo);
                if self.bg_fetcher.in_window() {
                    self.window_used_this_line = true;
                }

                let sprite_ctx = SpriteFetchContext {
                    x: self.x,
                    mem_free: !self.bg_fetcher.is_busy(),
                };
                self.sprite_fetcher.step(
                    mem,
                    &self.regs,
                    &sprite_ctx,
                    &mut self.sprite_buffer,
                    &mut self.sprite_fifo,
                );

                let pushed = self.mixer.tick(
                    self.x,
                    self.ly,
                    &self.regs,
                    self.sprite_fetcher.is_active(),
                    &mut self.bg_fifo,
                    &mut self.sprite_fifo,
                    sink,
                );
                if pushed {
                    self.x += 1;
                    if self.x == SCREEN_WIDTH {
                        self.mode = Mode::HBlank;
                        sink.hblank();
                    }
                }
            }
            Mode::HBlank | Mode::VBlank => {}
        }
    }

    /// Advances the free-running scanline counter and, every 456
    /// T-cycles, LY. This runs whether or not the LCD is enabled, so a
    /// disabled screen doesn't stall the scheduler's frame cadence; only
    /// the OAM/fetch/mixer work above is skipped while disabled.
    fn advance_t(&mut self, sink: &mut dyn DisplaySink) {
        self.t += 1;
        if self.t != T_CYCLES_PER_LINE {
            return;
        }
        self.t = 0;

        if self.window_used_this_line {
            self.window_line = self.window_line.wrapping_add(1);
            self.window_used_this_line = false;
        }

        if self.ly == VERTICAL_BLANK_SCAN_LINE_MAX {
            self.ly = 0;
            self.window_line = 0;
            self.wy_latch = false;
        } else {
            if self.ly + 1 == SCREEN_HEIGHT {
                sink.vblank();
            }
            self.ly += 1;
        }

        self.mode = if self.ly < SCREEN_HEIGHT {
            Mode::OamScan
        } else {
            Mode::VBlank
        };

        if self.mode == Mode::OamScan {
            self.x = 0;
            self.sprite_buffer.clear();
            self.oam_scanner.reset();
            self.bg_fetcher.start_scanline();
            self.sprite_fetcher.reset();
        }
    }
}
