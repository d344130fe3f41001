use crate::display::DisplaySink;
use crate::fifo::{BackgroundFifo, SpriteFifo};
use crate::palette::Pixel;
use crate::registers::Registers;

/// Which fetcher currently owns the shared memory port, decided fresh
/// every Draw tick by [`PixelMixer::route`]: the background fetcher when
/// it's mid-fetch, otherwise the sprite fetcher when a hit is in flight,
/// otherwise neither.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemoryPortRoute {
    Background,
    Sprite,
    Idle,
}

/// Pops one pixel per FIFO per Draw tick, resolves sprite-over-background
/// priority, applies the relevant palette and advances the draw cursor.
/// Owns no state of its own beyond what a single tick needs; `Ppu` is the
/// only thing that persists `x` across ticks.
#[derive(Debug, Default, Clone, Copy)]
pub struct PixelMixer;

impl PixelMixer {
    /// Memory-port arbitration for the coming tick: background fetcher
    /// busy with a tile beats an in-flight sprite fetch, which beats idle.
    #[inline]
    pub fn route(&self, bg_mem_busy: bool, sprite_active: bool) -> MemoryPortRoute {
        self.check_port_contention(bg_mem_busy, sprite_active);
        if bg_mem_busy {
            MemoryPortRoute::Background
        } else if sprite_active {
            MemoryPortRoute::Sprite
        } else {
            MemoryPortRoute::Idle
        }
    }

    /// Both fetchers should never claim the port in the same tick; `route`
    /// resolves it with a priority order regardless, but a contending tick
    /// means one of the two fetchers' gating logic has a bug. Logs instead
    /// of panicking so a release build keeps running with background
    /// priority rather than losing a frame to a trap.
    fn check_port_contention(&self, bg_mem_busy: bool, sprite_active: bool) {
        if bg_mem_busy && sprite_active {
            eprintln!("dmgppu: memory port contention, both background and sprite fetchers active");
        }
    }

    /// Attempts to emit one pixel this Draw tick. No pixel is produced
    /// while the screen is disabled or the sprite fetcher holds the port
    /// (background pixels may not overtake a sprite still being fetched).
    /// Returns whether a pixel was popped and pushed to `x` on `sink`.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &self,
        x: u8,
        ly: u8,
        regs: &Registers,
        sprite_detected: bool,
        bg_fifo: &mut BackgroundFifo,
        sprite_fifo: &mut SpriteFifo,
        sink: &mut dyn DisplaySink,
    ) -> bool {
        if !regs.lcd_control.contains(crate::registers::LCDControl::LCD_EN) || sprite_detected {
            return false;
        }
        let Some(bg_pixel) = bg_fifo.pop() else {
            return false;
        };
        // A disabled BG/window layer reads as color 0 for both output and
        // the sprite priority check below, matching the DMG's behavior of
        // blanking the layer rather than hiding the fetcher's work.
        let bg_pixel = if regs.lcd_control.contains(crate::registers::LCDControl::BG_WIN_EN) {
            bg_pixel
        } else {
            Pixel::Zero
        };
        let sprite_pixel = sprite_fifo.pop();

        let color = match sprite_pixel {
            Some(sprite) if !sprite.color.is_transparent() && (!sprite.bg_priority || bg_pixel == Pixel::Zero) => {
                let palette = match sprite.palette_select {
                    0 => &regs.obj_palette0,
                    _ => &regs.obj_palette1,
                };
                palette.colorize(sprite.color)
            }
            _ => regs.bg_palette.colorize(bg_pixel),
        };

        sink.write_pixel(x, ly, color);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::FrameBufferSink;
    use crate::fifo::SpritePixel;
    use crate::palette::{ColoredPixel, Palette};
    use crate::registers::LCDControl;

    fn enabled_registers() -> Registers {
        let mut regs = Registers::default();
        regs.lcd_control = LCDControl::LCD_EN;
        regs.bg_palette = Palette::from(0b11_10_01_00);
        regs.obj_palette0 = Palette::from(0b11_10_01_00);
        regs
    }

    #[test]
    fn opaque_sprite_wins_over_background() {
        let regs = enabled_registers();
        let mixer = PixelMixer;
        let mut bg = BackgroundFifo::default();
        bg.push_row([Pixel::Two; 8]);
        let mut sprite = SpriteFifo::default();
        sprite.push_row([SpritePixel {
            color: Pixel::Three,
            palette_select: 0,
            bg_priority: false,
        }; 8]);
        let mut sink = FrameBufferSink::new();

        assert!(mixer.tick(0, 0, &regs, false, &mut bg, &mut sprite, &mut sink));
        assert_eq!(sink.pixel(0, 0), ColoredPixel::Black);
    }

    #[test]
    fn bg_priority_sprite_yields_to_nonzero_background() {
        let regs = enabled_registers();
        let mixer = PixelMixer;
        let mut bg = BackgroundFifo::default();
        bg.push_row([Pixel::Two; 8]);
        let mut sprite = SpriteFifo::default();
        sprite.push_row([SpritePixel {
            color: Pixel::Three,
            palette_select: 0,
            bg_priority: true,
        }; 8]);
        let mut sink = FrameBufferSink::new();

        mixer.tick(0, 0, &regs, false, &mut bg, &mut sprite, &mut sink);
        assert_eq!(sink.pixel(0, 0), ColoredPixel::DarkGrey);
    }

    #[test]
    fn bg_priority_sprite_still_shows_over_transparent_background() {
        let regs = enabled_registers();
        let mixer = PixelMixer;
        let mut bg = BackgroundFifo::default();
        bg.push_row([Pixel::Zero; 8]);
        let mut sprite = SpriteFifo::default();
        sprite.push_row([SpritePixel {
            color: Pixel::Three,
            palette_select: 0,
            bg_priority: true,
        }; 8]);
        let mut sink = FrameBufferSink::new();

        mixer.tick(0, 0, &regs, false, &mut bg, &mut sprite, &mut sink);
        assert_eq!(sink.pixel(0, 0), ColoredPixel::Black);
    }

    #[test]
    fn disabled_bg_layer_reads_as_color_zero() {
        // `enabled_registers` only sets LCD_EN, so BG_WIN_EN is already clear.
        let regs = enabled_registers();
        let mixer = PixelMixer;
        let mut bg = BackgroundFifo::default();
        bg.push_row([Pixel::Three; 8]);
        let mut sprite = SpriteFifo::default();
        let mut sink = FrameBufferSink::new();

        mixer.tick(0, 0, &regs, false, &mut bg, &mut sprite, &mut sink);
        assert_eq!(sink.pixel(0, 0), ColoredPixel::Black, "color 0 maps to palette entry 0, not white");
    }

    #[test]
    fn no_pixel_while_sprite_detected() {
        let regs = enabled_registers();
        let mixer = PixelMixer;
        let mut bg = BackgroundFifo::default();
        bg.push_row([Pixel::One; 8]);
        let mut sprite = SpriteFifo::default();
        let mut sink = FrameBufferSink::new();

        assert!(!mixer.tick(0, 0, &regs, true, &mut bg, &mut sprite, &mut sink));
    }
}
