use crate::palette::Pixel;
use std::collections::VecDeque;

/// Ring buffers never hold more than 16 pixels; a push is only accepted
/// when there's room for a full 8-pixel row.
const FIFO_CAPACITY: usize = 16;
const ROW_LEN: usize = 8;

/// Pixel FIFO feeding the background/window path. Stores raw, un-colorized
/// color indices: the mixer applies BGP only at pop time, so it can still
/// see "is this background pixel color 0" for sprite priority resolution.
#[derive(Debug, Default, Clone)]
pub struct BackgroundFifo {
    entries: VecDeque<Pixel>,
}

impl BackgroundFifo {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// A fetcher may only push a fresh row once there's room for it.
    #[inline]
    pub fn can_accept_row(&self) -> bool {
        self.entries.len() <= FIFO_CAPACITY - ROW_LEN
    }

    pub fn push_row(&mut self, row: [Pixel; ROW_LEN]) {
        debug_assert!(self.can_accept_row(), "background FIFO push while not drainable");
        self.entries.extend(row);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Pixel> {
        self.entries.pop_front()
    }
}

/// One sprite FIFO slot: a raw color index plus the palette-select and
/// background-priority bits latched from the sprite's OAM flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SpritePixel {
    pub color: Pixel,
    pub palette_select: u8,
    pub bg_priority: bool,
}

impl Default for SpritePixel {
    fn default() -> Self {
        Self {
            color: Pixel::Zero,
            palette_select: 0,
            bg_priority: false,
        }
    }
}

/// Pixel FIFO feeding the sprite path. Unlike the background FIFO, pushing
/// a row *merges* with whatever is already queued: an earlier, higher
/// OAM-priority sprite's opaque pixels are never overwritten by a sprite
/// that triggers later at the same columns, matching real hardware's
/// pixel-mixing behavior for overlapping sprites.
#[derive(Debug, Default, Clone)]
pub struct SpriteFifo {
    entries: VecDeque<SpritePixel>,
}

impl SpriteFifo {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push_row(&mut self, row: [SpritePixel; ROW_LEN]) {
        for (index, pixel) in row.into_iter().enumerate() {
            match self.entries.get_mut(index) {
                // Keep the existing pixel unless it's transparent: an
                // earlier sprite already claimed this column.
                Some(existing) if !existing.color.is_transparent() => {}
                Some(existing) => *existing = pixel,
                None => self.entries.push_back(pixel),
            }
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Option<SpritePixel> {
        self.entries.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_fifo_gates_push_on_occupancy() {
        let mut fifo = BackgroundFifo::default();
        assert!(fifo.can_accept_row());
        fifo.push_row([Pixel::One; ROW_LEN]);
        assert!(fifo.can_accept_row());
        fifo.push_row([Pixel::Two; ROW_LEN]);
        assert!(!fifo.can_accept_row());
        assert_eq!(fifo.len(), 16);
    }

    #[test]
    fn sprite_fifo_merge_preserves_opaque_earlier_pixels() {
        let mut fifo = SpriteFifo::default();
        let mut first = [SpritePixel::default(); ROW_LEN];
        first[0] = SpritePixel {
            color: Pixel::Three,
            palette_select: 0,
            bg_priority: false,
        };
        fifo.push_row(first);

        let mut second = [SpritePixel::default(); ROW_LEN];
        second[0] = SpritePixel {
            color: Pixel::One,
            palette_select: 1,
            bg_priority: false,
        };
        second[1] = SpritePixel {
            color: Pixel::Two,
            palette_select: 1,
            bg_priority: false,
        };
        fifo.push_row(second);

        let popped = fifo.pop().unwrap();
        assert_eq!(popped.color, Pixel::Three, "earlier opaque pixel must win");
        let next = fifo.pop().unwrap();
        assert_eq!(next.color, Pixel::Two, "transparent slot is still fillable");
    }
}
