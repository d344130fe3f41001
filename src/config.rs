/// Configuration knobs threaded through [`crate::ppu::Ppu::new`]. Unlike
/// `CartridgeConfig` this has nothing to validate: every combination of
/// bits is a legal (if possibly nonsensical) initial LCDC value, so there
/// is no fallible constructor here.
#[derive(Copy, Clone, Debug)]
pub struct PpuConfig {
    /// LCDC value the PPU powers on with.
    pub initial_lcdc: u8,
}

impl Default for PpuConfig {
    fn default() -> Self {
        Self { initial_lcdc: 0 }
    }
}
