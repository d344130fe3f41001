//! Headless test harness: loads a flat VRAM+OAM scene dump from disk, steps
//! the PPU for a fixed number of frames, and prints basic statistics. Useful
//! for chasing a single frame's timing without a real CPU or front end.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dmgppu::{ArrayMemoryMap, DisplaySink, FrameBufferSink, PpuConfig};

/// Scene file layout: VRAM bytes (0x2000), then OAM bytes (0xA0), then a
/// 9-byte register block (LCDC, SCY, SCX, LYC, WY, WX, BGP, OBP0, OBP1).
const REGISTER_BLOCK_SIZE: usize = 9;

#[derive(Parser)]
#[command(name = "dmgppu-trace")]
#[command(about = "Run the PPU over a flat VRAM/OAM scene dump and report frame statistics")]
struct Cli {
    /// Path to a scene dump file.
    scene: PathBuf,

    /// Number of frames to run.
    #[arg(short = 'n', long, default_value_t = 1)]
    frames: u32,

    /// Override LCDC instead of the value stored in the scene file.
    #[arg(long)]
    lcdc: Option<u8>,
}

struct CountingSink {
    inner: FrameBufferSink,
    pixels_written: u64,
}

impl CountingSink {
    fn new() -> Self {
        Self {
            inner: FrameBufferSink::new(),
            pixels_written: 0,
        }
    }
}

impl DisplaySink for CountingSink {
    fn write_pixel(&mut self, x: u8, y: u8, color: dmgppu::ColoredPixel) {
        self.pixels_written += 1;
        self.inner.write_pixel(x, y, color);
    }

    fn hblank(&mut self) {
        self.inner.hblank();
    }

    fn vblank(&mut self) {
        self.inner.vblank();
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let raw = fs::read(&cli.scene).map_err(|e| format!("reading {}: {e}", cli.scene.display()))?;

    let vram_size = dmgppu::constants::VRAM_SIZE;
    let oam_size = dmgppu::constants::OAM_SIZE;
    let expected = vram_size + oam_size + REGISTER_BLOCK_SIZE;
    if raw.len() != expected {
        return Err(format!(
            "scene file has {} bytes, expected {} (vram {} + oam {} + registers {})",
            raw.len(),
            expected,
            vram_size,
            oam_size,
            REGISTER_BLOCK_SIZE
        ));
    }

    let (vram, rest) = raw.split_at(vram_size);
    let (oam, regs_block) = rest.split_at(oam_size);
    let mem = ArrayMemoryMap::from_dumps(vram, oam).map_err(|e| e.to_string())?;

    let lcdc = cli.lcdc.unwrap_or(regs_block[0]);
    let mut ppu = dmgppu::Ppu::new(PpuConfig { initial_lcdc: lcdc });
    {
        let regs = ppu.registers_mut();
        regs.scy = regs_block[1];
        regs.scx = regs_block[2];
        regs.lyc = regs_block[3];
        regs.wy = regs_block[4];
        regs.wx = regs_block[5];
        regs.bg_palette = dmgppu::Palette::from(regs_block[6]);
        regs.obj_palette0 = dmgppu::Palette::from(regs_block[7]);
        regs.obj_palette1 = dmgppu::Palette::from(regs_block[8]);
    }

    let mut sink = CountingSink::new();
    let mut t_cycles: u64 = 0;
    for frame in 0..cli.frames {
        let start_frames = sink.inner.frame_count();
        while sink.inner.frame_count() == start_frames {
            ppu.step_t_cycle(&mem, &mut sink);
            t_cycles += 1;
        }
        println!(
            "frame {}: ly={} pixels_written={} t_cycles={}",
            frame,
            ppu.ly(),
            sink.pixels_written,
            t_cycles
        );
    }

    println!(
        "done: {} frame(s), {} total pixels, {} total T-cycles",
        sink.inner.frame_count(),
        sink.pixels_written,
        t_cycles
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dmgppu-trace: {e}");
            ExitCode::FAILURE
        }
    }
}
