use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lockstep_nes::{Cartridge, Nes, NesConfig, OpcodePolicy};

#[derive(Parser, Debug)]
#[command(name = "lockstep-nes", about = "Cycle-synchronized NES core runner")]
struct Args {
    /// iNES ROM image (.nes)
    rom: PathBuf,

    /// Frames to run in headless mode
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Draw every sprite on a line (no 8-sprite limit, no overflow flag)
    #[arg(long, default_value_t = false)]
    no_sprite_limit: bool,

    /// Keep the 8-pixel overscan border (256x240 output)
    #[arg(long, default_value_t = false)]
    no_crop: bool,

    /// Execute undefined opcodes as 2-cycle NOPs instead of stopping
    #[arg(long, default_value_t = false)]
    nop_unknown: bool,

    /// Write the last frame to this PNG file
    #[cfg(feature = "screenshot")]
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Open a window instead of running headless
    #[cfg(feature = "display")]
    #[arg(long, default_value_t = false)]
    window: bool,
}

impl Args {
    fn config(&self) -> NesConfig {
        NesConfig {
            sprite_limit: !self.no_sprite_limit,
            overscan_crop: !self.no_crop,
            unknown_opcode: if self.nop_unknown {
                OpcodePolicy::TreatAsNop
            } else {
                OpcodePolicy::Fatal
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let cart = Cartridge::from_ines_file(&args.rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    log::info!(
        "loaded {} (mapper {}, {:?})",
        args.rom.display(),
        cart.mapper_id(),
        cart.mirroring()
    );
    let nes = Nes::new(cart, args.config());

    #[cfg(feature = "display")]
    if args.window {
        return display::run(nes);
    }

    run_headless(nes, &args)
}

fn run_headless(mut nes: Nes, args: &Args) -> Result<()> {
    let mut cycles = 0u64;
    for frame in 0..args.frames {
        cycles += nes
            .run_frame()
            .with_context(|| format!("frame {frame}"))?;
    }

    let cpu = nes.cpu();
    println!("A: 0x{:02X}", cpu.a());
    println!("X: 0x{:02X}", cpu.x());
    println!("Y: 0x{:02X}", cpu.y());
    println!("SP: 0x{:02X}", cpu.sp());
    println!("PC: 0x{:04X}", cpu.pc());
    println!("P: {:?}", cpu.status());
    println!(
        "frames: {}  cpu cycles: {}  ({:.1} per frame)",
        nes.frames_completed(),
        nes.cycle_count(),
        cycles as f64 / f64::from(args.frames.max(1))
    );

    #[cfg(feature = "screenshot")]
    if let Some(path) = &args.screenshot {
        save_png(&nes, path).with_context(|| format!("writing {}", path.display()))?;
        println!("screenshot: {}", path.display());
    }

    Ok(())
}

#[cfg(feature = "screenshot")]
fn save_png(nes: &Nes, path: &std::path::Path) -> Result<()> {
    let (width, height) = nes.frame_dimensions();
    let mut rgb = Vec::with_capacity(width * height * 3);
    for &pixel in nes.framebuffer() {
        rgb.push((pixel >> 16) as u8);
        rgb.push((pixel >> 8) as u8);
        rgb.push(pixel as u8);
    }
    let img = image::RgbImage::from_raw(width as u32, height as u32, rgb)
        .context("framebuffer size mismatch")?;
    img.save(path)?;
    Ok(())
}

#[cfg(feature = "display")]
mod display {
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result};
    use lockstep_nes::{Button, Nes};
    use pixels::{Pixels, SurfaceTexture};
    use winit::application::ApplicationHandler;
    use winit::event::{ElementState, WindowEvent};
    use winit::event_loop::{ActiveEventLoop, EventLoop};
    use winit::keyboard::{KeyCode, PhysicalKey};
    use winit::window::{Window, WindowAttributes, WindowId};

    const SCALE: u32 = 3;
    /// ~60.1 Hz NTSC frame.
    const FRAME_DURATION: Duration = Duration::from_micros(16_639);

    fn map_key(key: KeyCode) -> Option<Button> {
        Some(match key {
            KeyCode::KeyX => Button::A,
            KeyCode::KeyZ => Button::B,
            KeyCode::ShiftRight => Button::Select,
            KeyCode::Enter => Button::Start,
            KeyCode::ArrowUp => Button::Up,
            KeyCode::ArrowDown => Button::Down,
            KeyCode::ArrowLeft => Button::Left,
            KeyCode::ArrowRight => Button::Right,
            _ => return None,
        })
    }

    struct App {
        nes: Nes,
        window: Option<&'static Window>,
        pixels: Option<Pixels<'static>>,
        last_frame: Instant,
        failure: Option<anyhow::Error>,
    }

    impl App {
        fn blit(&mut self) {
            let Some(pixels) = self.pixels.as_mut() else {
                return;
            };
            for (dst, &src) in pixels
                .frame_mut()
                .chunks_exact_mut(4)
                .zip(self.nes.framebuffer())
            {
                dst.copy_from_slice(&[(src >> 16) as u8, (src >> 8) as u8, src as u8, 0xFF]);
            }
        }
    }

    impl ApplicationHandler for App {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.window.is_some() {
                return;
            }
            let (w, h) = self.nes.frame_dimensions();
            let (w, h) = (w as u32, h as u32);
            let attrs = WindowAttributes::default()
                .with_title("lockstep-nes")
                .with_inner_size(winit::dpi::LogicalSize::new(w * SCALE, h * SCALE))
                .with_resizable(false);

            let window = match event_loop.create_window(attrs) {
                Ok(window) => &*Box::leak(Box::new(window)),
                Err(e) => {
                    self.failure = Some(anyhow::Error::new(e).context("creating window"));
                    event_loop.exit();
                    return;
                }
            };
            let inner = window.inner_size();
            let surface = SurfaceTexture::new(inner.width, inner.height, window);
            match Pixels::new(w, h, surface) {
                Ok(pixels) => self.pixels = Some(pixels),
                Err(e) => {
                    self.failure = Some(anyhow::Error::new(e).context("creating pixel surface"));
                    event_loop.exit();
                    return;
                }
            }
            self.window = Some(window);
        }

        fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(key) = event.physical_key else {
                        return;
                    };
                    let pressed = event.state == ElementState::Pressed;
                    if key == KeyCode::Escape && pressed {
                        event_loop.exit();
                    } else if let Some(button) = map_key(key) {
                        self.nes.bus_mut().controllers_mut()[0].set_button(button, pressed);
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    if now.duration_since(self.last_frame) >= FRAME_DURATION {
                        if let Err(e) = self.nes.run_frame() {
                            self.failure = Some(e.into());
                            event_loop.exit();
                            return;
                        }
                        self.blit();
                        self.last_frame = now;
                    }
                    if let Some(pixels) = self.pixels.as_ref() {
                        if let Err(e) = pixels.render() {
                            self.failure = Some(anyhow::Error::new(e).context("rendering"));
                            event_loop.exit();
                        }
                    }
                }
                _ => {}
            }
        }

        fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
            if let Some(window) = self.window {
                window.request_redraw();
            }
        }
    }

    pub fn run(nes: Nes) -> Result<()> {
        let event_loop = EventLoop::new().context("creating event loop")?;
        let mut app = App {
            nes,
            window: None,
            pixels: None,
            last_frame: Instant::now(),
            failure: None,
        };
        event_loop.run_app(&mut app).context("event loop")?;
        match app.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
