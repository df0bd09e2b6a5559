#![doc = r#"
Bus module: owns every device the CPU can reach and the PPU's memory.

Modules and responsibilities
- `cpu_interface`: CPU-visible address decoder (`read`/`write`/`read_word`).
- `ppu_space`: PPU address-space storage (nametables, palette) and mirroring helpers.
- `interfaces`: `BusPpuView`, the borrow-split view the PPU steps against.
- `dma`: cycle-stepped OAM DMA controller.
- `clock`: per-CPU-cycle orchestration (PPU x3, DMA micro-step, NMI latch, APU, IRQ).
- `ram`: 2 KiB work RAM with mirroring.

CPU address map
    $0000-$07FF  2 KiB internal RAM
    $0800-$1FFF  mirrors of $0000-$07FF
    $2000-$2007  PPU ports
    $2008-$3FFF  mirrors of $2000-$2007
    $4000-$4013  APU registers
    $4014        OAM DMA (write)
    $4015        APU status / enables
    $4016        controller strobe (write), controller 1 (read)
    $4017        APU frame counter (write), controller 2 (read)
    $4018-$401F  disabled test registers
    $4020-$FFFF  cartridge (mapper)
"#]

pub mod clock;
pub mod cpu_interface;
pub mod dma;
pub(crate) mod interfaces;
pub mod ppu_space;
pub mod ram;


use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::config::NesConfig;
use crate::controller::Controller;
use crate::ppu::Ppu;
use dma::DmaController;
use interfaces::BusPpuView;
use ppu_space::PpuMemory;
use ram::Ram;


/// Host callback polled for a controller's button mask on every strobe.
pub type InputReader = Box<dyn FnMut() -> u8>;

pub struct Bus {
    ram: Ram,
    ppu: Ppu,
    ppu_mem: PpuMemory,
    apu: Apu,
    controllers: [Controller; 2],
    input_readers: [Option<InputReader>; 2],
    cartridge: Option<Cartridge>,
    dma: DmaController,
    dma_request: Option<u8>,
    cpu_cycle: u64,
    nmi_pending: bool,
    irq_line: bool,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("cpu_cycle", &self.cpu_cycle)
            .field("ppu", &self.ppu)
            .field("cartridge", &self.cartridge)
            .field("nmi_pending", &self.nmi_pending)
            .field("irq_line", &self.irq_line)
            .finish()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(&NesConfig::default())
    }
}

impl Bus {
    /// Bus with no cartridge: $8000-$FFFF reads $FF.
    pub fn new(config: &NesConfig) -> Self {
        Self {
            ram: Ram::new(),
            ppu: Ppu::with_config(config),
            ppu_mem: PpuMemory::default(),
            apu: Apu::new(),
            controllers: [Controller::new(), Controller::new()],
            input_readers: [None, None],
            cartridge: None,
            dma: DmaController::new(),
            dma_request: None,
            cpu_cycle: 0,
            nmi_pending: false,
            irq_line: false,
        }
    }

    pub fn with_cartridge(cartridge: Cartridge, config: &NesConfig) -> Self {
        let mut bus = Self::new(config);
        bus.attach_cartridge(cartridge);
        bus
    }

    pub fn attach_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
        self.sync_mirroring();
    }

    /// Apply the cartridge's current mirroring to the nametables.
    pub(crate) fn sync_mirroring(&mut self) {
        if let Some(cart) = &self.cartridge {
            self.ppu_mem.nametable.set_mirroring(cart.mirroring());
        }
    }

    /// Reset line: devices return to their reset state; RAM and VRAM keep contents.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.apu.reset();
        self.dma.reset();
        self.dma_request = None;
        self.nmi_pending = false;
        self.irq_line = false;
        if let Some(cart) = self.cartridge.as_mut() {
            cart.reset();
        }
        self.sync_mirroring();
        log::debug!("bus reset at cycle {}", self.cpu_cycle);
    }

    /// Borrow the PPU and a view of its address space at the same time.
    #[inline]
    pub(crate) fn split_ppu(&mut self) -> (&mut Ppu, BusPpuView<'_>) {
        (
            &mut self.ppu,
            BusPpuView::from_parts(&mut self.ppu_mem, self.cartridge.as_mut()),
        )
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn ppu_memory(&self) -> &PpuMemory {
        &self.ppu_mem
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    pub fn cartridge_mut(&mut self) -> Option<&mut Cartridge> {
        self.cartridge.as_mut()
    }

    pub fn controllers(&self) -> &[Controller; 2] {
        &self.controllers
    }

    pub fn controllers_mut(&mut self) -> &mut [Controller; 2] {
        &mut self.controllers
    }

    /// Framebuffer and controllers borrowed together for host callbacks.
    pub(crate) fn host_parts(&mut self) -> (&[u32], &mut [Controller; 2]) {
        (self.ppu.framebuffer(), &mut self.controllers)
    }

    /// Install (or clear) the input reader for controller `port` (0 or 1).
    pub fn set_input_reader(&mut self, port: usize, reader: Option<InputReader>) {
        if let Some(slot) = self.input_readers.get_mut(port) {
            *slot = reader;
        }
    }

    fn poll_input_readers(&mut self) {
        for (reader, pad) in self.input_readers.iter_mut().zip(self.controllers.iter_mut()) {
            if let Some(read) = reader {
                pad.set_state_mask(read());
            }
        }
    }

    /// CPU cycles elapsed since power-on.
    pub fn cpu_cycle(&self) -> u64 {
        self.cpu_cycle
    }

    /// Consume a latched NMI edge from the PPU.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// Level of the shared IRQ line (APU frame IRQ or cartridge IRQ).
    pub fn irq_line(&self) -> bool {
        self.irq_line
    }

    /// Source page of a pending $4014 write.
    pub fn take_dma_request(&mut self) -> Option<u8> {
        self.dma_request.take()
    }

    /// Read the PPU address space ($0000-$3FFF) without touching PPU latches.
    pub fn ppu_read(&mut self, addr: u16) -> u8 {
        use crate::ppu_bus::PpuBus;
        let (_, view) = self.split_ppu();
        view.ppu_read(addr)
    }

    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        use crate::ppu_bus::PpuBus;
        let (_, mut view) = self.split_ppu();
        view.ppu_write(addr, value);
    }

    /// Copy the cartridge's mapped pattern tables into `dest`.
    pub fn load_chr(&self, dest: &mut [u8]) -> usize {
        self.cartridge.as_ref().map_or(0, |cart| cart.load_chr(dest))
    }
}
