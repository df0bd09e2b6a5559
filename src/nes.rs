/*!
nes.rs - The `Nes` context: CPU and bus in lockstep.

Each `step_one_instruction` call follows one fixed order:

1. Service the interrupt line at the instruction boundary: NMI always,
   IRQ only while I is clear (it stays pending otherwise), RESET always.
2. Run one CPU instruction.
3. Clock the bus for the elapsed cycles (PPU 3 dots per CPU cycle, APU
   frame counter once per cycle).
4. If the instruction wrote $4014, run the OAM DMA stall (513 or 514
   cycles depending on the parity after the instruction).
5. Latch the PPU's NMI edge and the level of the shared IRQ line.
6. Host hooks: frame ready, NMI request, due scripted inputs, then the
   per-instruction hook.

`Nes` owns everything; hooks only ever see a `HostView` (framebuffer, cycle
counter, controllers), so they cannot reach CPU, PPU or bus state.
*/

use std::collections::VecDeque;

use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::config::NesConfig;
use crate::controller::Controller;
use crate::cpu::{Cpu, CpuBus, CpuState, InterruptKind};
use crate::error::NesError;

/// Single pending-interrupt slot checked at instruction boundaries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InterruptLine {
    #[default]
    None,
    Irq,
    Nmi,
    Reset,
}

impl InterruptLine {
    /// NMI replaces a pending IRQ; IRQ never replaces NMI or RESET.
    pub fn raise(&mut self, kind: InterruptKind) {
        *self = match (*self, kind) {
            (_, InterruptKind::Reset) => InterruptLine::Reset,
            (InterruptLine::Reset, _) => InterruptLine::Reset,
            (_, InterruptKind::Nmi) => InterruptLine::Nmi,
            (InterruptLine::None, InterruptKind::Irq) => InterruptLine::Irq,
            (current, InterruptKind::Irq) => current,
        };
    }

    pub fn is_pending(self) -> bool {
        self != InterruptLine::None
    }
}

/// What the per-instruction hook may touch.
pub struct HostView<'a> {
    framebuffer: &'a [u32],
    cycles: u64,
    controllers: &'a mut [Controller; 2],
}

impl<'a> HostView<'a> {
    pub fn framebuffer(&self) -> &[u32] {
        self.framebuffer
    }

    /// CPU cycles since power-on.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn controller(&mut self, port: usize) -> Option<&mut Controller> {
        self.controllers.get_mut(port)
    }
}

pub type FrameHook = Box<dyn FnMut(&[u32])>;
pub type NmiHook = Box<dyn FnMut()>;
pub type InstructionHook = Box<dyn FnMut(HostView<'_>)>;

#[derive(Default)]
struct Hooks {
    frame: Option<FrameHook>,
    nmi: Option<NmiHook>,
    instruction: Option<InstructionHook>,
}

/// Controller state applied once the cycle counter reaches `cycle`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct InputEvent {
    cycle: u64,
    port: usize,
    mask: u8,
}

pub struct Nes {
    cpu: Cpu,
    bus: Bus,
    interrupt: InterruptLine,
    config: NesConfig,
    hooks: Hooks,
    inputs: VecDeque<InputEvent>,
    frames: u64,
}

impl std::fmt::Debug for Nes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nes")
            .field("cpu", &self.cpu)
            .field("bus", &self.bus)
            .field("interrupt", &self.interrupt)
            .field("config", &self.config)
            .field("pending_inputs", &self.inputs.len())
            .field("frames", &self.frames)
            .finish()
    }
}

impl Nes {
    /// Plug in `cartridge` and run the power-on reset.
    pub fn new(cartridge: Cartridge, config: NesConfig) -> Self {
        log::debug!(
            "nes: mapper {} with {:?}",
            cartridge.mapper_id(),
            config
        );
        let mut nes = Self {
            cpu: Cpu::with_config(&config),
            bus: Bus::with_cartridge(cartridge, &config),
            interrupt: InterruptLine::None,
            config,
            hooks: Hooks::default(),
            inputs: VecDeque::new(),
            frames: 0,
        };
        nes.cpu.reset(&mut nes.bus);
        nes
    }

    pub fn from_ines_bytes(data: &[u8], config: NesConfig) -> Result<Self, NesError> {
        Ok(Self::new(Cartridge::from_ines_bytes(data)?, config))
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    pub fn config(&self) -> &NesConfig {
        &self.config
    }

    pub fn interrupt_line(&self) -> InterruptLine {
        self.interrupt
    }

    pub fn framebuffer(&self) -> &[u32] {
        self.bus.ppu().framebuffer()
    }

    pub fn frame_dimensions(&self) -> (usize, usize) {
        self.bus.ppu().frame_dimensions()
    }

    /// Frames handed off since power-on.
    pub fn frames_completed(&self) -> u64 {
        self.frames
    }

    pub fn cycle_count(&self) -> u64 {
        self.bus.cpu_cycle()
    }

    // ---------------------------------------------------------------------
    // Entry points
    // ---------------------------------------------------------------------

    /// `Reset` resets the devices and the CPU immediately; `Nmi`/`Irq` are
    /// posted on the interrupt line for the next instruction boundary.
    pub fn reset(&mut self, kind: InterruptKind) {
        match kind {
            InterruptKind::Reset => {
                self.bus.reset();
                self.cpu.interrupt(InterruptKind::Reset, &mut self.bus);
                self.interrupt = InterruptLine::None;
            }
            other => self.interrupt.raise(other),
        }
    }

    /// Copy the cartridge's pattern tables into `dest`; returns bytes copied.
    pub fn load_chr(&self, dest: &mut [u8]) -> usize {
        self.bus.load_chr(dest)
    }

    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    /// CPU-space write from the host. A $4014 write runs its DMA at once.
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
        if let Some(page) = self.bus.take_dma_request() {
            self.bus.run_oam_dma(page);
        }
    }

    /// Read PPU register `port` (0-7, i.e. $2000-$2007).
    pub fn ppu_read(&mut self, port: u8) -> u8 {
        self.bus.read(0x2000 | (port & 0x07) as u16)
    }

    pub fn ppu_write(&mut self, port: u8, value: u8) {
        self.bus.write(0x2000 | (port & 0x07) as u16, value);
    }

    /// Copy page `value` into OAM; returns the stall in CPU cycles.
    pub fn oam_dma_write(&mut self, value: u8) -> u32 {
        self.bus.run_oam_dma(value)
    }

    // ---------------------------------------------------------------------
    // Host callbacks
    // ---------------------------------------------------------------------

    pub fn on_frame<F: FnMut(&[u32]) + 'static>(&mut self, hook: F) {
        self.hooks.frame = Some(Box::new(hook));
    }

    pub fn on_nmi<F: FnMut() + 'static>(&mut self, hook: F) {
        self.hooks.nmi = Some(Box::new(hook));
    }

    pub fn on_instruction<F: FnMut(HostView<'_>) + 'static>(&mut self, hook: F) {
        self.hooks.instruction = Some(Box::new(hook));
    }

    /// Poll `reader` for controller `port`'s buttons on every strobe.
    pub fn set_input_reader<F: FnMut() -> u8 + 'static>(&mut self, port: usize, reader: F) {
        self.bus.set_input_reader(port, Some(Box::new(reader)));
    }

    pub fn set_patch_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut CpuState, &mut dyn CpuBus, u8) -> Option<u32> + 'static,
    {
        self.cpu.set_patch_hook(Some(Box::new(hook)));
    }

    /// Set controller `port` to `mask` once `cycle` CPU cycles have elapsed.
    pub fn schedule_input(&mut self, cycle: u64, port: usize, mask: u8) {
        let event = InputEvent { cycle, port, mask };
        let at = self.inputs.partition_point(|e| e.cycle <= cycle);
        self.inputs.insert(at, event);
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Run one instruction (plus any interrupt entry and DMA stall) and
    /// return the CPU cycles that elapsed.
    pub fn step_one_instruction(&mut self) -> Result<u32, NesError> {
        let entry = self.service_interrupt();
        self.bus.tick(entry);

        let cycles = self.cpu.step(&mut self.bus)?;
        self.bus.tick(cycles);

        let mut elapsed = entry + cycles;
        if let Some(page) = self.bus.take_dma_request() {
            elapsed += self.bus.run_oam_dma(page);
        }

        let nmi = self.bus.take_nmi();
        if nmi {
            self.interrupt.raise(InterruptKind::Nmi);
        }
        self.sync_irq_level();

        self.run_hooks(nmi);
        Ok(elapsed)
    }

    fn service_interrupt(&mut self) -> u32 {
        let kind = match self.interrupt {
            InterruptLine::None => return 0,
            InterruptLine::Irq if self.cpu.status().irq_disabled() => return 0,
            InterruptLine::Irq => InterruptKind::Irq,
            InterruptLine::Nmi => InterruptKind::Nmi,
            InterruptLine::Reset => {
                self.bus.reset();
                InterruptKind::Reset
            }
        };
        self.interrupt = InterruptLine::None;
        self.cpu.interrupt(kind, &mut self.bus)
    }

    /// IRQ is level-triggered: follow the bus line while nothing stronger is pending.
    fn sync_irq_level(&mut self) {
        match (self.interrupt, self.bus.irq_line()) {
            (InterruptLine::None, true) => self.interrupt = InterruptLine::Irq,
            (InterruptLine::Irq, false) => self.interrupt = InterruptLine::None,
            _ => {}
        }
    }

    fn run_hooks(&mut self, nmi: bool) {
        if self.bus.ppu_mut().take_frame_ready() {
            self.frames += 1;
            if let Some(hook) = self.hooks.frame.as_mut() {
                hook(self.bus.ppu().framebuffer());
            }
        }

        if nmi {
            if let Some(hook) = self.hooks.nmi.as_mut() {
                hook();
            }
        }

        let now = self.bus.cpu_cycle();
        while self.inputs.front().is_some_and(|e| e.cycle <= now) {
            if let Some(event) = self.inputs.pop_front() {
                if let Some(pad) = self.bus.controllers_mut().get_mut(event.port) {
                    pad.set_state_mask(event.mask);
                }
            }
        }

        if let Some(hook) = self.hooks.instruction.as_mut() {
            let (framebuffer, controllers) = self.bus.host_parts();
            hook(HostView {
                framebuffer,
                cycles: now,
                controllers,
            });
        }
    }

    /// Run until the cycle counter reaches `target`; returns cycles elapsed.
    pub fn run_until(&mut self, target: u64) -> Result<u64, NesError> {
        let start = self.cycle_count();
        while self.cycle_count() < target {
            self.step_one_instruction()?;
        }
        Ok(self.cycle_count() - start)
    }

    pub fn run_cycles(&mut self, cycles: u64) -> Result<u64, NesError> {
        let target = self.cycle_count() + cycles;
        self.run_until(target)
    }

    /// Run until the next frame is handed off; returns cycles elapsed.
    pub fn run_frame(&mut self) -> Result<u64, NesError> {
        let start_cycle = self.cycle_count();
        let start_frame = self.frames;
        while self.frames == start_frame {
            self.step_one_instruction()?;
        }
        Ok(self.cycle_count() - start_cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Button;
    use crate::ppu::{CROPPED_HEIGHT, CROPPED_WIDTH};
    use crate::test_utils::{assemble, build_nrom_with_prg};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn nes_with(parts: &[(u16, &[u8])], vectors: Option<(u16, u16, u16)>) -> Nes {
        let rom = build_nrom_with_prg(&assemble(parts), 1, 1, vectors);
        Nes::from_ines_bytes(&rom, NesConfig::default()).expect("rom")
    }

    /// SEI; JMP self
    fn idle() -> Nes {
        nes_with(&[(0x8000, &[0x78, 0x4C, 0x01, 0x80])], None)
    }

    #[test]
    fn interrupt_line_priorities() {
        let mut line = InterruptLine::None;
        line.raise(InterruptKind::Irq);
        assert_eq!(line, InterruptLine::Irq);
        line.raise(InterruptKind::Nmi);
        assert_eq!(line, InterruptLine::Nmi, "NMI replaces IRQ");
        line.raise(InterruptKind::Irq);
        assert_eq!(line, InterruptLine::Nmi, "IRQ never replaces NMI");

        let mut line = InterruptLine::Reset;
        line.raise(InterruptKind::Irq);
        line.raise(InterruptKind::Nmi);
        assert_eq!(line, InterruptLine::Reset);
        assert!(line.is_pending());
        assert!(!InterruptLine::None.is_pending());
    }

    #[test]
    fn power_on_state() {
        let nes = idle();
        assert_eq!(nes.cpu().pc(), 0x8000);
        assert_eq!(nes.cycle_count(), 0);
        assert_eq!(nes.bus().ppu().position(), (241, 0));
        assert_eq!(nes.frame_dimensions(), (CROPPED_WIDTH, CROPPED_HEIGHT));
    }

    #[test]
    fn ppu_runs_three_dots_per_cpu_cycle() {
        let mut nes = idle();
        assert_eq!(nes.step_one_instruction().unwrap(), 2);
        assert_eq!(nes.cycle_count(), 2);
        assert_eq!(nes.bus().ppu().position(), (241, 6));
        assert_eq!(nes.step_one_instruction().unwrap(), 3);
        assert_eq!(nes.bus().ppu().position(), (241, 15));
    }

    #[test]
    fn oam_dma_stalls_after_even_cycle() {
        // LDA #$02; STA $4014
        let mut nes = nes_with(&[(0x8000, &[0xA9, 0x02, 0x8D, 0x14, 0x40])], None);
        for i in 0..256u16 {
            nes.cpu_write(0x0200 + i, i as u8);
        }
        nes.step_one_instruction().unwrap();
        assert_eq!(nes.step_one_instruction().unwrap(), 4 + 513);
        assert_eq!(nes.cycle_count(), 2 + 4 + 513);
        let oam = nes.bus().ppu().oam();
        assert!(oam.iter().enumerate().all(|(i, &b)| b == i as u8));
    }

    #[test]
    fn oam_dma_stalls_after_odd_cycle() {
        // LDA #$02; LDX $00; STA $4014
        let mut nes = nes_with(
            &[(0x8000, &[0xA9, 0x02, 0xA6, 0x00, 0x8D, 0x14, 0x40])],
            None,
        );
        nes.step_one_instruction().unwrap();
        nes.step_one_instruction().unwrap();
        assert_eq!(nes.cycle_count(), 5);
        assert_eq!(nes.step_one_instruction().unwrap(), 4 + 514);
    }

    #[test]
    fn host_dma_entry_point() {
        let mut nes = idle();
        nes.cpu_write(0x0300, 0x11);
        assert_eq!(nes.oam_dma_write(0x03), 513);
        assert_eq!(nes.bus().ppu().oam()[0], 0x11);

        nes.cpu_write(0x0300, 0x22);
        nes.cpu_write(0x4014, 0x03);
        assert_eq!(nes.bus().ppu().oam()[0], 0x22, "port write runs immediately");
    }

    #[test]
    fn vblank_nmi_reaches_handler_and_hooks() {
        // SEI; LDA #$80; STA $2000; JMP self     NMI: INC $10; RTI
        let mut nes = nes_with(
            &[
                (0x8000, &[0x78, 0xA9, 0x80, 0x8D, 0x00, 0x20, 0x4C, 0x06, 0x80]),
                (0x8020, &[0xE6, 0x10, 0x40]),
            ],
            Some((0x8000, 0x8020, 0x8000)),
        );
        let nmis = Rc::new(Cell::new(0));
        let frame_len = Rc::new(Cell::new(0));
        {
            let nmis = Rc::clone(&nmis);
            nes.on_nmi(move || nmis.set(nmis.get() + 1));
            let frame_len = Rc::clone(&frame_len);
            nes.on_frame(move |fb| frame_len.set(fb.len()));
        }

        nes.run_frame().unwrap();
        assert_eq!(nes.frames_completed(), 1);
        assert_eq!(frame_len.get(), CROPPED_WIDTH * CROPPED_HEIGHT);
        assert_eq!(nmis.get(), 1);
        assert_eq!(nes.interrupt_line(), InterruptLine::Nmi);

        nes.step_one_instruction().unwrap();
        assert_eq!(nes.cpu_read(0x0010), 1, "handler ran");
        nes.step_one_instruction().unwrap();
        assert_eq!(nes.cpu().pc(), 0x8006, "RTI back into the loop");
    }

    #[test]
    fn apu_frame_irq_is_serviced_when_enabled() {
        // CLI; JMP self     IRQ: LDA $4015; INC $11; RTI
        let mut nes = nes_with(
            &[
                (0x8000, &[0x58, 0x4C, 0x01, 0x80]),
                (0x8020, &[0xAD, 0x15, 0x40, 0xE6, 0x11, 0x40]),
            ],
            Some((0x8000, 0x8000, 0x8020)),
        );
        nes.run_cycles(29_000).unwrap();
        assert_eq!(nes.cpu_read(0x0011), 0);
        nes.run_until(30_000).unwrap();
        assert_eq!(nes.cpu_read(0x0011), 1);
        assert_eq!(nes.interrupt_line(), InterruptLine::None, "acknowledged");
    }

    #[test]
    fn masked_irq_stays_pending() {
        let mut nes = idle();
        nes.run_until(29_900).unwrap();
        assert_eq!(nes.interrupt_line(), InterruptLine::Irq);
        assert_eq!(nes.cpu().pc() & 0xFFF0, 0x8000, "never vectored");
    }

    #[test]
    fn scheduled_input_applies_at_cycle() {
        let mut nes = idle();
        nes.schedule_input(100, 0, Button::A.mask());
        nes.schedule_input(40, 1, Button::Start.mask());
        nes.run_until(50).unwrap();
        assert_eq!(nes.bus().controllers()[1].state_mask(), Button::Start.mask());
        assert_eq!(nes.bus().controllers()[0].state_mask(), 0);
        nes.run_until(101).unwrap();
        assert_eq!(nes.bus().controllers()[0].state_mask(), Button::A.mask());
    }

    #[test]
    fn instruction_hook_sees_cycles_and_writes_controllers() {
        let mut nes = idle();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = Rc::clone(&seen);
            nes.on_instruction(move |mut view| {
                seen.borrow_mut().push(view.cycles());
                if let Some(pad) = view.controller(1) {
                    pad.set_button(Button::Right, true);
                }
                assert!(view.controller(2).is_none());
            });
        }
        nes.step_one_instruction().unwrap();
        nes.step_one_instruction().unwrap();
        assert_eq!(*seen.borrow(), vec![2, 5]);
        assert_eq!(nes.bus().controllers()[1].state_mask(), Button::Right.mask());
    }

    #[test]
    fn input_reader_feeds_controller_port() {
        // LDA #1; STA $4016; LDA #0; STA $4016; LDA $4016; STA $12
        let mut nes = nes_with(
            &[(
                0x8000,
                &[
                    0xA9, 0x01, 0x8D, 0x16, 0x40, 0xA9, 0x00, 0x8D, 0x16, 0x40, 0xAD, 0x16,
                    0x40, 0x85, 0x12,
                ],
            )],
            None,
        );
        nes.set_input_reader(0, || Button::A.mask());
        for _ in 0..6 {
            nes.step_one_instruction().unwrap();
        }
        assert_eq!(nes.cpu_read(0x0012), 0x41);
    }

    #[test]
    fn unsupported_opcode_surfaces() {
        let mut nes = nes_with(&[(0x8000, &[0x02])], None);
        let err = nes.step_one_instruction().unwrap_err();
        assert!(matches!(
            err,
            NesError::UnsupportedOpcode {
                pc: 0x8000,
                opcode: 0x02
            }
        ));
        assert_eq!(nes.cycle_count(), 0);
    }

    #[test]
    fn patch_hook_through_context() {
        let mut nes = nes_with(&[(0x8000, &[0x02, 0xE8])], None);
        nes.set_patch_hook(|state, _bus, opcode| (opcode == 0x02).then(|| {
            state.y = 0x5A;
            2
        }));
        assert_eq!(nes.step_one_instruction().unwrap(), 2);
        assert_eq!(nes.cpu().y(), 0x5A);
        assert_eq!(nes.cpu().pc(), 0x8001);
    }

    #[test]
    fn reset_kinds() {
        let mut nes = nes_with(&[(0x8000, &[0x78, 0xE8, 0xE8, 0xE8])], Some((0x8000, 0x8002, 0x8000)));
        nes.run_cycles(6).unwrap();
        assert_eq!(nes.cpu().x(), 2);

        nes.reset(InterruptKind::Reset);
        assert_eq!(nes.cpu().pc(), 0x8000);
        assert_eq!(nes.cpu().x(), 0);
        assert_eq!(nes.cpu().sp(), 0xFD);

        nes.reset(InterruptKind::Nmi);
        assert_eq!(nes.interrupt_line(), InterruptLine::Nmi);
        assert_eq!(nes.step_one_instruction().unwrap(), 7 + 2);
        assert_eq!(nes.cpu().pc(), 0x8003);
    }

    #[test]
    fn ppu_ports_and_chr() {
        let mut nes = idle();
        nes.ppu_write(6, 0x23);
        nes.ppu_write(6, 0xC0);
        assert_eq!(nes.bus().ppu().vram_addr(), 0x23C0);
        nes.ppu_write(7, 0x55);
        assert_eq!(nes.bus().ppu().vram_addr(), 0x23C1);
        assert_eq!(nes.bus_mut().ppu_read(0x23C0), 0x55);
        let _ = nes.ppu_read(2);
        nes.ppu_write(14, 0x23);
        nes.ppu_write(14, 0xC0);
        let _ = nes.ppu_read(7);
        assert_eq!(nes.ppu_read(7), 0x55, "ports mirror every 8");

        let mut chr = vec![0u8; 0x2000];
        assert_eq!(nes.load_chr(&mut chr), 0x2000);
        assert!(chr.iter().all(|&b| b == 0xCC));
    }
}
