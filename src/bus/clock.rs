/*!
Clock/timing orchestrator for the Bus.

Order of operations for one CPU cycle:
  * increment the CPU cycle counter
  * step the PPU three dots against a borrow-split view of the bus
  * one DMA micro-step if a transfer is running
  * latch a PPU NMI request
  * tick the APU and aggregate the IRQ line (APU OR cartridge)
*/

use crate::bus::Bus;

impl Bus {
    /// Advance every device by `cycles` CPU cycles.
    pub fn tick(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.tick_one();
        }
    }

    fn tick_one(&mut self) {
        self.cpu_cycle = self.cpu_cycle.wrapping_add(1);

        {
            let (ppu, mut view) = self.split_ppu();
            for _ in 0..3 {
                ppu.step(&mut view);
            }
        }

        if self.dma.is_active() {
            let mut dma = std::mem::take(&mut self.dma);
            dma.step_one_cycle(self);
            self.dma = dma;
        }

        if self.ppu.take_nmi_request() {
            self.nmi_pending = true;
        }

        self.apu.tick(1);
        let cart_irq = self.cartridge.as_ref().is_some_and(|c| c.irq_pending());
        self.irq_line = self.apu.irq_asserted() || cart_irq;
    }

    /// Run a whole OAM DMA from `page`, clocking the other devices through
    /// the stall. Returns the stall length in CPU cycles (513 or 514).
    pub fn run_oam_dma(&mut self, page: u8) -> u32 {
        self.dma.start(page, self.cpu_cycle);
        let stall = self.dma.stall_remaining();
        self.tick(stall);
        stall
    }
}
