/*!
DmaController: cycle-stepped OAM DMA state machine.

Behavioral model
- A write to $4014 latches a source page; the synchronizer starts the
  transfer once the triggering instruction has retired.
- 1 alignment cycle when started on an even CPU cycle, 2 on an odd one.
- Then 256 read/write pairs: read `page << 8 | i` through the CPU address
  space (with its side effects), write the byte to the OAM data port, which
  auto-increments the OAM address.
- 513 or 514 cycles in total, all of them CPU stall cycles; the PPU and APU
  keep running.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DmaPhase {
    #[default]
    Read,
    Write,
}

/// What a transfer needs from the bus: CPU-visible reads and the OAM port.
pub trait DmaBus {
    fn dma_read(&mut self, addr: u16) -> u8;
    fn oam_write(&mut self, value: u8);
}

#[derive(Debug, Clone, Default)]
pub struct DmaController {
    active: bool,
    src_addr: u16,
    index: u16,
    phase: DmaPhase,
    latch: u8,
    align_cycles: u8,
}

impl DmaController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Begin a transfer from `$XX00`. `cpu_cycle` parity picks the alignment.
    pub fn start(&mut self, src_page: u8, cpu_cycle: u64) {
        *self = Self {
            active: true,
            src_addr: (src_page as u16) << 8,
            align_cycles: 1 + (cpu_cycle & 1) as u8,
            ..Self::default()
        };
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// CPU stall cycles left in the current transfer, alignment included.
    pub fn stall_remaining(&self) -> u32 {
        if !self.active {
            return 0;
        }
        let bytes_left = 256u32.saturating_sub(self.index as u32);
        let transfer = match self.phase {
            DmaPhase::Read => bytes_left * 2,
            DmaPhase::Write => (bytes_left * 2).saturating_sub(1),
        };
        self.align_cycles as u32 + transfer
    }

    /// One CPU cycle of the transfer; a no-op when idle.
    pub fn step_one_cycle<B: DmaBus>(&mut self, bus: &mut B) {
        if !self.active {
            return;
        }
        if self.align_cycles > 0 {
            self.align_cycles -= 1;
            return;
        }
        match self.phase {
            DmaPhase::Read => {
                self.latch = bus.dma_read(self.src_addr.wrapping_add(self.index));
                self.phase = DmaPhase::Write;
            }
            DmaPhase::Write => {
                bus.oam_write(self.latch);
                self.index += 1;
                self.phase = DmaPhase::Read;
                if self.index >= 256 {
                    self.active = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PatternBus {
        writes: Vec<u8>,
    }

    impl DmaBus for PatternBus {
        fn dma_read(&mut self, addr: u16) -> u8 {
            (addr & 0xFF) as u8 ^ (addr >> 8) as u8
        }

        fn oam_write(&mut self, value: u8) {
            self.writes.push(value);
        }
    }

    fn run(page: u8, start_cycle: u64) -> (u32, Vec<u8>) {
        let mut dma = DmaController::new();
        let mut bus = PatternBus { writes: Vec::new() };
        dma.start(page, start_cycle);
        let mut cycles = 0;
        let expected = dma.stall_remaining();
        while dma.is_active() {
            dma.step_one_cycle(&mut bus);
            cycles += 1;
        }
        assert_eq!(cycles, expected, "stall estimate matches the transfer");
        (cycles, bus.writes)
    }

    #[test]
    fn even_start_takes_513_cycles() {
        let (cycles, writes) = run(0x02, 0);
        assert_eq!(cycles, 513);
        assert_eq!(writes.len(), 256);
        for (i, &b) in writes.iter().enumerate() {
            assert_eq!(b, i as u8 ^ 0x02);
        }
    }

    #[test]
    fn odd_start_takes_514_cycles() {
        let (cycles, writes) = run(0x03, 7);
        assert_eq!(cycles, 514);
        assert_eq!(writes.len(), 256);
    }

    #[test]
    fn stall_remaining_counts_down() {
        let mut dma = DmaController::new();
        let mut bus = PatternBus { writes: Vec::new() };
        dma.start(0x10, 1);
        assert_eq!(dma.stall_remaining(), 514);
        dma.step_one_cycle(&mut bus);
        dma.step_one_cycle(&mut bus);
        assert_eq!(dma.stall_remaining(), 512);
        dma.step_one_cycle(&mut bus);
        assert_eq!(dma.stall_remaining(), 511, "mid-pair after the read");
        assert!(bus.writes.is_empty());
        dma.step_one_cycle(&mut bus);
        assert_eq!(bus.writes, vec![0x10]);
    }

    #[test]
    fn idle_controller_does_not_stall() {
        let mut dma = DmaController::new();
        let mut bus = PatternBus { writes: Vec::new() };
        dma.step_one_cycle(&mut bus);
        assert!(bus.writes.is_empty());
        assert!(!dma.is_active());
        assert_eq!(dma.stall_remaining(), 0);
    }
}
