/*!
APU register stub.

No audio is produced. The stub keeps what the CPU can observe:
- $4000..=$4013 channel registers are stored and read back.
- $4015 write: channel enable mask (bits 0-4). $4015 read: enable mask as
  channel status, bit 6 frame IRQ; the read clears bit 6. Bit 7 (DMC IRQ)
  always reads 0 since the DMC is not modeled.
- $4017 write: bit 7 selects the 5-step sequence (no IRQ), bit 6 inhibits
  and clears the frame IRQ.
- The 4-step sequence raises the frame IRQ every 29830 CPU cycles.

$4014 (OAM DMA) and $4016/$4017 reads (controllers) are routed by the bus.
*/

const FOUR_STEP_PERIOD: u32 = 29830;

#[derive(Clone, Debug, Default)]
pub struct Apu {
    regs: [u8; 0x18],
    enabled_mask: u8,
    five_step: bool,
    frame_irq_inhibit: bool,
    frame_irq_flag: bool,
    frame_cycle: u32,
}

impl Apu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn write_reg(&mut self, addr: u16, value: u8) {
        if !(0x4000..=0x4017).contains(&addr) {
            return;
        }
        self.regs[(addr - 0x4000) as usize] = value;
        match addr {
            0x4015 => self.enabled_mask = value & 0x1F,
            0x4017 => {
                self.five_step = value & 0x80 != 0;
                self.frame_irq_inhibit = value & 0x40 != 0;
                if self.frame_irq_inhibit {
                    self.frame_irq_flag = false;
                }
                self.frame_cycle = 0;
            }
            _ => {}
        }
    }

    pub fn read_reg(&mut self, addr: u16) -> u8 {
        match addr {
            0x4015 => self.read_status(),
            0x4000..=0x4013 => self.regs[(addr - 0x4000) as usize],
            _ => 0,
        }
    }

    fn read_status(&mut self) -> u8 {
        let mut status = self.enabled_mask;
        if self.frame_irq_flag {
            status |= 0x40;
        }
        self.frame_irq_flag = false;
        status
    }

    /// Whether the APU is pulling the IRQ line low.
    pub fn irq_asserted(&self) -> bool {
        self.frame_irq_flag
    }

    /// Advance the frame sequencer by `cpu_cycles`.
    pub fn tick(&mut self, cpu_cycles: u32) {
        self.frame_cycle += cpu_cycles;
        while self.frame_cycle >= FOUR_STEP_PERIOD {
            self.frame_cycle -= FOUR_STEP_PERIOD;
            if !self.five_step && !self.frame_irq_inhibit {
                self.frame_irq_flag = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_read_clears_frame_irq_only() {
        let mut apu = Apu::new();
        apu.write_reg(0x4015, 0b0001_0001);
        apu.tick(FOUR_STEP_PERIOD);

        let s = apu.read_reg(0x4015);
        assert_eq!(s & 0x1F, 0b0001_0001);
        assert_ne!(s & 0x40, 0);
        assert_eq!(s & 0x80, 0, "no DMC IRQ source");

        let s2 = apu.read_reg(0x4015);
        assert_eq!(s2 & 0x40, 0);
        assert_eq!(s2 & 0x1F, 0b0001_0001, "enable bits survive the read");
        assert!(!apu.irq_asserted());
    }

    #[test]
    fn inhibit_and_five_step_suppress_frame_irq() {
        let mut apu = Apu::new();
        apu.tick(FOUR_STEP_PERIOD);
        assert!(apu.irq_asserted());

        apu.write_reg(0x4017, 0x40);
        assert!(!apu.irq_asserted());
        apu.tick(FOUR_STEP_PERIOD * 2);
        assert!(!apu.irq_asserted());

        apu.write_reg(0x4017, 0x80);
        apu.tick(FOUR_STEP_PERIOD);
        assert!(!apu.irq_asserted());
    }
}
