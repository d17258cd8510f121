pub mod hd44780;

use crate::pin_map::LogicalBits;

/// Register and direction of a single controller transaction. Selects the RS and RW lines that
/// accompany a nibble on the expander.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LcdMode {
    /// RS=0, RW=0: write to the instruction register
    InstructionWrite,
    /// RS=1, RW=0: write to DDRAM or CGRAM
    DataWrite,
    /// RS=1, RW=1: read from DDRAM or CGRAM
    DataRead,
    /// RS=0, RW=1: read the busy flag and address counter
    BusyFlagRead,
}

impl LcdMode {
    /// Register select level for this mode.
    pub const fn rs(&self) -> bool {
        matches!(self, LcdMode::DataWrite | LcdMode::DataRead)
    }

    /// Read/write level for this mode.
    pub const fn rw(&self) -> bool {
        matches!(self, LcdMode::DataRead | LcdMode::BusyFlagRead)
    }

    /// Logical control bits for a strobed nibble in this mode: RS and RW per the mode, E=1,
    /// data lines and backlight cleared.
    pub(crate) fn strobe_bits(&self) -> LogicalBits {
        let mut bits = LogicalBits(0);
        bits.set_rs(self.rs() as u8);
        bits.set_rw(self.rw() as u8);
        bits.set_enable(1);
        bits
    }
}

/// How many nibbles of a byte are clocked into the controller.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommandWidth {
    /// Only the high nibble. Used while the controller may still be in 8-bit mode during reset.
    FourBit,
    /// High nibble followed by low nibble.
    EightBit,
}
