// Logical-to-physical pin mapping for PCF8574 based LCD adapters.
//
// Every byte the driver assembles is first built in a fixed *logical* layout (see `LogicalBits`)
// and then permuted onto the expander ports according to how the adapter board is wired. Cheap
// backpacks disagree on the wiring, so the permutation is data rather than a hard coded bitfield.

use bitfield::bitfield;

// Logical layout of one expander byte, independent of the board wiring:
//
//   7   6   5  4   3   2   1   0
//   RS  RW  E  D7  D6  D5  D4  BL
bitfield! {
    pub struct LogicalBits(u8);
    impl Debug;
    pub backlight, set_backlight: 0, 0;
    pub data, set_data: 4, 1;
    pub enable, set_enable: 5, 5;
    pub rw, set_rw: 6, 6;
    pub rs, set_rs: 7, 7;
}

impl Clone for LogicalBits {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl Copy for LogicalBits {}

/// The eight HD44780 side signals that a PCF8574 adapter drives.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LcdPin {
    /// Register select, HD44780 header pin 4
    RegisterSelect,
    /// Read/write, HD44780 header pin 5
    ReadWrite,
    /// Enable strobe, HD44780 header pin 6
    Enable,
    /// Data line 4, HD44780 header pin 11
    D4,
    /// Data line 5, HD44780 header pin 12
    D5,
    /// Data line 6, HD44780 header pin 13
    D6,
    /// Data line 7, HD44780 header pin 14
    D7,
    /// Backlight transistor, usually the module's pin 16 (LED cathode)
    Backlight,
}

impl LcdPin {
    /// Bit position of this signal in the logical byte.
    pub const fn logical_bit(&self) -> u8 {
        match self {
            LcdPin::Backlight => 0,
            LcdPin::D4 => 1,
            LcdPin::D5 => 2,
            LcdPin::D6 => 3,
            LcdPin::D7 => 4,
            LcdPin::Enable => 5,
            LcdPin::ReadWrite => 6,
            LcdPin::RegisterSelect => 7,
        }
    }

    /// Pin number of this signal on the 16 pin LCD module header.
    pub const fn header_pin(&self) -> u8 {
        match self {
            LcdPin::RegisterSelect => 4,
            LcdPin::ReadWrite => 5,
            LcdPin::Enable => 6,
            LcdPin::D4 => 11,
            LcdPin::D5 => 12,
            LcdPin::D6 => 13,
            LcdPin::D7 => 14,
            LcdPin::Backlight => 16,
        }
    }

    /// Looks up a signal by its LCD module header pin number. Returns `None` for header pins the
    /// adapter cannot drive (power, contrast, D0-D3, ...).
    pub const fn from_header_pin(pin: u8) -> Option<Self> {
        match pin {
            4 => Some(LcdPin::RegisterSelect),
            5 => Some(LcdPin::ReadWrite),
            6 => Some(LcdPin::Enable),
            11 => Some(LcdPin::D4),
            12 => Some(LcdPin::D5),
            13 => Some(LcdPin::D6),
            14 => Some(LcdPin::D7),
            16 => Some(LcdPin::Backlight),
            _ => None,
        }
    }
}

/// Wiring used by nearly every PCF8574 "I2C backpack": P0=RS, P1=RW, P2=E, P3=backlight and
/// the data lines D4-D7 on P4-P7.
pub const DEFAULT_WIRING: [LcdPin; 8] = [
    LcdPin::RegisterSelect,
    LcdPin::ReadWrite,
    LcdPin::Enable,
    LcdPin::Backlight,
    LcdPin::D4,
    LcdPin::D5,
    LcdPin::D6,
    LcdPin::D7,
];

/// A fixed permutation between the logical byte layout and the expander ports P0-P7.
///
/// A `PinMap` is built once from the board wiring. If the wiring does not assign each of the
/// eight signals to exactly one port the map is still constructed, but flagged invalid, and the
/// display refuses to talk to the device.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PinMap {
    // index = logical bit, value = expander port
    lcd_to_port: [u8; 8],
    valid: bool,
}

impl PinMap {
    /// Builds the map from the signal connected to each expander port, `wiring[0]` being P0.
    pub fn new(wiring: [LcdPin; 8]) -> Self {
        let mut lcd_to_port = [0u8; 8];
        let mut assigned = 0u8;
        for (port, pin) in wiring.iter().enumerate() {
            let bit = pin.logical_bit();
            assigned |= 1 << bit;
            lcd_to_port[bit as usize] = port as u8;
        }
        // eight ports and eight signals: a duplicate always leaves some signal unassigned
        Self {
            lcd_to_port,
            valid: assigned == 0xFF,
        }
    }

    /// Builds the map from LCD module header pin numbers, `pins[0]` being the header pin wired to
    /// P0. Header numbers that do not name a drivable signal mark the map invalid.
    pub fn from_header_pins(pins: [u8; 8]) -> Self {
        let mut wiring = DEFAULT_WIRING;
        let mut recognized = true;
        for (slot, &header_pin) in wiring.iter_mut().zip(pins.iter()) {
            match LcdPin::from_header_pin(header_pin) {
                Some(pin) => *slot = pin,
                None => recognized = false,
            }
        }
        let mut map = Self::new(wiring);
        map.valid &= recognized;
        map
    }

    /// Whether every signal is wired to exactly one port.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The expander port (0-7) the signal is wired to.
    pub fn port(&self, pin: LcdPin) -> u8 {
        self.lcd_to_port[pin.logical_bit() as usize]
    }

    /// The single expander bit of a signal.
    pub fn port_mask(&self, pin: LcdPin) -> u8 {
        1 << self.port(pin)
    }

    /// Permutes a logical byte onto the expander ports.
    pub fn map(&self, logical: u8) -> u8 {
        (0..8usize)
            .filter(|bit| logical & (1 << bit) != 0)
            .fold(0u8, |port_bits, bit| port_bits | (1 << self.lcd_to_port[bit]))
    }

    /// Inverse of [`PinMap::map`]: recovers the logical byte from an expander port reading.
    pub fn unmap(&self, port_bits: u8) -> u8 {
        (0..8usize)
            .filter(|&bit| port_bits & (1 << self.lcd_to_port[bit]) != 0)
            .fold(0u8, |logical, bit| logical | (1 << bit))
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::new(DEFAULT_WIRING)
    }
}
