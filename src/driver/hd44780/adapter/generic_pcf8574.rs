use embedded_hal::{delay::DelayNs, i2c};

use crate::{
    driver::LcdMode,
    pin_map::{LcdPin, LogicalBits, PinMap},
    BacklightPolarity, CharacterDisplayError, DeviceSetupConfig,
};

use super::HD44780AdapterTrait;

/// Number of attempts at reading the port byte back from the PCF8574 before giving up.
const READ_ATTEMPTS: u8 = 3;

/// Adapter based on the PCF8574 / PCF8574A I2C GPIO expander interfacing with the HD44780 LCD
/// controller via a 4-bit interface. The expander ports may be wired to the controller in any
/// order; the ordering is described by a [`PinMap`].
pub struct GenericPCF8574Adapter {
    pin_map: PinMap,
    polarity: BacklightPolarity,
    backlight_on: bool,
    // backlight level already shifted into its port position, OR'd into every write
    backlight_bits: u8,
}

impl GenericPCF8574Adapter {
    /// Creates the adapter with the backlight switched on.
    pub fn new(pin_map: PinMap, polarity: BacklightPolarity) -> Self {
        let mut adapter = Self {
            pin_map,
            polarity,
            backlight_on: true,
            backlight_bits: 0,
        };
        adapter.backlight_bits = adapter.backlight_port_bits(true);
        adapter
    }

    pub fn pin_map(&self) -> &PinMap {
        &self.pin_map
    }

    pub fn polarity(&self) -> BacklightPolarity {
        self.polarity
    }

    fn backlight_port_bits(&self, on: bool) -> u8 {
        let level = match self.polarity {
            BacklightPolarity::Positive => on,
            BacklightPolarity::Negative => !on,
        };
        if level {
            self.pin_map.port_mask(LcdPin::Backlight)
        } else {
            0
        }
    }

    /// Merges the backlight into an already mapped port byte and writes it to the expander.
    fn write_port<I2C, DELAY>(
        &self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        port_bits: u8,
    ) -> Result<(), CharacterDisplayError<I2C>>
    where
        I2C: i2c::I2c,
        DELAY: DelayNs,
    {
        config
            .i2c
            .write(config.address, &[port_bits | self.backlight_bits])
            .map_err(CharacterDisplayError::I2cError)
    }

    /// Reads the expander port byte. The PCF8574 occasionally fails to return its byte while the
    /// controller is driving the bus, so the read is retried a few times. `None` when no attempt
    /// succeeded.
    fn read_port<I2C, DELAY>(&self, config: &mut DeviceSetupConfig<I2C, DELAY>) -> Option<u8>
    where
        I2C: i2c::I2c,
        DELAY: DelayNs,
    {
        let mut data = [0];
        for attempt in 1..=READ_ATTEMPTS {
            match config.i2c.read(config.address, &mut data) {
                Ok(()) => return Some(data[0]),
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("PCF8574 read attempt {} failed", attempt);
                    if attempt < READ_ATTEMPTS {
                        config.delay.delay_us(config.timing.read_retry_delay_us);
                    }
                }
            }
        }
        None
    }
}

impl Default for GenericPCF8574Adapter {
    fn default() -> Self {
        Self::new(PinMap::default(), BacklightPolarity::Positive)
    }
}

impl<I2C, DELAY> HD44780AdapterTrait<I2C, DELAY> for GenericPCF8574Adapter
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    fn is_configured(&self) -> bool {
        self.pin_map.is_valid()
    }

    fn init(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        // an empty write is just the address byte, which the PCF8574 must acknowledge
        config
            .i2c
            .write(config.address, &[])
            .map_err(|_| CharacterDisplayError::DeviceNotFound)?;
        // start from a known port state: every controller line low
        self.write_port(config, 0)
    }

    fn backlight(&self) -> bool {
        self.backlight_on
    }

    fn set_backlight(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        on: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.backlight_on = on;
        self.backlight_bits = self.backlight_port_bits(on);
        self.write_port(config, 0)
    }

    fn write_nibble(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        mode: LcdMode,
        nibble: u8,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        let mut bits = mode.strobe_bits();
        bits.set_data(nibble & 0x0F);
        let strobe = self.pin_map.map(bits.0);

        self.write_port(config, strobe)?;
        // E pulse width must be > 450ns
        config.delay.delay_us(config.timing.enable_pulse_us);
        // falling edge of E latches the nibble
        self.write_port(config, strobe & !self.pin_map.port_mask(LcdPin::Enable))?;
        config.delay.delay_us(config.timing.command_delay_us);
        Ok(())
    }

    fn read_register(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        mode: LcdMode,
    ) -> Result<u8, CharacterDisplayError<I2C>> {
        // need to set all data bits to HIGH to read, per PCF8574 data sheet description of
        // quasi-bidirectional I/Os. A port written low always reads low.
        let mut setup = mode.strobe_bits();
        setup.set_data(0b1111);
        setup.set_enable(0);
        let idle = self.pin_map.map(setup.0);
        let strobe = idle | self.pin_map.port_mask(LcdPin::Enable);
        self.write_port(config, idle)?;

        // in 4-bit mode the controller hands out the high nibble on the first E cycle and the
        // low nibble on the second
        let mut nibbles = [0u8; 2];
        let mut complete = true;
        for nibble in nibbles.iter_mut() {
            self.write_port(config, strobe)?;
            config.delay.delay_us(config.timing.enable_pulse_us);
            match self.read_port(config) {
                Some(port_bits) => *nibble = LogicalBits(self.pin_map.unmap(port_bits)).data(),
                None => complete = false,
            }
            self.write_port(config, idle)?;
        }

        if !complete {
            #[cfg(feature = "defmt")]
            defmt::warn!("PCF8574 did not return port state, assuming idle controller");
            return Ok(0);
        }
        Ok((nibbles[0] << 4) | nibbles[1])
    }
}
