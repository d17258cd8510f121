pub mod generic_pcf8574;

use embedded_hal::{delay::DelayNs, i2c};

use crate::{driver::LcdMode, CharacterDisplayError, DeviceSetupConfig};

/// Trait for implementing an I2C adapter that drives an HD44780 controller over its 4-bit
/// interface. The adapter owns everything that depends on how the expander is wired: the pin
/// positions, the backlight state and the exact byte sequence that strobes a nibble in or out
/// of the controller.
pub trait HD44780AdapterTrait<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Whether the adapter configuration can drive a display at all. Operations on a
    /// misconfigured adapter fail before touching the bus.
    fn is_configured(&self) -> bool {
        true
    }

    /// Perform adapter specific initialization. Called once per session before the controller
    /// reset sequence.
    fn init(
        &mut self,
        _config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        Ok(())
    }

    /// Current backlight setting.
    fn backlight(&self) -> bool;

    /// Turns the backlight on or off. Does not touch the controller.
    fn set_backlight(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        on: bool,
    ) -> Result<(), CharacterDisplayError<I2C>>;

    /// Clocks the low 4 bits of `nibble` into the controller using the RS/RW lines of `mode`.
    fn write_nibble(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        mode: LcdMode,
        nibble: u8,
    ) -> Result<(), CharacterDisplayError<I2C>>;

    /// Writes a full byte as two nibbles, high nibble first as the controller requires in
    /// 4-bit mode.
    fn write_byte(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        mode: LcdMode,
        value: u8,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.write_nibble(config, mode, value >> 4)
            .and_then(|_| self.write_nibble(config, mode, value & 0x0F))
    }

    /// Reads one byte from the controller. With `LcdMode::BusyFlagRead` the byte is the busy
    /// flag (bit 7) and the address counter, with `LcdMode::DataRead` it is the DDRAM or CGRAM
    /// content at the address counter.
    fn read_register(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        mode: LcdMode,
    ) -> Result<u8, CharacterDisplayError<I2C>>;
}
