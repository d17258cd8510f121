// An adapter implemented outside the crate, driving a board that latches one nibble per I2C write:
// bits 3-0 carry the data, bit 4 is RS and bit 5 the backlight.

use embedded_hal::{delay::DelayNs, i2c::I2c};
use embedded_hal_mock::eh1::{
    delay::NoopDelay,
    i2c::{Mock as I2cMock, Transaction as I2cTransaction},
};
use pcf8574_character_lcd::{
    BaseCharacterDisplay, CharacterDisplayError, DeviceSetupConfig, HD44780AdapterTrait,
    LcdFontSize, LcdMode,
};

const RS: u8 = 0b0001_0000;
const BACKLIGHT: u8 = 0b0010_0000;

#[derive(Default)]
struct LatchAdapter {
    backlight: bool,
}

impl LatchAdapter {
    fn backlight_bits(&self) -> u8 {
        if self.backlight {
            BACKLIGHT
        } else {
            0
        }
    }
}

impl<I2C, DELAY> HD44780AdapterTrait<I2C, DELAY> for LatchAdapter
where
    I2C: I2c,
    DELAY: DelayNs,
{
    fn backlight(&self) -> bool {
        self.backlight
    }

    fn set_backlight(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        on: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.backlight = on;
        let address = config.address();
        config
            .i2c()
            .write(address, &[self.backlight_bits()])
            .map_err(CharacterDisplayError::I2cError)
    }

    fn write_nibble(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        mode: LcdMode,
        nibble: u8,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        let rs = if mode.rs() { RS } else { 0 };
        let address = config.address();
        config
            .i2c()
            .write(address, &[self.backlight_bits() | rs | (nibble & 0x0F)])
            .map_err(CharacterDisplayError::I2cError)?;
        let settle = config.timing().command_delay_us;
        config.delay().delay_us(settle);
        Ok(())
    }

    fn read_register(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        _mode: LcdMode,
    ) -> Result<u8, CharacterDisplayError<I2C>> {
        let address = config.address();
        let mut data = [0];
        config
            .i2c()
            .read(address, &mut data)
            .map_err(CharacterDisplayError::I2cError)?;
        Ok(data[0])
    }
}

fn instruction(i2c_address: u8, value: u8) -> [I2cTransaction; 2] {
    [
        I2cTransaction::write(i2c_address, vec![BACKLIGHT | (value >> 4)]),
        I2cTransaction::write(i2c_address, vec![BACKLIGHT | (value & 0x0F)]),
    ]
}

#[test]
fn test_display_with_external_adapter() {
    let i2c_address = 0x3A_u8;
    let mut expected_i2c_transactions = vec![I2cTransaction::write(i2c_address, vec![BACKLIGHT])];
    // reset nibbles
    for nibble in [0x3, 0x3, 0x3, 0x2] {
        expected_i2c_transactions.push(I2cTransaction::write(i2c_address, vec![BACKLIGHT | nibble]));
    }
    // function set (1 line), display off, clear, entry mode, display on
    for command in [0x20, 0x08, 0x01, 0x06, 0x0C] {
        expected_i2c_transactions.extend(instruction(i2c_address, command));
    }
    // 'Z' = 0x5A as data
    expected_i2c_transactions.push(I2cTransaction::write(i2c_address, vec![BACKLIGHT | RS | 0x5]));
    expected_i2c_transactions.push(I2cTransaction::write(i2c_address, vec![BACKLIGHT | RS | 0xA]));
    // busy flag set
    expected_i2c_transactions.push(I2cTransaction::read(i2c_address, vec![0x80]));

    let i2c = I2cMock::new(&expected_i2c_transactions);
    let mut bus = i2c.clone();
    let mut lcd =
        BaseCharacterDisplay::new_with_adapter(i2c, i2c_address, LatchAdapter::default(), NoopDelay::new());

    assert!(lcd.backlight(true).is_ok());
    assert!(lcd.begin(16, 1, LcdFontSize::Dots5x8).is_ok());
    assert!(lcd.print("Z").is_ok());
    assert_eq!(lcd.read_busy_flag().ok(), Some(true));

    bus.done();
}
