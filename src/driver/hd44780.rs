// HD44780 Support
// This module provides the controller side of the driver: the instruction set, the shadow copies
// of the write-only controller registers and the 4-bit power-on initialization sequence. The
// HD44780 struct does not know how the controller is wired; every nibble goes through an object
// implementing HD44780AdapterTrait, which is where the I2C expander specifics live.
//

pub mod adapter;

use core::marker::PhantomData;
use embedded_hal::{delay::DelayNs, i2c};

use crate::{
    driver::{hd44780::adapter::HD44780AdapterTrait, CommandWidth, LcdMode},
    CharacterDisplayError, DeviceSetupConfig, LcdFontSize, LcdGeometry,
};

// commands
const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
const LCD_CMD_RETURNHOME: u8 = 0x02; //  Set cursor position to zero
const LCD_CMD_ENTRYMODESET: u8 = 0x04; //  Sets the entry mode
const LCD_CMD_DISPLAYCONTROL: u8 = 0x08; //  Controls the display; does stuff like turning it off and on
const LCD_CMD_CURSORSHIFT: u8 = 0x10; //  Lets you move the cursor
const LCD_CMD_FUNCTIONSET: u8 = 0x20; //  Used to send the function to set to the display
const LCD_CMD_SETCGRAMADDR: u8 = 0x40; //  Used to set the CGRAM (character generator RAM) with characters
const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Used to set the DDRAM (Display Data RAM)

// flags for display entry mode
const LCD_FLAG_ENTRYLEFT: u8 = 0x02; //  Used to set text to flow from left to right
const LCD_FLAG_ENTRYSHIFTINCREMENT: u8 = 0x01; //  Used to 'right justify' text from the cursor
const LCD_FLAG_ENTRYSHIFTDECREMENT: u8 = 0x00; //  Used to 'left justify' text from the cursor

// flags for display on/off control
const LCD_FLAG_DISPLAYON: u8 = 0x04; //  Turns the display on
const LCD_FLAG_DISPLAYOFF: u8 = 0x00; //  Turns the display off
const LCD_FLAG_CURSORON: u8 = 0x02; //  Turns the cursor on
const LCD_FLAG_CURSOROFF: u8 = 0x00; //  Turns the cursor off
const LCD_FLAG_BLINKON: u8 = 0x01; //  Turns on the blinking cursor
const LCD_FLAG_BLINKOFF: u8 = 0x00; //  Turns off the blinking cursor

// flags for display/cursor shift
const LCD_FLAG_DISPLAYMOVE: u8 = 0x08; //  Flag for moving the display
const LCD_FLAG_MOVERIGHT: u8 = 0x04; //  Flag for moving right
const LCD_FLAG_MOVELEFT: u8 = 0x00; //  Flag for moving left

// flags for function set
const LCD_FLAG_8BITMODE: u8 = 0x10; //  LCD 8 bit mode
const LCD_FLAG_4BITMODE: u8 = 0x00; //  LCD 4 bit mode
const LCD_FLAG_2LINE: u8 = 0x08; //  LCD 2 line mode
const LCD_FLAG_1LINE: u8 = 0x00; //  LCD 1 line mode
const LCD_FLAG_5x10_DOTS: u8 = 0x04; //  10 pixel high font mode
const LCD_FLAG_5x8_DOTS: u8 = 0x00; //  8 pixel high font mode

// status register
const LCD_STATUS_BUSY: u8 = 0x80; //  Busy flag
const LCD_STATUS_ADDRESS: u8 = 0x7F; //  Address counter

/// Shadow copies of the write-only controller registers. The controller cannot report these, so
/// every instruction that changes a single flag is built from the shadow.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct ControllerState {
    /// Function set register. Fixed after initialization.
    pub display_function: u8,
    /// Display on/off control register: display, cursor and blink flags.
    pub display_control: u8,
    /// Entry mode register: text direction and autoscroll.
    pub display_mode: u8,
}

/// Steps of the power-on reset procedure for 4-bit operation (HD44780 data sheet, figure 24).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InitState {
    /// `begin` has not completed for this session.
    Uninitialized,
    PowerSettle,
    Force8bitAttempt1,
    Force8bitAttempt2,
    Force8bitAttempt3,
    Switch4bit,
    ProgramFunction,
    ProgramControl,
    Clear,
    ProgramEntryMode,
    DisplayOn,
    Ready,
}

impl InitState {
    /// The step that follows this one. `Ready` is terminal.
    pub const fn next(&self) -> Self {
        match self {
            InitState::Uninitialized => InitState::PowerSettle,
            InitState::PowerSettle => InitState::Force8bitAttempt1,
            InitState::Force8bitAttempt1 => InitState::Force8bitAttempt2,
            InitState::Force8bitAttempt2 => InitState::Force8bitAttempt3,
            InitState::Force8bitAttempt3 => InitState::Switch4bit,
            InitState::Switch4bit => InitState::ProgramFunction,
            InitState::ProgramFunction => InitState::ProgramControl,
            InitState::ProgramControl => InitState::Clear,
            InitState::Clear => InitState::ProgramEntryMode,
            InitState::ProgramEntryMode => InitState::DisplayOn,
            InitState::DisplayOn => InitState::Ready,
            InitState::Ready => InitState::Ready,
        }
    }
}

/// Function set flags for a geometry. The controller cannot drive the 5x10 font on two lines, so
/// the 2-line flag is dropped when the tall font is requested for a multi-row display.
fn function_flags(geometry: &LcdGeometry) -> u8 {
    let lines = if geometry.rows() > 1 {
        LCD_FLAG_2LINE
    } else {
        LCD_FLAG_1LINE
    };
    match geometry.font() {
        LcdFontSize::Dots5x8 => LCD_FLAG_4BITMODE | lines | LCD_FLAG_5x8_DOTS,
        LcdFontSize::Dots5x10 => LCD_FLAG_4BITMODE | LCD_FLAG_1LINE | LCD_FLAG_5x10_DOTS,
    }
}

/// HD44780 controller driver. Holds the register shadows and the geometry, and turns display
/// operations into instruction and data bytes for the adapter.
pub struct HD44780<I2C, DELAY, ADAPTER>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
    ADAPTER: HD44780AdapterTrait<I2C, DELAY>,
{
    adapter: ADAPTER,
    state: ControllerState,
    geometry: LcdGeometry,
    init_state: InitState,
    _marker: PhantomData<I2C>,
    _delay: PhantomData<DELAY>,
}

impl<I2C, DELAY, ADAPTER> HD44780<I2C, DELAY, ADAPTER>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
    ADAPTER: HD44780AdapterTrait<I2C, DELAY>,
{
    pub fn new(adapter: ADAPTER) -> Self {
        Self {
            adapter,
            state: ControllerState::default(),
            geometry: LcdGeometry::default(),
            init_state: InitState::Uninitialized,
            _marker: PhantomData,
            _delay: PhantomData,
        }
    }

    pub fn adapter(&self) -> &ADAPTER {
        &self.adapter
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn geometry(&self) -> &LcdGeometry {
        &self.geometry
    }

    pub fn init_state(&self) -> InitState {
        self.init_state
    }

    pub fn is_ready(&self) -> bool {
        self.init_state == InitState::Ready
    }

    /// Runs the adapter initialization and the full controller reset sequence for `geometry`.
    /// Calling it again starts a new session from scratch.
    pub fn begin(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        geometry: LcdGeometry,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        if !self.adapter.is_configured() {
            return Err(CharacterDisplayError::InvalidPinMapping);
        }
        self.init_state = InitState::Uninitialized;
        self.geometry = geometry;
        self.state = ControllerState::default();
        self.adapter.init(config)?;

        self.init_state = InitState::PowerSettle;
        while self.init_state != InitState::Ready {
            #[cfg(feature = "defmt")]
            defmt::trace!("HD44780 init step {}", self.init_state as u8);
            self.run_init_step(config)?;
            self.init_state = self.init_state.next();
        }
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "HD44780 ready: {}x{}, function set {:#x}",
            self.geometry.columns(),
            self.geometry.rows(),
            self.state.display_function
        );
        Ok(())
    }

    fn run_init_step(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        match self.init_state {
            InitState::Uninitialized | InitState::Ready => {}
            InitState::PowerSettle => {
                // controller needs ~40ms after Vcc rises above 2.7V, some MCUs start much earlier
                config.delay.delay_ms(config.timing.power_on_delay_ms);
            }
            InitState::Force8bitAttempt1 => {
                self.force_8bit(config)?;
                config.delay.delay_us(config.timing.reset_first_wait_us);
            }
            InitState::Force8bitAttempt2 => {
                self.force_8bit(config)?;
                config.delay.delay_us(config.timing.reset_second_wait_us);
            }
            InitState::Force8bitAttempt3 => {
                self.force_8bit(config)?;
                config.delay.delay_us(config.timing.reset_third_wait_us);
            }
            InitState::Switch4bit => {
                self.send(
                    config,
                    LcdMode::InstructionWrite,
                    LCD_CMD_FUNCTIONSET | LCD_FLAG_4BITMODE,
                    CommandWidth::FourBit,
                )?;
            }
            InitState::ProgramFunction => {
                self.state.display_function = function_flags(&self.geometry);
                self.command(config, LCD_CMD_FUNCTIONSET | self.state.display_function)?;
            }
            InitState::ProgramControl => {
                self.state.display_control =
                    LCD_FLAG_DISPLAYOFF | LCD_FLAG_CURSOROFF | LCD_FLAG_BLINKOFF;
                self.command(config, LCD_CMD_DISPLAYCONTROL | self.state.display_control)?;
            }
            InitState::Clear => {
                self.command(config, LCD_CMD_CLEARDISPLAY)?;
                config.delay.delay_us(config.timing.clear_home_delay_us);
            }
            InitState::ProgramEntryMode => {
                self.state.display_mode = LCD_FLAG_ENTRYLEFT | LCD_FLAG_ENTRYSHIFTDECREMENT;
                self.command(config, LCD_CMD_ENTRYMODESET | self.state.display_mode)?;
            }
            InitState::DisplayOn => {
                self.state.display_control |= LCD_FLAG_DISPLAYON;
                self.command(config, LCD_CMD_DISPLAYCONTROL | self.state.display_control)?;
            }
        }
        Ok(())
    }

    fn force_8bit(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.send(
            config,
            LcdMode::InstructionWrite,
            LCD_CMD_FUNCTIONSET | LCD_FLAG_8BITMODE,
            CommandWidth::FourBit,
        )
    }

    /// Sends `value` to the controller register selected by `mode`. With `CommandWidth::FourBit`
    /// only the high nibble is clocked in, which is only meaningful during the reset sequence.
    pub fn send(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        mode: LcdMode,
        value: u8,
        width: CommandWidth,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        match width {
            CommandWidth::FourBit => self.adapter.write_nibble(config, mode, value >> 4),
            CommandWidth::EightBit => self.adapter.write_byte(config, mode, value),
        }
    }

    fn command(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        value: u8,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.send(config, LcdMode::InstructionWrite, value, CommandWidth::EightBit)
    }

    pub fn clear(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.command(config, LCD_CMD_CLEARDISPLAY)?;
        config.delay.delay_us(config.timing.clear_home_delay_us);
        Ok(())
    }

    pub fn home(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.command(config, LCD_CMD_RETURNHOME)?;
        config.delay.delay_us(config.timing.clear_home_delay_us);
        Ok(())
    }

    /// Moves the cursor. Coordinates outside the geometry are clamped to the last column and row.
    pub fn set_cursor(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        col: u8,
        row: u8,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        let address = self.geometry.ddram_address(col, row);
        self.command(config, LCD_CMD_SETDDRAMADDR | address)
    }

    fn update_display_control(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        flag: u8,
        on: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        if on {
            self.state.display_control |= flag;
        } else {
            self.state.display_control &= !flag;
        }
        self.command(config, LCD_CMD_DISPLAYCONTROL | self.state.display_control)
    }

    fn update_display_mode(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        flag: u8,
        on: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        if on {
            self.state.display_mode |= flag;
        } else {
            self.state.display_mode &= !flag;
        }
        self.command(config, LCD_CMD_ENTRYMODESET | self.state.display_mode)
    }

    pub fn show_display(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        show_display: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.update_display_control(config, LCD_FLAG_DISPLAYON, show_display)
    }

    pub fn show_cursor(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        show_cursor: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.update_display_control(config, LCD_FLAG_CURSORON, show_cursor)
    }

    pub fn blink_cursor(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        blink_cursor: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.update_display_control(config, LCD_FLAG_BLINKON, blink_cursor)
    }

    /// Shifts the whole display one position left without changing DDRAM.
    pub fn scroll_display_left(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.command(
            config,
            LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE | LCD_FLAG_MOVELEFT,
        )
    }

    /// Shifts the whole display one position right without changing DDRAM.
    pub fn scroll_display_right(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.command(
            config,
            LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE | LCD_FLAG_MOVERIGHT,
        )
    }

    pub fn left_to_right(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.update_display_mode(config, LCD_FLAG_ENTRYLEFT, true)
    }

    pub fn right_to_left(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.update_display_mode(config, LCD_FLAG_ENTRYLEFT, false)
    }

    pub fn autoscroll(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        autoscroll: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.update_display_mode(config, LCD_FLAG_ENTRYSHIFTINCREMENT, autoscroll)
    }

    /// Stores a custom glyph in CGRAM. The location is clamped to the number of slots of the
    /// font (8 for 5x8, 4 for 5x10), extra pattern rows are ignored and only the low 5 bits of
    /// each row are used. The cursor is left in CGRAM; call `set_cursor` before printing again.
    ///
    /// In 5x10 mode each slot spans 16 CGRAM bytes, so slot `location` is printed with character
    /// code `2 * location` rather than `location`.
    pub fn create_char(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        location: u8,
        charmap: &[u8],
    ) -> Result<(), CharacterDisplayError<I2C>> {
        let font = self.geometry.font();
        let location = location.min(font.custom_char_count() - 1);
        // CGRAM holds 64 bytes: 8 slots of 8 rows, or 4 slots of 16 rows for 5x10
        let address = match font {
            LcdFontSize::Dots5x8 => location << 3,
            LcdFontSize::Dots5x10 => location << 4,
        };
        self.command(config, LCD_CMD_SETCGRAMADDR | address)?;
        for row in charmap.iter().take(font.pattern_rows() as usize) {
            self.write_byte(config, row & 0x1F)?;
        }
        Ok(())
    }

    /// Writes one character code to DDRAM (or CGRAM after `create_char`) at the address counter.
    pub fn write_byte(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        value: u8,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.send(config, LcdMode::DataWrite, value, CommandWidth::EightBit)
    }

    pub fn print(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        text: &str,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        for c in text.bytes() {
            self.write_byte(config, c)?;
        }
        Ok(())
    }

    pub fn backlight(&self) -> bool {
        self.adapter.backlight()
    }

    /// Switches the backlight. The controller registers are not touched.
    pub fn set_backlight(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
        on: bool,
    ) -> Result<(), CharacterDisplayError<I2C>> {
        self.adapter.set_backlight(config, on)
    }

    pub fn read_busy_flag(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<bool, CharacterDisplayError<I2C>> {
        let status = self.adapter.read_register(config, LcdMode::BusyFlagRead)?;
        Ok(status & LCD_STATUS_BUSY != 0)
    }

    pub fn read_address_counter(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<u8, CharacterDisplayError<I2C>> {
        let status = self.adapter.read_register(config, LcdMode::BusyFlagRead)?;
        Ok(status & LCD_STATUS_ADDRESS)
    }

    /// Reads the DDRAM or CGRAM byte at the address counter. The controller advances the counter
    /// afterwards as it does for writes.
    pub fn read_data(
        &mut self,
        config: &mut DeviceSetupConfig<I2C, DELAY>,
    ) -> Result<u8, CharacterDisplayError<I2C>> {
        self.adapter.read_register(config, LcdMode::DataRead)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use crate::{
        driver::hd44780::adapter::generic_pcf8574::GenericPCF8574Adapter, LcdTiming,
    };
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };
    use std::vec::Vec;

    type TestDriver = HD44780<I2cMock, NoopDelay, GenericPCF8574Adapter>;

    fn config(expected: &[I2cTransaction]) -> DeviceSetupConfig<I2cMock, NoopDelay> {
        DeviceSetupConfig {
            i2c: I2cMock::new(expected),
            address: 0x27,
            delay: NoopDelay,
            timing: LcdTiming::default(),
        }
    }

    /// Expander writes for one nibble on the default wiring with the backlight on.
    fn nibble(rs: bool, value: u8) -> [I2cTransaction; 2] {
        let low = (value << 4) | 0x08 | rs as u8;
        [
            I2cTransaction::write(0x27, std::vec![low | 0x04]),
            I2cTransaction::write(0x27, std::vec![low]),
        ]
    }

    fn byte(rs: bool, value: u8) -> Vec<I2cTransaction> {
        let mut transactions = Vec::new();
        transactions.extend(nibble(rs, value >> 4));
        transactions.extend(nibble(rs, value & 0x0F));
        transactions
    }

    fn instruction(value: u8) -> Vec<I2cTransaction> {
        byte(false, value)
    }

    fn data(value: u8) -> Vec<I2cTransaction> {
        byte(true, value)
    }

    fn init_sequence(function: u8) -> Vec<I2cTransaction> {
        let mut transactions = std::vec![
            I2cTransaction::write(0x27, std::vec![]),
            I2cTransaction::write(0x27, std::vec![0x08]),
        ];
        for _ in 0..3 {
            transactions.extend(nibble(false, 0x3));
        }
        transactions.extend(nibble(false, 0x2));
        transactions.extend(instruction(0x20 | function));
        transactions.extend(instruction(0x08));
        transactions.extend(instruction(0x01));
        transactions.extend(instruction(0x06));
        transactions.extend(instruction(0x0C));
        transactions
    }

    fn ready_driver(
        geometry: LcdGeometry,
        after_init: &[I2cTransaction],
    ) -> (TestDriver, DeviceSetupConfig<I2cMock, NoopDelay>) {
        let function = function_flags(&geometry);
        let mut expected = init_sequence(function);
        expected.extend_from_slice(after_init);
        let mut config = config(&expected);
        let mut driver = TestDriver::new(GenericPCF8574Adapter::default());
        assert!(driver.begin(&mut config, geometry).is_ok());
        (driver, config)
    }

    #[test]
    fn test_init_state_order() {
        let mut state = InitState::Uninitialized;
        let mut steps = 0;
        while state != InitState::Ready {
            state = state.next();
            steps += 1;
        }
        assert_eq!(steps, 11);
        assert_eq!(InitState::Ready.next(), InitState::Ready);
    }

    #[test]
    fn test_function_flags() {
        let two_line = LcdGeometry::new(16, 2, LcdFontSize::Dots5x8);
        assert_eq!(function_flags(&two_line), LCD_FLAG_2LINE);
        let one_line = LcdGeometry::new(16, 1, LcdFontSize::Dots5x8);
        assert_eq!(function_flags(&one_line), 0x00);
        let tall_one_line = LcdGeometry::new(16, 1, LcdFontSize::Dots5x10);
        assert_eq!(function_flags(&tall_one_line), LCD_FLAG_5x10_DOTS);
        // 5x10 on two lines is not supported by the controller
        let tall_two_line = LcdGeometry::new(16, 2, LcdFontSize::Dots5x10);
        assert_eq!(function_flags(&tall_two_line), LCD_FLAG_5x10_DOTS);
    }

    #[test]
    fn test_begin_sequence() {
        let (driver, mut config) = ready_driver(LcdGeometry::new(16, 2, LcdFontSize::Dots5x8), &[]);
        assert!(driver.is_ready());
        assert_eq!(
            driver.state(),
            &ControllerState {
                display_function: 0x08,
                display_control: 0x04,
                display_mode: 0x02,
            }
        );
        config.i2c.done();
    }

    #[test]
    fn test_begin_failure_leaves_driver_uninitialized() {
        use embedded_hal::i2c::ErrorKind;

        let mut expected = std::vec![
            I2cTransaction::write(0x27, std::vec![]),
            I2cTransaction::write(0x27, std::vec![0x08]),
        ];
        expected.push(I2cTransaction::write(0x27, std::vec![0x3C]).with_error(ErrorKind::Other));
        let mut config = config(&expected);
        let mut driver = TestDriver::new(GenericPCF8574Adapter::default());

        let result = driver.begin(&mut config, LcdGeometry::new(16, 2, LcdFontSize::Dots5x8));
        assert!(matches!(result, Err(CharacterDisplayError::I2cError(_))));
        assert!(!driver.is_ready());
        assert_eq!(driver.init_state(), InitState::Force8bitAttempt1);
        config.i2c.done();
    }

    #[test]
    fn test_begin_twice_reruns_sequence() {
        let geometry = LcdGeometry::new(20, 4, LcdFontSize::Dots5x8);
        let function = function_flags(&geometry);
        let mut expected = init_sequence(function);
        expected.extend(init_sequence(function));
        let mut config = config(&expected);
        let mut driver = TestDriver::new(GenericPCF8574Adapter::default());

        assert!(driver.begin(&mut config, geometry).is_ok());
        assert!(driver.begin(&mut config, geometry).is_ok());
        assert!(driver.is_ready());
        config.i2c.done();
    }

    #[test]
    fn test_set_cursor_20x4_addresses() {
        let mut expected = Vec::new();
        for base in [0x00u8, 0x40, 0x14, 0x54] {
            expected.extend(instruction(0x80 | (base + 3)));
        }
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(20, 4, LcdFontSize::Dots5x8), &expected);

        for row in 0..4 {
            assert!(driver.set_cursor(&mut config, 3, row).is_ok());
        }
        config.i2c.done();
    }

    #[test]
    fn test_set_cursor_clamps() {
        let mut expected = Vec::new();
        // last column of the last row on 16x2
        expected.extend(instruction(0x80 | 0x4F));
        expected.extend(instruction(0x80 | 0x4F));
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 2, LcdFontSize::Dots5x8), &expected);

        assert!(driver.set_cursor(&mut config, 40, 7).is_ok());
        assert!(driver.set_cursor(&mut config, 15, 1).is_ok());
        config.i2c.done();
    }

    #[test]
    fn test_display_control_and_entry_mode() {
        let mut expected = Vec::new();
        expected.extend(instruction(0x0E)); // cursor on
        expected.extend(instruction(0x0F)); // blink on
        expected.extend(instruction(0x0B)); // display off
        expected.extend(instruction(0x04)); // right to left
        expected.extend(instruction(0x05)); // autoscroll
        expected.extend(instruction(0x07)); // left to right
        expected.extend(instruction(0x18)); // scroll left
        expected.extend(instruction(0x1C)); // scroll right
        expected.extend(instruction(0x02)); // home
        expected.extend(instruction(0x01)); // clear
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 2, LcdFontSize::Dots5x8), &expected);

        assert!(driver.show_cursor(&mut config, true).is_ok());
        assert!(driver.blink_cursor(&mut config, true).is_ok());
        assert!(driver.show_display(&mut config, false).is_ok());
        assert!(driver.right_to_left(&mut config).is_ok());
        assert!(driver.autoscroll(&mut config, true).is_ok());
        assert!(driver.left_to_right(&mut config).is_ok());
        assert!(driver.scroll_display_left(&mut config).is_ok());
        assert!(driver.scroll_display_right(&mut config).is_ok());
        assert!(driver.home(&mut config).is_ok());
        assert!(driver.clear(&mut config).is_ok());
        assert_eq!(driver.state().display_control, 0x03);
        assert_eq!(driver.state().display_mode, 0x03);
        config.i2c.done();
    }

    #[test]
    fn test_create_char_clamps_location_and_rows() {
        let pattern = [0xFF, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x1F, 0x00, 0x15, 0x15];
        let mut expected = Vec::new();
        // location 9 on 5x8 is slot 7, address 56
        expected.extend(instruction(0x40 | 56));
        for row in pattern.iter().take(8) {
            expected.extend(data(row & 0x1F));
        }
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 2, LcdFontSize::Dots5x8), &expected);

        assert!(driver.create_char(&mut config, 9, &pattern).is_ok());
        config.i2c.done();
    }

    #[test]
    fn test_create_char_5x10() {
        let pattern = [0x1F; 12];
        let mut expected = Vec::new();
        // location 5 on 5x10 is slot 3, address 48
        expected.extend(instruction(0x40 | 48));
        for _ in 0..10 {
            expected.extend(data(0x1F));
        }
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 1, LcdFontSize::Dots5x10), &expected);

        assert!(driver.create_char(&mut config, 5, &pattern).is_ok());
        config.i2c.done();
    }

    #[test]
    fn test_create_char_5x10_printed_by_code() {
        let pattern = [0x0E; 10];
        let mut expected = Vec::new();
        // slot 1 on 5x10 starts at CGRAM address 16
        expected.extend(instruction(0x40 | 16));
        for _ in 0..10 {
            expected.extend(data(0x0E));
        }
        expected.extend(instruction(0x80));
        // character code 2 selects slot 1
        expected.extend(data(0x02));
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 1, LcdFontSize::Dots5x10), &expected);

        assert!(driver.create_char(&mut config, 1, &pattern).is_ok());
        assert!(driver.set_cursor(&mut config, 0, 0).is_ok());
        let code = LcdFontSize::Dots5x10.custom_char_code(1);
        assert_eq!(code, 2);
        assert!(driver.write_byte(&mut config, code).is_ok());
        config.i2c.done();
    }

    #[test]
    fn test_begin_with_invalid_pin_map_sends_nothing() {
        use crate::{pin_map::DEFAULT_WIRING, BacklightPolarity, PinMap};

        let expected: [I2cTransaction; 0] = [];
        let mut config = config(&expected);
        let mut wiring = DEFAULT_WIRING;
        wiring[2] = wiring[3];
        let mut driver = TestDriver::new(GenericPCF8574Adapter::new(
            PinMap::new(wiring),
            BacklightPolarity::Positive,
        ));

        let result = driver.begin(&mut config, LcdGeometry::new(16, 2, LcdFontSize::Dots5x8));
        assert!(matches!(result, Err(CharacterDisplayError::InvalidPinMapping)));
        assert!(!driver.is_ready());
        config.i2c.done();
    }

    #[test]
    fn test_print_and_send_widths() {
        let mut expected = Vec::new();
        expected.extend(data(b'H'));
        expected.extend(data(b'i'));
        expected.extend(nibble(false, 0x3));
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 2, LcdFontSize::Dots5x8), &expected);

        assert!(driver.print(&mut config, "Hi").is_ok());
        assert!(driver
            .send(&mut config, LcdMode::InstructionWrite, 0x30, CommandWidth::FourBit)
            .is_ok());
        config.i2c.done();
    }

    #[test]
    fn test_backlight_keeps_registers() {
        let expected = [
            I2cTransaction::write(0x27, std::vec![0x00]),
            I2cTransaction::write(0x27, std::vec![0x08]),
        ];
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 2, LcdFontSize::Dots5x8), &expected);
        let before = *driver.state();

        assert!(driver.set_backlight(&mut config, false).is_ok());
        assert!(!driver.backlight());
        assert!(driver.set_backlight(&mut config, true).is_ok());
        assert!(driver.backlight());
        assert_eq!(driver.state(), &before);
        config.i2c.done();
    }

    #[test]
    fn test_status_reads() {
        let mut expected = Vec::new();
        for _ in 0..2 {
            // busy, address 0x45
            expected.extend([
                I2cTransaction::write(0x27, std::vec![0xFA]),
                I2cTransaction::write(0x27, std::vec![0xFE]),
                I2cTransaction::read(0x27, std::vec![0xCE]),
                I2cTransaction::write(0x27, std::vec![0xFA]),
                I2cTransaction::write(0x27, std::vec![0xFE]),
                I2cTransaction::read(0x27, std::vec![0x5E]),
                I2cTransaction::write(0x27, std::vec![0xFA]),
            ]);
        }
        let (mut driver, mut config) =
            ready_driver(LcdGeometry::new(16, 2, LcdFontSize::Dots5x8), &expected);

        assert_eq!(driver.read_busy_flag(&mut config).ok(), Some(true));
        assert_eq!(driver.read_address_counter(&mut config).ok(), Some(0x45));
        config.i2c.done();
    }
}
