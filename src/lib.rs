//! This Rust `embedded-hal`-based library drives a [HD44780](https://en.wikipedia.org/wiki/Hitachi_HD44780_LCD_controller)
//! compatible character display through a PCF8574 or PCF8574A I2C GPIO expander in an embedded, `no_std` environment.
//!
//! PCF8574 "I2C backpacks" are ubiquitous on eBay and AliExpress and have no clear branding. Most of them wire the expander
//! ports as P0=RS, P1=RW, P2=E, P3=backlight and P4-P7=D4-D7, but plenty of boards (and hand wired prototypes) use a
//! different ordering. This library treats the wiring as data: any assignment of the eight controller signals to the eight
//! expander ports can be described with a [`PinMap`].
//!
//! Key features include:
//! - Convenient high-level API for controlling the display
//! - Any expander pin ordering, declared either with [`LcdPin`] values or LCD module header pin numbers
//! - Active-high or active-low backlight transistors
//! - Support for custom characters, including the 5x10 font
//! - Reading the busy flag, address counter and display RAM back from the controller
//! - `core::fmt::Write` implementation for easy use with the `write!` macro
//! - Compatible with the `embedded-hal` traits v1.0 and later
//! - Optional support for the `defmt` and `ufmt` logging frameworks
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! pcf8574-character-lcd = { version = "0.1", features = ["defmt"] }
//! ```
//! The `features = ["defmt"]` line is optional and enables the `defmt` feature, which allows the library's errors to be used with
//! the `defmt` logging framework and emits debug logging during initialization. Another optional feature is
//! `features = ["ufmt"]`, which enables the `ufmt` feature, allowing the `uwriteln!` and `uwrite!` macros to be used.
//!
//! Create the display object:
//! ```rust
//! use pcf8574_character_lcd::{BacklightPolarity, CharacterDisplayPCF8574, LcdPin, Pcf8574Address, PinMap};
//!
//! // board setup
//! let i2c = ...; // I2C peripheral
//! let delay = ...; // DelayNs implementation
//!
//! // common backpack at address 0x27
//! let mut lcd = CharacterDisplayPCF8574::new(i2c, delay);
//!
//! // a board with a different wiring, declared with the LCD header pin connected to each of P0-P7
//! let pin_map = PinMap::from_header_pins([11, 4, 6, 12, 13, 14, 5, 16]);
//! let mut lcd = CharacterDisplayPCF8574::new_with_wiring(
//!     i2c,
//!     Pcf8574Address::Pcf8574A_3F,
//!     pin_map,
//!     BacklightPolarity::Positive,
//!     delay,
//! );
//! ```
//! It is recommended that the `i2c` object be wrapped in an `embedded_hal_bus::i2c::CriticalSectionDevice` so that it can be
//! shared between multiple peripherals.
//!
//! Initialize the display with its geometry:
//! ```rust
//! if let Err(e) = lcd.begin_display_type(LcdDisplayType::Lcd20x4, LcdFontSize::Dots5x8) {
//!    panic!("Error initializing LCD: {}", e);
//! }
//! ```
//! Use the display:
//! ```rust
//! lcd.backlight(true)?.clear()?.home()?;
//! lcd.print("Hello, world!")?;
//! // can also use the `core::fmt::write!` macro
//! use core::fmt::Write;
//!
//! write!(lcd, "Hello, world!")?;
//! ```
//! The various methods for controlling the LCD return a `Result` that wraps the display object in `Ok()`, allowing for easy
//! chaining of commands. Cursor coordinates outside the display are clamped to the last column and row.
//!
//! ### Reading from the display
//! The PCF8574 ports are quasi-bidirectional, so the controller can be read through the expander when the RW line is wired.
//! `read_busy_flag`, `read_address_counter` and `read_data` are available. The expander sometimes fails to return its port
//! byte; reads are retried a few times and then report an idle controller (not busy, address 0, data 0).
//!
#![no_std]
#![allow(non_camel_case_types, non_upper_case_globals)]
use core::fmt::Display;

use embedded_hal::{delay::DelayNs, i2c, pwm::SetDutyCycle};

mod driver;
pub mod pin_map;

pub use driver::{
    hd44780::{
        adapter::{generic_pcf8574::GenericPCF8574Adapter, HD44780AdapterTrait},
        ControllerState, InitState, HD44780,
    },
    CommandWidth, LcdMode,
};
pub use pin_map::{LcdPin, PinMap, DEFAULT_WIRING};

/// HD44780 based character display using a PCF8574 or PCF8574A I2C expander with any pin ordering.
pub type CharacterDisplayPCF8574<I2C, DELAY> = BaseCharacterDisplay<I2C, DELAY, GenericPCF8574Adapter>;

#[derive(Debug, PartialEq, Copy, Clone)]
/// Errors that can occur when using the display
pub enum CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    /// I2C error returned from the underlying I2C implementation
    I2cError(I2C::Error),
    /// The expander did not acknowledge its address
    DeviceNotFound,
    /// The pin map does not assign every controller signal to exactly one expander port
    InvalidPinMapping,
    /// The display was used before `begin` completed
    NotInitialized,
    /// Formatting error
    FormattingError(core::fmt::Error),
}

impl<I2C> From<core::fmt::Error> for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn from(err: core::fmt::Error) -> Self {
        CharacterDisplayError::FormattingError(err)
    }
}

impl<I2C> From<&CharacterDisplayError<I2C>> for &'static str
where
    I2C: i2c::I2c,
{
    fn from(err: &CharacterDisplayError<I2C>) -> Self {
        match err {
            CharacterDisplayError::I2cError(_) => "I2C error",
            CharacterDisplayError::DeviceNotFound => "Device not found",
            CharacterDisplayError::InvalidPinMapping => "Invalid pin mapping",
            CharacterDisplayError::NotInitialized => "Display not initialized",
            CharacterDisplayError::FormattingError(_) => "Formatting error",
        }
    }
}

#[cfg(feature = "defmt")]
impl<I2C> defmt::Format for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl<I2C> ufmt::uDisplay for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl<I2C> Display for CharacterDisplayError<I2C>
where
    I2C: i2c::I2c,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

/// I2C address of the expander, set by the A2-A0 straps. The PCF8574 answers on 0x20-0x27, the PCF8574A
/// on 0x38-0x3F.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[repr(u8)]
pub enum Pcf8574Address {
    Pcf8574_20 = 0x20,
    Pcf8574_21 = 0x21,
    Pcf8574_22 = 0x22,
    Pcf8574_23 = 0x23,
    Pcf8574_24 = 0x24,
    Pcf8574_25 = 0x25,
    Pcf8574_26 = 0x26,
    /// All straps high. The factory setting of most backpacks.
    #[default]
    Pcf8574_27 = 0x27,
    Pcf8574A_38 = 0x38,
    Pcf8574A_39 = 0x39,
    Pcf8574A_3A = 0x3A,
    Pcf8574A_3B = 0x3B,
    Pcf8574A_3C = 0x3C,
    Pcf8574A_3D = 0x3D,
    Pcf8574A_3E = 0x3E,
    Pcf8574A_3F = 0x3F,
}

impl Pcf8574Address {
    /// The 7-bit bus address.
    pub const fn address(&self) -> u8 {
        *self as u8
    }
}

/// Drive polarity of the backlight transistor.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum BacklightPolarity {
    /// The backlight is lit when its expander port is high.
    #[default]
    Positive,
    /// The backlight is lit when its expander port is low.
    Negative,
}

/// Character cell height. Fixed at initialization.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum LcdFontSize {
    #[default]
    Dots5x8,
    /// Only usable on single line displays.
    Dots5x10,
}

impl LcdFontSize {
    /// Number of custom characters that fit in CGRAM for this font.
    pub const fn custom_char_count(&self) -> u8 {
        match self {
            LcdFontSize::Dots5x8 => 8,
            LcdFontSize::Dots5x10 => 4,
        }
    }

    /// Number of pixel rows in one custom character pattern.
    pub const fn pattern_rows(&self) -> u8 {
        match self {
            LcdFontSize::Dots5x8 => 8,
            LcdFontSize::Dots5x10 => 10,
        }
    }

    /// Character code that prints the custom glyph stored at `location` by `create_char`. The location is
    /// clamped the same way `create_char` clamps it. In 5x10 mode CGRAM slots are 16 bytes apart and
    /// character codes 2k and 2k+1 both select slot k.
    pub const fn custom_char_code(&self, location: u8) -> u8 {
        let slots = self.custom_char_count();
        let location = if location < slots { location } else { slots - 1 };
        match self {
            LcdFontSize::Dots5x8 => location,
            LcdFontSize::Dots5x10 => location << 1,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Common display sizes, usable with `begin_display_type`.
pub enum LcdDisplayType {
    /// 8x2 display
    Lcd8x2,
    /// 16x1 display
    Lcd16x1,
    /// 16x2 display
    Lcd16x2,
    /// 16x4 display
    Lcd16x4,
    /// 20x2 display
    Lcd20x2,
    /// 20x4 display
    Lcd20x4,
    /// 40x2 display
    Lcd40x2,
}

impl From<&LcdDisplayType> for &'static str {
    fn from(display_type: &LcdDisplayType) -> Self {
        match display_type {
            LcdDisplayType::Lcd8x2 => "8x2",
            LcdDisplayType::Lcd16x1 => "16x1",
            LcdDisplayType::Lcd16x2 => "16x2",
            LcdDisplayType::Lcd16x4 => "16x4",
            LcdDisplayType::Lcd20x2 => "20x2",
            LcdDisplayType::Lcd20x4 => "20x4",
            LcdDisplayType::Lcd40x2 => "40x2",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LcdDisplayType {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for LcdDisplayType {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl Display for LcdDisplayType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

impl LcdDisplayType {
    /// Get the number of rows for the display type
    pub const fn rows(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd16x1 => 1,
            LcdDisplayType::Lcd8x2
            | LcdDisplayType::Lcd16x2
            | LcdDisplayType::Lcd20x2
            | LcdDisplayType::Lcd40x2 => 2,
            LcdDisplayType::Lcd16x4 | LcdDisplayType::Lcd20x4 => 4,
        }
    }

    /// Get the number of columns for the display type
    pub const fn cols(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd8x2 => 8,
            LcdDisplayType::Lcd16x1 | LcdDisplayType::Lcd16x2 | LcdDisplayType::Lcd16x4 => 16,
            LcdDisplayType::Lcd20x2 | LcdDisplayType::Lcd20x4 => 20,
            LcdDisplayType::Lcd40x2 => 40,
        }
    }
}

/// Size of the display in characters plus its font.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LcdGeometry {
    columns: u8,
    rows: u8,
    font: LcdFontSize,
}

impl LcdGeometry {
    /// The controller addresses at most 4 rows; `rows` is clamped to 1..=4 and `columns` to at least 1.
    pub fn new(columns: u8, rows: u8, font: LcdFontSize) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.clamp(1, 4),
            font,
        }
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn font(&self) -> LcdFontSize {
        self.font
    }

    /// DDRAM address of the first character of each row. Rows 2 and 3 continue rows 0 and 1 past the
    /// visible columns.
    pub fn row_offsets(&self) -> [u8; 4] {
        [
            0x00,
            0x40,
            self.columns,
            0x40u8.wrapping_add(self.columns),
        ]
    }

    /// Clamps a position to the last column and row of the display.
    pub fn clamp(&self, col: u8, row: u8) -> (u8, u8) {
        (
            col.min(self.columns.saturating_sub(1)),
            row.min(self.rows.saturating_sub(1)),
        )
    }

    /// DDRAM address of a (clamped) position.
    pub fn ddram_address(&self, col: u8, row: u8) -> u8 {
        let (col, row) = self.clamp(col, row);
        self.row_offsets()[row as usize].wrapping_add(col) & 0x7F
    }
}

impl Default for LcdGeometry {
    fn default() -> Self {
        Self::new(16, 2, LcdFontSize::Dots5x8)
    }
}

impl From<(LcdDisplayType, LcdFontSize)> for LcdGeometry {
    fn from((display_type, font): (LcdDisplayType, LcdFontSize)) -> Self {
        Self::new(display_type.cols(), display_type.rows(), font)
    }
}

/// Delays used when talking to the controller. The defaults follow the HD44780 data sheet with some margin
/// for slow clones.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LcdTiming {
    /// Wait after power up before the reset sequence, in milliseconds
    pub power_on_delay_ms: u32,
    /// Wait after the first "8-bit mode" nibble, in microseconds
    pub reset_first_wait_us: u32,
    /// Wait after the second "8-bit mode" nibble, in microseconds
    pub reset_second_wait_us: u32,
    /// Wait after the third "8-bit mode" nibble, in microseconds
    pub reset_third_wait_us: u32,
    /// Enable pulse width, in microseconds. The controller needs > 450ns.
    pub enable_pulse_us: u32,
    /// Execution time of most instructions, in microseconds
    pub command_delay_us: u32,
    /// Execution time of clear and home, in microseconds
    pub clear_home_delay_us: u32,
    /// Wait between attempts to read the expander port, in microseconds
    pub read_retry_delay_us: u32,
}

impl Default for LcdTiming {
    fn default() -> Self {
        Self {
            power_on_delay_ms: 500,
            reset_first_wait_us: 5_000,
            reset_second_wait_us: 200,
            reset_third_wait_us: 100,
            enable_pulse_us: 1,
            command_delay_us: 43,
            clear_home_delay_us: 2_000,
            read_retry_delay_us: 5,
        }
    }
}

/// Bus, address and timing shared by the driver and its adapter. Adapters reach the hardware only through
/// this object.
pub struct DeviceSetupConfig<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    i2c: I2C,
    address: u8,
    delay: DELAY,
    timing: LcdTiming,
}

impl<I2C, DELAY> DeviceSetupConfig<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// 7-bit I2C address of the adapter.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn delay(&mut self) -> &mut DELAY {
        &mut self.delay
    }

    pub fn timing(&self) -> &LcdTiming {
        &self.timing
    }
}

pub struct BaseCharacterDisplay<I2C, DELAY, ADAPTER>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
    ADAPTER: HD44780AdapterTrait<I2C, DELAY>,
{
    config: DeviceSetupConfig<I2C, DELAY>,
    driver: HD44780<I2C, DELAY, ADAPTER>,
}

impl<I2C, DELAY> BaseCharacterDisplay<I2C, DELAY, GenericPCF8574Adapter>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Create a new character display object for the common backpack: address 0x27, default wiring and an
    /// active-high backlight.
    pub fn new(i2c: I2C, delay: DELAY) -> Self {
        Self::new_with_wiring(
            i2c,
            Pcf8574Address::default(),
            PinMap::default(),
            BacklightPolarity::Positive,
            delay,
        )
    }

    /// Create a new character display object for a specific address, wiring and backlight polarity.
    pub fn new_with_wiring(
        i2c: I2C,
        address: Pcf8574Address,
        pin_map: PinMap,
        polarity: BacklightPolarity,
        delay: DELAY,
    ) -> Self {
        Self::new_with_adapter(
            i2c,
            address.address(),
            GenericPCF8574Adapter::new(pin_map, polarity),
            delay,
        )
    }

    /// Sets the brightness of a PWM driven backlight, 0 being off and 255 full brightness. This is for boards
    /// where the backlight jumper is removed and the LED is driven from a PWM pin, so it does not touch the
    /// expander. The duty cycle is inverted for an active-low backlight.
    pub fn set_brightness<PWM>(&self, pwm: &mut PWM, value: u8) -> Result<(), PWM::Error>
    where
        PWM: SetDutyCycle,
    {
        let value = match self.driver.adapter().polarity() {
            BacklightPolarity::Positive => value,
            BacklightPolarity::Negative => u8::MAX - value,
        };
        pwm.set_duty_cycle_fraction(value as u16, u8::MAX as u16)
    }
}

impl<I2C, DELAY, ADAPTER> BaseCharacterDisplay<I2C, DELAY, ADAPTER>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
    ADAPTER: HD44780AdapterTrait<I2C, DELAY>,
{
    /// Create a new character display object with a custom adapter.
    pub fn new_with_adapter(i2c: I2C, address: u8, adapter: ADAPTER, delay: DELAY) -> Self {
        Self {
            config: DeviceSetupConfig {
                i2c,
                address,
                delay,
                timing: LcdTiming::default(),
            },
            driver: HD44780::new(adapter),
        }
    }

    /// Replaces the controller timing.
    pub fn with_timing(mut self, timing: LcdTiming) -> Self {
        self.config.timing = timing;
        self
    }

    /// Initialize the display. This must be called before using the display. It can be called again to reset
    /// the controller, for example after a brown-out.
    pub fn begin(
        &mut self,
        columns: u8,
        rows: u8,
        font: LcdFontSize,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        if !self.driver.adapter().is_configured() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Refusing to start display with an invalid pin map");
            return Err(CharacterDisplayError::InvalidPinMapping);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Starting {}x{} display at address {:#x}",
            columns,
            rows,
            self.config.address
        );
        self.driver
            .begin(&mut self.config, LcdGeometry::new(columns, rows, font))?;
        Ok(self)
    }

    /// Initialize the display using one of the common display sizes.
    pub fn begin_display_type(
        &mut self,
        display_type: LcdDisplayType,
        font: LcdFontSize,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.begin(display_type.cols(), display_type.rows(), font)
    }

    fn ensure_configured(&self) -> Result<(), CharacterDisplayError<I2C>> {
        if self.driver.adapter().is_configured() {
            Ok(())
        } else {
            Err(CharacterDisplayError::InvalidPinMapping)
        }
    }

    fn ensure_ready(&self) -> Result<(), CharacterDisplayError<I2C>> {
        self.ensure_configured()?;
        if self.driver.is_ready() {
            Ok(())
        } else {
            Err(CharacterDisplayError::NotInitialized)
        }
    }

    /// returns a reference to the I2C peripheral. mostly needed for testing
    #[cfg(test)]
    fn i2c(&mut self) -> &mut I2C {
        &mut self.config.i2c
    }

    /// returns the geometry passed to the last `begin`
    pub fn geometry(&self) -> LcdGeometry {
        *self.driver.geometry()
    }

    /// returns the shadow copies of the controller registers
    pub fn controller_state(&self) -> ControllerState {
        *self.driver.state()
    }

    pub fn is_initialized(&self) -> bool {
        self.driver.is_ready()
    }

    pub fn is_backlight_on(&self) -> bool {
        self.driver.backlight()
    }

    pub fn timing(&self) -> &LcdTiming {
        &self.config.timing
    }

    /// Reads the busy flag. While it is set the controller ignores instructions.
    pub fn read_busy_flag(&mut self) -> Result<bool, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.read_busy_flag(&mut self.config)
    }

    /// Reads the address counter from the controller. The busy bit is masked off.
    pub fn read_address_counter(&mut self) -> Result<u8, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.read_address_counter(&mut self.config)
    }

    /// Reads one byte of either CGRAM or DDRAM at the current cursor position, depending on which address
    /// was set last.
    pub fn read_data(&mut self) -> Result<u8, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.read_data(&mut self.config)
    }

    /// Reads into the buffer consecutive bytes of CGRAM or DDRAM starting at the current cursor position.
    pub fn read_device_data(
        &mut self,
        buffer: &mut [u8],
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        for byte in buffer.iter_mut() {
            *byte = self.driver.read_data(&mut self.config)?;
        }
        Ok(self)
    }

    //--------------------------------------------------------------------------------------------------
    // high level commands, for the user!
    //--------------------------------------------------------------------------------------------------

    /// Clear the display
    pub fn clear(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.clear(&mut self.config)?;
        Ok(self)
    }

    /// Set the cursor to the home position.
    pub fn home(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.home(&mut self.config)?;
        Ok(self)
    }

    /// Set the cursor position at specified column and row. Columns and rows are zero-indexed and clamped
    /// to the display size.
    pub fn set_cursor(
        &mut self,
        col: u8,
        row: u8,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.set_cursor(&mut self.config, col, row)?;
        Ok(self)
    }

    /// Set the cursor visibility.
    pub fn show_cursor(
        &mut self,
        show_cursor: bool,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.show_cursor(&mut self.config, show_cursor)?;
        Ok(self)
    }

    /// Set the cursor blinking.
    pub fn blink_cursor(
        &mut self,
        blink_cursor: bool,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.blink_cursor(&mut self.config, blink_cursor)?;
        Ok(self)
    }

    /// Set the display visibility. The text stays in DDRAM while the display is off.
    pub fn show_display(
        &mut self,
        show_display: bool,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.show_display(&mut self.config, show_display)?;
        Ok(self)
    }

    /// Scroll the display to the left.
    pub fn scroll_display_left(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.scroll_display_left(&mut self.config)?;
        Ok(self)
    }

    /// Scroll the display to the right.
    pub fn scroll_display_right(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.scroll_display_right(&mut self.config)?;
        Ok(self)
    }

    /// Set the text flow direction to left to right.
    pub fn left_to_right(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.left_to_right(&mut self.config)?;
        Ok(self)
    }

    /// Set the text flow direction to right to left.
    pub fn right_to_left(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.right_to_left(&mut self.config)?;
        Ok(self)
    }

    /// Set the auto scroll mode.
    pub fn autoscroll(
        &mut self,
        autoscroll: bool,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.autoscroll(&mut self.config, autoscroll)?;
        Ok(self)
    }

    /// Create a new custom character. `charmap` holds one byte per pixel row, 8 rows for the 5x8 font and
    /// 10 for 5x10. Follow with `set_cursor` before printing.
    ///
    /// With the 5x8 font the glyph in slot `location` prints as character code `location`. With the 5x10
    /// font slot `location` prints as code `2 * location` (the controller ignores bit 0 of the code), see
    /// [`LcdFontSize::custom_char_code`].
    pub fn create_char(
        &mut self,
        location: u8,
        charmap: &[u8],
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.create_char(&mut self.config, location, charmap)?;
        Ok(self)
    }

    /// Writes a raw character code at the current cursor position.
    pub fn write_byte(&mut self, value: u8) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.write_byte(&mut self.config, value)?;
        Ok(self)
    }

    /// Prints a string to the LCD at the current cursor position.
    pub fn print(&mut self, text: &str) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        self.driver.print(&mut self.config, text)?;
        Ok(self)
    }

    /// Turn the backlight on or off. Allowed before `begin`.
    pub fn backlight(&mut self, on: bool) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_configured()?;
        self.driver.set_backlight(&mut self.config, on)?;
        Ok(self)
    }

    /// Shows the text kept in DDRAM and turns the backlight on.
    pub fn display_on(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.show_display(true)?.backlight(true)
    }

    /// Turns the backlight off and blanks the display. The text stays in DDRAM.
    pub fn display_off(&mut self) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.backlight(false)?.show_display(false)
    }

    /// Draws a horizontal bar graph on one row: `name` in the first column followed by solid blocks
    /// proportional to `value / max_value` and spaces to the end of the row.
    pub fn print_horizontal_graph(
        &mut self,
        name: u8,
        row: u8,
        value: u16,
        max_value: u16,
    ) -> Result<&mut Self, CharacterDisplayError<I2C>> {
        self.ensure_ready()?;
        let columns = self.driver.geometry().columns();
        let bars = if max_value == 0 {
            0
        } else {
            (value.min(max_value) as u32 * columns as u32 / max_value as u32) as u8
        };

        self.driver.set_cursor(&mut self.config, 0, row)?;
        self.driver.write_byte(&mut self.config, name)?;
        for col in 1..columns {
            // 0xFF is the built in solid block, 0x20 a space
            let glyph = if col < bars { 0xFF } else { 0x20 };
            self.driver.write_byte(&mut self.config, glyph)?;
        }
        Ok(self)
    }
}

/// Implement the `core::fmt::Write` trait for the display, allowing it to be used with the `write!` macro.
/// This is a convenience method for printing to the display.
impl<I2C, DELAY, ADAPTER> core::fmt::Write for BaseCharacterDisplay<I2C, DELAY, ADAPTER>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
    ADAPTER: HD44780AdapterTrait<I2C, DELAY>,
{
    fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
        if let Err(_e) = self.print(s) {
            return Err(core::fmt::Error);
        }
        Ok(())
    }
}

#[cfg(feature = "ufmt")]
/// Implement the `ufmt::uWrite` trait for the display, allowing it to be used with the `uwriteln!` and `uwrite!` macros.
impl<I2C, DELAY, ADAPTER> ufmt::uWrite for BaseCharacterDisplay<I2C, DELAY, ADAPTER>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
    ADAPTER: HD44780AdapterTrait<I2C, DELAY>,
{
    fn write_str(&mut self, s: &str) -> Result<(), CharacterDisplayError<I2C>> {
        self.print(s)?;
        Ok(())
    }

    type Error = CharacterDisplayError<I2C>;
}
