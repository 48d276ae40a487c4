//! GT911 Multi-Touch Touchscreen Controller

#![no_std]

use core::fmt::Debug;

use bondrewd::Bitfields;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use crate::config::{ConfigMirror, CONFIG_SIZE};

mod config;
pub mod reg;

// The controller never reports more than 5 simultaneous contacts
const MAX_TOUCH_POINTS: usize = 5;

/// Any type of error which may occur while interacting with the device
#[derive(Debug)]
pub enum Error<E> {
    /// Some error originating from the communication bus
    BusError(E),
    /// The device's native width or height is zero, so coordinates cannot be
    /// scaled
    InvalidDimensions,
}

/// The two bus addresses the controller can strap to during reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// 0x5D, selected by holding the interrupt line low through reset
    Primary,
    /// 0x14, selected by holding the interrupt line high through reset
    Secondary,
}

impl Address {
    /// The 7-bit bus address
    pub fn value(self) -> u8 {
        match self {
            Address::Primary => 0x5D,
            Address::Secondary => 0x14,
        }
    }

    // Level driven on the interrupt strap while reset is released.
    fn strap_level(self) -> bool {
        self == Address::Secondary
    }
}

/// Orientation correction applied to decoded points
///
/// Alters only the software interpretation of coordinates, never the
/// device's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Panel rotated left
    Left = 0,
    /// Panel mounted upside down
    Inverted = 1,
    /// Panel rotated right
    Right = 2,
    /// Panel in its natural orientation
    Normal = 3,
}

impl Rotation {
    /// Decode a raw orientation value; values outside `0..=3` are rejected
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Rotation::Left),
            1 => Some(Rotation::Inverted),
            2 => Some(Rotation::Right),
            3 => Some(Rotation::Normal),
            _ => None,
        }
    }

    // Maps device-space coordinates for a panel of the given native size.
    fn transform(self, x: u16, y: u16, width: u16, height: u16) -> (u16, u16) {
        match self {
            Rotation::Normal => (width.saturating_sub(x), height.saturating_sub(y)),
            Rotation::Left => (width.saturating_sub(y), x),
            Rotation::Inverted => (x, y),
            Rotation::Right => (y, height.saturating_sub(x)),
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::Normal
    }
}

/// Status byte preceding the point records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Bitfields)]
#[bondrewd(default_endianness = "le")]
pub struct PointInfo {
    /// The coordinate buffer holds a fresh report
    #[bondrewd(bit_length = 1)]
    pub buffer_ready: u8,
    /// A large conductive object covers the panel
    #[bondrewd(bit_length = 1)]
    pub large_object: u8,
    /// Proximity sensing result is valid
    #[bondrewd(bit_length = 1)]
    pub proximity_valid: u8,
    /// A touch key is pressed
    #[bondrewd(bit_length = 1)]
    pub key_present: u8,
    /// Number of contacts in the report
    #[bondrewd(bit_length = 4)]
    pub touch_count: u8,
}

/// The fixed 7-byte wire encoding of one touch contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Bitfields)]
#[bondrewd(default_endianness = "le")]
pub struct PointRecord {
    /// Controller-assigned tracking slot
    pub track_id: u8,
    /// Horizontal position in device space
    pub x: u16,
    /// Vertical position in device space
    pub y: u16,
    /// Contact area, a proxy for pressure
    pub size: u16,
}

/// A decoded touch contact with the orientation correction applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchPoint {
    /// Controller-assigned tracking slot (0–31)
    pub id: u8,
    /// Horizontal position
    pub x: u16,
    /// Vertical position
    pub y: u16,
    /// Contact area, a proxy for pressure
    pub size: u16,
}

/// GT911 driver
pub struct GT911<I2C, INT, RST> {
    /// Underlying I²C peripheral
    i2c: I2C,
    /// Bus address selected by the reset strap
    address: Address,
    /// Interrupt line, driven only as the address strap during bring-up
    int: Option<INT>,
    /// Reset line
    rst: Option<RST>,
    /// Device-native horizontal resolution
    width: u16,
    /// Device-native vertical resolution
    height: u16,
    /// Orientation correction for decoded points
    rotation: Rotation,
    /// Mirror of the controller's writable configuration window
    config: ConfigMirror,
    /// Whether the last report contained any contacts
    touched: bool,
    /// Whether the controller flagged a large conductive object
    large_object: bool,
    /// Number of valid entries at the front of `points`
    touch_count: u8,
    /// Decoded contacts; only the first `touch_count` entries are valid
    points: [TouchPoint; MAX_TOUCH_POINTS],
}

impl<I2C, INT, RST, E> GT911<I2C, INT, RST>
where
    I2C: I2c<Error = E>,
    INT: OutputPin,
    RST: OutputPin,
    E: Debug,
{
    /// Create a new instance of the driver and bring the device up
    ///
    /// Runs the timed reset sequence, mirrors the device's configuration
    /// block and applies the requested native resolution. Either control
    /// line may be passed as `None` when it is not wired to a usable pin.
    ///
    /// The bus implementation is expected to bound every transaction with
    /// its own timeout (1000 ms in the reference configuration); the driver
    /// performs no retries of its own.
    pub async fn new<D>(
        i2c: I2C,
        address: Address,
        int: Option<INT>,
        rst: Option<RST>,
        width: u16,
        height: u16,
        delay: &mut D,
    ) -> Result<Self, Error<E>>
    where
        D: DelayNs,
    {
        let mut device = Self {
            i2c,
            address,
            int,
            rst,
            width,
            height,
            rotation: Rotation::default(),
            config: ConfigMirror::default(),
            touched: false,
            large_object: false,
            touch_count: 0,
            points: [TouchPoint::default(); MAX_TOUCH_POINTS],
        };

        device.reset(delay).await?;

        Ok(device)
    }

    /// Run the hardware reset sequence and re-mirror the configuration block
    ///
    /// The interrupt line doubles as the address-select strap and is sampled
    /// by the controller while reset is released, so the hold times below
    /// must not be shortened. Once the sequence has finished the controller
    /// drives the line itself; reclaim the pin with [`GT911::release_int`]
    /// and reconfigure it as an input.
    pub async fn reset<D>(&mut self, delay: &mut D) -> Result<(), Error<E>>
    where
        D: DelayNs,
    {
        let strap = self.address.strap_level();

        self.drive_int(false);
        self.drive_rst(false);
        delay.delay_ms(10).await;

        self.drive_int(strap);
        delay.delay_ms(1).await;

        self.drive_rst(true);
        delay.delay_ms(5).await;

        self.drive_int(false);
        delay.delay_ms(50).await;

        // Quiet period while the controller takes over the interrupt line.
        delay.delay_ms(50).await;

        let mut block = [0u8; CONFIG_SIZE];
        self.read_block(reg::CONFIG_START, &mut block).await?;
        self.config = ConfigMirror::from_bytes(block);

        self.set_resolution(self.width, self.height).await
    }

    /// Update the device-native resolution
    ///
    /// The four resolution bytes land in the mirrored configuration window
    /// first and the block is then committed, so a failed commit leaves the
    /// mirror ahead of the device. Treat that as fatal for the handle and
    /// re-run [`GT911::reset`] rather than retrying.
    pub async fn set_resolution(&mut self, width: u16, height: u16) -> Result<(), Error<E>> {
        self.width = width;
        self.height = height;

        self.config.set(reg::X_OUTPUT_MAX_LOW, width as u8);
        self.config.set(reg::X_OUTPUT_MAX_HIGH, (width >> 8) as u8);
        self.config.set(reg::Y_OUTPUT_MAX_LOW, height as u8);
        self.config.set(reg::Y_OUTPUT_MAX_HIGH, (height >> 8) as u8);

        self.reflash_config().await
    }

    /// Set the orientation correction; a pure local state update
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    /// Decode one touch report
    ///
    /// Reads the point-info register, the advertised point records (at most
    /// five) and acknowledges the report by clearing the register. On an
    /// error partway through the cycle the point set must not be used; only
    /// the touched flag reflects the status byte that was read.
    pub async fn read(&mut self) -> Result<(), Error<E>> {
        let info = PointInfo::from_bytes([self.read_register(reg::POINT_INFO).await?]);

        self.touched = info.touch_count > 0;
        self.large_object = info.large_object != 0;
        self.touch_count = info.touch_count.min(MAX_TOUCH_POINTS as u8);

        log::debug!(
            "buffer ready: {}, large object: {}, proximity: {}, key: {}, touches: {}",
            info.buffer_ready,
            info.large_object,
            info.proximity_valid,
            info.key_present,
            info.touch_count
        );

        if info.buffer_ready != 0 && self.touched {
            for slot in 0..self.touch_count {
                let mut record = [0u8; 7];
                self.read_block(reg::POINT_1 + u16::from(slot) * reg::POINT_STRIDE, &mut record)
                    .await?;

                let point = self.correct(PointRecord::from_bytes(record));
                log::debug!("touch {}: {:?}", slot, point);
                self.points[usize::from(slot)] = point;
            }
        }

        // Acknowledge the report even when no points were read.
        self.write_register(reg::POINT_INFO, 0).await
    }

    /// Scale a device-space point into the given screen dimensions
    ///
    /// Uses truncating integer division.
    pub fn map_to_screen(
        &self,
        point: TouchPoint,
        screen_width: u16,
        screen_height: u16,
    ) -> Result<(u16, u16), Error<E>> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidDimensions);
        }

        let x = u32::from(point.x) * u32::from(screen_width) / u32::from(self.width);
        let y = u32::from(point.y) * u32::from(screen_height) / u32::from(self.height);

        Ok((x as u16, y as u16))
    }

    /// Read the 4-byte ASCII product identifier
    pub async fn product_id(&mut self) -> Result<[u8; 4], Error<E>> {
        let mut id = [0u8; 4];
        self.read_block(reg::PRODUCT_ID, &mut id).await?;

        Ok(id)
    }

    /// Whether the last decoded report contained any contacts
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// The contacts decoded from the last report
    pub fn points(&self) -> &[TouchPoint] {
        &self.points[..usize::from(self.touch_count)]
    }

    /// Whether the controller flagged a large conductive object
    pub fn large_object(&self) -> bool {
        self.large_object
    }

    /// The device-native resolution
    pub fn resolution(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// The current orientation correction
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Value of a mirrored configuration register, or `None` outside the
    /// configuration window
    pub fn config_value(&self, register: u16) -> Option<u8> {
        if (reg::CONFIG_START..=reg::CONFIG_CHECKSUM).contains(&register) {
            Some(self.config.get(register))
        } else {
            None
        }
    }

    /// Hand the interrupt strap pin back so the platform can reconfigure it
    /// as an input once bring-up has finished
    pub fn release_int(&mut self) -> Option<INT> {
        self.int.take()
    }

    /// Release the bus and both control lines
    pub fn release(self) -> (I2C, Option<INT>, Option<RST>) {
        (self.i2c, self.int, self.rst)
    }

    // -----------------------------------------------------------------------
    // PRIVATE

    // Commits the mirrored block: checksum first, then the config-fresh
    // trigger.
    async fn reflash_config(&mut self) -> Result<(), Error<E>> {
        let checksum = self.config.checksum();
        self.config.set(reg::CONFIG_CHECKSUM, checksum);

        self.write_register(reg::CONFIG_CHECKSUM, checksum).await?;
        self.write_register(reg::CONFIG_FRESH, 1).await
    }

    // Applies the orientation correction to one decoded record.
    fn correct(&self, record: PointRecord) -> TouchPoint {
        let (x, y) = self
            .rotation
            .transform(record.x, record.y, self.width, self.height);

        TouchPoint {
            id: record.track_id,
            x,
            y,
            size: record.size,
        }
    }

    fn drive_int(&mut self, high: bool) {
        if let Some(pin) = self.int.as_mut() {
            drive(pin, high);
        }
    }

    fn drive_rst(&mut self, high: bool) {
        if let Some(pin) = self.rst.as_mut() {
            drive(pin, high);
        }
    }

    async fn write_register(&mut self, register: u16, value: u8) -> Result<(), Error<E>> {
        self.write_block(register, &[value]).await
    }

    async fn write_block(&mut self, register: u16, data: &[u8]) -> Result<(), Error<E>> {
        debug_assert!(data.len() <= 8);

        let mut buffer = [0u8; 2 + 8];
        buffer[0] = (register >> 8) as u8;
        buffer[1] = register as u8;
        buffer[2..2 + data.len()].copy_from_slice(data);

        self.i2c
            .write(self.address.value(), &buffer[..2 + data.len()])
            .await
            .map_err(|e| {
                log::error!("bus write failed at register {:#06x}: {:?}", register, e);
                Error::BusError(e)
            })
    }

    async fn read_register(&mut self, register: u16) -> Result<u8, Error<E>> {
        let mut buffer = [0u8; 1];
        self.read_block(register, &mut buffer).await?;

        Ok(buffer[0])
    }

    // Address write phase followed by a read phase; the bus implementation
    // NACKs the final byte to terminate the transfer.
    async fn read_block(&mut self, register: u16, buffer: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c
            .write_read(self.address.value(), &register.to_be_bytes(), buffer)
            .await
            .map_err(|e| {
                log::error!("bus read failed at register {:#06x}: {:?}", register, e);
                Error::BusError(e)
            })
    }
}

// GPIO failures are not escalated; a line wired as unusable is an expected
// configuration, and the bus traffic that follows surfaces any real fault.
fn drive<P: OutputPin>(pin: &mut P, high: bool) {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.ok();
}
