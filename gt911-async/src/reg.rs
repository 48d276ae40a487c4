//! Device register map
//!
//! These addresses are a bit-exact contract with the controller and must not
//! be altered.

// Real-time command registers (write only)
pub const COMMAND: u16 = 0x8040;
pub const ESD_CHECK: u16 = 0x8041;
pub const COMMAND_CHECK: u16 = 0x8046;

// Writable configuration window
pub const CONFIG_START: u16 = 0x8047;
pub const CONFIG_VERSION: u16 = 0x8047;
pub const X_OUTPUT_MAX_LOW: u16 = 0x8048;
pub const X_OUTPUT_MAX_HIGH: u16 = 0x8049;
pub const Y_OUTPUT_MAX_LOW: u16 = 0x804A;
pub const Y_OUTPUT_MAX_HIGH: u16 = 0x804B;
pub const TOUCH_NUMBER: u16 = 0x804C;
pub const CONFIG_CHECKSUM: u16 = 0x80FF;
pub const CONFIG_FRESH: u16 = 0x8100;

// Coordinate information
pub const PRODUCT_ID: u16 = 0x8140;
pub const POINT_INFO: u16 = 0x814E;
pub const POINT_1: u16 = 0x814F;
pub const POINT_2: u16 = 0x8157;
pub const POINT_3: u16 = 0x815F;
pub const POINT_4: u16 = 0x8167;
pub const POINT_5: u16 = 0x816F;

/// Register stride between consecutive point record slots
pub const POINT_STRIDE: u16 = 8;
