//! Mirrored copy of the controller's writable configuration window

use crate::reg;

/// Size in bytes of the window spanning `CONFIG_START..=CONFIG_CHECKSUM`
pub(crate) const CONFIG_SIZE: usize = (reg::CONFIG_CHECKSUM - reg::CONFIG_START + 1) as usize;

const CHECKSUM_OFFSET: usize = (reg::CONFIG_CHECKSUM - reg::CONFIG_START) as usize;

/// Byte-addressed mirror of the configuration block, indexed by
/// `register − CONFIG_START`
///
/// The controller refuses to apply a block whose checksum byte does not
/// balance the rest of the block modulo 256, so every mutation must be
/// followed by a checksum recompute before the block is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConfigMirror {
    bytes: [u8; CONFIG_SIZE],
}

impl ConfigMirror {
    pub(crate) fn from_bytes(bytes: [u8; CONFIG_SIZE]) -> Self {
        Self { bytes }
    }

    pub(crate) fn get(&self, register: u16) -> u8 {
        self.bytes[offset(register)]
    }

    pub(crate) fn set(&mut self, register: u16, value: u8) {
        self.bytes[offset(register)] = value;
    }

    /// Two's-complement negation of the sum of every byte except the
    /// checksum slot, truncated to one byte
    pub(crate) fn checksum(&self) -> u8 {
        let mut sum = 0u8;
        for byte in &self.bytes[..CHECKSUM_OFFSET] {
            sum = sum.wrapping_add(*byte);
        }

        sum.wrapping_neg()
    }
}

impl Default for ConfigMirror {
    fn default() -> Self {
        Self {
            bytes: [0; CONFIG_SIZE],
        }
    }
}

fn offset(register: u16) -> usize {
    debug_assert!((reg::CONFIG_START..=reg::CONFIG_CHECKSUM).contains(&register));

    usize::from(register - reg::CONFIG_START)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterned() -> ConfigMirror {
        let mut bytes = [0u8; CONFIG_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(37);
        }

        ConfigMirror::from_bytes(bytes)
    }

    #[test]
    fn checksum_balances_the_block() {
        let mut mirror = patterned();
        let checksum = mirror.checksum();
        mirror.set(reg::CONFIG_CHECKSUM, checksum);

        let mut sum = 0u8;
        for register in reg::CONFIG_START..=reg::CONFIG_CHECKSUM {
            sum = sum.wrapping_add(mirror.get(register));
        }

        assert_eq!(sum, 0);
    }

    #[test]
    fn checksum_ignores_the_checksum_slot() {
        let mut mirror = patterned();
        let before = mirror.checksum();

        mirror.set(reg::CONFIG_CHECKSUM, 0xAB);

        assert_eq!(mirror.checksum(), before);
    }

    #[test]
    fn checksum_tracks_every_mutation() {
        let mut mirror = patterned();
        let before = mirror.checksum();

        mirror.set(reg::TOUCH_NUMBER, mirror.get(reg::TOUCH_NUMBER).wrapping_add(1));

        assert_eq!(mirror.checksum(), before.wrapping_sub(1));
    }

    #[test]
    fn registers_index_from_the_window_start() {
        let mut mirror = ConfigMirror::default();

        mirror.set(reg::X_OUTPUT_MAX_LOW, 0x20);

        assert_eq!(mirror.bytes[1], 0x20);
        assert_eq!(mirror.get(reg::X_OUTPUT_MAX_LOW), 0x20);
    }
}
