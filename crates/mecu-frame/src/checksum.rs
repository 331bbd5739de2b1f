//! Frame integrity code.
//!
//! Two running sums modulo 255 packed as `(b << 8) | a`. Despite the
//! device documentation calling it a CRC, this is a Fletcher-16 variant.

const MODULUS: u16 = 255;

/// Incremental checksum accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    a: u16,
    b: u16,
}

impl Checksum {
    /// Fresh accumulator.
    pub const fn new() -> Self {
        Self { a: 0, b: 0 }
    }

    /// Feed one byte.
    pub fn update_byte(&mut self, byte: u8) {
        self.a = (self.a + u16::from(byte)) % MODULUS;
        self.b = (self.b + self.a) % MODULUS;
    }

    /// Feed a slice of bytes in order.
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.update_byte(byte);
        }
    }

    /// Final 16-bit value.
    pub const fn finish(self) -> u16 {
        (self.b << 8) | self.a
    }
}

/// Checksum of an arbitrary byte sequence.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut sum = Checksum::new();
    sum.update(bytes);
    sum.finish()
}

/// Checksum of a frame body: type, class and command codes followed by the payload.
pub fn frame_checksum(message_type: u8, message_class: u8, command: u8, payload: &[u8]) -> u16 {
    let mut sum = Checksum::new();
    sum.update(&[message_type, message_class, command]);
    sum.update(payload);
    sum.finish()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn known_frame_bodies() {
        // System / Get ECU Info request.
        assert_eq!(checksum(&[0x00, 0x04, 0x00]), 0x0804);
        // System / Get Hash, detailed.
        assert_eq!(checksum(&[0x00, 0x04, 0x01, 0x01]), 0x0f06);
        // Reporting / Send Ack.
        assert_eq!(checksum(&[0x00, 0x00, 0x01, 0x00]), 0x0201);
    }

    #[test]
    fn frame_checksum_matches_flat_input() {
        let payload = [0x10, 0x20, 0x30];
        assert_eq!(
            frame_checksum(0x0F, 0x00, 0x02, &payload),
            checksum(&[0x0F, 0x00, 0x02, 0x10, 0x20, 0x30])
        );
    }

    #[test]
    fn modulus_is_255_not_256() {
        // 0xFF is congruent to zero, so `a` never moves.
        assert_eq!(checksum(&[0xFF; 32]), 0);
        // A modulus of 256 would give 0xFDFF here.
        assert_eq!(checksum(&[0xFE, 0x01]), 0xFE00);
    }

    #[test]
    fn accumulator_roles_are_not_interchangeable() {
        let data = [0x00, 0x04, 0x00];
        let mut sum = Checksum::new();
        sum.update(&data);
        let swapped = (sum.a << 8) | sum.b;
        assert_ne!(sum.finish(), swapped);
    }

    #[test]
    fn incremental_equals_one_shot() {
        let data = b"telemetry stream";
        let mut sum = Checksum::new();
        sum.update(&data[..5]);
        sum.update(&data[5..]);
        assert_eq!(sum.finish(), checksum(data));
    }

    #[test]
    fn reordering_changes_value() {
        assert_ne!(checksum(&[0x01, 0x02, 0x03]), checksum(&[0x03, 0x02, 0x01]));
        assert_ne!(checksum(&[0x0F, 0x00]), checksum(&[0x00, 0x0F]));
    }

    proptest! {
        #[test]
        fn swapping_distinct_adjacent_bytes_changes_checksum(
            prefix in proptest::collection::vec(any::<u8>(), 0..64),
            x in 0u8..255,
            y in 0u8..255,
        ) {
            prop_assume!(x != y);
            let mut forward = prefix.clone();
            forward.extend_from_slice(&[x, y]);
            let mut reversed = prefix;
            reversed.extend_from_slice(&[y, x]);
            prop_assert_ne!(checksum(&forward), checksum(&reversed));
        }
    }
}
