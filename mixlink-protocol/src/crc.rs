//! CRC-32/MPEG-2
//!
//! - Polynomial: 0x04C11DB7, processed MSB-first
//! - Initial value: 0xFFFFFFFF
//! - No input/output reflection, no final XOR
//!
//! Check value for `"123456789"` is `0x0376E6E7`.

/// Generator polynomial (implicit x^32 term)
pub const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Register value before the first byte
pub const INIT: u32 = 0xFFFF_FFFF;

/// Checksum of `data`
pub const fn crc32_mpeg2(data: &[u8]) -> u32 {
    update(INIT, data)
}

/// Continue a running checksum over `data`
///
/// `update(update(INIT, a), b)` equals the checksum of `a ‖ b`.
pub const fn update(mut crc: u32, data: &[u8]) -> u32 {
    let mut i = 0;
    while i < data.len() {
        crc ^= (data[i] as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        i += 1;
    }
    crc
}
