//! Wire-level constants for the exchange protocol.
//!
//! The 16-byte header layout is fixed regardless of body serializer:
//!
//! | offset | size | field                                                |
//! |--------|------|------------------------------------------------------|
//! | 0      | 2    | magic `0xdabb`                                       |
//! | 2      | 1    | flags: request, two-way, event, serializer id        |
//! | 3      | 1    | status (responses only)                              |
//! | 4      | 8    | message id                                           |
//! | 12     | 4    | body length                                          |
//!
//! All integers are big-endian.

/// Total header length in bytes.
pub const HEADER_LENGTH: usize = 16;

/// Frame magic.
pub const MAGIC: u16 = 0xdabb;

/// High byte of the magic, first on the wire.
pub const MAGIC_HIGH: u8 = (MAGIC >> 8) as u8;

/// Low byte of the magic.
pub const MAGIC_LOW: u8 = (MAGIC & 0xff) as u8;

/// Flag bit: the frame carries a request (clear means response).
pub const FLAG_REQUEST: u8 = 0x80;

/// Flag bit: the request expects a response.
pub const FLAG_TWOWAY: u8 = 0x40;

/// Flag bit: the frame is an event (heartbeat or control message).
pub const FLAG_EVENT: u8 = 0x20;

/// Low five flag bits carry the body serializer id.
pub const SERIALIZATION_MASK: u8 = 0x1f;

/// URL parameter bounding the body size of a single frame.
pub const PAYLOAD_KEY: &str = "payload";

/// Default payload bound (8 MiB). Fixed limit prevents a single frame from
/// exhausting memory on either side of the connection.
pub const DEFAULT_PAYLOAD: usize = 8 * 1024 * 1024;

/// URL parameter naming the body serializer for outbound frames.
pub const SERIALIZATION_KEY: &str = "serialization";

/// Serializer used when the URL names none.
pub const DEFAULT_SERIALIZATION: &str = "postcard";

/// URL parameter naming the codec implementation.
pub const CODEC_KEY: &str = "codec";

/// Protocol version stamped on requests.
pub const DEFAULT_VERSION: &str = "2.0.0";

/// Longest error message a replacement BAD_RESPONSE frame will carry; the
/// replacement must never trip the payload check itself.
pub const ERROR_MESSAGE_LIMIT: usize = 512;

/// Default time a caller waits on a correlated response.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_split_correctly() {
        assert_eq!(MAGIC_HIGH, 0xda);
        assert_eq!(MAGIC_LOW, 0xbb);
        assert_eq!(u16::from_be_bytes([MAGIC_HIGH, MAGIC_LOW]), MAGIC);
    }

    #[test]
    fn flag_bits_do_not_overlap_the_serializer_mask() {
        assert_eq!(FLAG_REQUEST & SERIALIZATION_MASK, 0);
        assert_eq!(FLAG_TWOWAY & SERIALIZATION_MASK, 0);
        assert_eq!(FLAG_EVENT & SERIALIZATION_MASK, 0);
    }
}
