//! Content fingerprints for deduplication.
//!
//! `hash = CRC32("{time_of_day}|{nick}|{message_normalized}")`, rendered as
//! eight upper-case hex digits. CRC32 is not collision resistant; it is
//! kept because stored rows already carry fingerprints in this format.
//!
//! The CRC input is one byte per UTF-16 code unit (its low eight bits), not
//! the UTF-8 encoding. For ASCII the two agree; for a nick like `jötä` only
//! the code-unit form reproduces the stored fingerprints.

/// IEEE 802.3 CRC32 lookup table (reflected polynomial `0xEDB88320`).
const CRC32_TABLE: [u32; 256] = generate_crc32_table();

const fn generate_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC32 (IEEE) of a byte slice.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in bytes {
        let idx = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = CRC32_TABLE[idx] ^ (crc >> 8);
    }
    !crc
}

/// Low byte of every UTF-16 code unit of `text`.
fn code_unit_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().map(|unit| unit as u8).collect()
}

/// Fingerprint of a canonical triple.
///
/// `nick` and `message_normalized` must already be normalized; this
/// function does not lowercase or trim.
pub fn content_hash(time_of_day: &str, nick: &str, message_normalized: &str) -> String {
    let combined = format!("{}|{}|{}", time_of_day, nick, message_normalized);
    format!("{:08X}", crc32(&code_unit_bytes(&combined)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn content_hash_is_stable() {
        let a = content_hash("07:07:08", "jotasiete", "iron lump 1s");
        let b = content_hash("07:07:08", "jotasiete", "iron lump 1s");
        assert_eq!(a, b);
        assert_eq!(a, "3C978729");
    }

    #[test]
    fn content_hash_is_zero_padded_upper_hex() {
        let h = content_hash("00:00:00", "a", "b");
        assert_eq!(h.len(), 8);
        assert!(h
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn non_ascii_nick_hashes_code_units() {
        assert_eq!(content_hash("07:07:08", "jötä", "iron lump 1s"), "30209C96");
        // UTF-8 bytes would give a different value
        let utf8 = format!("{:08X}", crc32("07:07:08|jötä|iron lump 1s".as_bytes()));
        assert_eq!(utf8, "DBBCBAC2");
    }

    #[test]
    fn any_field_changes_the_hash() {
        let base = content_hash("07:07:08", "jotasiete", "iron lump 1s");
        assert_ne!(base, content_hash("07:07:09", "jotasiete", "iron lump 1s"));
        assert_ne!(base, content_hash("07:07:08", "jota", "iron lump 1s"));
        assert_ne!(base, content_hash("07:07:08", "jotasiete", "iron lump 2s"));
    }
}
