//! Minimal deterministic CBOR writer for remote-call envelopes.
//!
//! Only the subset the envelopes need is implemented: unsigned integers,
//! byte strings, text strings, arrays, and text-keyed maps, always in
//! definite-length form. Encoding is deterministic by construction — the
//! shortest head is always chosen and map entries are written in the
//! order supplied by the caller, who keeps them sorted.

use crate::tx::request::Value;

/// CBOR major types, shifted into the high bits of the head byte.
const MAJOR_UNSIGNED: u8 = 0 << 5;
const MAJOR_BYTES: u8 = 2 << 5;
const MAJOR_TEXT: u8 = 3 << 5;
const MAJOR_ARRAY: u8 = 4 << 5;
const MAJOR_MAP: u8 = 5 << 5;

/// The self-describe tag (55799) every envelope leads with, so receivers
/// can recognize the payload as CBOR from its first bytes.
pub const SELF_DESCRIBE: [u8; 3] = [0xd9, 0xd9, 0xf7];

#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(256) }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn self_describe(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&SELF_DESCRIBE);
        self
    }

    fn write_head(&mut self, major: u8, value: u64) {
        match value {
            0..=23 => self.buf.push(major | value as u8),
            24..=0xff => {
                self.buf.push(major | 24);
                self.buf.push(value as u8);
            }
            0x100..=0xffff => {
                self.buf.push(major | 25);
                self.buf.extend_from_slice(&(value as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.buf.push(major | 26);
                self.buf.extend_from_slice(&(value as u32).to_be_bytes());
            }
            _ => {
                self.buf.push(major | 27);
                self.buf.extend_from_slice(&value.to_be_bytes());
            }
        }
    }

    pub fn write_unsigned(&mut self, value: u64) -> &mut Self {
        self.write_head(MAJOR_UNSIGNED, value);
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_head(MAJOR_BYTES, bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_text(&mut self, text: &str) -> &mut Self {
        self.write_head(MAJOR_TEXT, text.len() as u64);
        self.buf.extend_from_slice(text.as_bytes());
        self
    }

    pub fn write_array_header(&mut self, len: usize) -> &mut Self {
        self.write_head(MAJOR_ARRAY, len as u64);
        self
    }

    pub fn write_map_header(&mut self, len: usize) -> &mut Self {
        self.write_head(MAJOR_MAP, len as u64);
        self
    }

    pub fn write_value(&mut self, value: &Value) -> &mut Self {
        match value {
            Value::Nat(n) => self.write_unsigned(*n),
            Value::Bytes(bytes) => self.write_bytes(bytes),
            Value::Text(text) => self.write_text(text),
            Value::Array(items) => {
                self.write_array_header(items.len());
                for item in items {
                    self.write_value(item);
                }
                self
            }
            Value::Map(pairs) => {
                self.write_map_header(pairs.len());
                for (key, item) in pairs {
                    self.write_text(key);
                    self.write_value(item);
                }
                self
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn encode(value: &Value) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_value(value);
        writer.into_bytes()
    }

    #[test]
    fn test_unsigned_heads() {
        assert_eq!(encode(&Value::Nat(0)), hex!("00"));
        assert_eq!(encode(&Value::Nat(23)), hex!("17"));
        assert_eq!(encode(&Value::Nat(24)), hex!("1818"));
        assert_eq!(encode(&Value::Nat(500)), hex!("1901f4"));
        assert_eq!(encode(&Value::Nat(100_000)), hex!("1a000186a0"));
        assert_eq!(encode(&Value::Nat(u64::MAX)), hex!("1bffffffffffffffff"));
    }

    #[test]
    fn test_strings_and_collections() {
        assert_eq!(encode(&Value::Bytes(vec![1, 2, 3])), hex!("43010203"));
        assert_eq!(encode(&Value::Text("abc".to_string())), hex!("63616263"));
        assert_eq!(
            encode(&Value::Array(vec![Value::Nat(1), Value::Text("a".to_string())])),
            hex!("82016161")
        );
        assert_eq!(
            encode(&Value::Map(vec![("a".to_string(), Value::Nat(1))])),
            hex!("a1616101")
        );
    }

    #[test]
    fn test_self_describe_prefix() {
        let mut writer = Writer::new();
        writer.self_describe().write_unsigned(0);
        assert_eq!(writer.into_bytes(), hex!("d9d9f700"));
    }
}
