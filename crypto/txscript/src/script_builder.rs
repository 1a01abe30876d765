use std::iter::once;

use crate::{
    opcodes::{codes::*, OP_1_NEGATE_VAL, OP_DATA_MAX_VAL, OP_DATA_MIN_VAL, OP_SMALL_INT_MAX_VAL},
    MAX_SCRIPTS_SIZE, MAX_SCRIPT_ELEMENT_SIZE,
};
use thiserror::Error;

/// Default size used for the backing array of a script being built. The
/// array grows as needed, but this covers the vast majority of scripts
/// without reallocation.
const DEFAULT_SCRIPT_ALLOC: usize = 512;

#[derive(Error, PartialEq, Eq, Debug, Clone, Copy)]
pub enum ScriptBuilderError {
    #[error("adding opcode {0} would exceed the maximum allowed canonical script length of {MAX_SCRIPTS_SIZE}")]
    OpCodeRejected(u8),

    #[error("adding {0} bytes of data would exceed the maximum allowed canonical script length of {MAX_SCRIPTS_SIZE}")]
    DataRejected(usize),

    #[error("adding a data element of {0} bytes exceed the maximum allowed script element size of {MAX_SCRIPT_ELEMENT_SIZE}")]
    ElementExceedsMaxSize(usize),
}
pub type ScriptBuilderResult<T> = std::result::Result<T, ScriptBuilderError>;

/// ScriptBuilder provides a facility for building custom scripts. It allows
/// you to push opcodes and data while respecting canonical encoding. Data
/// pushes which would exceed the maximum allowed script engine limits, and
/// are therefore guaranteed not to execute, are rejected with an error.
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self { script: Vec::with_capacity(DEFAULT_SCRIPT_ALLOC) }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn drain(&mut self) -> Vec<u8> {
        // The internal script, when taken, is replaced by a vector with no
        // predefined capacity because the builder is not supposed to be
        // reused after a call to drain.
        std::mem::take(&mut self.script)
    }

    /// Pushes the passed opcode to the end of the script. The script will
    /// not be modified if pushing the opcode would cause it to exceed the
    /// maximum allowed script engine size.
    pub fn add_op(&mut self, opcode: u8) -> ScriptBuilderResult<&mut Self> {
        if self.script.len() >= MAX_SCRIPTS_SIZE {
            return Err(ScriptBuilderError::OpCodeRejected(opcode));
        }

        self.script.push(opcode);
        Ok(self)
    }

    /// Returns the number of bytes the canonical encoding of the data will take.
    pub fn canonical_data_size(data: &[u8]) -> usize {
        let data_len = data.len();

        // A single byte representable by a small-integer opcode takes one
        // byte in total.
        if data_len == 0 || (data_len == 1 && (data[0] <= OP_SMALL_INT_MAX_VAL || data[0] == OP_1_NEGATE_VAL)) {
            return 1;
        }

        data_len
            + if data_len <= OP_DATA_MAX_VAL as usize {
                1 // length encoded as OpData#
            } else if data_len <= u8::MAX as usize {
                2 // length encoded as OpPushData1 + 1 byte for value
            } else if data_len <= u16::MAX as usize {
                3 // length encoded as OpPushData2 + 2 bytes for value
            } else {
                5 // length encoded as OpPushData4 + 4 bytes for value
            }
    }

    /// Internal push that chooses canonical opcodes depending on the length
    /// of the data. A zero length buffer leads to a push of empty data onto
    /// the stack (Op0). No data limits are enforced here.
    fn add_raw_data(&mut self, data: &[u8]) -> &mut Self {
        let data_len = data.len();

        // Use the small-integer and 1-negate opcodes where the data is a
        // single representable byte.
        if data_len == 0 || (data_len == 1 && data[0] == 0) {
            self.script.push(Op0);
            return self;
        } else if data_len == 1 && data[0] <= OP_SMALL_INT_MAX_VAL {
            self.script.push((Op1 - 1) + data[0]);
            return self;
        } else if data_len == 1 && data[0] == OP_1_NEGATE_VAL {
            self.script.push(Op1Negate);
            return self;
        }

        // Use a direct OpData# opcode while the length fits a single byte
        // instruction, otherwise the smallest possible OpPushData# form.
        if data_len <= OP_DATA_MAX_VAL as usize {
            self.script.push((OP_DATA_MIN_VAL - 1) + data_len as u8);
        } else if data_len <= u8::MAX as usize {
            self.script.extend(once(OpPushData1).chain(once(data_len as u8)));
        } else if data_len <= u16::MAX as usize {
            self.script.extend(once(OpPushData2).chain((data_len as u16).to_le_bytes()));
        } else {
            self.script.extend(once(OpPushData4).chain((data_len as u32).to_le_bytes()));
        }

        self.script.extend(data);
        self
    }

    /// Pushes the passed data to the end of the script, choosing canonical
    /// opcodes depending on its length. A push larger than
    /// [`MAX_SCRIPT_ELEMENT_SIZE`] or one that would grow the script past
    /// [`MAX_SCRIPTS_SIZE`] leaves the script unmodified and errors.
    pub fn add_data(&mut self, data: &[u8]) -> ScriptBuilderResult<&mut Self> {
        let data_size = Self::canonical_data_size(data);
        if self.script.len() + data_size > MAX_SCRIPTS_SIZE {
            return Err(ScriptBuilderError::DataRejected(data_size));
        }

        let data_len = data.len();
        if data_len > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptBuilderError::ElementExceedsMaxSize(data_len));
        }

        Ok(self.add_raw_data(data))
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_add_op() {
        let mut builder = ScriptBuilder::new();
        builder.add_op(OpDup).unwrap().add_op(OpHash160).unwrap();
        assert_eq!(builder.script(), &[OpDup, OpHash160]);
    }

    #[test]
    fn test_add_data_canonical_forms() {
        struct Test {
            name: &'static str,
            data: Vec<u8>,
            expected: Vec<u8>,
        }

        let tests = vec![
            Test { name: "empty push", data: vec![], expected: vec![Op0] },
            Test { name: "small int 1", data: vec![1], expected: vec![Op1] },
            Test { name: "small int 16", data: vec![16], expected: vec![Op16] },
            Test { name: "1-negate", data: vec![0x81], expected: vec![Op1Negate] },
            Test { name: "single data byte", data: vec![0x42], expected: vec![OpData1, 0x42] },
            Test { name: "20 bytes", data: vec![0xaa; 20], expected: [vec![OpData20], vec![0xaa; 20]].concat() },
            Test { name: "75 bytes", data: vec![0xbb; 75], expected: [vec![OpData75], vec![0xbb; 75]].concat() },
            Test { name: "76 bytes", data: vec![0xcc; 76], expected: [vec![OpPushData1, 76], vec![0xcc; 76]].concat() },
            Test { name: "256 bytes", data: vec![0xdd; 256], expected: [vec![OpPushData2, 0x00, 0x01], vec![0xdd; 256]].concat() },
        ];

        for test in tests {
            let mut builder = ScriptBuilder::new();
            builder.add_data(&test.data).unwrap();
            assert_eq!(builder.drain(), test.expected, "canonical push failed for '{}'", test.name);
        }
    }

    #[test]
    fn test_add_data_limits() {
        let mut builder = ScriptBuilder::new();
        assert_eq!(
            builder.add_data(&vec![0u8; MAX_SCRIPT_ELEMENT_SIZE + 1]).map(|_| ()).unwrap_err(),
            ScriptBuilderError::ElementExceedsMaxSize(MAX_SCRIPT_ELEMENT_SIZE + 1)
        );
        assert!(builder.script().is_empty());
    }

    #[test]
    fn test_drain() {
        let mut builder = ScriptBuilder::new();
        builder.add_data(&hex!("751e76e8199196d454941c45d1b3a323f1433bd6")).unwrap();
        assert_eq!(builder.drain(), hex!("14751e76e8199196d454941c45d1b3a323f1433bd6"));
        assert!(builder.script().is_empty());
    }
}
