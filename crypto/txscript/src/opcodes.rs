//! The opcode values used by standard locking and unlocking scripts.

#[allow(non_upper_case_globals)]
pub mod codes {
    pub const Op0: u8 = 0x00;
    pub const OpData1: u8 = 0x01;
    pub const OpData20: u8 = 0x14;
    pub const OpData32: u8 = 0x20;
    pub const OpData33: u8 = 0x21;
    pub const OpData75: u8 = 0x4b;
    pub const OpPushData1: u8 = 0x4c;
    pub const OpPushData2: u8 = 0x4d;
    pub const OpPushData4: u8 = 0x4e;
    pub const Op1Negate: u8 = 0x4f;
    pub const Op1: u8 = 0x51;
    pub const Op16: u8 = 0x60;
    pub const OpReturn: u8 = 0x6a;
    pub const OpDup: u8 = 0x76;
    pub const OpEqual: u8 = 0x87;
    pub const OpEqualVerify: u8 = 0x88;
    pub const OpHash160: u8 = 0xa9;
    pub const OpCheckSig: u8 = 0xac;
    pub const OpCheckMultiSig: u8 = 0xae;
}

/// Largest value representable by a direct `OpData#` push.
pub const OP_DATA_MAX_VAL: u8 = codes::OpData75;
/// Smallest `OpData#` opcode.
pub const OP_DATA_MIN_VAL: u8 = codes::OpData1;
/// Largest small integer with a dedicated opcode.
pub const OP_SMALL_INT_MAX_VAL: u8 = 16;
/// The value pushed by `Op1Negate`.
pub const OP_1_NEGATE_VAL: u8 = 0x81;
