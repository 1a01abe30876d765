use crate::{AddressError, DecodedAddress};

const CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const REV_CHARSET: [u8; 123] = [
    100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 15, 100, 10, 17, 21, 20, 26, 30, 7, 5, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 29, 100, 24, 13, 25, 9, 8, 23, 100, 18, 22, 31, 27, 19, 100, 1, 0, 3, 16, 11, 28, 12, 14, 6, 4, 2,
];

// BIP-173 checksum generator
const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

fn polymod<'data, I>(values: I) -> u32
where
    I: Iterator<Item = &'data u8>,
{
    let mut chk = 1u32;
    for v in values {
        let b = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ (*v as u32);
        for (i, coeff) in GEN.iter().enumerate() {
            if (b >> i) & 1 != 0 {
                chk ^= coeff;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    hrp.bytes()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(hrp.bytes().map(|b| b & 0x1f))
        .collect()
}

fn verify_checksum(hrp: &str, data: &[u8]) -> bool {
    polymod(hrp_expand(hrp).iter().chain(data.iter())) == 1
}

// Convert 5 bit groups to 8 bit bytes, rejecting incomplete or non-zero
// padding per BIP-173.
fn conv5to8(payload: &[u8]) -> Result<Vec<u8>, AddressError> {
    let mut acc = 0u32;
    let mut bits = 0u32;
    let mut out = Vec::with_capacity(payload.len() * 5 / 8);
    for v in payload {
        acc = (acc << 5) | (*v as u32);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    if bits >= 5 || (acc & ((1 << bits) - 1)) != 0 {
        return Err(AddressError::Bech32Format);
    }
    Ok(out)
}

/// Decodes a BIP-173 segwit address with the given human readable part.
pub(crate) fn decode_segwit(address: &str, hrp: &str) -> Result<DecodedAddress, AddressError> {
    // mixed case is invalid outright
    if address.bytes().any(|b| b.is_ascii_uppercase()) && address.bytes().any(|b| b.is_ascii_lowercase()) {
        return Err(AddressError::Bech32Format);
    }
    let address = address.to_ascii_lowercase();

    let (found_hrp, data_part) = address.rsplit_once('1').ok_or(AddressError::Bech32Format)?;
    if found_hrp != hrp {
        return Err(AddressError::InvalidPrefix(found_hrp.to_string()));
    }
    // witness version + at least one data group + 6 checksum groups
    if data_part.len() < 8 {
        return Err(AddressError::Bech32Format);
    }

    let mut err = Ok(());
    let data_u5 = data_part
        .bytes()
        .scan(&mut err, |err, b| match REV_CHARSET.get(b as usize).copied().unwrap_or(100) {
            100 => {
                **err = Err(AddressError::DecodingError(b as char));
                None
            }
            i => Some(i),
        })
        .collect::<Vec<u8>>();
    err?;

    if !verify_checksum(hrp, &data_u5) {
        return Err(AddressError::BadChecksum);
    }

    let (version, program_u5) = data_u5[..data_u5.len() - 6].split_first().ok_or(AddressError::Bech32Format)?;
    if *version != 0 {
        return Err(AddressError::UnsupportedWitnessVersion(*version));
    }
    let program = conv5to8(program_u5)?;
    if program.len() != 20 && program.len() != 32 {
        return Err(AddressError::BadLength(program.len()));
    }

    Ok(DecodedAddress::WitnessProgram { version: *version, program })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rev_charset_matches_charset() {
        for (i, c) in CHARSET.iter().enumerate() {
            assert_eq!(REV_CHARSET[*c as usize] as usize, i);
        }
    }

    #[test]
    fn test_decode_segwit_strictness() {
        // mixed case
        assert_eq!(
            decode_segwit("bc1Qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", "bc"),
            Err(AddressError::Bech32Format)
        );
        // wrong hrp
        assert_eq!(
            decode_segwit("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx", "bc"),
            Err(AddressError::InvalidPrefix("tb".to_string()))
        );
        // all-caps form of a valid address is legal bech32
        assert!(decode_segwit("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4", "bc").is_ok());
    }
}
