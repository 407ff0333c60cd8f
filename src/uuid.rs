use static_assertions::assert_impl_all;
use std::fmt;
use std::str::FromStr;

const BASE_UUID_BYTES: [u8; 16] = [0, 0, 0, 0, 0, 0, 0x10, 0, 0x80, 0, 0, 0x80, 0x5F, 0x9B, 0x34, 0xFB];

/// Bluetooth-tailored UUID.
///
/// Besides the canonical `8-4-4-4-12` form, parsing accepts the 16-bit (`"180d"`) and 32-bit
/// (`"0000180d"`) short forms, which are expanded against the Base UUID.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Uuid([u8; 16]);

assert_impl_all!(Uuid: Send, Sync);

impl Uuid {
    pub const fn zeroed() -> Self {
        Self([0; 16])
    }

    /// Returns the Base UUID (`00000000-0000-1000-8000-00805F9B34FB`).
    pub const fn base() -> Self {
        Self(BASE_UUID_BYTES)
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Expands a 16-bit assigned number.
    pub const fn from_u16(v: u16) -> Self {
        Self::from_u32(v as u32)
    }

    /// Expands a 32-bit assigned number.
    pub const fn from_u32(v: u32) -> Self {
        let b = BASE_UUID_BYTES;
        Self([(v >> 24) as u8, (v >> 16) as u8, (v >> 8) as u8, v as u8,
            b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]])
    }

    pub fn bytes(&self) -> [u8; 16] {
        self.0
    }

    /// Returns the 16-bit assigned number if this UUID is derived from the Base UUID.
    pub fn to_u16(&self) -> Option<u16> {
        match self.to_u32()? {
            v if v <= u16::MAX as u32 => Some(v as u16),
            _ => None,
        }
    }

    /// Returns the 32-bit assigned number if this UUID is derived from the Base UUID.
    pub fn to_u32(&self) -> Option<u32> {
        if self.0[4..] == BASE_UUID_BYTES[4..] {
            Some(u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]))
        } else {
            None
        }
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Uuid({})", self)
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(v: [u8; 16]) -> Self {
        Self::from_bytes(v)
    }
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn hex(s: &[u8], dst: &mut [u8]) -> Result<(), UuidParseError> {
            fn dig(c: u8) -> Result<u8, UuidParseError> {
                Ok(match c {
                    b'0'..=b'9' => c - b'0',
                    b'a'..=b'f' => c - b'a' + 10,
                    b'A'..=b'F' => c - b'A' + 10,
                    _ => return Err(UuidParseError(())),
                })
            }
            if s.len() != dst.len() * 2 {
                return Err(UuidParseError(()));
            }
            for (pair, d) in s.chunks(2).zip(dst.iter_mut()) {
                *d = (dig(pair[0])? << 4) | dig(pair[1])?;
            }
            Ok(())
        }

        let s = s.as_bytes();
        match s.len() {
            4 => {
                let mut b = [0; 2];
                hex(s, &mut b)?;
                Ok(Self::from_u16(u16::from_be_bytes(b)))
            }
            8 => {
                let mut b = [0; 4];
                hex(s, &mut b)?;
                Ok(Self::from_u32(u32::from_be_bytes(b)))
            }
            36 => {
                let mut r = [0; 16];
                let mut src = 0;
                let mut dst = 0;
                for &len in &[4, 2, 2, 2, 6] {
                    if src > 0 {
                        if s[src] != b'-' {
                            return Err(UuidParseError(()));
                        }
                        src += 1;
                    }
                    hex(&s[src..src + len * 2], &mut r[dst..dst + len])?;
                    src += len * 2;
                    dst += len;
                }
                Ok(Self(r))
            }
            _ => Err(UuidParseError(())),
        }
    }
}

#[derive(Debug)]
pub struct UuidParseError(());

impl fmt::Display for UuidParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid UUID string")
    }
}

impl std::error::Error for UuidParseError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_forms() {
        let hr = Uuid::from_u16(0x180d);
        assert_eq!(hr.to_string(), "0000180d-0000-1000-8000-00805f9b34fb");
        assert_eq!(hr.to_u16(), Some(0x180d));
        assert_eq!(Uuid::from_u32(0x1234_5678).to_u16(), None);
        assert_eq!(Uuid::from_u32(0x1234_5678).to_u32(), Some(0x1234_5678));
        assert_eq!(Uuid::zeroed().to_u32(), None);
        assert_eq!("180D".parse::<Uuid>().unwrap(), hr);
        assert_eq!("0000180d".parse::<Uuid>().unwrap(), hr);
    }

    #[test]
    fn parse_ok() {
        let data = &[
            ("00000000-0000-0000-0000-000000000000", Uuid::zeroed()),
            ("12345678-9AbC-Def0-1234-56789aBCDEF0", Uuid::from_bytes(
                [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC,
                    0xDE, 0xF0])),
            ("00000000-0000-1000-8000-00805F9B34FB", Uuid::base()),
        ];
        for &(inp, exp) in data {
            let act = inp.parse::<Uuid>().unwrap();
            assert_eq!(act, exp);
            assert_eq!(inp.to_ascii_lowercase(), act.to_string());
        }
    }

    #[test]
    fn parse_fail() {
        let data = &[
            "",
            "0",
            "18z0",
            "00000000_0000-0000-0000-000000000000",
            "00000000-0000*0000-0000-000000000000",
            "00000000-0000-00z0-0000-000000000000",
            "00000000-0000-0000-0000-_00000000000",
        ];
        for &inp in data {
            assert!(inp.parse::<Uuid>().is_err(), "{}", inp);
        }
    }
}
