/// Defines the Memory Bank Controller type used by the cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    NoMbc,
    Mbc1,
    Mbc3,
}

impl MbcType {
    /// Determines MBC type, RAM presence, and battery presence from the
    /// cartridge type byte at 0x0147.
    pub fn from_header(cartridge_type_code: u8) -> Result<(Self, bool, bool), String> {
        match cartridge_type_code {
            0x00 => Ok((MbcType::NoMbc, false, false)),
            0x01 => Ok((MbcType::Mbc1, false, false)),
            0x02 => Ok((MbcType::Mbc1, true, false)),
            0x03 => Ok((MbcType::Mbc1, true, true)),
            0x08 => Ok((MbcType::NoMbc, true, false)), // ROM+RAM
            0x09 => Ok((MbcType::NoMbc, true, true)),  // ROM+RAM+BATT
            0x0F => Ok((MbcType::Mbc3, false, true)),  // MBC3+TIMER+BATT
            0x10 => Ok((MbcType::Mbc3, true, true)),   // MBC3+TIMER+RAM+BATT
            0x11 => Ok((MbcType::Mbc3, false, false)), // MBC3
            0x12 => Ok((MbcType::Mbc3, true, false)),  // MBC3+RAM
            0x13 => Ok((MbcType::Mbc3, true, true)),   // MBC3+RAM+BATT
            _ => Err(format!(
                "Unsupported cartridge type: {:02X}",
                cartridge_type_code
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_supported_mappers() {
        assert_eq!(
            MbcType::from_header(0x00).unwrap(),
            (MbcType::NoMbc, false, false)
        );
        assert_eq!(
            MbcType::from_header(0x03).unwrap(),
            (MbcType::Mbc1, true, true)
        );
        assert_eq!(
            MbcType::from_header(0x13).unwrap(),
            (MbcType::Mbc3, true, true)
        );
    }

    #[test]
    fn rejects_unsupported_mappers() {
        // MBC5 and friends are out of scope.
        assert!(MbcType::from_header(0x19).is_err());
        assert!(MbcType::from_header(0x05).is_err());
    }
}
