use num_enum::{IntoPrimitive, TryFromPrimitive};

#[doc = r#"
The format word of the header chunk.

The encoder always writes [`FormatType::Simultaneous`]: one control track
carrying tempo and time signature, followed by one track per part, all played
together from tick zero.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum FormatType {
    /// Format 0
    SingleMultiChannel = 0,
    /// Format 1
    Simultaneous = 1,
    /// Format 2
    SequentiallyIndependent = 2,
}

impl Default for FormatType {
    fn default() -> Self {
        Self::Simultaneous
    }
}

impl FormatType {
    /// The two big-endian bytes written in the header.
    pub fn to_bytes(self) -> [u8; 2] {
        u16::from(self).to_be_bytes()
    }
}

#[test]
fn format_words() {
    assert_eq!(FormatType::default().to_bytes(), [0x00, 0x01]);
    assert_eq!(FormatType::try_from(2u16).unwrap(), FormatType::SequentiallyIndependent);
    assert!(FormatType::try_from(3u16).is_err());
}
