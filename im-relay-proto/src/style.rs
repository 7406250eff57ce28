use core::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    InvalidData(&'static str, u32),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidData(ty, raw) => write!(f, "Invalid Data {}: {}", ty, raw),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum StyleKind {
    Underline = 0,
    Foreground = 1,
    Background = 2,
}

impl StyleKind {
    pub fn from_raw(raw: u32) -> Result<Self, DecodeError> {
        match raw {
            0 => Ok(Self::Underline),
            1 => Ok(Self::Foreground),
            2 => Ok(Self::Background),
            _ => Err(DecodeError::InvalidData("StyleKind", raw)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum UnderlineKind {
    None = 0,
    Single = 1,
    Double = 2,
    Low = 3,
    Error = 4,
}

impl UnderlineKind {
    pub fn from_raw(raw: u32) -> Result<Self, DecodeError> {
        match raw {
            0 => Ok(Self::None),
            1 => Ok(Self::Single),
            2 => Ok(Self::Double),
            3 => Ok(Self::Low),
            4 => Ok(Self::Error),
            _ => Err(DecodeError::InvalidData("UnderlineKind", raw)),
        }
    }
}

/// Packed `0xRRGGBB` colour. Splitting into channels is left to the renderer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct Rgb(u32);

impl Rgb {
    /// Bits above the low 24 are discarded.
    pub const fn from_packed(value: u32) -> Self {
        Self(value & 0x00ff_ffff)
    }

    pub const fn packed(self) -> u32 {
        self.0
    }
}

/// One styling attribute of a preedit span.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PreeditStyle {
    Underline(UnderlineKind),
    Foreground(Rgb),
    Background(Rgb),
}

impl PreeditStyle {
    /// Decode the `(kind, value)` pair carried by a `preedit_styling` request.
    pub fn decode(kind: u32, value: u32) -> Result<Self, DecodeError> {
        Ok(match StyleKind::from_raw(kind)? {
            StyleKind::Underline => Self::Underline(UnderlineKind::from_raw(value)?),
            StyleKind::Foreground => Self::Foreground(Rgb::from_packed(value)),
            StyleKind::Background => Self::Background(Rgb::from_packed(value)),
        })
    }

    pub fn kind(&self) -> StyleKind {
        match self {
            Self::Underline(_) => StyleKind::Underline,
            Self::Foreground(_) => StyleKind::Foreground,
            Self::Background(_) => StyleKind::Background,
        }
    }

    /// The `(kind, value)` pair to put back on the wire.
    pub fn raw(&self) -> (u32, u32) {
        let value = match self {
            Self::Underline(u) => *u as u32,
            Self::Foreground(c) | Self::Background(c) => c.packed(),
        };
        (self.kind() as u32, value)
    }
}
