//! Protocol vocabulary for the text input relay.
//!
//! This crate only names things: object ids, the requests clients send to the
//! relay, and the events the relay sends back. It carries no state. See the
//! [`im-relay`] crate for the relay itself.
//!
//! [`im-relay`]: https://crates.io/crates/im-relay

#![forbid(unsafe_code, future_incompatible)]
#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

use alloc::string::String;
use core::fmt;

pub mod style;

pub use style::{DecodeError, PreeditStyle, Rgb, StyleKind, UnderlineKind};

macro_rules! define_ids {
    ($($(#[$meta:meta])* $name:ident($ty:ty),)+) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
            #[repr(transparent)]
            pub struct $name(pub $ty);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}@{}", stringify!($name), self.0)
                }
            }
        )+
    };
}

define_ids! {
    /// A connected client of the display server.
    ClientId(u32),
    /// A surface, owned by some client. The relay never dereferences it.
    SurfaceId(u32),
    /// A text field created by an application client.
    FieldId(u32),
    /// A relay context living on the input method client's connection.
    ContextId(u32),
    /// The input method's keyboard mirror object, id chosen by the client.
    MirrorId(u32),
}

/// Globals advertised by the relay.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Global {
    InputMethod,
    TextFieldManager,
}

/// Fatal protocol error codes, posted to the offending connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ErrorCode {
    InvalidObject = 0,
    InvalidMethod = 1,
    NoMemory = 2,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum KeyState {
    Released = 0,
    Pressed = 1,
}

impl KeyState {
    pub fn from_raw(raw: u32) -> Result<Self, DecodeError> {
        match raw {
            0 => Ok(Self::Released),
            1 => Ok(Self::Pressed),
            _ => Err(DecodeError::InvalidData("KeyState", raw)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ModifierState {
    pub depressed: u32,
    pub latched: u32,
    pub locked: u32,
    pub group: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum KeymapFormat {
    NoKeymap = 0,
    XkbV1 = 1,
}

/// A compiled keymap shared through a file descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Keymap {
    pub format: KeymapFormat,
    pub fd: i32,
    pub size: u32,
}

impl Keymap {
    pub const fn none() -> Self {
        Self {
            format: KeymapFormat::NoKeymap,
            fd: -1,
            size: 0,
        }
    }
}

/// Requests an application client sends on one of its text fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextFieldRequest {
    SetSurroundingText {
        text: String,
    },
    SetCursorIndex {
        index: u32,
    },
    Activate,
    Deactivate,
    SetSelectedText {
        text: String,
        index: i32,
    },
    SetMicroFocus {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    SetPreedit,
    SetContentType,
    Destroy,
}

impl TextFieldRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetSurroundingText { .. } => "SetSurroundingText",
            Self::SetCursorIndex { .. } => "SetCursorIndex",
            Self::Activate => "Activate",
            Self::Deactivate => "Deactivate",
            Self::SetSelectedText { .. } => "SetSelectedText",
            Self::SetMicroFocus { .. } => "SetMicroFocus",
            Self::SetPreedit => "SetPreedit",
            Self::SetContentType => "SetContentType",
            Self::Destroy => "Destroy",
        }
    }
}

/// Requests the input method client sends on a relay context.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContextRequest {
    CommitString {
        text: String,
        index: u32,
    },
    PreeditString {
        text: String,
        index: u32,
    },
    PreeditStyling {
        kind: u32,
        value: u32,
        start: u32,
        end: u32,
    },
    ForwardKey {
        time: u32,
        key: u32,
        state: u32,
    },
    Destroy,
}

impl ContextRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CommitString { .. } => "CommitString",
            Self::PreeditString { .. } => "PreeditString",
            Self::PreeditStyling { .. } => "PreeditStyling",
            Self::ForwardKey { .. } => "ForwardKey",
            Self::Destroy => "Destroy",
        }
    }
}

/// Everything the relay sends to a client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    // text field, to the owning application
    CommitString {
        field: FieldId,
        text: String,
        index: u32,
    },
    PreeditString {
        field: FieldId,
        text: String,
        index: u32,
    },
    PreeditStyling {
        field: FieldId,
        style: PreeditStyle,
        start: u32,
        end: u32,
    },

    // input method
    CreateContext {
        context: ContextId,
    },
    DestroyMe {
        context: ContextId,
    },
    FocusIn {
        context: ContextId,
    },
    FocusOut {
        context: ContextId,
    },

    // keyboard mirror
    MirrorKeymap {
        mirror: MirrorId,
        keymap: Keymap,
    },
    MirrorKey {
        mirror: MirrorId,
        serial: u32,
        time: u32,
        key: u32,
        state: KeyState,
    },
    MirrorModifiers {
        mirror: MirrorId,
        serial: u32,
        modifiers: ModifierState,
    },

    // seat keyboard, to whichever surface holds focus
    Key {
        surface: SurfaceId,
        serial: u32,
        time: u32,
        key: u32,
        state: KeyState,
    },
    Modifiers {
        surface: SurfaceId,
        serial: u32,
        modifiers: ModifierState,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CommitString { .. } => "CommitString",
            Self::PreeditString { .. } => "PreeditString",
            Self::PreeditStyling { .. } => "PreeditStyling",
            Self::CreateContext { .. } => "CreateContext",
            Self::DestroyMe { .. } => "DestroyMe",
            Self::FocusIn { .. } => "FocusIn",
            Self::FocusOut { .. } => "FocusOut",
            Self::MirrorKeymap { .. } => "MirrorKeymap",
            Self::MirrorKey { .. } => "MirrorKey",
            Self::MirrorModifiers { .. } => "MirrorModifiers",
            Self::Key { .. } => "Key",
            Self::Modifiers { .. } => "Modifiers",
        }
    }
}
