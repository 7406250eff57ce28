//! The seat keyboard and its single grab slot.
//!
//! Without a grab, key and modifier events go only to the surface holding
//! keyboard focus. A text field grab redirects keys to the input method's
//! keyboard mirror instead, so the input method sees them before the
//! application does, and copies modifier changes to the mirror.

use im_relay_proto::{ClientId, FieldId, KeyState, MirrorId, ModifierState, SurfaceId};

use crate::relay::{Relay, RelayCore, RelayError};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyboardFocus {
    pub client: ClientId,
    pub surface: SurfaceId,
}

/// The input method's own keyboard object.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyboardMirror {
    pub client: ClientId,
    pub id: MirrorId,
}

/// Grab descriptor owned by a text field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyboardGrab {
    owner: FieldId,
}

impl KeyboardGrab {
    pub fn new(owner: FieldId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> FieldId {
        self.owner
    }
}

#[derive(Debug, Default)]
pub struct SeatKeyboard {
    focus: Option<KeyboardFocus>,
    grab: Option<KeyboardGrab>,
}

impl SeatKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Option<KeyboardFocus> {
        self.focus
    }

    /// Field currently holding the grab slot.
    pub fn grab_owner(&self) -> Option<FieldId> {
        self.grab.map(|g| g.owner)
    }

    pub(crate) fn set_focus(&mut self, focus: Option<KeyboardFocus>) {
        self.focus = focus;
    }

    /// Install `grab`, returning whichever grab it replaced.
    pub(crate) fn start_grab(&mut self, grab: KeyboardGrab) -> Option<KeyboardGrab> {
        self.grab.replace(grab)
    }

    /// End `grab` if it is the one installed.
    pub(crate) fn end_grab(&mut self, grab: KeyboardGrab) -> bool {
        if self.grab == Some(grab) {
            self.grab = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn key<S: RelayCore>(
        &self,
        server: &mut S,
        mirror: Option<KeyboardMirror>,
        time: u32,
        key: u32,
        state: KeyState,
    ) -> Result<(), RelayError> {
        match (self.grab, mirror) {
            (Some(_), Some(mirror)) => {
                server.mirror_key(mirror.client, mirror.id, time, key, state)
            }
            _ => match self.focus {
                Some(focus) => server.key(focus.client, focus.surface, time, key, state),
                None => Ok(()),
            },
        }
    }

    pub(crate) fn modifiers<S: RelayCore>(
        &self,
        server: &mut S,
        mirror: Option<KeyboardMirror>,
        modifiers: ModifierState,
    ) -> Result<(), RelayError> {
        if let Some(focus) = self.focus {
            server.modifiers(focus.client, focus.surface, modifiers)?;
        }

        match (self.grab, mirror) {
            (Some(_), Some(mirror)) => {
                server.mirror_modifiers(mirror.client, mirror.id, modifiers)
            }
            _ => Ok(()),
        }
    }
}
