use im_relay_proto::{
    ClientId, ContextId, DecodeError, ErrorCode, Event, FieldId, Global, KeyState, Keymap,
    MirrorId, ModifierState, PreeditStyle, SurfaceId,
};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Input method already bound")]
    AlreadyBound,
    #[error("Keyboard already requested")]
    MirrorAlreadyRequested,
    #[error("No keyboard requested")]
    NoMirror,
    #[error("{0} is not the bound input method")]
    NotBound(ClientId),
    #[error("{field} is not owned by {client}")]
    NotOwner { client: ClientId, field: FieldId },
    #[error("Text field doesn't exists: {0}")]
    UnknownTextField(FieldId),
    #[error("Relay context doesn't exists: {0}")]
    UnknownContext(ContextId),
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(&'static str),
    #[error("Can't decode request: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl RelayError {
    /// Protocol error code posted to the offending client.
    ///
    /// `None` for failures of the transport itself, which no client caused.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RelayError::AlreadyBound
            | RelayError::MirrorAlreadyRequested
            | RelayError::NoMirror
            | RelayError::NotBound(_)
            | RelayError::NotOwner { .. }
            | RelayError::UnknownTextField(_)
            | RelayError::UnknownContext(_) => Some(ErrorCode::InvalidObject),
            RelayError::Decode(_) => Some(ErrorCode::InvalidMethod),
            RelayError::ResourceExhausted(_) => Some(ErrorCode::NoMemory),
            RelayError::Other(_) => None,
        }
    }
}

/// Everything typed the relay sends, built on top of [`RelayCore`].
pub trait Relay {
    fn error(&mut self, client: ClientId, error: &RelayError) -> Result<(), RelayError>;

    fn commit_string(
        &mut self,
        client: ClientId,
        field: FieldId,
        text: &str,
        index: u32,
    ) -> Result<(), RelayError>;
    fn preedit_string(
        &mut self,
        client: ClientId,
        field: FieldId,
        text: &str,
        index: u32,
    ) -> Result<(), RelayError>;
    fn preedit_styling(
        &mut self,
        client: ClientId,
        field: FieldId,
        style: PreeditStyle,
        start: u32,
        end: u32,
    ) -> Result<(), RelayError>;

    fn create_context(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError>;
    fn destroy_me(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError>;
    fn focus_in(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError>;
    fn focus_out(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError>;

    fn mirror_keymap(
        &mut self,
        client: ClientId,
        mirror: MirrorId,
        keymap: Keymap,
    ) -> Result<(), RelayError>;
    fn mirror_key(
        &mut self,
        client: ClientId,
        mirror: MirrorId,
        time: u32,
        key: u32,
        state: KeyState,
    ) -> Result<(), RelayError>;
    fn mirror_modifiers(
        &mut self,
        client: ClientId,
        mirror: MirrorId,
        modifiers: ModifierState,
    ) -> Result<(), RelayError>;

    fn key(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        time: u32,
        key: u32,
        state: KeyState,
    ) -> Result<(), RelayError>;
    fn modifiers(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        modifiers: ModifierState,
    ) -> Result<(), RelayError>;
}

impl<S: RelayCore> Relay for S {
    fn error(&mut self, client: ClientId, error: &RelayError) -> Result<(), RelayError> {
        match error.code() {
            Some(code) => self.post_error(client, code, error.to_string()),
            None => Ok(()),
        }
    }

    fn commit_string(
        &mut self,
        client: ClientId,
        field: FieldId,
        text: &str,
        index: u32,
    ) -> Result<(), RelayError> {
        self.send_event(
            client,
            Event::CommitString {
                field,
                text: text.into(),
                index,
            },
        )
    }

    fn preedit_string(
        &mut self,
        client: ClientId,
        field: FieldId,
        text: &str,
        index: u32,
    ) -> Result<(), RelayError> {
        self.send_event(
            client,
            Event::PreeditString {
                field,
                text: text.into(),
                index,
            },
        )
    }

    fn preedit_styling(
        &mut self,
        client: ClientId,
        field: FieldId,
        style: PreeditStyle,
        start: u32,
        end: u32,
    ) -> Result<(), RelayError> {
        self.send_event(
            client,
            Event::PreeditStyling {
                field,
                style,
                start,
                end,
            },
        )
    }

    fn create_context(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError> {
        self.send_event(client, Event::CreateContext { context })
    }

    fn destroy_me(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError> {
        self.send_event(client, Event::DestroyMe { context })
    }

    fn focus_in(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError> {
        self.send_event(client, Event::FocusIn { context })
    }

    fn focus_out(&mut self, client: ClientId, context: ContextId) -> Result<(), RelayError> {
        self.send_event(client, Event::FocusOut { context })
    }

    fn mirror_keymap(
        &mut self,
        client: ClientId,
        mirror: MirrorId,
        keymap: Keymap,
    ) -> Result<(), RelayError> {
        self.send_event(client, Event::MirrorKeymap { mirror, keymap })
    }

    fn mirror_key(
        &mut self,
        client: ClientId,
        mirror: MirrorId,
        time: u32,
        key: u32,
        state: KeyState,
    ) -> Result<(), RelayError> {
        let serial = self.next_serial();
        self.send_event(
            client,
            Event::MirrorKey {
                mirror,
                serial,
                time,
                key,
                state,
            },
        )
    }

    fn mirror_modifiers(
        &mut self,
        client: ClientId,
        mirror: MirrorId,
        modifiers: ModifierState,
    ) -> Result<(), RelayError> {
        let serial = self.next_serial();
        self.send_event(
            client,
            Event::MirrorModifiers {
                mirror,
                serial,
                modifiers,
            },
        )
    }

    fn key(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        time: u32,
        key: u32,
        state: KeyState,
    ) -> Result<(), RelayError> {
        let serial = self.next_serial();
        self.send_event(
            client,
            Event::Key {
                surface,
                serial,
                time,
                key,
                state,
            },
        )
    }

    fn modifiers(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        modifiers: ModifierState,
    ) -> Result<(), RelayError> {
        let serial = self.next_serial();
        self.send_event(
            client,
            Event::Modifiers {
                surface,
                serial,
                modifiers,
            },
        )
    }
}

/// The display server transport, as seen by the relay.
pub trait RelayCore {
    fn send_event(&mut self, client: ClientId, event: Event) -> Result<(), RelayError>;
    /// Post a fatal protocol error. The transport terminates the connection.
    fn post_error(
        &mut self,
        client: ClientId,
        code: ErrorCode,
        detail: String,
    ) -> Result<(), RelayError>;
    fn next_serial(&mut self) -> u32;
    fn add_global(&mut self, global: Global) -> Result<(), RelayError>;
    fn remove_global(&mut self, global: Global) -> Result<(), RelayError>;
}
