mod id_table;

use im_relay_proto::{
    ClientId, ContextId, ContextRequest, FieldId, Global, KeyState, Keymap, MirrorId,
    ModifierState, PreeditStyle, SurfaceId, TextFieldRequest,
};

use self::id_table::IdTable;
use crate::context::RelayContext;
use crate::grab::{KeyboardFocus, KeyboardMirror, SeatKeyboard};
use crate::relay::{Relay, RelayCore, RelayError};
use crate::shell::{PanelEvent, ShellHandler};
use crate::text_field::{StyleSpan, TextField};

/// Post `err` to `client` and fail with it.
fn reject<S: RelayCore, T>(
    server: &mut S,
    client: ClientId,
    err: RelayError,
) -> Result<T, RelayError> {
    log::warn!("Protocol error for {}: {}", client, err);
    server.error(client, &err)?;
    Err(err)
}

/// Pairs text fields with the single bound input method client.
pub struct InputMethodCoordinator {
    bound_client: Option<ClientId>,
    keyboard_mirror: Option<KeyboardMirror>,
    active_field: Option<FieldId>,
    fields: IdTable<FieldId, TextField>,
    contexts: IdTable<ContextId, RelayContext>,
    keyboard: SeatKeyboard,
    keymap: Keymap,
    shell: Option<Box<dyn ShellHandler>>,
}

impl InputMethodCoordinator {
    /// Create the coordinator and advertise its two globals.
    pub fn new<S: RelayCore>(server: &mut S, keymap: Keymap) -> Result<Self, RelayError> {
        server.add_global(Global::InputMethod)?;
        server.add_global(Global::TextFieldManager)?;

        Ok(Self {
            bound_client: None,
            keyboard_mirror: None,
            active_field: None,
            fields: IdTable::new(),
            contexts: IdTable::new(),
            keyboard: SeatKeyboard::new(),
            keymap,
            shell: None,
        })
    }

    /// Compositor shutdown.
    pub fn shutdown<S: RelayCore>(self, server: &mut S) -> Result<(), RelayError> {
        log::info!(
            "Shutting down with {} text fields, {} contexts",
            self.fields.len(),
            self.contexts.len()
        );
        server.remove_global(Global::InputMethod)?;
        server.remove_global(Global::TextFieldManager)
    }

    pub fn set_shell(&mut self, shell: impl ShellHandler + 'static) {
        self.shell = Some(Box::new(shell));
    }

    /// Keymap sent to keyboard mirrors requested from now on.
    pub fn set_keymap(&mut self, keymap: Keymap) {
        self.keymap = keymap;
    }

    pub fn bound_client(&self) -> Option<ClientId> {
        self.bound_client
    }

    pub fn is_bound(&self) -> bool {
        self.bound_client.is_some()
    }

    pub fn active_field(&self) -> Option<FieldId> {
        self.active_field
    }

    pub fn grab_owner(&self) -> Option<FieldId> {
        self.keyboard.grab_owner()
    }

    pub fn keyboard(&self) -> &SeatKeyboard {
        &self.keyboard
    }

    pub fn keyboard_mirror(&self) -> Option<KeyboardMirror> {
        self.keyboard_mirror
    }

    pub fn field(&self, id: FieldId) -> Option<&TextField> {
        self.fields.get_item(id)
    }

    pub fn context(&self, id: ContextId) -> Option<&RelayContext> {
        self.contexts.get_item(id)
    }

    /// Live text fields in creation order.
    pub fn fields(&self) -> Vec<FieldId> {
        self.fields.ids()
    }

    fn emit_panel(&mut self, event: PanelEvent) {
        log::debug!("Input panel: {:?}", event);
        if let Some(shell) = self.shell.as_mut() {
            shell.handle_panel(event);
        }
    }

    fn owned_field<S: RelayCore>(
        &self,
        server: &mut S,
        client: ClientId,
        field: FieldId,
    ) -> Result<(), RelayError> {
        match self.fields.get_item(field) {
            None => reject(server, client, RelayError::UnknownTextField(field)),
            Some(f) if f.client() != client => {
                reject(server, client, RelayError::NotOwner { client, field })
            }
            Some(_) => Ok(()),
        }
    }

    fn check_bound<S: RelayCore>(
        &self,
        server: &mut S,
        client: ClientId,
    ) -> Result<(), RelayError> {
        if self.bound_client == Some(client) {
            Ok(())
        } else {
            reject(server, client, RelayError::NotBound(client))
        }
    }

    fn create_context<S: RelayCore>(
        &mut self,
        server: &mut S,
        im: ClientId,
        field: FieldId,
    ) -> Result<(), RelayError> {
        let (context, _) = self
            .contexts
            .new_item(|id| RelayContext::new(id, field))?;

        if let Some(f) = self.fields.get_item_mut(field) {
            f.attach_context(context);
        }

        log::debug!("Create {} for {}", context, field);
        server.create_context(im, context)
    }

    fn start_grab(&mut self, field: FieldId) {
        if let Some(grab) = self.fields.get_item(field).map(TextField::grab) {
            if let Some(prev) = self.keyboard.start_grab(grab) {
                log::debug!("Replaced keyboard grab of {}", prev.owner());
            }
            log::info!("Start keyboard grab for {}", field);
        }
    }

    fn end_grab(&mut self, field: FieldId) {
        if let Some(grab) = self.fields.get_item(field).map(TextField::grab) {
            if self.keyboard.end_grab(grab) {
                log::info!("End keyboard grab for {}", field);
            }
        }
    }

    // text fields

    /// Application request: create a text field for `surface`.
    pub fn create_text_field<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        surface: SurfaceId,
    ) -> Result<FieldId, RelayError> {
        let field = match self
            .fields
            .new_item(|id| TextField::new(id, client, surface))
        {
            Ok((id, _)) => id,
            Err(err) => return reject(server, client, err),
        };

        log::debug!("Create {} on {} for {}", field, surface, client);

        if let Some(im) = self.bound_client {
            if let Err(err) = self.create_context(server, im, field) {
                // the field lives on without a context
                log::warn!("Can't create context for {}: {}", field, err);
            }
        }

        Ok(field)
    }

    pub fn handle_text_field_request<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        field: FieldId,
        req: TextFieldRequest,
    ) -> Result<(), RelayError> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("<-{} {}: {:?}", client, field, req);
        } else {
            log::debug!("<-{} {}: {}", client, field, req.name());
        }

        match req {
            TextFieldRequest::Activate => self.activate(server, client, field),
            TextFieldRequest::Deactivate => self.deactivate(server, client, field),
            TextFieldRequest::Destroy => self.destroy(server, client, field),
            TextFieldRequest::SetSurroundingText { .. }
            | TextFieldRequest::SetCursorIndex { .. }
            | TextFieldRequest::SetSelectedText { .. }
            | TextFieldRequest::SetMicroFocus { .. }
            | TextFieldRequest::SetPreedit
            | TextFieldRequest::SetContentType => {
                self.owned_field(server, client, field)?;
                log::trace!("{} is not implemented, ignored", req.name());
                Ok(())
            }
        }
    }

    pub fn activate<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        field: FieldId,
    ) -> Result<(), RelayError> {
        self.owned_field(server, client, field)?;

        if self.active_field == Some(field) {
            return Ok(());
        }

        if let Some(prev) = self.active_field {
            self.deactivate_field(server, prev)?;
        }

        let context = match self.fields.get_item_mut(field) {
            Some(f) => {
                f.set_active(true);
                f.context()
            }
            None => return Ok(()),
        };
        self.active_field = Some(field);
        self.emit_panel(PanelEvent::Show);

        if let Some(im) = self.bound_client {
            if let Some(context) = context {
                server.focus_in(im, context)?;
            }
            self.start_grab(field);
        }

        Ok(())
    }

    pub fn deactivate<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        field: FieldId,
    ) -> Result<(), RelayError> {
        self.owned_field(server, client, field)?;
        self.deactivate_field(server, field)
    }

    fn deactivate_field<S: RelayCore>(
        &mut self,
        server: &mut S,
        field: FieldId,
    ) -> Result<(), RelayError> {
        let mut sent = Ok(());

        if self.active_field == Some(field) {
            self.active_field = None;

            let context = match self.fields.get_item_mut(field) {
                Some(f) => {
                    f.set_active(false);
                    f.context()
                }
                None => None,
            };
            self.emit_panel(PanelEvent::Hide);

            if let (Some(im), Some(context)) = (self.bound_client, context) {
                sent = server.focus_out(im, context);
            }
        }

        self.end_grab(field);

        sent
    }

    pub fn destroy<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        field: FieldId,
    ) -> Result<(), RelayError> {
        self.owned_field(server, client, field)?;
        self.destroy_field(server, field)
    }

    fn destroy_field<S: RelayCore>(
        &mut self,
        server: &mut S,
        field: FieldId,
    ) -> Result<(), RelayError> {
        let deactivated = self.deactivate_field(server, field);

        let context = self
            .fields
            .get_item_mut(field)
            .and_then(TextField::detach_context);

        let mut sent = Ok(());
        if let Some(context) = context {
            if let Some(c) = self.contexts.get_item_mut(context) {
                c.disable();
            }
            if let Some(im) = self.bound_client {
                sent = server.destroy_me(im, context);
            }
        }

        self.fields.remove_item(field);
        log::debug!("Destroyed {}", field);

        deactivated.and(sent)
    }

    // input method

    pub fn bind_input_method<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
    ) -> Result<(), RelayError> {
        if self.bound_client.is_some() {
            return reject(server, client, RelayError::AlreadyBound);
        }

        log::info!("Bind input method {}", client);
        self.bound_client = Some(client);

        for field in self.fields.ids() {
            if let Err(err) = self.create_context(server, client, field) {
                log::warn!("Can't create context for {}: {}", field, err);
            }
        }

        if let Some(active) = self.active_field {
            if let Some(context) = self.fields.get_item(active).and_then(TextField::context) {
                server.focus_in(client, context)?;
            }
            self.start_grab(active);
        }

        Ok(())
    }

    /// The input method went away. Text fields survive, their contexts don't.
    pub fn unbind_input_method(&mut self) {
        let client = match self.bound_client.take() {
            Some(client) => client,
            None => return,
        };

        log::info!("Unbind input method {}", client);

        if let Some(mirror) = self.keyboard_mirror.take() {
            log::debug!("Drop keyboard mirror {}", mirror.id);
        }

        if let Some(active) = self.active_field {
            self.end_grab(active);
        }

        for (_, mut context) in self.contexts.drain() {
            if let Some(field) = context.disable() {
                if let Some(f) = self.fields.get_item_mut(field) {
                    f.detach_context();
                }
            }
        }
    }

    pub fn request_keyboard_mirror<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        id: MirrorId,
    ) -> Result<(), RelayError> {
        self.check_bound(server, client)?;

        if self.keyboard_mirror.is_some() {
            return reject(server, client, RelayError::MirrorAlreadyRequested);
        }

        self.keyboard_mirror = Some(KeyboardMirror { client, id });
        log::debug!("Keyboard mirror {} for {}", id, client);
        server.mirror_keymap(client, id, self.keymap)
    }

    pub fn release_keyboard_mirror<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
    ) -> Result<(), RelayError> {
        self.check_bound(server, client)?;

        match self.keyboard_mirror.take() {
            Some(mirror) => {
                log::debug!("Release keyboard mirror {}", mirror.id);
                Ok(())
            }
            None => reject(server, client, RelayError::NoMirror),
        }
    }

    // relay contexts

    pub fn handle_context_request<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        context: ContextId,
        req: ContextRequest,
    ) -> Result<(), RelayError> {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("<-{} {}: {:?}", client, context, req);
        } else {
            log::debug!("<-{} {}: {}", client, context, req.name());
        }

        match req {
            ContextRequest::CommitString { text, index } => {
                self.commit_string(server, client, context, &text, index)
            }
            ContextRequest::PreeditString { text, index } => {
                self.preedit_string(server, client, context, &text, index)
            }
            ContextRequest::PreeditStyling {
                kind,
                value,
                start,
                end,
            } => self.preedit_styling(server, client, context, kind, value, start, end),
            ContextRequest::ForwardKey { time, key, state } => {
                self.forward_key(server, client, context, time, key, state)
            }
            ContextRequest::Destroy => self.destroy_context(server, client, context),
        }
    }

    /// Field an edit through `context` should reach, `None` if it is stale.
    fn edit_target<S: RelayCore>(
        &self,
        server: &mut S,
        client: ClientId,
        context: ContextId,
        what: &str,
    ) -> Result<Option<FieldId>, RelayError> {
        self.check_bound(server, client)?;

        match self.contexts.get_item(context) {
            None => reject(server, client, RelayError::UnknownContext(context)),
            Some(c) => {
                let target = c.target();
                if target.is_none() {
                    log::debug!("Dropping {} on disabled {}", what, context);
                }
                Ok(target)
            }
        }
    }

    pub fn commit_string<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        context: ContextId,
        text: &str,
        index: u32,
    ) -> Result<(), RelayError> {
        let field = match self.edit_target(server, client, context, "commit")? {
            Some(field) => field,
            None => return Ok(()),
        };

        match self.fields.get_item_mut(field) {
            Some(f) => {
                f.composition_mut().commit();
                server.commit_string(f.client(), field, text, index)
            }
            None => Ok(()),
        }
    }

    pub fn preedit_string<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        context: ContextId,
        text: &str,
        index: u32,
    ) -> Result<(), RelayError> {
        let field = match self.edit_target(server, client, context, "preedit")? {
            Some(field) => field,
            None => return Ok(()),
        };

        match self.fields.get_item_mut(field) {
            Some(f) => {
                f.composition_mut().set_preedit(text, index);
                server.preedit_string(f.client(), field, text, index)
            }
            None => Ok(()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn preedit_styling<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        context: ContextId,
        kind: u32,
        value: u32,
        start: u32,
        end: u32,
    ) -> Result<(), RelayError> {
        let field = match self.edit_target(server, client, context, "preedit styling")? {
            Some(field) => field,
            None => return Ok(()),
        };

        let style = match PreeditStyle::decode(kind, value) {
            Ok(style) => style,
            Err(err) => return reject(server, client, err.into()),
        };

        let f = match self.fields.get_item_mut(field) {
            Some(f) => f,
            None => return Ok(()),
        };

        if !f.composition_mut().push_style(StyleSpan { style, start, end }) {
            log::debug!(
                "Styling [{}, {}) out of preedit {:?} of {}, not tracked",
                start,
                end,
                f.composition().preedit(),
                field
            );
        }

        server.preedit_styling(f.client(), field, style, start, end)
    }

    pub fn forward_key<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        context: ContextId,
        time: u32,
        key: u32,
        state: u32,
    ) -> Result<(), RelayError> {
        let field = match self.edit_target(server, client, context, "forwarded key")? {
            Some(field) => field,
            None => return Ok(()),
        };

        let state = match KeyState::from_raw(state) {
            Ok(state) => state,
            Err(err) => return reject(server, client, err.into()),
        };

        if self.active_field != Some(field) {
            return Ok(());
        }

        match self.keyboard.focus() {
            Some(focus) => server.key(focus.client, focus.surface, time, key, state),
            None => Ok(()),
        }
    }

    /// The input method destroyed its context object.
    pub fn destroy_context<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
        context: ContextId,
    ) -> Result<(), RelayError> {
        self.check_bound(server, client)?;

        let mut removed = match self.contexts.remove_item(context) {
            Some(c) => c,
            None => return reject(server, client, RelayError::UnknownContext(context)),
        };

        if let Some(field) = removed.disable() {
            if let Some(f) = self.fields.get_item_mut(field) {
                debug_assert_eq!(f.context(), Some(context));
                f.detach_context();
            }
        }

        log::debug!("Released {}", context);
        Ok(())
    }

    // seat

    /// Keyboard focus moved. An active field loses activation unless its
    /// surface kept the focus.
    pub fn route_focus_change<S: RelayCore>(
        &mut self,
        server: &mut S,
        focus: Option<KeyboardFocus>,
    ) -> Result<(), RelayError> {
        self.keyboard.set_focus(focus);

        let active = match self.active_field.and_then(|id| self.fields.get_item(id)) {
            Some(f) => f,
            None => return Ok(()),
        };

        let keeps_focus = focus
            .map(|focus| focus.client == active.client() && focus.surface == active.surface())
            .unwrap_or(false);

        if keeps_focus {
            Ok(())
        } else {
            let id = active.id();
            log::debug!("Keyboard focus left {}", id);
            self.deactivate_field(server, id)
        }
    }

    /// Raw key from the seat.
    pub fn handle_key<S: RelayCore>(
        &mut self,
        server: &mut S,
        time: u32,
        key: u32,
        state: KeyState,
    ) -> Result<(), RelayError> {
        self.keyboard
            .key(server, self.keyboard_mirror, time, key, state)
    }

    /// Raw modifier state from the seat.
    pub fn handle_modifiers<S: RelayCore>(
        &mut self,
        server: &mut S,
        modifiers: ModifierState,
    ) -> Result<(), RelayError> {
        self.keyboard
            .modifiers(server, self.keyboard_mirror, modifiers)
    }

    /// Drop everything a disconnected client held.
    pub fn client_disconnected<S: RelayCore>(
        &mut self,
        server: &mut S,
        client: ClientId,
    ) -> Result<(), RelayError> {
        if self.bound_client == Some(client) {
            self.unbind_input_method();
        }

        let mut ret = Ok(());

        let mut owned: Vec<FieldId> = self
            .fields
            .values()
            .filter(|f| f.client() == client)
            .map(TextField::id)
            .collect();
        owned.sort_unstable();

        for field in owned {
            let destroyed = self.destroy_field(server, field);
            if ret.is_ok() {
                ret = destroyed;
            }
        }

        ret
    }
}
