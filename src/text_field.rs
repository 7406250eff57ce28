use im_relay_proto::{ClientId, ContextId, FieldId, PreeditStyle, SurfaceId};

use crate::grab::KeyboardGrab;

/// One styled byte range `[start, end)` of the current preedit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StyleSpan {
    pub style: PreeditStyle,
    pub start: u32,
    pub end: u32,
}

/// What the input method has composed into a field so far.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Composition {
    preedit: String,
    cursor: u32,
    styles: Vec<StyleSpan>,
}

impl Composition {
    pub fn preedit(&self) -> &str {
        &self.preedit
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn styles(&self) -> &[StyleSpan] {
        &self.styles
    }

    pub(crate) fn commit(&mut self) {
        self.preedit.clear();
        self.cursor = 0;
        self.styles.clear();
    }

    pub(crate) fn set_preedit(&mut self, text: &str, cursor: u32) {
        self.preedit.clear();
        self.preedit.push_str(text);
        self.cursor = cursor;
        self.styles.clear();
    }

    /// Accept `span` if it covers whole characters of the current preedit.
    pub(crate) fn push_style(&mut self, span: StyleSpan) -> bool {
        let (start, end) = (span.start as usize, span.end as usize);

        if start > end
            || end > self.preedit.len()
            || !self.preedit.is_char_boundary(start)
            || !self.preedit.is_char_boundary(end)
        {
            return false;
        }

        self.styles.push(span);
        true
    }
}

pub struct TextField {
    id: FieldId,
    client: ClientId,
    surface: SurfaceId,
    active: bool,
    grab: KeyboardGrab,
    context: Option<ContextId>,
    composition: Composition,
}

impl TextField {
    pub(crate) fn new(id: FieldId, client: ClientId, surface: SurfaceId) -> Self {
        Self {
            id,
            client,
            surface,
            active: false,
            grab: KeyboardGrab::new(id),
            context: None,
            composition: Composition::default(),
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn context(&self) -> Option<ContextId> {
        self.context
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub(crate) fn grab(&self) -> KeyboardGrab {
        self.grab
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn attach_context(&mut self, context: ContextId) {
        debug_assert!(self.context.is_none(), "{} already has a context", self.id);
        self.context = Some(context);
    }

    pub(crate) fn detach_context(&mut self) -> Option<ContextId> {
        self.context.take()
    }

    pub(crate) fn composition_mut(&mut self) -> &mut Composition {
        &mut self.composition
    }
}
