use im_relay_proto::{ContextId, FieldId};

/// The input method's handle on one text field.
///
/// Once disabled a context stays disabled: it forgets its field and every edit
/// sent through it is dropped until the input method destroys it.
#[derive(Debug)]
pub struct RelayContext {
    id: ContextId,
    field: Option<FieldId>,
    disabled: bool,
}

impl RelayContext {
    pub(crate) fn new(id: ContextId, field: FieldId) -> Self {
        Self {
            id,
            field: Some(field),
            disabled: false,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Field edits should reach, `None` once disabled.
    pub fn target(&self) -> Option<FieldId> {
        if self.disabled {
            None
        } else {
            self.field
        }
    }

    /// Disable and detach, returning the field it was paired with.
    pub(crate) fn disable(&mut self) -> Option<FieldId> {
        self.disabled = true;
        self.field.take()
    }
}
