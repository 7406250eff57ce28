/// Signals for the shell's on-screen input panel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PanelEvent {
    Show,
    Hide,
}

/// The shell side observer. The coordinator holds at most one.
pub trait ShellHandler {
    fn handle_panel(&mut self, event: PanelEvent);
}

impl<F: FnMut(PanelEvent)> ShellHandler for F {
    fn handle_panel(&mut self, event: PanelEvent) {
        self(event)
    }
}
