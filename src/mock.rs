//! Recording transport and shell shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use im_relay_proto::{ClientId, ErrorCode, Event, Global, Keymap, KeymapFormat, SurfaceId};

use crate::coordinator::InputMethodCoordinator;
use crate::relay::{RelayCore, RelayError};
use crate::shell::{PanelEvent, ShellHandler};

pub const APP: ClientId = ClientId(1);
pub const APP2: ClientId = ClientId(2);
pub const IM: ClientId = ClientId(10);
pub const S1: SurfaceId = SurfaceId(100);
pub const S2: SurfaceId = SurfaceId(101);

pub const KEYMAP: Keymap = Keymap {
    format: KeymapFormat::XkbV1,
    fd: 7,
    size: 4096,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    Event(ClientId, Event),
    Error(ClientId, ErrorCode, String),
    Panel(PanelEvent),
    AddGlobal(Global),
    RemoveGlobal(Global),
}

pub type Log = Rc<RefCell<Vec<Record>>>;

pub struct MockServer {
    log: Log,
    serial: u32,
}

impl MockServer {
    pub fn new() -> Self {
        Self::with_log(Log::default())
    }

    pub fn with_log(log: Log) -> Self {
        Self { log, serial: 0 }
    }

    pub fn take(&self) -> Vec<Record> {
        self.log.borrow_mut().drain(..).collect()
    }
}

impl RelayCore for MockServer {
    fn send_event(&mut self, client: ClientId, event: Event) -> Result<(), RelayError> {
        self.log.borrow_mut().push(Record::Event(client, event));
        Ok(())
    }

    fn post_error(
        &mut self,
        client: ClientId,
        code: ErrorCode,
        detail: String,
    ) -> Result<(), RelayError> {
        self.log
            .borrow_mut()
            .push(Record::Error(client, code, detail));
        Ok(())
    }

    fn next_serial(&mut self) -> u32 {
        self.serial += 1;
        self.serial
    }

    fn add_global(&mut self, global: Global) -> Result<(), RelayError> {
        self.log.borrow_mut().push(Record::AddGlobal(global));
        Ok(())
    }

    fn remove_global(&mut self, global: Global) -> Result<(), RelayError> {
        self.log.borrow_mut().push(Record::RemoveGlobal(global));
        Ok(())
    }
}

pub struct MockShell(pub Log);

impl ShellHandler for MockShell {
    fn handle_panel(&mut self, event: PanelEvent) {
        self.0.borrow_mut().push(Record::Panel(event));
    }
}

/// A coordinator wired to a shared log, with its globals already drained.
pub fn setup() -> (InputMethodCoordinator, MockServer) {
    let log = Log::default();
    let mut server = MockServer::with_log(log.clone());
    let mut coordinator = InputMethodCoordinator::new(&mut server, KEYMAP).unwrap();
    coordinator.set_shell(MockShell(log));
    server.take();
    (coordinator, server)
}
