use im_relay::{
    ClientId, ContextRequest, ErrorCode, Event, Global, InputMethodCoordinator, KeyState,
    KeyboardFocus, Keymap, KeymapFormat, MirrorId, PanelEvent, RelayCore, RelayError, SurfaceId,
    TextFieldRequest,
};

const APP: ClientId = ClientId(1);
const IM: ClientId = ClientId(2);
const SURFACE: SurfaceId = SurfaceId(10);

/// Transport that only prints what would go on the wire.
#[derive(Default)]
struct LoggingServer {
    serial: u32,
}

impl RelayCore for LoggingServer {
    fn send_event(&mut self, client: ClientId, event: Event) -> Result<(), RelayError> {
        match &event {
            Event::PreeditStyling {
                field,
                style,
                start,
                end,
            } => {
                let (kind, value) = style.raw();
                log::info!(
                    "->{}: {} {} kind={} value={:#x} [{}, {})",
                    client,
                    event.name(),
                    field,
                    kind,
                    value,
                    start,
                    end
                );
            }
            _ => log::info!("->{}: {:?}", client, event),
        }
        Ok(())
    }

    fn post_error(
        &mut self,
        client: ClientId,
        code: ErrorCode,
        detail: String,
    ) -> Result<(), RelayError> {
        log::error!("->{} error {:?}: {}", client, code, detail);
        Ok(())
    }

    fn next_serial(&mut self) -> u32 {
        self.serial = self.serial.wrapping_add(1);
        self.serial
    }

    fn add_global(&mut self, global: Global) -> Result<(), RelayError> {
        log::info!("Advertise {:?}", global);
        Ok(())
    }

    fn remove_global(&mut self, global: Global) -> Result<(), RelayError> {
        log::info!("Withdraw {:?}", global);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let mut server = LoggingServer::default();
    let keymap = Keymap {
        format: KeymapFormat::XkbV1,
        fd: -1,
        size: 0,
    };
    let mut coordinator = InputMethodCoordinator::new(&mut server, keymap)?;
    coordinator.set_shell(|event: PanelEvent| log::info!("Panel: {:?}", event));

    coordinator.route_focus_change(
        &mut server,
        Some(KeyboardFocus {
            client: APP,
            surface: SURFACE,
        }),
    )?;

    // application exposes a field before any input method is around
    let field = coordinator.create_text_field(&mut server, APP, SURFACE)?;
    coordinator.handle_text_field_request(&mut server, APP, field, TextFieldRequest::Activate)?;

    coordinator.bind_input_method(&mut server, IM)?;
    coordinator.request_keyboard_mirror(&mut server, IM, MirrorId(1))?;

    let context = coordinator
        .field(field)
        .and_then(|f| f.context())
        .ok_or("input method got no context")?;

    for key in [35, 23, 49] {
        coordinator.handle_key(&mut server, 0, key, KeyState::Pressed)?;
        coordinator.handle_key(&mut server, 0, key, KeyState::Released)?;
    }

    for req in [
        ContextRequest::PreeditString {
            text: "かん".into(),
            index: 6,
        },
        ContextRequest::PreeditStyling {
            kind: 0,
            value: 1,
            start: 0,
            end: 6,
        },
        ContextRequest::CommitString {
            text: "感".into(),
            index: 3,
        },
    ] {
        coordinator.handle_context_request(&mut server, IM, context, req)?;
    }

    log::info!(
        "Composition after commit: {:?}",
        coordinator.field(field).map(|f| f.composition())
    );

    coordinator.client_disconnected(&mut server, APP)?;
    coordinator.handle_context_request(&mut server, IM, context, ContextRequest::Destroy)?;
    coordinator.client_disconnected(&mut server, IM)?;

    coordinator.shutdown(&mut server)?;

    Ok(())
}
