//! Compositor side relay between application text fields and a single input
//! method client.
//!
//! The display server transport is abstracted behind [`RelayCore`]; the
//! [`InputMethodCoordinator`] owns every text field, every relay context and
//! the seat keyboard grab, and reacts to requests handed to it by the
//! transport.

#![forbid(unsafe_code, future_incompatible)]

mod context;
mod coordinator;
mod grab;
#[cfg(test)]
mod mock;
mod relay;
mod shell;
mod text_field;

pub use im_relay_proto::*;

pub use crate::context::RelayContext;
pub use crate::coordinator::InputMethodCoordinator;
pub use crate::grab::{KeyboardFocus, KeyboardGrab, KeyboardMirror, SeatKeyboard};
pub use crate::relay::{Relay, RelayCore, RelayError};
pub use crate::shell::{PanelEvent, ShellHandler};
pub use crate::text_field::{Composition, StyleSpan, TextField};

pub type AHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

#[cfg(test)]
mod tests {
    use crate::mock::{setup, Record, APP, IM, S1, S2};
    use crate::*;
    use pretty_assertions::assert_eq;

    fn focus(surface: SurfaceId) -> Option<KeyboardFocus> {
        Some(KeyboardFocus {
            client: APP,
            surface,
        })
    }

    fn ev(client: ClientId, event: Event) -> Record {
        Record::Event(client, event)
    }

    fn context_of(coordinator: &InputMethodCoordinator, field: FieldId) -> ContextId {
        coordinator.field(field).unwrap().context().unwrap()
    }

    #[test]
    fn commit_reaches_field_then_destroy() {
        let (mut coordinator, mut server) = setup();

        coordinator.bind_input_method(&mut server, IM).unwrap();
        let a = coordinator.create_text_field(&mut server, APP, S1).unwrap();
        coordinator
            .handle_text_field_request(&mut server, APP, a, TextFieldRequest::Activate)
            .unwrap();
        let ctx = context_of(&coordinator, a);

        assert_eq!(
            server.take(),
            vec![
                ev(IM, Event::CreateContext { context: ctx }),
                Record::Panel(PanelEvent::Show),
                ev(IM, Event::FocusIn { context: ctx }),
            ]
        );
        assert_eq!(coordinator.grab_owner(), Some(a));

        coordinator
            .handle_context_request(
                &mut server,
                IM,
                ctx,
                ContextRequest::CommitString {
                    text: "こんにちは".into(),
                    index: 0,
                },
            )
            .unwrap();
        assert_eq!(
            server.take(),
            vec![ev(
                APP,
                Event::CommitString {
                    field: a,
                    text: "こんにちは".into(),
                    index: 0,
                }
            )]
        );

        coordinator
            .handle_text_field_request(&mut server, APP, a, TextFieldRequest::Destroy)
            .unwrap();
        assert_eq!(
            server.take(),
            vec![
                Record::Panel(PanelEvent::Hide),
                ev(IM, Event::FocusOut { context: ctx }),
                ev(IM, Event::DestroyMe { context: ctx }),
            ]
        );
        assert_eq!(coordinator.grab_owner(), None);
        assert_eq!(coordinator.active_field(), None);
        assert!(coordinator.field(a).is_none());
    }

    #[test]
    fn late_bind_focuses_active_field() {
        let (mut coordinator, mut server) = setup();

        let b = coordinator.create_text_field(&mut server, APP, S1).unwrap();
        coordinator.activate(&mut server, APP, b).unwrap();
        assert_eq!(server.take(), vec![Record::Panel(PanelEvent::Show)]);
        assert_eq!(coordinator.grab_owner(), None);

        coordinator.bind_input_method(&mut server, IM).unwrap();
        let ctx = context_of(&coordinator, b);
        assert_eq!(
            server.take(),
            vec![
                ev(IM, Event::CreateContext { context: ctx }),
                ev(IM, Event::FocusIn { context: ctx }),
            ]
        );
        assert_eq!(coordinator.grab_owner(), Some(b));
    }

    #[test]
    fn switching_fields_leaves_old_one_first() {
        let (mut coordinator, mut server) = setup();
        coordinator.bind_input_method(&mut server, IM).unwrap();
        let a = coordinator.create_text_field(&mut server, APP, S1).unwrap();
        let b = coordinator.create_text_field(&mut server, APP, S2).unwrap();
        let (ctx_a, ctx_b) = (context_of(&coordinator, a), context_of(&coordinator, b));
        coordinator.activate(&mut server, APP, a).unwrap();
        server.take();

        coordinator.activate(&mut server, APP, b).unwrap();

        assert_eq!(
            server.take(),
            vec![
                Record::Panel(PanelEvent::Hide),
                ev(IM, Event::FocusOut { context: ctx_a }),
                Record::Panel(PanelEvent::Show),
                ev(IM, Event::FocusIn { context: ctx_b }),
            ]
        );
        assert!(!coordinator.field(a).unwrap().is_active());
        assert!(coordinator.field(b).unwrap().is_active());
        assert_eq!(coordinator.grab_owner(), Some(b));
    }

    #[test]
    fn one_active_field_and_grab_iff_bound() {
        let (mut coordinator, mut server) = setup();
        let fields: Vec<FieldId> = [S1, S2, S1]
            .iter()
            .map(|&s| coordinator.create_text_field(&mut server, APP, s).unwrap())
            .collect();

        let check = |coordinator: &InputMethodCoordinator| {
            let active: Vec<FieldId> = coordinator
                .fields()
                .into_iter()
                .filter(|&id| coordinator.field(id).unwrap().is_active())
                .collect();
            assert!(active.len() <= 1);
            assert_eq!(active.first().copied(), coordinator.active_field());

            let expected_grab = if coordinator.is_bound() {
                coordinator.active_field()
            } else {
                None
            };
            assert_eq!(coordinator.grab_owner(), expected_grab);
        };

        let steps: [(usize, bool); 10] = [
            (0, true),
            (1, true),
            (1, false),
            (2, true),
            (2, true),
            (0, false),
            (0, true),
            (2, true),
            (2, false),
            (1, true),
        ];

        for (round, &(i, on)) in steps.iter().enumerate() {
            if round == 4 {
                coordinator.bind_input_method(&mut server, IM).unwrap();
            }
            if round == 8 {
                coordinator.unbind_input_method();
            }

            if on {
                coordinator.activate(&mut server, APP, fields[i]).unwrap();
            } else {
                coordinator.deactivate(&mut server, APP, fields[i]).unwrap();
            }
            check(&coordinator);
        }
    }

    #[test]
    fn focus_moving_away_deactivates_exactly_once() {
        let (mut coordinator, mut server) = setup();
        coordinator.bind_input_method(&mut server, IM).unwrap();
        let a = coordinator.create_text_field(&mut server, APP, S1).unwrap();
        let ctx = context_of(&coordinator, a);
        coordinator
            .route_focus_change(&mut server, focus(S1))
            .unwrap();
        coordinator.activate(&mut server, APP, a).unwrap();
        server.take();

        coordinator
            .route_focus_change(&mut server, focus(S2))
            .unwrap();
        coordinator
            .route_focus_change(&mut server, focus(S1))
            .unwrap();

        assert_eq!(
            server.take(),
            vec![
                Record::Panel(PanelEvent::Hide),
                ev(IM, Event::FocusOut { context: ctx }),
            ]
        );
        assert_eq!(coordinator.grab_owner(), None);
        assert!(!coordinator.field(a).unwrap().is_active());
    }

    #[test]
    fn keys_follow_grab() {
        let (mut coordinator, mut server) = setup();
        let mirror = MirrorId(1);
        coordinator.bind_input_method(&mut server, IM).unwrap();
        coordinator
            .request_keyboard_mirror(&mut server, IM, mirror)
            .unwrap();
        let a = coordinator.create_text_field(&mut server, APP, S1).unwrap();
        let ctx = context_of(&coordinator, a);
        coordinator
            .route_focus_change(&mut server, focus(S1))
            .unwrap();
        coordinator.activate(&mut server, APP, a).unwrap();
        server.take();

        // the input method swallows the key and forwards another one
        coordinator
            .handle_key(&mut server, 10, 38, KeyState::Pressed)
            .unwrap();
        coordinator
            .handle_context_request(
                &mut server,
                IM,
                ctx,
                ContextRequest::ForwardKey {
                    time: 10,
                    key: 28,
                    state: 1,
                },
            )
            .unwrap();
        coordinator
            .handle_modifiers(&mut server, ModifierState::default())
            .unwrap();

        assert_eq!(
            server.take(),
            vec![
                ev(
                    IM,
                    Event::MirrorKey {
                        mirror,
                        serial: 1,
                        time: 10,
                        key: 38,
                        state: KeyState::Pressed,
                    }
                ),
                ev(
                    APP,
                    Event::Key {
                        surface: S1,
                        serial: 2,
                        time: 10,
                        key: 28,
                        state: KeyState::Pressed,
                    }
                ),
                ev(
                    APP,
                    Event::Modifiers {
                        surface: S1,
                        serial: 3,
                        modifiers: ModifierState::default(),
                    }
                ),
                ev(
                    IM,
                    Event::MirrorModifiers {
                        mirror,
                        serial: 4,
                        modifiers: ModifierState::default(),
                    }
                ),
            ]
        );
    }

    #[test]
    fn closure_shell_sees_panel_events() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let (mut coordinator, mut server) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        coordinator.set_shell(move |event: PanelEvent| sink.borrow_mut().push(event));

        let a = coordinator.create_text_field(&mut server, APP, S1).unwrap();
        coordinator.activate(&mut server, APP, a).unwrap();
        coordinator.route_focus_change(&mut server, None).unwrap();

        assert_eq!(*seen.borrow(), vec![PanelEvent::Show, PanelEvent::Hide]);
    }
}
