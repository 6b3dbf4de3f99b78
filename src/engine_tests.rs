use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::engine::{Dispatch, DispatchEngine, Handler};
use crate::error::RegisterError;
use crate::event::{KeyEvent, KeyTarget, TypingGuard};
use crate::overrides::KeymapOverrides;
use crate::registry::{Binding, KeymapRegistry};
use crate::types::Shortcut;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
enum Action {
    Save,
    Find,
    CloseOverlay,
    Confirm,
    AddItem,
    NextItem,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn binding(chord: &str, description: &str) -> Binding {
    Binding::new(Shortcut::parse(chord).unwrap(), description)
}

fn registry() -> KeymapRegistry<Action> {
    KeymapRegistry::new([
        (Action::Save, binding("Ctrl+S", "Save")),
        (Action::Find, binding("Ctrl+F", "Find")),
        (Action::CloseOverlay, binding("Escape", "Close the overlay")),
        (Action::Confirm, binding("Enter", "Confirm")),
        (Action::AddItem, binding("Ctrl+M", "Add an item")),
        (Action::NextItem, binding("n", "Select the next item")),
    ])
}

fn engine() -> DispatchEngine<Action> {
    DispatchEngine::new(registry(), TypingGuard::new(["text-input", "textarea"]))
}

/// Handler that counts its invocations.
fn counter() -> (Rc<Cell<usize>>, Handler) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, Box::new(move |_: &KeyEvent| inner.set(inner.get() + 1)))
}

#[test]
fn dispatches_matching_shortcut() {
    init_tracing();
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::Save, handler).unwrap();

    engine.key_down(&KeyEvent::new("Control"));
    let outcome = engine.key_down(&KeyEvent::new("s"));

    assert_eq!(outcome, Dispatch::Handled(Action::Save));
    assert!(outcome.should_suppress_default());
    assert_eq!(count.get(), 1);
}

#[test]
fn wrong_modifiers_do_not_match() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::Save, handler).unwrap();

    assert_eq!(engine.key_down(&KeyEvent::new("s")), Dispatch::NoMatch);
    assert_eq!(count.get(), 0);
}

#[test]
fn handler_receives_the_original_event() {
    let mut engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let inner = seen.clone();
    engine
        .register(
            Action::NextItem,
            Box::new(move |event: &KeyEvent| inner.borrow_mut().push(event.key.clone())),
        )
        .unwrap();

    engine.key_down(&KeyEvent::new("n"));
    assert_eq!(*seen.borrow(), vec!["n".to_string()]);
}

#[test]
fn context_specific_binding_shadows_global() {
    let mut engine = engine();
    let (global_count, global_handler) = counter();
    let (modal_count, modal_handler) = counter();
    engine.register(Action::CloseOverlay, global_handler).unwrap();
    engine
        .register_in(Action::CloseOverlay, "modal", modal_handler)
        .unwrap();

    engine.push_context("modal");
    assert_eq!(
        engine.key_down(&KeyEvent::new("Escape")),
        Dispatch::Handled(Action::CloseOverlay)
    );
    assert_eq!(modal_count.get(), 1);
    assert_eq!(global_count.get(), 0);

    engine.pop_context();
    engine.key_down(&KeyEvent::new("Escape"));
    assert_eq!(modal_count.get(), 1);
    assert_eq!(global_count.get(), 1);
}

#[test]
fn unmatched_context_falls_back_to_global() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::Save, handler).unwrap();

    engine.push_context("modal");
    engine.key_down(&KeyEvent::new("Control"));
    assert_eq!(
        engine.key_down(&KeyEvent::new("s")),
        Dispatch::Handled(Action::Save)
    );
    assert_eq!(count.get(), 1);
}

#[test]
fn rebinding_keeps_the_original_handler() {
    init_tracing();
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::AddItem, handler).unwrap();

    engine.set_overrides([(
        Action::AddItem,
        Some(binding("Alt+M", "Add an item")),
    )]);

    // the old chord is dead
    engine.key_down(&KeyEvent::new("Control"));
    assert_eq!(engine.key_down(&KeyEvent::new("m")), Dispatch::NoMatch);
    engine.key_up(&KeyEvent::new("Control"));
    assert_eq!(count.get(), 0);

    // the new chord reaches the handler registered before the rebind
    engine.key_down(&KeyEvent::new("Alt"));
    assert_eq!(
        engine.key_down(&KeyEvent::new("m")),
        Dispatch::Handled(Action::AddItem)
    );
    assert_eq!(count.get(), 1);
}

#[test]
fn reset_overrides_restores_default_chord() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::AddItem, handler).unwrap();

    engine.set_overrides([(Action::AddItem, Some(binding("Alt+M", "Add an item")))]);
    engine.reset_overrides();

    engine.key_down(&KeyEvent::new("Control"));
    assert_eq!(
        engine.key_down(&KeyEvent::new("m")),
        Dispatch::Handled(Action::AddItem)
    );
    assert_eq!(count.get(), 1);
}

#[test]
fn disabling_override_parks_the_handler() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::NextItem, handler).unwrap();

    engine.set_overrides([(Action::NextItem, None)]);
    assert_eq!(engine.key_down(&KeyEvent::new("n")), Dispatch::NoMatch);
    assert_eq!(count.get(), 0);

    // a later override change brings the parked handler back
    engine.reset_overrides();
    assert_eq!(
        engine.key_down(&KeyEvent::new("n")),
        Dispatch::Handled(Action::NextItem)
    );
    assert_eq!(count.get(), 1);
}

#[test]
fn apply_overrides_document() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::AddItem, handler).unwrap();

    let doc: KeymapOverrides<Action> =
        KeymapOverrides::from_json(r#"{ "addItem": "Alt+M" }"#).unwrap();
    let errors = engine.apply_overrides(&doc);
    assert!(errors.is_empty());

    engine.key_down(&KeyEvent::new("Alt"));
    assert_eq!(
        engine.key_down(&KeyEvent::new("m")),
        Dispatch::Handled(Action::AddItem)
    );
    assert_eq!(count.get(), 1);
}

#[test]
fn typing_guard_swallows_plain_keys() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::NextItem, handler).unwrap();

    let in_field = KeyEvent::new("n").with_target(KeyTarget::element("text-input"));
    assert_eq!(engine.key_down(&in_field), Dispatch::Guarded);
    assert_eq!(count.get(), 0);

    // unmarked element kinds dispatch normally
    let on_button = KeyEvent::new("n").with_target(KeyTarget::element("button"));
    assert_eq!(engine.key_down(&on_button), Dispatch::Handled(Action::NextItem));
    assert_eq!(count.get(), 1);
}

#[test]
fn escape_always_escapes_the_guard() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::CloseOverlay, handler).unwrap();

    let event = KeyEvent::new("Escape").with_target(KeyTarget::element("text-input"));
    assert_eq!(engine.key_down(&event), Dispatch::Handled(Action::CloseOverlay));
    assert_eq!(count.get(), 1);
}

#[test]
fn enter_dispatches_only_when_the_target_opts_in() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::Confirm, handler).unwrap();

    let plain = KeyEvent::new("Enter").with_target(KeyTarget::element("text-input"));
    assert_eq!(engine.key_down(&plain), Dispatch::Guarded);

    let opted_in =
        KeyEvent::new("Enter").with_target(KeyTarget::element("text-input").with_enter_opt_in());
    assert_eq!(engine.key_down(&opted_in), Dispatch::Handled(Action::Confirm));
    assert_eq!(count.get(), 1);
}

#[test]
fn base_context_survives_pop() {
    let mut engine = engine();
    assert_eq!(engine.pop_context(), None);
    assert_eq!(engine.current_context(), "global");
}

#[test]
fn replace_top_swaps_scope_identity() {
    let mut engine = engine();
    engine.push_context("panel-a");
    engine.replace_top("panel-b");
    assert_eq!(engine.current_context(), "panel-b");
    assert_eq!(engine.pop_context().as_deref(), Some("panel-b"));
    assert_eq!(engine.current_context(), "global");
}

#[test]
fn blur_resets_modifier_state() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::AddItem, handler).unwrap();

    engine.key_down(&KeyEvent::new("Control"));
    engine.window_blur();
    // the key-up for Control was lost to the blur; "m" must encode as
    // plain M, not Ctrl+M
    assert_eq!(engine.key_down(&KeyEvent::new("m")), Dispatch::NoMatch);
    assert_eq!(count.get(), 0);
}

#[test]
fn key_up_releases_modifiers() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::Save, handler).unwrap();

    engine.key_down(&KeyEvent::new("Control"));
    engine.key_up(&KeyEvent::new("Control"));
    assert_eq!(engine.key_down(&KeyEvent::new("s")), Dispatch::NoMatch);
    assert_eq!(count.get(), 0);
}

#[test]
fn disable_and_enable() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::NextItem, handler).unwrap();

    engine.disable();
    assert!(!engine.is_enabled());
    assert_eq!(engine.key_down(&KeyEvent::new("n")), Dispatch::Disabled);

    engine.enable();
    assert_eq!(engine.key_down(&KeyEvent::new("n")), Dispatch::Handled(Action::NextItem));
    assert_eq!(count.get(), 1);
}

#[test]
fn destroy_is_idempotent_and_final() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::NextItem, handler).unwrap();

    engine.destroy();
    engine.destroy();
    assert!(engine.is_destroyed());
    assert_eq!(engine.key_down(&KeyEvent::new("n")), Dispatch::Disabled);
    assert_eq!(count.get(), 0);

    // enable cannot resurrect a destroyed engine
    engine.enable();
    assert_eq!(engine.key_down(&KeyEvent::new("n")), Dispatch::Disabled);

    let (_, late) = counter();
    assert_eq!(
        engine.register(Action::NextItem, late),
        Err(RegisterError::Destroyed)
    );
}

#[test]
fn unknown_action_registration_is_skipped() {
    init_tracing();
    let mut engine: DispatchEngine<Action> =
        DispatchEngine::new(KeymapRegistry::new([]), TypingGuard::none());
    let (count, handler) = counter();

    assert_eq!(
        engine.register(Action::Save, handler),
        Err(RegisterError::UnknownAction(Action::Save))
    );
    engine.key_down(&KeyEvent::new("Control"));
    assert_eq!(engine.key_down(&KeyEvent::new("s")), Dispatch::NoMatch);
    assert_eq!(count.get(), 0);
}

#[test]
fn reregistering_replaces_the_handler() {
    let mut engine = engine();
    let (first_count, first) = counter();
    let (second_count, second) = counter();
    engine.register(Action::NextItem, first).unwrap();
    engine.register(Action::NextItem, second).unwrap();

    engine.key_down(&KeyEvent::new("n"));
    assert_eq!(first_count.get(), 0);
    assert_eq!(second_count.get(), 1);
}

#[test]
fn colliding_registration_later_wins() {
    init_tracing();
    let mut registry = registry();
    // rebind Find onto Save's chord so both claim Ctrl+S
    registry.set_overrides([(Action::Find, Some(binding("Ctrl+S", "Find")))]);
    let mut engine = DispatchEngine::new(registry, TypingGuard::none());

    let (save_count, save) = counter();
    let (find_count, find) = counter();
    engine.register(Action::Save, save).unwrap();
    engine.register(Action::Find, find).unwrap();

    engine.key_down(&KeyEvent::new("Control"));
    assert_eq!(
        engine.key_down(&KeyEvent::new("s")),
        Dispatch::Handled(Action::Find)
    );
    assert_eq!(save_count.get(), 0);
    assert_eq!(find_count.get(), 1);
}

#[test]
fn unregister_removes_the_handler() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::NextItem, handler).unwrap();

    engine.unregister(Action::NextItem);
    assert_eq!(engine.key_down(&KeyEvent::new("n")), Dispatch::NoMatch);
    assert_eq!(count.get(), 0);

    // unregistering something absent is a no-op
    engine.unregister(Action::NextItem);
    engine.unregister_in(Action::NextItem, "modal");
}

#[test]
fn merged_bindings_reflect_overrides() {
    let mut engine = engine();
    engine.set_overrides([(Action::AddItem, Some(binding("Alt+M", "Add an item")))]);

    let bindings = engine.bindings();
    let add_item = bindings
        .iter()
        .find(|(action, _)| *action == Action::AddItem)
        .unwrap();
    assert_eq!(add_item.1.shortcut.to_string(), "Alt+M");
    assert_eq!(bindings.len(), 6);
}

#[test]
fn engines_share_no_state() {
    let mut first = engine();
    let mut second = engine();
    let (count, handler) = counter();
    first.register(Action::NextItem, handler).unwrap();

    assert_eq!(second.key_down(&KeyEvent::new("n")), Dispatch::NoMatch);
    assert_eq!(first.key_down(&KeyEvent::new("n")), Dispatch::Handled(Action::NextItem));
    assert_eq!(count.get(), 1);

    first.destroy();
    assert_eq!(second.key_down(&KeyEvent::new("n")), Dispatch::NoMatch);
    assert!(!second.is_destroyed());
}

#[test]
fn modifier_keydown_alone_matches_nothing() {
    let mut engine = engine();
    let (count, handler) = counter();
    engine.register(Action::Save, handler).unwrap();

    assert_eq!(engine.key_down(&KeyEvent::new("Control")), Dispatch::NoMatch);
    assert_eq!(count.get(), 0);
}
