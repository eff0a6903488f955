#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use connect_bot::test_support::{CountingCache, FakeContactCenter, new_peer};
use connect_bot::{
    DialogueError, SessionCache, SessionStore, Subscriber, TicketPart, WizardStep, fill,
    session_key,
};
use connect_menu::states;
use uuid::Uuid;

fn store_with(cache: Arc<CountingCache>, contact_center: FakeContactCenter) -> SessionStore {
    SessionStore::new(cache, Duration::from_secs(60), Arc::new(contact_center))
}

fn subscriber(name: &str) -> Subscriber {
    Subscriber {
        name: name.to_string(),
        ..Subscriber::default()
    }
}

#[tokio::test]
async fn miss_builds_a_fresh_session_without_writing() {
    let cache = Arc::new(CountingCache::default());
    let store = store_with(
        cache.clone(),
        FakeContactCenter::new().with_subscriber(subscriber("Ann")),
    );
    let peer = new_peer();

    let session = store.get(&peer).await;
    assert_eq!(session.current_state, states::GREETINGS);
    assert_eq!(session.previous_state, states::GREETINGS);
    assert!(session.history_state.is_empty());
    assert_eq!(session.user.name, "Ann");
    assert_eq!(session.user.user_id, peer.user_id);
    assert_eq!(cache.writes(), 0);
}

#[tokio::test]
async fn change_to_the_current_state_writes_nothing() {
    let cache = Arc::new(CountingCache::default());
    let store = store_with(cache.clone(), FakeContactCenter::new());
    let peer = new_peer();
    let mut session = store.get(&peer).await;

    let changed = store
        .change_state(&peer, &mut session, states::GREETINGS)
        .await
        .expect("no-op change");
    assert!(!changed);
    assert_eq!(cache.writes(), 0);

    let changed = store
        .change_state(&peer, &mut session, states::START)
        .await
        .expect("state change");
    assert!(changed);
    assert_eq!(cache.writes(), 1);
    assert_eq!(session.previous_state, states::GREETINGS);
    assert_eq!(session.current_state, states::START);
}

#[tokio::test]
async fn written_session_is_read_back() {
    let cache = Arc::new(CountingCache::default());
    let store = store_with(cache.clone(), FakeContactCenter::new());
    let peer = new_peer();
    let mut session = store.get(&peer).await;

    store
        .mutate_vars(&peer, &mut session, "note", "hello")
        .await
        .expect("vars write");
    store
        .change_state(&peer, &mut session, "tariffs")
        .await
        .expect("state change");

    let loaded = store.get(&peer).await;
    assert_eq!(loaded, session);
    assert_eq!(loaded.var("note"), Some("hello"));
    assert_eq!(loaded.history_state, vec!["tariffs".to_string()]);
}

#[tokio::test]
async fn undecodable_payload_reads_as_a_miss() {
    let cache = Arc::new(CountingCache::default());
    let store = store_with(cache.clone(), FakeContactCenter::new());
    let peer = new_peer();
    cache
        .set(
            &session_key(peer.user_id, peer.line_id),
            b"{not json".to_vec(),
            Duration::from_secs(60),
        )
        .await
        .expect("raw write");

    let session = store.get(&peer).await;
    assert_eq!(session.current_state, states::GREETINGS);
    assert!(session.vars.is_empty());
}

#[tokio::test]
async fn dialogues_are_keyed_by_user_and_line() {
    let cache = Arc::new(CountingCache::default());
    let store = store_with(cache.clone(), FakeContactCenter::new());
    let peer = new_peer();
    let other_line = connect_bot::Peer {
        line_id: Uuid::new_v4(),
        ..peer
    };

    let mut session = store.get(&peer).await;
    store
        .change_state(&peer, &mut session, states::START)
        .await
        .expect("state change");

    assert_eq!(store.get(&peer).await.current_state, states::START);
    assert_eq!(store.get(&other_line).await.current_state, states::GREETINGS);
}

#[tokio::test]
async fn incomplete_ticket_field_is_rejected_without_writing() {
    let cache = Arc::new(CountingCache::default());
    let store = store_with(cache.clone(), FakeContactCenter::new());
    let peer = new_peer();
    let mut session = store.get(&peer).await;

    let err = store
        .mutate_ticket_field(
            &peer,
            &mut session,
            WizardStep::Executor,
            TicketPart {
                id: Uuid::new_v4(),
                name: String::new(),
            },
        )
        .await
        .expect_err("catalog field needs a name");
    assert!(matches!(err, DialogueError::InvalidTicketValue { .. }));
    assert_eq!(cache.writes(), 0);
}

#[test]
fn history_collapses_repeats_and_skips_transient_states() {
    let mut session = connect_bot::Session::new(Subscriber::default());
    for state in [
        "tariffs",
        "tariffs",
        states::WAIT_SEND,
        "options",
        states::CREATE_TICKET,
        states::CREATE_TICKET_PREV_STAGE,
        "tariffs",
    ] {
        session.history_append(state);
    }
    assert_eq!(
        session.history_state,
        vec![
            "tariffs".to_string(),
            "options".to_string(),
            "tariffs".to_string()
        ]
    );
}

#[test]
fn reset_states_wipe_history() {
    for reset in [states::START, states::FINAL, states::FAIL_QNA, states::GREETINGS] {
        let mut session = connect_bot::Session::new(Subscriber::default());
        session.history_append("tariffs");
        session.history_append("options");
        session.history_append(reset);
        assert!(session.history_state.is_empty(), "{reset} should reset history");
    }
}

#[test]
fn back_steps_walk_history_down_to_greetings() {
    let mut session = connect_bot::Session::new(Subscriber::default());
    for state in ["tariffs", "options", "details"] {
        session.history_append(state);
    }

    session.history_back();
    assert_eq!(session.previous_state, "options");
    session.history_back();
    assert_eq!(session.previous_state, "tariffs");
    session.history_back();
    assert_eq!(session.previous_state, states::GREETINGS);
    session.history_back();
    assert_eq!(session.previous_state, states::GREETINGS);
    assert!(session.history_state.is_empty());
}

#[test]
fn templates_read_user_vars_and_ticket() {
    let mut session = connect_bot::Session::new(subscriber("Ann"));
    session
        .vars
        .insert("note".to_string(), "call me back".to_string());
    session.ticket.theme = "Printer".to_string();

    let text = fill(
        "{{ User.name }}: {{ Var.note }} ({{ Ticket.theme }})",
        &session,
    )
    .expect("template should render");
    assert_eq!(text, "Ann: call me back (Printer)");
}

#[test]
fn malformed_template_is_an_error() {
    let session = connect_bot::Session::new(Subscriber::default());
    let err = fill("Hello {{ User.name ", &session).expect_err("unclosed expression");
    assert!(matches!(err, DialogueError::Template(_)));
}
