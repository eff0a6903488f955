#![allow(missing_docs)]

use std::sync::Arc;

use connect_bot::test_support::{FakeContactCenter, FakeKnowledgeBase, Harness, event, new_peer};
use connect_bot::{InFlightLimit, InboundMessage, MessageType, SessionGate, spawn_dispatcher};
use connect_menu::states;
use tokio::sync::mpsc;

const MENU: &str = r#"
back_button:
  text: "Back"
menus:
  start:
    answer:
      - chat: "Main menu"
    buttons:
      - button:
          text: "Tariffs"
          goto: tariffs
  tariffs:
    answer:
      - chat: "Our tariffs"
    buttons:
      - button:
          back_button: true
"#;

#[tokio::test]
async fn events_of_one_dialogue_are_handled_in_order() {
    let harness = Harness::new(MENU, FakeContactCenter::new(), FakeKnowledgeBase::failing())
        .expect("menu should parse");
    let peer = harness.peer;
    let Harness {
        dispatcher,
        sender,
        ..
    } = harness;
    let dispatcher = Arc::new(dispatcher);

    let (tx, rx) = mpsc::channel::<InboundMessage>(16);
    let worker = spawn_dispatcher(
        Arc::clone(&dispatcher),
        rx,
        InFlightLimit::new(4),
        SessionGate::new(),
    );
    for text in ["menu", "Tariffs", "Back", "Tariffs"] {
        tx.send(event(&peer, MessageType::Text, text))
            .await
            .expect("enqueue");
    }
    drop(tx);
    worker.await.expect("dispatcher task");

    assert_eq!(
        sender.texts(),
        vec!["Main menu", "Our tariffs", "Main menu", "Our tariffs"]
    );
    let session = dispatcher.store().get(&peer).await;
    assert_eq!(session.current_state, "tariffs");
    assert_eq!(session.previous_state, states::START);
}

#[tokio::test]
async fn separate_dialogues_keep_separate_sessions() {
    let harness = Harness::new(MENU, FakeContactCenter::new(), FakeKnowledgeBase::failing())
        .expect("menu should parse");
    let dispatcher = Arc::new(harness.dispatcher);
    let first = new_peer();
    let second = new_peer();

    let (tx, rx) = mpsc::channel::<InboundMessage>(16);
    let worker = spawn_dispatcher(
        Arc::clone(&dispatcher),
        rx,
        InFlightLimit::new(1),
        SessionGate::new(),
    );
    tx.send(event(&first, MessageType::Text, "menu"))
        .await
        .expect("enqueue");
    tx.send(event(&second, MessageType::Text, "menu"))
        .await
        .expect("enqueue");
    tx.send(event(&first, MessageType::Text, "Tariffs"))
        .await
        .expect("enqueue");
    drop(tx);
    worker.await.expect("dispatcher task");

    assert_eq!(dispatcher.store().get(&first).await.current_state, "tariffs");
    assert_eq!(
        dispatcher.store().get(&second).await.current_state,
        states::START
    );
}
