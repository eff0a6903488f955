#![allow(missing_docs)]

use std::time::Duration;

use connect_bot::test_support::{ContactCall, FakeContactCenter, FakeKnowledgeBase, Harness, Sent};
use connect_bot::{KB_SOURCE_GOODBYES, KbAnswer, KbResponse};
use connect_menu::states;
use uuid::Uuid;

const MENU: &str = r#"
use_qna:
  enabled: true
menus:
  start:
    answer:
      - chat: "Main menu"
    buttons:
      - button:
          text: "Prices"
          goto: prices
  prices:
    qna_disable: true
    answer:
      - chat: "Price list"
        file: "prices.png"
        file_text: "Current prices"
    buttons:
      - button:
          text: "Home"
          goto: start
  fail_qna_menu:
    answer:
      - chat: "I did not understand"
    buttons:
      - button:
          text: "Home"
          goto: start
"#;

fn answer(text: &str, accuracy: f32, source: &str) -> KbAnswer {
    KbAnswer {
        id: Uuid::new_v4(),
        text: text.to_string(),
        accuracy,
        answer_source: source.to_string(),
    }
}

fn response(answers: Vec<KbAnswer>) -> KbResponse {
    KbResponse {
        request_id: Uuid::new_v4(),
        question: String::new(),
        answers,
    }
}

async fn wait_for_ack(knowledge_base: &FakeKnowledgeBase) -> Vec<(Uuid, Uuid)> {
    for _ in 0..50 {
        let selected = knowledge_base.selected();
        if !selected.is_empty() {
            return selected;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Vec::new()
}

#[tokio::test]
async fn free_text_in_greetings_is_answered_from_the_knowledge_base() {
    let kb = response(vec![
        answer("ignored", 0.0, ""),
        answer("We are open 9 to 5", 0.7, "FAQ"),
    ]);
    let request_id = kb.request_id;
    let result_id = kb.answers[1].id;
    let harness = Harness::new(
        MENU,
        FakeContactCenter::new(),
        FakeKnowledgeBase::answering(kb),
    )
    .expect("menu should parse");

    let state = harness.text("when are you open?").await.expect("handle");
    assert_eq!(state, states::START);
    assert_eq!(harness.sender.texts(), vec!["We are open 9 to 5"]);
    assert_eq!(
        harness.sender.last_keyboard(),
        harness.dispatcher.menu().keyboard(states::START)
    );
    assert_eq!(
        wait_for_ack(&harness.knowledge_base).await,
        vec![(request_id, result_id)]
    );
}

#[tokio::test]
async fn menu_keyword_bypasses_the_knowledge_base() {
    let harness = Harness::new(
        MENU,
        FakeContactCenter::new(),
        FakeKnowledgeBase::failing(),
    )
    .expect("menu should parse");

    let state = harness.text("MENU").await.expect("handle");
    assert_eq!(state, states::START);
    assert_eq!(harness.sender.texts(), vec!["Main menu"]);
}

#[tokio::test]
async fn goodbye_answer_closes_the_treatment() {
    let harness = Harness::new(
        MENU,
        FakeContactCenter::new(),
        FakeKnowledgeBase::answering(response(vec![answer(
            "Have a nice day",
            0.9,
            KB_SOURCE_GOODBYES,
        )])),
    )
    .expect("menu should parse");

    let state = harness.text("thanks, bye").await.expect("handle");
    assert_eq!(state, states::GREETINGS);
    assert_eq!(
        harness.sender.sent(),
        vec![Sent::Text {
            text: "Have a nice day".to_string(),
            keyboard: None,
        }]
    );
    assert_eq!(harness.contact_center.calls(), vec![ContactCall::CloseTreatment]);
}

#[tokio::test]
async fn unusable_answers_open_the_fail_menu() {
    for knowledge_base in [
        FakeKnowledgeBase::failing(),
        FakeKnowledgeBase::answering(response(vec![answer("nope", 0.0, "FAQ")])),
        FakeKnowledgeBase::answering(response(Vec::new())),
    ] {
        let harness = Harness::new(MENU, FakeContactCenter::new(), knowledge_base)
            .expect("menu should parse");
        let state = harness.text("asdf").await.expect("handle");
        assert_eq!(state, states::FAIL_QNA);
        assert_eq!(harness.sender.texts(), vec!["I did not understand"]);
    }
}

#[tokio::test]
async fn menus_with_qna_disabled_reply_with_the_error_message() {
    let harness = Harness::new(
        MENU,
        FakeContactCenter::new(),
        FakeKnowledgeBase::answering(response(vec![answer("unused", 0.9, "FAQ")])),
    )
    .expect("menu should parse");
    harness.text("menu").await.expect("start");
    harness.text("Prices").await.expect("prices");
    harness.sender.clear();

    let state = harness.text("how much?").await.expect("handle");
    assert_eq!(state, "prices");
    let error_message = harness.dispatcher.menu().error_message.clone();
    assert_eq!(harness.sender.texts(), vec![error_message]);
    assert!(harness.knowledge_base.selected().is_empty());
}

#[tokio::test]
async fn attachments_carry_the_keyboard_after_the_text() {
    let files = tempfile::tempdir().expect("tempdir");
    std::fs::write(files.path().join("prices.png"), b"png").expect("write attachment");
    let harness = Harness::with_files_dir(
        MENU,
        FakeContactCenter::new(),
        FakeKnowledgeBase::failing(),
        files.path().to_path_buf(),
    )
    .expect("menu should parse");
    harness.text("menu").await.expect("start");
    harness.sender.clear();

    harness.text("Prices").await.expect("prices");
    let keyboard = harness.dispatcher.menu().keyboard("prices");
    assert_eq!(
        harness.sender.sent(),
        vec![
            Sent::Text {
                text: "Price list".to_string(),
                keyboard: None,
            },
            Sent::File {
                file_name: "prices.png".to_string(),
                caption: "Current prices".to_string(),
                is_image: true,
                keyboard,
            },
        ]
    );
}

#[tokio::test]
async fn missing_attachment_is_skipped() {
    let harness = Harness::new(
        MENU,
        FakeContactCenter::new(),
        FakeKnowledgeBase::failing(),
    )
    .expect("menu should parse");
    harness.text("menu").await.expect("start");
    harness.sender.clear();

    assert_eq!(harness.text("Prices").await.expect("prices"), "prices");
    assert_eq!(
        harness.sender.sent(),
        vec![Sent::Text {
            text: "Price list".to_string(),
            keyboard: harness.dispatcher.menu().keyboard("prices"),
        }]
    );
}
