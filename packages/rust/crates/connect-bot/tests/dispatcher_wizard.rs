#![allow(missing_docs)]

use connect_bot::test_support::{ContactCall, FakeContactCenter, FakeKnowledgeBase, Harness};
use connect_bot::{CatalogEntry, NewTicket, Subscriber, Ticket, TicketPart, WizardStep};
use connect_menu::states;
use uuid::Uuid;

const CHANNEL: &str = "11111111-2222-4333-8444-555555555555";
const EXECUTOR: &str = "22222222-3333-4444-8555-666666666666";
const SERVICE: &str = "33333333-4444-4555-8666-777777777777";
const SERVICE_TYPE: &str = "44444444-5555-4666-8777-888888888888";

const MENU: &str = r#"
ticket_buttons:
  confirm: "Confirm"
  back: "Previous"
  cancel: "Cancel"
  incorrect_value: "Incorrect value"
menus:
  start:
    answer:
      - chat: "Main menu"
    buttons:
      - button:
          text: "New ticket"
          ticket_button:
            channel_id: 11111111-2222-4333-8444-555555555555
            theme:
              text: "What is the problem, {{ User.name }}?"
            description:
              text: "Describe it"
            executor:
              text: "Who should handle it?"
              value: "22222222-3333-4444-8555-666666666666"
            service:
              text: "Pick a service"
            service_type:
              text: "Pick a type"
            data:
              text: "Create ticket '{{ Ticket.theme }}' for {{ Ticket.service.name }}?"
  final_menu:
    answer:
      - chat: "Anything else?"
"#;

fn uuid(raw: &str) -> Uuid {
    Uuid::parse_str(raw).expect("valid uuid literal")
}

fn entry(id: &str, name: &str) -> CatalogEntry {
    CatalogEntry {
        id: uuid(id),
        name: name.to_string(),
    }
}

fn contact_center() -> FakeContactCenter {
    FakeContactCenter::new()
        .with_subscriber(Subscriber {
            name: "Ann".to_string(),
            ..Subscriber::default()
        })
        .with_executors(vec![entry(EXECUTOR, "Bob")])
        .with_services(vec![
            entry(SERVICE, "Support"),
            CatalogEntry {
                id: Uuid::new_v4(),
                name: "Billing".to_string(),
            },
        ])
        .with_service_types(uuid(SERVICE), vec![entry(SERVICE_TYPE, "Hardware")])
}

async fn wizard(contact_center: FakeContactCenter) -> Harness {
    let harness = Harness::new(MENU, contact_center, FakeKnowledgeBase::failing())
        .expect("menu should parse");
    harness.text("menu").await.expect("open start");
    let state = harness.text("New ticket").await.expect("start wizard");
    assert_eq!(state, states::CREATE_TICKET);
    harness
}

async fn step(harness: &Harness) -> Option<WizardStep> {
    harness.session().await.ticket.step
}

fn key_texts(harness: &Harness) -> Vec<String> {
    harness
        .sender
        .last_keyboard()
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|key| key.text)
        .collect()
}

#[tokio::test]
async fn first_prompt_is_templated_with_wizard_keys() {
    let harness = wizard(contact_center()).await;

    assert_eq!(
        harness.sender.texts().last().map(String::as_str),
        Some("What is the problem, Ann?")
    );
    assert_eq!(key_texts(&harness), vec!["Previous", "Cancel"]);
    let session = harness.session().await;
    assert_eq!(session.ticket.step, Some(WizardStep::Theme));
    assert_eq!(session.ticket.channel_id, uuid(CHANNEL));
    assert!(session.ticket_button().is_some());
}

#[tokio::test]
async fn defaulted_steps_are_filled_without_prompting() {
    let harness = wizard(contact_center()).await;
    harness.text("Printer broken").await.expect("theme");
    harness.sender.clear();
    harness.text("It jams").await.expect("description");

    assert_eq!(harness.sender.texts(), vec!["Pick a service"]);
    assert_eq!(key_texts(&harness), vec!["Support", "Billing", "Previous", "Cancel"]);
    let session = harness.session().await;
    assert_eq!(session.ticket.step, Some(WizardStep::Service));
    assert_eq!(
        session.ticket.executor,
        TicketPart {
            id: uuid(EXECUTOR),
            name: "Bob".to_string(),
        }
    );
}

#[tokio::test]
async fn unknown_catalog_value_is_rejected_and_draft_kept() {
    let harness = wizard(contact_center()).await;
    harness.text("Printer broken").await.expect("theme");
    harness.text("It jams").await.expect("description");
    let before = harness.session().await.ticket;
    harness.sender.clear();

    let state = harness.text("Plumbing").await.expect("reject");
    assert_eq!(state, states::CREATE_TICKET);
    assert_eq!(harness.sender.texts(), vec!["Incorrect value"]);
    assert_eq!(key_texts(&harness), vec!["Support", "Billing", "Previous", "Cancel"]);
    assert_eq!(harness.session().await.ticket, before);
}

#[tokio::test]
async fn blank_free_text_is_rejected() {
    let harness = wizard(contact_center()).await;
    harness.sender.clear();

    let state = harness.text("   ").await.expect("reject");
    assert_eq!(state, states::CREATE_TICKET);
    assert_eq!(harness.sender.texts(), vec!["Incorrect value"]);
    assert_eq!(step(&harness).await, Some(WizardStep::Theme));
}

#[tokio::test]
async fn back_skips_defaulted_steps_and_forward_resumes() {
    let harness = wizard(contact_center()).await;
    harness.text("Printer broken").await.expect("theme");
    harness.text("It jams").await.expect("description");
    assert_eq!(step(&harness).await, Some(WizardStep::Service));

    harness.sender.clear();
    let state = harness.text("Previous").await.expect("back");
    assert_eq!(state, states::CREATE_TICKET);
    assert_eq!(harness.sender.texts(), vec!["Describe it"]);
    assert_eq!(step(&harness).await, Some(WizardStep::Description));

    harness.text("It still jams").await.expect("description again");
    assert_eq!(step(&harness).await, Some(WizardStep::Service));
    assert_eq!(harness.session().await.ticket.description, "It still jams");
}

#[tokio::test]
async fn back_from_the_first_step_cancels() {
    let harness = wizard(contact_center()).await;
    harness.sender.clear();

    let state = harness.text("Previous").await.expect("back");
    assert_eq!(state, states::START);
    assert_eq!(harness.sender.texts(), vec!["Main menu"]);
    let session = harness.session().await;
    assert_eq!(session.ticket, Ticket::default());
    assert!(session.saved_button.is_none());
}

#[tokio::test]
async fn cancel_drops_the_draft() {
    let harness = wizard(contact_center()).await;
    harness.text("Printer broken").await.expect("theme");

    let state = harness.text("cancel").await.expect("cancel");
    assert_eq!(state, states::START);
    assert_eq!(harness.session().await.ticket, Ticket::default());
    assert!(harness.contact_center.calls().is_empty());
}

#[tokio::test]
async fn confirmed_ticket_is_submitted_and_polled() {
    let harness = wizard(contact_center().with_ticket_visible_after(2)).await;
    harness.text("Printer broken").await.expect("theme");
    harness.text("It jams").await.expect("description");
    harness.text("Support").await.expect("service");

    // Catalog names must match exactly.
    assert_eq!(
        harness.text("hardware").await.expect("reject"),
        states::CREATE_TICKET
    );
    assert_eq!(step(&harness).await, Some(WizardStep::ServiceType));

    harness.sender.clear();
    harness.text("Hardware").await.expect("service type");
    assert_eq!(
        harness.sender.texts(),
        vec!["Create ticket 'Printer broken' for Support?"]
    );
    assert_eq!(key_texts(&harness), vec!["Confirm", "Previous", "Cancel"]);
    assert_eq!(step(&harness).await, Some(WizardStep::Final));

    harness.sender.clear();
    let state = harness.text("Confirm").await.expect("submit");
    assert_eq!(state, states::FINAL);
    assert_eq!(harness.sender.texts(), vec!["Anything else?"]);
    assert_eq!(
        harness.contact_center.calls(),
        vec![ContactCall::CreateTicket(NewTicket {
            channel_id: uuid(CHANNEL),
            theme: "Printer broken".to_string(),
            description: "It jams".to_string(),
            executor_id: uuid(EXECUTOR),
            service_id: uuid(SERVICE),
            service_type_id: uuid(SERVICE_TYPE),
        })]
    );
    assert_eq!(harness.contact_center.ticket_lookups(), 2);

    let session = harness.session().await;
    assert_eq!(session.ticket, Ticket::default());
    assert!(session.saved_button.is_none());
}

#[tokio::test]
async fn unconfirmed_ticket_still_completes_the_wizard() {
    let harness = wizard(contact_center().with_ticket_visible_after(usize::MAX)).await;
    for input in ["Printer broken", "It jams", "Support", "Hardware"] {
        harness.text(input).await.expect("wizard input");
    }

    let state = harness.text("Confirm").await.expect("submit");
    assert_eq!(state, states::FINAL);
    assert_eq!(
        harness.contact_center.ticket_lookups(),
        connect_bot::Pacing::immediate().ticket_poll_retries as usize
    );
}

#[tokio::test]
async fn final_step_ignores_free_text() {
    let harness = wizard(contact_center()).await;
    for input in ["Printer broken", "It jams", "Support", "Hardware"] {
        harness.text(input).await.expect("wizard input");
    }
    harness.sender.clear();

    let state = harness.text("yes please").await.expect("reject");
    assert_eq!(state, states::CREATE_TICKET);
    assert_eq!(harness.sender.texts(), vec!["Incorrect value"]);
    assert!(harness.contact_center.calls().is_empty());
}

async fn reply_to(harness: &Harness, text: &str) -> Vec<String> {
    harness.sender.clear();
    let state = harness.text(text).await.expect("wizard input");
    assert_eq!(state, states::CREATE_TICKET);
    harness.sender.texts()
}

#[tokio::test]
async fn walking_back_and_forward_again_repeats_the_prompts() {
    let menu = MENU.replace(
        "              value: \"22222222-3333-4444-8555-666666666666\"\n",
        "",
    );
    assert!(!menu.contains(EXECUTOR), "executor default should be removed");
    let harness = Harness::new(&menu, contact_center(), FakeKnowledgeBase::failing())
        .expect("menu should parse");
    harness.text("menu").await.expect("open start");
    harness.sender.clear();
    harness.text("New ticket").await.expect("start wizard");
    let first_prompt = harness.sender.texts();

    let answers = ["Printer broken", "It jams", "Bob", "Support", "Hardware"];
    let mut forward = first_prompt.clone();
    for answer in answers {
        forward.extend(reply_to(&harness, answer).await);
    }
    assert_eq!(
        forward,
        vec![
            "What is the problem, Ann?",
            "Describe it",
            "Who should handle it?",
            "Pick a service",
            "Pick a type",
            "Create ticket 'Printer broken' for Support?",
        ]
    );
    assert_eq!(step(&harness).await, Some(WizardStep::Final));

    let mut backward = Vec::new();
    for _ in answers {
        backward.extend(reply_to(&harness, "Previous").await);
    }
    let mut expected_back = forward[..answers.len()].to_vec();
    expected_back.reverse();
    assert_eq!(backward, expected_back);
    assert_eq!(step(&harness).await, Some(WizardStep::Theme));

    let mut again = Vec::new();
    for answer in answers {
        again.extend(reply_to(&harness, answer).await);
    }
    assert_eq!(again, forward[1..].to_vec());
    assert_eq!(step(&harness).await, Some(WizardStep::Final));
}
