#![allow(missing_docs)]

use std::io::Write;

use connect_menu::{ButtonAction, MenuError, load_menu_config, parse_menu_config, states};

const MENU: &str = r#"
use_qna:
  enabled: true
error_message: "Unknown command"
greeting_message: "Hello!"
first_greeting: true
back_button:
  id: back
  text: "Back"
  chat:
    - chat: "Going back"
close_button:
  text: "Close"
save_to_var:
  var_name: ""
  send_text: "Type your answer"
menus:
  start:
    answer:
      - chat: "Welcome, {{ User.name }}"
    buttons:
      - button:
          text: "Tariffs"
          menu:
            id: tariffs
            answer:
              - chat: "Our tariffs"
            buttons:
              - button:
                  back_button: true
      - button:
          close_button: true
      - button:
          text: "Leave a note"
          save_to_var:
            var_name: note
            goto: final_menu
      - button:
          text: "Specialist"
          appoint_random_spec_from_list_button:
            - 6f8f3cf2-5a4a-4a39-9b55-0c4f8d9d7c01
            - 0c1d1c7b-9d5f-4c5e-8d5c-31b6f0a5b9c2
          redirect_button: true
  final_menu:
    answer:
      - chat: "Anything else?"
    do_button:
      goto: start
"#;

#[test]
fn nested_menus_are_flattened_under_their_id() {
    let config = parse_menu_config(MENU).expect("menu should parse");
    assert!(config.menu("tariffs").is_some());
    let button = config.button(states::START, "tariffs").expect("tariffs button");
    assert_eq!(button.action, ButtonAction::NestedMenu("tariffs".to_string()));
}

#[test]
fn default_templates_fill_missing_text_and_chat() {
    let config = parse_menu_config(MENU).expect("menu should parse");

    let back = config.button("tariffs", "BACK").expect("back button from template");
    assert!(back.back_button);
    assert_eq!(back.id, "back");
    assert_eq!(back.chat.len(), 1);

    let close = config.button(states::START, "close").expect("close button from template");
    assert_eq!(close.action, ButtonAction::Close);
}

#[test]
fn save_to_var_inherits_default_prompt() {
    let config = parse_menu_config(MENU).expect("menu should parse");
    let button = config.button(states::START, "leave a note").expect("note button");
    let ButtonAction::SaveToVar(save) = &button.action else {
        panic!("expected save_to_var action, got {:?}", button.action);
    };
    assert_eq!(save.var_name, "note");
    assert_eq!(save.send_text.as_deref(), Some("Type your answer"));
    assert_eq!(save.goto.as_deref(), Some(states::FINAL));
}

#[test]
fn redirect_takes_priority_over_random_assignment() {
    let config = parse_menu_config(MENU).expect("menu should parse");
    let button = config.button(states::START, "specialist").expect("specialist button");
    assert_eq!(button.action, ButtonAction::Redirect);
}

#[test]
fn menu_auto_trigger_does_not_need_text() {
    let config = parse_menu_config(MENU).expect("menu should parse");
    let final_menu = config.menu(states::FINAL).expect("final menu");
    let do_button = final_menu.do_button.as_ref().expect("auto-trigger button");
    assert_eq!(do_button.goto, states::START);
    assert_eq!(do_button.action, ButtonAction::Goto);
}

#[test]
fn keyboard_button_without_text_is_rejected() {
    let yaml = r"
menus:
  start:
    buttons:
      - button:
          goto: start
";
    let err = parse_menu_config(yaml).expect_err("button without text must fail");
    assert!(matches!(err, MenuError::MissingButtonText { ref menu } if menu == "start"));
}

#[test]
fn nested_menu_colliding_with_top_level_is_rejected() {
    let yaml = r"
menus:
  start:
    buttons:
      - button:
          text: Again
          menu:
            id: start
";
    let err = parse_menu_config(yaml).expect_err("duplicate id must fail");
    assert!(matches!(err, MenuError::DuplicateMenu(ref id) if id == "start"));
}

#[test]
fn ticket_button_requires_channel() {
    let yaml = r#"
menus:
  start:
    buttons:
      - button:
          text: Ticket
          ticket_button:
            channel_id: "00000000-0000-0000-0000-000000000000"
            theme: { text: "Theme?" }
            description: { text: "Describe" }
            executor: { text: "Executor?" }
            service: { text: "Service?" }
            service_type: { text: "Type?" }
            data: { text: "Summary" }
"#;
    let err = parse_menu_config(yaml).expect_err("nil channel must fail");
    assert!(matches!(err, MenuError::MissingTicketChannel { .. }));
}

#[test]
fn load_from_file_reports_missing_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.yaml");
    let err = load_menu_config(&missing).expect_err("missing file must fail");
    assert!(matches!(err, MenuError::Io { .. }));

    let path = dir.path().join("menu.yaml");
    let mut file = std::fs::File::create(&path).expect("create menu file");
    file.write_all(MENU.as_bytes()).expect("write menu file");
    let config = load_menu_config(&path).expect("menu file should load");
    assert!(config.use_qna.enabled);
    assert!(config.first_greeting);
    assert_eq!(config.error_message, "Unknown command");
}

#[test]
fn converted_button_survives_session_serialization() {
    let config = parse_menu_config(MENU).expect("menu should parse");
    let button = config.button(states::START, "leave a note").expect("note button");
    let json = serde_json::to_string(button).expect("encode button");
    assert!(json.contains(r#""kind":"save_to_var""#));
    let decoded: connect_menu::Button = serde_json::from_str(&json).expect("decode button");
    assert_eq!(&decoded, button);
}

#[test]
fn shipped_sample_menu_loads_without_dangling_targets() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../conf/menu.yaml");
    let config = load_menu_config(&path).expect("sample menu should load");
    for state in [states::START, states::FINAL, states::FAIL_QNA, states::WAIT_SEND] {
        assert!(config.menu(state).is_some(), "sample menu lacks `{state}`");
    }
    assert!(config.dangling_gotos().is_empty());
}
