//! Reserved dialogue state identifiers.
//!
//! Every other state id is an operator-defined menu key.

/// Initial and reset state.
pub const GREETINGS: &str = "greetings";
/// Main menu.
pub const START: &str = "start";
/// Menu rendered after a terminal action or a recovered failure.
pub const FINAL: &str = "final_menu";
/// Menu rendered when the knowledge base has no answer.
pub const FAIL_QNA: &str = "fail_qna_menu";
/// Waiting for free text to be captured into a variable.
pub const WAIT_SEND: &str = "wait_send";
/// Ticket wizard is active.
pub const CREATE_TICKET: &str = "create_ticket";
/// Id of the wizard "back" key.
pub const CREATE_TICKET_PREV_STAGE: &str = "create_ticket_prev_stage";

/// States that wipe the history stack when entered.
pub const HISTORY_RESET_STATES: [&str; 4] = [FAIL_QNA, FINAL, START, GREETINGS];

/// Transient states that are never recorded in the history stack.
pub const HISTORY_TRANSIENT_STATES: [&str; 3] = [CREATE_TICKET, CREATE_TICKET_PREV_STAGE, WAIT_SEND];
