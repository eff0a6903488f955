use anyhow::Result;
use connect_menu::{normalize_button_text, states};

use crate::connect::Peer;
use crate::error::DialogueError;
use crate::event::{InboundMessage, MessageType};
use crate::observability::DialogueEvent;
use crate::session::{Session, VAR_FOR_GOTO, VAR_FOR_SAVE};
use crate::template::fill;

use super::Dispatcher;
use super::button::normalize_quotes;
use super::render::back_target;

/// Typed in GREETINGS, these open the main menu without a knowledge-base lookup.
const MENU_KEYWORDS: [&str; 2] = ["menu", "меню"];

impl Dispatcher {
    /// Process one inbound event end to end and persist the resulting state.
    ///
    /// Dialogue failures are recovered in place (apology + FINAL menu); the returned
    /// error only reports that the final session write failed.
    ///
    /// # Errors
    /// Session cache write failures.
    ///
    /// # Panics
    /// On a message type code the bot does not know.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<String> {
        let peer = msg.peer();
        tracing::debug!(
            event = DialogueEvent::EventReceived.as_str(),
            user_id = %peer.user_id,
            line_id = %peer.line_id,
            message_id = %msg.message_id,
            message_type = i64::from(msg.message_type),
            "inbound event received"
        );
        let mut session = self.store.get(&peer).await;
        let from = session.current_state.clone();
        let next = match self.process(msg, &peer, &mut session).await {
            Ok(next) => next,
            Err(error) => {
                let next = self.recover(&peer, &mut session, &error).await;
                self.store.set(&peer, &session).await?;
                next
            }
        };
        self.store.change_state(&peer, &mut session, &next).await?;
        tracing::debug!(
            event = DialogueEvent::EventProcessed.as_str(),
            user_id = %peer.user_id,
            from = %from,
            to = %next,
            "inbound event processed"
        );
        Ok(next)
    }

    async fn process(
        &self,
        msg: &InboundMessage,
        peer: &Peer,
        session: &mut Session,
    ) -> Result<String, DialogueError> {
        match msg.message_type {
            MessageType::TreatmentStartByUser => {
                if session.current_state == states::START {
                    return Ok(states::START.to_string());
                }
                session.history_clear();
                Ok(states::GREETINGS.to_string())
            }
            MessageType::CallStartTreatment
            | MessageType::CallStartNoTreatment
            | MessageType::TreatmentStartBySpecialist
            | MessageType::TreatmentClose
            | MessageType::TreatmentCloseActive => {
                session.history_clear();
                if let Err(error) = self.contact_center.start(peer).await {
                    tracing::warn!(
                        user_id = %peer.user_id,
                        error = %error,
                        "failed to notify treatment start"
                    );
                }
                Ok(states::GREETINGS.to_string())
            }
            MessageType::NoFreeSpecialists => {
                session.history_clear();
                if let Err(error) = self.contact_center.reroute_treatment(peer).await {
                    tracing::warn!(
                        user_id = %peer.user_id,
                        error = %error,
                        "failed to requeue treatment"
                    );
                }
                Ok(states::GREETINGS.to_string())
            }
            MessageType::TreatmentToBot | MessageType::LineReroutingOtherLine => {
                Ok(session.current_state.clone())
            }
            MessageType::Text | MessageType::File => {
                tokio::time::sleep(self.pacing.inbound_delay).await;
                self.on_user_input(peer, session, &msg.text).await
            }
            MessageType::Other(code) => {
                panic!("unsupported message type code {code} for user {}", peer.user_id)
            }
        }
    }

    async fn on_user_input(
        &self,
        peer: &Peer,
        session: &mut Session,
        text: &str,
    ) -> Result<String, DialogueError> {
        match session.current_state.as_str() {
            states::GREETINGS => self.on_greetings(peer, session, text).await,
            states::CREATE_TICKET => self.on_wizard_input(peer, session, text).await,
            states::WAIT_SEND => self.on_wait_send(peer, session, text).await,
            _ => self.on_menu(peer, session, text).await,
        }
    }

    async fn on_greetings(
        &self,
        peer: &Peer,
        session: &mut Session,
        text: &str,
    ) -> Result<String, DialogueError> {
        let keyword = normalize_button_text(text);
        if !MENU_KEYWORDS.contains(&keyword.as_str()) && self.qna_enabled(states::START) {
            return self.answer_from_kb(peer, session, states::START).await;
        }
        if self.menu.first_greeting && !self.menu.greeting_message.is_empty() {
            let greeting = fill(&self.menu.greeting_message, session)?;
            self.send_text(peer, &greeting, None).await;
            tokio::time::sleep(self.pacing.greeting_delay).await;
        }
        self.open_menu(peer, session, states::START, 0).await
    }

    async fn on_menu(
        &self,
        peer: &Peer,
        session: &mut Session,
        text: &str,
    ) -> Result<String, DialogueError> {
        let current = session.current_state.clone();
        if self.menu.menu(&current).is_none() {
            tracing::warn!(
                event = DialogueEvent::UnknownMenu.as_str(),
                user_id = %peer.user_id,
                menu = %current,
                "session points at a menu that is not configured"
            );
            let keyboard = self.menu.keyboard(states::START);
            self.send_text(peer, &self.menu.error_message, keyboard.as_ref())
                .await;
            return Ok(states::GREETINGS.to_string());
        }

        let button = self.menu.button(&current, text).or_else(|| {
            let normalized = normalize_quotes(text);
            if normalized == text {
                None
            } else {
                self.menu.button(&current, &normalized)
            }
        });
        match button {
            Some(button) => self.trigger(peer, session, button, 0).await,
            None if self.qna_enabled(&current) => {
                self.answer_from_kb(peer, session, &current).await
            }
            None => {
                let keyboard = self.menu.keyboard(&current);
                self.send_text(peer, &self.menu.error_message, keyboard.as_ref())
                    .await;
                Ok(current)
            }
        }
    }

    /// Capture free text into the pending variable, then continue the deferred flow.
    async fn on_wait_send(
        &self,
        peer: &Peer,
        session: &mut Session,
        text: &str,
    ) -> Result<String, DialogueError> {
        if let Some(var_name) = session.var(VAR_FOR_SAVE).map(str::to_string) {
            self.store.mutate_vars(peer, session, &var_name, text).await?;
        }
        let goto = session.var(VAR_FOR_GOTO).map(str::to_string);
        let deferred = session.saved_button.take();
        session.clear_transient();
        self.store.set(peer, session).await?;

        let back_pressed = [states::WAIT_SEND, session.previous_state.as_str()]
            .into_iter()
            .filter_map(|menu_id| self.menu.button(menu_id, text))
            .any(|button| button.back_button);
        if back_pressed {
            let target = back_target(&session.previous_state);
            return self.open_menu(peer, session, &target, 0).await;
        }
        if let Some(button) = deferred {
            return self.trigger(peer, session, &button, 0).await;
        }
        let target = goto.unwrap_or_else(|| back_target(&session.previous_state));
        self.open_menu(peer, session, &target, 0).await
    }
}
