use connect_menu::{Answer, Keyboard, states};

use crate::connect::{OutboundFile, Peer};
use crate::error::DialogueError;
use crate::observability::DialogueEvent;
use crate::session::Session;
use crate::template::fill;

use super::Dispatcher;

/// Menu shown by "back" when `state` is the reset state.
pub(super) fn back_target(state: &str) -> String {
    if state == states::GREETINGS {
        states::START.to_string()
    } else {
        state.to_string()
    }
}

impl Dispatcher {
    /// Send one message; delivery failures are logged, never propagated.
    pub(super) async fn send_text(&self, peer: &Peer, text: &str, keyboard: Option<&Keyboard>) {
        if let Err(error) = self.sender.send_text(peer, text, keyboard).await {
            tracing::warn!(
                event = DialogueEvent::SendFailed.as_str(),
                user_id = %peer.user_id,
                error = %error,
                "failed to send message"
            );
        }
    }

    async fn send_file(&self, peer: &Peer, file: &OutboundFile, keyboard: Option<&Keyboard>) {
        if let Err(error) = self.sender.send_file(peer, file, keyboard).await {
            tracing::warn!(
                event = DialogueEvent::SendFailed.as_str(),
                user_id = %peer.user_id,
                file = %file.file_name,
                error = %error,
                "failed to send file"
            );
        }
    }

    /// Emit answer entries in order, pacing after each.
    ///
    /// `keyboard` is attached to the last message of the last entry only.
    pub(super) async fn send_answers(
        &self,
        peer: &Peer,
        session: &Session,
        answers: &[Answer],
        keyboard: Option<&Keyboard>,
        skip_text: bool,
    ) -> Result<(), DialogueError> {
        let last = answers.len().saturating_sub(1);
        for (index, answer) in answers.iter().enumerate() {
            let file = self.files.resolve(answer);
            let text = if skip_text || answer.chat.is_empty() {
                String::new()
            } else {
                fill(&answer.chat, session)?
            };
            let entry_keyboard = if index == last { keyboard } else { None };
            if !text.is_empty() {
                let text_keyboard = if file.is_none() { entry_keyboard } else { None };
                self.send_text(peer, &text, text_keyboard).await;
            }
            if let Some(file) = file {
                self.send_file(peer, &file, entry_keyboard).await;
            }
            tokio::time::sleep(self.pacing.message_delay).await;
        }
        Ok(())
    }

    /// Render a menu's answers with its keyboard, without running its auto-trigger.
    pub(super) async fn render_menu(
        &self,
        peer: &Peer,
        session: &Session,
        menu_id: &str,
    ) -> Result<(), DialogueError> {
        let Some(menu) = self.menu.menu(menu_id) else {
            return Err(DialogueError::Config(format!(
                "menu `{menu_id}` is not configured"
            )));
        };
        let keyboard = self.menu.keyboard(menu_id);
        self.send_answers(peer, session, &menu.answer, keyboard.as_ref(), false)
            .await?;
        tracing::debug!(
            event = DialogueEvent::MenuRendered.as_str(),
            user_id = %peer.user_id,
            menu = menu_id,
            "menu rendered"
        );
        Ok(())
    }

    /// Render a menu and chain into its `do_button`, if any.
    ///
    /// Returns the state the session ends up in.
    pub(super) async fn open_menu(
        &self,
        peer: &Peer,
        session: &mut Session,
        menu_id: &str,
        depth: usize,
    ) -> Result<String, DialogueError> {
        self.render_menu(peer, session, menu_id).await?;
        match self.menu.menu(menu_id).and_then(|menu| menu.do_button.as_deref()) {
            Some(button) => self.trigger(peer, session, button, depth + 1).await,
            None => Ok(menu_id.to_string()),
        }
    }

    /// Generic failure path: apology, transient data and history dropped, FINAL rendered.
    pub(super) async fn recover(
        &self,
        peer: &Peer,
        session: &mut Session,
        error: &DialogueError,
    ) -> String {
        tracing::warn!(
            event = DialogueEvent::RecoveredFailure.as_str(),
            user_id = %peer.user_id,
            line_id = %peer.line_id,
            state = %session.current_state,
            error = %error,
            "dialogue step failed; routing to the final menu"
        );
        let apology = error.user_message(&self.menu.failure_message);
        self.send_text(peer, &apology, None).await;
        session.clear_transient();
        session.history_clear();
        if let Err(render_error) = self.render_menu(peer, session, states::FINAL).await {
            tracing::warn!(
                user_id = %peer.user_id,
                error = %render_error,
                "final menu could not be rendered during recovery"
            );
        }
        states::FINAL.to_string()
    }
}
