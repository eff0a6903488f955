use connect_menu::{Button, ButtonAction, SaveToVar, states};
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::connect::Peer;
use crate::error::DialogueError;
use crate::observability::DialogueEvent;
use crate::session::{Session, VAR_FOR_GOTO, VAR_FOR_SAVE};
use crate::template::fill;

use super::render::back_target;
use super::{BoxFuture, Dispatcher, MAX_AUTO_TRIGGER_DEPTH};

/// Map guillemets to plain double quotes for a second lookup attempt.
pub(super) fn normalize_quotes(text: &str) -> String {
    text.replace(['«', '»'], "\"")
}

impl Dispatcher {
    /// Run one button: back navigation, fixed chat, then its action.
    ///
    /// `depth` counts chained auto-triggers; the chain fails past
    /// [`MAX_AUTO_TRIGGER_DEPTH`].
    pub(super) fn trigger<'a>(
        &'a self,
        peer: &'a Peer,
        session: &'a mut Session,
        button: &'a Button,
        depth: usize,
    ) -> BoxFuture<'a, Result<String, DialogueError>> {
        Box::pin(async move {
            if depth > MAX_AUTO_TRIGGER_DEPTH {
                return Err(DialogueError::TriggerDepthExceeded(MAX_AUTO_TRIGGER_DEPTH));
            }
            tracing::debug!(
                event = DialogueEvent::ButtonTriggered.as_str(),
                user_id = %peer.user_id,
                button = %button.id,
                depth,
                "button triggered"
            );

            let mut goto = button.goto.clone();
            if button.back_button {
                session.history_back();
                self.store.set(peer, session).await?;
                goto = back_target(&session.previous_state);
            }

            let skip_text = matches!(button.action, ButtonAction::Close | ButtonAction::Redirect);
            self.send_answers(peer, session, &button.chat, None, skip_text)
                .await?;

            // Actions are mutually exclusive. When a configured button sets several, the
            // loader keeps the first of: close, redirect, appoint specialist, appoint
            // random specialist, reroute, exec, save_to_var, ticket, nested menu, goto.
            match &button.action {
                ButtonAction::Close => {
                    self.contact_center.close_treatment(peer).await?;
                    Ok(states::GREETINGS.to_string())
                }
                ButtonAction::Redirect => {
                    self.contact_center.reroute_treatment(peer).await?;
                    Ok(states::GREETINGS.to_string())
                }
                ButtonAction::AppointSpecialist(specialist_id) => {
                    self.appoint_specialist(peer, *specialist_id).await
                }
                ButtonAction::AppointRandomSpecialist(candidates) => {
                    self.appoint_random_specialist(peer, candidates).await
                }
                ButtonAction::Reroute(line_id) => self.reroute(peer, *line_id).await,
                ButtonAction::Exec(command) => {
                    self.run_exec(peer, session, command, &goto, depth).await
                }
                ButtonAction::SaveToVar(capture) => self.start_capture(peer, session, capture).await,
                ButtonAction::Ticket(_) => self.start_wizard(peer, session, button).await,
                ButtonAction::NestedMenu(menu_id) => {
                    self.open_menu(peer, session, menu_id, depth).await
                }
                ButtonAction::Goto => self.open_menu(peer, session, &goto, depth).await,
            }
        })
    }

    async fn appoint_specialist(
        &self,
        peer: &Peer,
        specialist_id: Uuid,
    ) -> Result<String, DialogueError> {
        let available = match self
            .contact_center
            .specialist_available(peer, specialist_id)
            .await
        {
            Ok(available) => available,
            Err(error) => {
                tracing::warn!(
                    user_id = %peer.user_id,
                    specialist_id = %specialist_id,
                    error = %error,
                    "specialist availability check failed"
                );
                false
            }
        };
        if !available {
            return Err(DialogueError::SpecialistUnavailable(specialist_id));
        }
        self.contact_center
            .appoint_specialist(peer, specialist_id)
            .await?;
        Ok(states::GREETINGS.to_string())
    }

    async fn appoint_random_specialist(
        &self,
        peer: &Peer,
        candidates: &[Uuid],
    ) -> Result<String, DialogueError> {
        let available = match self.contact_center.specialists_available(peer).await {
            Ok(available) => available,
            Err(error) => {
                tracing::warn!(
                    user_id = %peer.user_id,
                    error = %error,
                    "available specialists lookup failed"
                );
                Vec::new()
            }
        };
        let eligible: Vec<Uuid> = candidates
            .iter()
            .filter(|id| available.contains(id))
            .copied()
            .collect();
        let chosen = {
            let mut rng = rand::thread_rng();
            eligible.choose(&mut rng).copied()
        };
        let Some(specialist_id) = chosen else {
            return Err(DialogueError::NoSpecialistsAvailable);
        };
        tracing::debug!(
            user_id = %peer.user_id,
            specialist_id = %specialist_id,
            eligible = eligible.len(),
            "random specialist chosen"
        );
        self.contact_center
            .appoint_specialist(peer, specialist_id)
            .await?;
        Ok(states::GREETINGS.to_string())
    }

    async fn reroute(&self, peer: &Peer, line_id: Uuid) -> Result<String, DialogueError> {
        let subscriptions = self.contact_center.subscriptions(peer, line_id).await?;
        if subscriptions.is_empty() {
            return Err(DialogueError::LineUnavailable(line_id));
        }
        self.contact_center.reroute(peer, line_id).await?;
        Ok(states::GREETINGS.to_string())
    }

    /// Arm free-text capture and show its prompt.
    async fn start_capture(
        &self,
        peer: &Peer,
        session: &mut Session,
        capture: &SaveToVar,
    ) -> Result<String, DialogueError> {
        self.store
            .mutate_vars(peer, session, VAR_FOR_SAVE, &capture.var_name)
            .await?;
        self.store
            .mutate_vars(
                peer,
                session,
                VAR_FOR_GOTO,
                capture.goto.as_deref().unwrap_or_default(),
            )
            .await?;
        self.store
            .mutate_saved_button(peer, session, capture.do_button.as_deref().cloned())
            .await?;

        match capture.send_text.as_deref().filter(|text| !text.is_empty()) {
            Some(prompt) => {
                let text = fill(prompt, session)?;
                let keyboard = self.menu.keyboard(states::WAIT_SEND);
                self.send_text(peer, &text, keyboard.as_ref()).await;
            }
            None if self.menu.menu(states::WAIT_SEND).is_some() => {
                self.render_menu(peer, session, states::WAIT_SEND).await?;
            }
            None => {}
        }
        Ok(states::WAIT_SEND.to_string())
    }
}
