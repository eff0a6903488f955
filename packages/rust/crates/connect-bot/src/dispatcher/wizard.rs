//! Ticket wizard: theme → description → executor → service → service type → final.
//!
//! The step awaiting input lives in `session.ticket.step`; the wizard definition is the
//! button saved in `session.saved_button`. Steps with a configured default are filled
//! without prompting, both when moving forward and when walking back.

use connect_menu::{
    Button, ButtonAction, Keyboard, KeyboardKey, TicketButton, normalize_button_text, states,
};
use uuid::Uuid;

use crate::connect::{CatalogEntry, Peer};
use crate::error::DialogueError;
use crate::observability::DialogueEvent;
use crate::session::{Session, Ticket, TicketPart, WizardStep};
use crate::template::fill;

use super::Dispatcher;
use super::render::back_target;

const CONFIRM_KEY_ID: &str = "create_ticket_confirm";
const CANCEL_KEY_ID: &str = "create_ticket_cancel";

fn active_definition(session: &Session) -> Result<TicketButton, DialogueError> {
    session
        .ticket_button()
        .cloned()
        .ok_or_else(|| DialogueError::Config("ticket wizard is not active".to_string()))
}

impl Dispatcher {
    /// Enter the wizard for a ticket button.
    pub(super) async fn start_wizard(
        &self,
        peer: &Peer,
        session: &mut Session,
        button: &Button,
    ) -> Result<String, DialogueError> {
        let ButtonAction::Ticket(definition) = &button.action else {
            return Err(DialogueError::Config(format!(
                "button `{}` does not start a ticket",
                button.id
            )));
        };
        session.ticket = Ticket {
            channel_id: definition.channel_id,
            ..Ticket::default()
        };
        self.store
            .mutate_saved_button(peer, session, Some(button.clone()))
            .await?;
        self.next_stage(peer, session, WizardStep::FIRST).await?;
        Ok(states::CREATE_TICKET.to_string())
    }

    /// Fill defaulted steps from `from` onwards, then prompt for the first open one.
    async fn next_stage(
        &self,
        peer: &Peer,
        session: &mut Session,
        from: WizardStep,
    ) -> Result<(), DialogueError> {
        let definition = active_definition(session)?;
        let mut step = from;
        while step != WizardStep::Final {
            let Some(default) = step.config(&definition).default_value() else {
                break;
            };
            let value = fill(default, session)?;
            let part = self.resolve_default(peer, session, step, &value).await?;
            tracing::debug!(
                event = DialogueEvent::WizardStep.as_str(),
                user_id = %peer.user_id,
                step = step.as_str(),
                "wizard step filled from default"
            );
            self.store
                .mutate_ticket_field(peer, session, step, part)
                .await?;
            step = step.next();
        }
        self.prompt(peer, session, step, &definition).await
    }

    /// Walk back from `from`, skipping defaulted steps.
    ///
    /// Backing out before the first step cancels the wizard.
    async fn prev_stage(
        &self,
        peer: &Peer,
        session: &mut Session,
        from: WizardStep,
    ) -> Result<String, DialogueError> {
        let definition = active_definition(session)?;
        let mut step = from;
        while let Some(prev) = step.prev() {
            if prev.config(&definition).default_value().is_none() {
                self.next_stage(peer, session, prev).await?;
                return Ok(states::CREATE_TICKET.to_string());
            }
            step = prev;
        }
        self.cancel(peer, session).await
    }

    async fn cancel(&self, peer: &Peer, session: &mut Session) -> Result<String, DialogueError> {
        session.clear_transient();
        self.store.set(peer, session).await?;
        let target = back_target(&session.previous_state);
        self.open_menu(peer, session, &target, 0).await
    }

    /// Handle input while in CREATE_TICKET.
    pub(super) async fn on_wizard_input(
        &self,
        peer: &Peer,
        session: &mut Session,
        text: &str,
    ) -> Result<String, DialogueError> {
        let definition = active_definition(session)?;
        let Some(step) = session.ticket.step else {
            return Err(DialogueError::Config(
                "ticket wizard has no pending step".to_string(),
            ));
        };
        let labels = &self.menu.ticket_buttons;
        let input = normalize_button_text(text);

        if input == normalize_button_text(&labels.cancel) || input == CANCEL_KEY_ID {
            return self.cancel(peer, session).await;
        }
        if input == normalize_button_text(&labels.back) || input == states::CREATE_TICKET_PREV_STAGE
        {
            return self.prev_stage(peer, session, step).await;
        }

        match step {
            WizardStep::Theme | WizardStep::Description => {
                let value = text.trim();
                if value.is_empty() {
                    self.reject(peer, session, step).await?;
                    return Ok(states::CREATE_TICKET.to_string());
                }
                let part = TicketPart {
                    id: Uuid::nil(),
                    name: value.to_string(),
                };
                self.store
                    .mutate_ticket_field(peer, session, step, part)
                    .await?;
                self.next_stage(peer, session, step.next()).await?;
                Ok(states::CREATE_TICKET.to_string())
            }
            WizardStep::Executor | WizardStep::Service | WizardStep::ServiceType => {
                let candidates = self.catalog(peer, session, step).await?;
                let wanted = text.trim();
                let Some(entry) = candidates.into_iter().find(|entry| entry.name.trim() == wanted)
                else {
                    self.reject(peer, session, step).await?;
                    return Ok(states::CREATE_TICKET.to_string());
                };
                let part = TicketPart {
                    id: entry.id,
                    name: entry.name,
                };
                self.store
                    .mutate_ticket_field(peer, session, step, part)
                    .await?;
                self.next_stage(peer, session, step.next()).await?;
                Ok(states::CREATE_TICKET.to_string())
            }
            WizardStep::Final => {
                if input == normalize_button_text(&labels.confirm) || input == CONFIRM_KEY_ID {
                    return self.submit(peer, session, &definition).await;
                }
                self.reject(peer, session, step).await?;
                Ok(states::CREATE_TICKET.to_string())
            }
        }
    }

    /// Candidates for a catalog step; empty for free-text steps.
    async fn catalog(
        &self,
        peer: &Peer,
        session: &Session,
        step: WizardStep,
    ) -> Result<Vec<CatalogEntry>, DialogueError> {
        let entries = match step {
            WizardStep::Executor => self.contact_center.ticket_executors(peer).await?,
            WizardStep::Service => self.contact_center.ticket_services(peer).await?,
            WizardStep::ServiceType => {
                self.contact_center
                    .ticket_service_types(peer, session.ticket.service.id)
                    .await?
            }
            WizardStep::Theme | WizardStep::Description | WizardStep::Final => Vec::new(),
        };
        Ok(entries)
    }

    /// Turn a configured default into a ticket field, validating catalog ids.
    async fn resolve_default(
        &self,
        peer: &Peer,
        session: &Session,
        step: WizardStep,
        value: &str,
    ) -> Result<TicketPart, DialogueError> {
        if !step.is_catalog() {
            return Ok(TicketPart {
                id: Uuid::nil(),
                name: value.to_string(),
            });
        }
        let not_found = || {
            DialogueError::Config(format!(
                "default {} `{value}` is not in the catalog",
                step.as_str()
            ))
        };
        let id = Uuid::parse_str(value.trim()).map_err(|_| not_found())?;
        self.catalog(peer, session, step)
            .await?
            .into_iter()
            .find(|entry| entry.id == id)
            .map(|entry| TicketPart {
                id: entry.id,
                name: entry.name,
            })
            .ok_or_else(not_found)
    }

    async fn keyboard(
        &self,
        peer: &Peer,
        session: &Session,
        step: WizardStep,
    ) -> Result<Keyboard, DialogueError> {
        let labels = &self.menu.ticket_buttons;
        let mut keyboard: Keyboard = Vec::new();
        if step == WizardStep::Final {
            keyboard.push(vec![KeyboardKey {
                id: CONFIRM_KEY_ID.to_string(),
                text: labels.confirm.clone(),
            }]);
        } else {
            for entry in self.catalog(peer, session, step).await? {
                keyboard.push(vec![KeyboardKey {
                    id: entry.id.to_string(),
                    text: entry.name,
                }]);
            }
        }
        keyboard.push(vec![KeyboardKey {
            id: states::CREATE_TICKET_PREV_STAGE.to_string(),
            text: labels.back.clone(),
        }]);
        keyboard.push(vec![KeyboardKey {
            id: CANCEL_KEY_ID.to_string(),
            text: labels.cancel.clone(),
        }]);
        Ok(keyboard)
    }

    async fn prompt(
        &self,
        peer: &Peer,
        session: &mut Session,
        step: WizardStep,
        definition: &TicketButton,
    ) -> Result<(), DialogueError> {
        let text = fill(&step.config(definition).text, session)?;
        let keyboard = self.keyboard(peer, session, step).await?;
        session.ticket.step = Some(step);
        self.store.set(peer, session).await?;
        tracing::debug!(
            event = DialogueEvent::WizardStep.as_str(),
            user_id = %peer.user_id,
            step = step.as_str(),
            "wizard step prompted"
        );
        self.send_text(peer, &text, Some(&keyboard)).await;
        Ok(())
    }

    /// "Incorrect value" with the step keyboard; the draft is left untouched.
    async fn reject(
        &self,
        peer: &Peer,
        session: &Session,
        step: WizardStep,
    ) -> Result<(), DialogueError> {
        let keyboard = self.keyboard(peer, session, step).await?;
        self.send_text(peer, &self.menu.ticket_buttons.incorrect_value, Some(&keyboard))
            .await;
        Ok(())
    }

    async fn submit(
        &self,
        peer: &Peer,
        session: &mut Session,
        definition: &TicketButton,
    ) -> Result<String, DialogueError> {
        let ticket = session.ticket.to_new_ticket();
        let ticket_id = self.contact_center.create_ticket(peer, &ticket).await?;
        tracing::info!(
            event = DialogueEvent::TicketSubmitted.as_str(),
            user_id = %peer.user_id,
            ticket_id = %ticket_id,
            "ticket submitted"
        );
        if !self.wait_for_ticket(peer, ticket_id).await {
            tracing::warn!(
                event = DialogueEvent::TicketNotConfirmed.as_str(),
                user_id = %peer.user_id,
                ticket_id = %ticket_id,
                retries = self.pacing.ticket_poll_retries,
                "ticket not visible upstream after polling"
            );
        }
        session.clear_transient();
        self.store.set(peer, session).await?;
        let target = definition
            .goto
            .as_deref()
            .filter(|goto| !goto.is_empty())
            .unwrap_or(states::FINAL);
        self.open_menu(peer, session, target, 0).await
    }

    /// Poll ticket visibility with a fixed retry budget; best effort.
    async fn wait_for_ticket(&self, peer: &Peer, ticket_id: Uuid) -> bool {
        for attempt in 1..=self.pacing.ticket_poll_retries {
            tokio::time::sleep(self.pacing.ticket_poll_delay).await;
            match self.contact_center.ticket_exists(peer, ticket_id).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(error) => tracing::debug!(
                    ticket_id = %ticket_id,
                    attempt,
                    error = %error,
                    "ticket lookup failed"
                ),
            }
        }
        false
    }
}
