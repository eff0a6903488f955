//! On-disk YAML layout and its conversion into the runtime model.
//!
//! The file keeps one optional field per action kind on each button; conversion
//! collapses them into a single [`ButtonAction`].

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use uuid::Uuid;

use crate::error::MenuError;
use crate::model::{
    Answer, Button, ButtonAction, DEFAULT_ERROR_MESSAGE, DEFAULT_FAILURE_MESSAGE, Menu,
    MenuConfig, QnaSettings, SaveToVar, TicketButton, TicketButtons,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawLevels {
    menus: HashMap<String, RawMenu>,
    use_qna: QnaSettings,

    back_button: Option<RawButton>,
    close_button: Option<RawButton>,
    redirect_button: Option<RawButton>,
    appoint_spec_button: Option<RawButton>,
    appoint_random_spec_from_list_button: Option<RawButton>,
    reroute_button: Option<RawButton>,
    exec_button: Option<RawButton>,
    save_to_var: Option<RawSaveToVar>,

    error_message: String,
    greeting_message: String,
    first_greeting: bool,
    failure_message: String,
    ticket_buttons: Option<TicketButtons>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMenu {
    answer: Vec<Answer>,
    buttons: Vec<RawButtonEntry>,
    qna_disable: bool,
    do_button: Option<RawButton>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawButtonEntry {
    button: RawButton,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawNestedMenu {
    id: String,
    answer: Vec<Answer>,
    buttons: Vec<RawButtonEntry>,
    qna_disable: bool,
    do_button: Option<RawButton>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawButton {
    id: String,
    text: String,
    chat: Vec<Answer>,
    close_button: bool,
    redirect_button: bool,
    back_button: bool,
    appoint_spec_button: Option<Uuid>,
    appoint_random_spec_from_list_button: Option<Vec<Uuid>>,
    reroute_button: Option<Uuid>,
    exec_button: String,
    save_to_var: Option<RawSaveToVar>,
    ticket_button: Option<TicketButton>,
    goto: String,
    menu: Option<Box<RawNestedMenu>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSaveToVar {
    var_name: String,
    send_text: Option<String>,
    goto: String,
    do_button: Option<Box<RawButton>>,
}

impl RawButton {
    /// Fill empty id, text and chat from a template.
    fn set_default(&mut self, template: &RawButton) {
        if self.id.is_empty() {
            self.id.clone_from(&template.id);
        }
        if self.text.is_empty() {
            self.text.clone_from(&template.text);
        }
        if self.chat.is_empty() {
            self.chat.clone_from(&template.chat);
        }
    }
}

/// Whether a converted button is shown on a keyboard (and so needs text).
#[derive(Clone, Copy, PartialEq, Eq)]
enum Placement {
    Keyboard,
    AutoTrigger,
}

struct Converter<'a> {
    defaults: &'a RawLevels,
    known_ids: HashSet<String>,
    nested: HashMap<String, Menu>,
}

impl RawLevels {
    pub(crate) fn into_config(mut self) -> Result<MenuConfig, MenuError> {
        let raw_menus = std::mem::take(&mut self.menus);
        let menus = {
            let mut converter = Converter {
                defaults: &self,
                known_ids: raw_menus.keys().cloned().collect(),
                nested: HashMap::new(),
            };
            let mut menus = HashMap::with_capacity(raw_menus.len());
            for (id, raw) in raw_menus {
                let menu =
                    converter.menu(&id, raw.answer, raw.buttons, raw.qna_disable, raw.do_button)?;
                menus.insert(id, menu);
            }
            menus.extend(converter.nested);
            menus
        };

        Ok(MenuConfig {
            menus,
            use_qna: self.use_qna,
            error_message: non_empty_or(self.error_message, DEFAULT_ERROR_MESSAGE),
            greeting_message: self.greeting_message,
            first_greeting: self.first_greeting,
            failure_message: non_empty_or(self.failure_message, DEFAULT_FAILURE_MESSAGE),
            ticket_buttons: self.ticket_buttons.unwrap_or_default(),
        })
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

impl Converter<'_> {
    fn menu(
        &mut self,
        menu_id: &str,
        answer: Vec<Answer>,
        buttons: Vec<RawButtonEntry>,
        qna_disable: bool,
        do_button: Option<RawButton>,
    ) -> Result<Menu, MenuError> {
        let buttons = buttons
            .into_iter()
            .map(|entry| self.button(menu_id, entry.button, Placement::Keyboard))
            .collect::<Result<Vec<_>, _>>()?;
        let do_button = do_button
            .map(|raw| self.button(menu_id, raw, Placement::AutoTrigger))
            .transpose()?
            .map(Box::new);
        Ok(Menu {
            answer,
            buttons,
            qna_disable,
            do_button,
        })
    }

    fn template_for(&self, raw: &RawButton) -> Option<&RawButton> {
        let d = self.defaults;
        if raw.close_button {
            d.close_button.as_ref()
        } else if raw.redirect_button {
            d.redirect_button.as_ref()
        } else if raw.appoint_spec_button.is_some() {
            d.appoint_spec_button.as_ref()
        } else if raw.appoint_random_spec_from_list_button.is_some() {
            d.appoint_random_spec_from_list_button.as_ref()
        } else if raw.reroute_button.is_some() {
            d.reroute_button.as_ref()
        } else if !raw.exec_button.is_empty() {
            d.exec_button.as_ref()
        } else {
            None
        }
    }

    fn button(
        &mut self,
        menu_id: &str,
        mut raw: RawButton,
        placement: Placement,
    ) -> Result<Button, MenuError> {
        if raw.back_button
            && let Some(template) = &self.defaults.back_button
        {
            raw.set_default(template);
        }
        if let Some(template) = self.template_for(&raw).cloned() {
            raw.set_default(&template);
        }
        if placement == Placement::Keyboard && raw.text.trim().is_empty() {
            return Err(MenuError::MissingButtonText {
                menu: menu_id.to_string(),
            });
        }
        if raw.id.is_empty() {
            raw.id.clone_from(&raw.text);
        }

        let action = self.action(menu_id, &mut raw)?;
        Ok(Button {
            id: raw.id,
            text: raw.text,
            chat: raw.chat,
            back_button: raw.back_button,
            goto: raw.goto,
            action,
        })
    }

    /// Collapse the per-kind fields into one action.
    ///
    /// Priority order, first set field wins: close, redirect, appoint specialist,
    /// appoint random specialist from list, reroute, exec, save to var, ticket,
    /// nested menu, plain goto. One button carries exactly one action.
    fn action(&mut self, menu_id: &str, raw: &mut RawButton) -> Result<ButtonAction, MenuError> {
        if raw.close_button {
            return Ok(ButtonAction::Close);
        }
        if raw.redirect_button {
            return Ok(ButtonAction::Redirect);
        }
        if let Some(specialist) = raw.appoint_spec_button {
            return Ok(ButtonAction::AppointSpecialist(specialist));
        }
        if let Some(candidates) = raw.appoint_random_spec_from_list_button.take() {
            return Ok(ButtonAction::AppointRandomSpecialist(candidates));
        }
        if let Some(line) = raw.reroute_button {
            return Ok(ButtonAction::Reroute(line));
        }
        if !raw.exec_button.is_empty() {
            return Ok(ButtonAction::Exec(std::mem::take(&mut raw.exec_button)));
        }
        if let Some(save) = raw.save_to_var.take() {
            return self.save_to_var(menu_id, save).map(ButtonAction::SaveToVar);
        }
        if let Some(ticket) = raw.ticket_button.take() {
            if ticket.channel_id.is_nil() {
                return Err(MenuError::MissingTicketChannel {
                    menu: menu_id.to_string(),
                    button: raw.text.clone(),
                });
            }
            return Ok(ButtonAction::Ticket(Box::new(ticket)));
        }
        if let Some(nested) = raw.menu.take() {
            let id = nested.id.trim().to_string();
            if id.is_empty() || !self.known_ids.insert(id.clone()) {
                return Err(MenuError::DuplicateMenu(id));
            }
            let RawNestedMenu {
                answer,
                buttons,
                qna_disable,
                do_button,
                ..
            } = *nested;
            let menu = self.menu(&id, answer, buttons, qna_disable, do_button)?;
            self.nested.insert(id.clone(), menu);
            return Ok(ButtonAction::NestedMenu(id));
        }
        Ok(ButtonAction::Goto)
    }

    fn save_to_var(&mut self, menu_id: &str, raw: RawSaveToVar) -> Result<SaveToVar, MenuError> {
        let send_text = raw.send_text.or_else(|| {
            self.defaults
                .save_to_var
                .as_ref()
                .and_then(|template| template.send_text.clone())
        });
        let do_button = raw
            .do_button
            .map(|button| self.button(menu_id, *button, Placement::AutoTrigger))
            .transpose()?
            .map(Box::new);
        Ok(SaveToVar {
            var_name: raw.var_name,
            send_text,
            goto: Some(raw.goto).filter(|goto| !goto.is_empty()),
            do_button,
        })
    }
}
