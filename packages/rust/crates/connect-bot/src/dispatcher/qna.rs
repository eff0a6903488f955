use std::sync::Arc;

use connect_menu::states;

use crate::connect::{KB_SOURCE_GOODBYES, Peer};
use crate::error::DialogueError;
use crate::observability::DialogueEvent;
use crate::session::Session;

use super::Dispatcher;

impl Dispatcher {
    /// Whether free text typed in `menu_id` may fall back to the knowledge base.
    pub(super) fn qna_enabled(&self, menu_id: &str) -> bool {
        self.menu.use_qna.enabled
            && self
                .menu
                .menu(menu_id)
                .is_some_and(|menu| !menu.qna_disable)
    }

    /// Answer free text from the knowledge base, staying in `menu_id`.
    ///
    /// No usable answer (or a failed lookup) renders the FAIL_QNA menu instead.
    pub(super) async fn answer_from_kb(
        &self,
        peer: &Peer,
        session: &mut Session,
        menu_id: &str,
    ) -> Result<String, DialogueError> {
        let response = match self.knowledge_base.query(peer).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(
                    event = DialogueEvent::KnowledgeBaseFailed.as_str(),
                    user_id = %peer.user_id,
                    error = %error,
                    "knowledge base query failed"
                );
                return self.open_menu(peer, session, states::FAIL_QNA, 0).await;
            }
        };
        let Some(answer) = response.best_answer() else {
            tracing::debug!(
                event = DialogueEvent::KnowledgeBaseFailed.as_str(),
                user_id = %peer.user_id,
                candidates = response.answers.len(),
                "knowledge base returned no usable answer"
            );
            return self.open_menu(peer, session, states::FAIL_QNA, 0).await;
        };

        let knowledge_base = Arc::clone(&self.knowledge_base);
        let (request_id, result_id) = (response.request_id, answer.id);
        tokio::spawn(async move {
            if let Err(error) = knowledge_base.selected(request_id, result_id).await {
                tracing::warn!(
                    request_id = %request_id,
                    error = %error,
                    "failed to acknowledge knowledge base answer"
                );
            }
        });
        tracing::debug!(
            event = DialogueEvent::KnowledgeBaseAnswered.as_str(),
            user_id = %peer.user_id,
            accuracy = answer.accuracy,
            source = %answer.answer_source,
            "knowledge base answer used"
        );

        if answer.answer_source == KB_SOURCE_GOODBYES {
            self.send_text(peer, &answer.text, None).await;
            self.contact_center.close_treatment(peer).await?;
            return Ok(states::GREETINGS.to_string());
        }
        let keyboard = self.menu.keyboard(menu_id);
        self.send_text(peer, &answer.text, keyboard.as_ref()).await;
        Ok(menu_id.to_string())
    }
}
