use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The subscriber on one line; every outbound call is addressed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    pub line_id: Uuid,
    pub user_id: Uuid,
}

/// Subscriber profile, cached in the session and exposed to templates as `User`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscriber {
    pub user_id: Uuid,
    pub login: String,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub email: String,
    pub phone: String,
    pub company: String,
}

/// One selectable entry of a ticket catalog (specialist, service, service type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
}

/// Ticket submitted at the end of the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub channel_id: Uuid,
    pub theme: String,
    pub description: String,
    pub executor_id: Uuid,
    pub service_id: Uuid,
    pub service_type_id: Uuid,
}

/// Ranked knowledge-base candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbAnswer {
    pub id: Uuid,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub accuracy: f32,
    #[serde(default)]
    pub answer_source: String,
}

/// Source tag of a closing remark; using it also closes the treatment.
pub const KB_SOURCE_GOODBYES: &str = "GOODBYES";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbResponse {
    pub request_id: Uuid,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answers: Vec<KbAnswer>,
}

impl KbResponse {
    /// First candidate with a strictly positive accuracy; upstream order is trusted.
    #[must_use]
    pub fn best_answer(&self) -> Option<&KbAnswer> {
        self.answers.iter().find(|answer| answer.accuracy > 0.0)
    }
}

/// A file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFile {
    pub is_image: bool,
    pub file_name: String,
    pub path: PathBuf,
    pub caption: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(accuracy: f32, text: &str) -> KbAnswer {
        KbAnswer {
            id: Uuid::new_v4(),
            text: text.to_string(),
            accuracy,
            answer_source: String::new(),
        }
    }

    #[test]
    fn best_answer_skips_zero_accuracy() {
        let response = KbResponse {
            request_id: Uuid::new_v4(),
            question: String::new(),
            answers: vec![answer(0.0, "zero"), answer(0.4, "first"), answer(0.9, "second")],
        };
        assert_eq!(response.best_answer().map(|a| a.text.as_str()), Some("first"));
    }
}
