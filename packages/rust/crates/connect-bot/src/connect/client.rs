//! HTTP client for the Connect line API.
//!
//! One client implements all three collaborator traits. Bodies are JSON keyed by
//! `line_id`/`user_id`; non-2xx responses become errors carrying status and body.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use connect_menu::Keyboard;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::ConnectConfig;

use super::traits::{ContactCenter, KnowledgeBase, OutboundSender};
use super::types::{CatalogEntry, KbResponse, NewTicket, OutboundFile, Peer, Subscriber};

const SEND_MESSAGE_PATH: &str = "/line/send/message/";
const SEND_FILE_PATH: &str = "/line/send/file/";
const START_PATH: &str = "/line/appoint/start/";
const REROUTE_TREATMENT_PATH: &str = "/line/appoint/spec/queue/";
const CLOSE_TREATMENT_PATH: &str = "/line/drop/treatment/";
const SPECIALISTS_AVAILABLE_PATH: &str = "/line/specialists/available/";
const APPOINT_SPECIALIST_PATH: &str = "/line/appoint/spec/";
const SUBSCRIPTIONS_PATH: &str = "/line/subscriptions/";
const REROUTE_PATH: &str = "/line/reroute/";
const SUBSCRIBER_PATH: &str = "/line/subscriber/";
const TICKET_EXECUTORS_PATH: &str = "/line/ticket/executors/";
const TICKET_SERVICES_PATH: &str = "/line/ticket/services/";
const TICKET_SERVICE_TYPES_PATH: &str = "/line/ticket/service_types/";
const TICKET_CREATE_PATH: &str = "/line/ticket/create/";
const TICKET_GET_PATH: &str = "/line/ticket/";
const QNA_PATH: &str = "/line/qna/";
const QNA_SELECTED_PATH: &str = "/line/qna/selected/";

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct SpecialistsResponse {
    #[serde(default)]
    specialists: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionsResponse {
    #[serde(default)]
    subscriptions: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    items: Vec<CatalogEntry>,
}

/// Connect API client.
#[derive(Clone)]
pub struct ConnectClient {
    client: Client,
    base_url: String,
    login: Option<String>,
    password: Option<String>,
}

impl ConnectClient {
    /// # Errors
    /// Fails when the HTTP client cannot be built (TLS backend initialisation).
    pub fn new(config: &ConnectConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .build()
            .context("failed to build connect http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login: config.login.clone(),
            password: config.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let builder = self.client.request(method, url);
        match &self.login {
            Some(login) => builder.basic_auth(login, self.password.as_deref()),
            None => builder,
        }
    }

    async fn call(&self, method: Method, path: &'static str, body: Value) -> Result<Response> {
        let response = self
            .request(method, path)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connect request failed: {path}"))?;
        ensure_success(path, response).await
    }

    async fn call_unit(&self, path: &'static str, body: Value) -> Result<()> {
        self.call(Method::POST, path, body).await.map(|_| ())
    }

    async fn call_json<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &'static str,
        body: Value,
    ) -> Result<R> {
        let response = self.call(method, path, body).await?;
        response
            .json::<R>()
            .await
            .with_context(|| format!("failed to decode connect response: {path}"))
    }
}

async fn ensure_success(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("connect {path} returned {status}: {body}")
}

fn peer_body(peer: &Peer) -> Value {
    json!({ "line_id": peer.line_id, "user_id": peer.user_id })
}

fn peer_body_with(peer: &Peer, key: &str, value: impl Into<Value>) -> Value {
    let mut body = peer_body(peer);
    body[key] = value.into();
    body
}

#[async_trait]
impl ContactCenter for ConnectClient {
    async fn start(&self, peer: &Peer) -> Result<()> {
        self.call_unit(START_PATH, peer_body(peer)).await
    }

    async fn reroute_treatment(&self, peer: &Peer) -> Result<()> {
        self.call_unit(REROUTE_TREATMENT_PATH, peer_body(peer)).await
    }

    async fn close_treatment(&self, peer: &Peer) -> Result<()> {
        self.call_unit(CLOSE_TREATMENT_PATH, peer_body(peer)).await
    }

    async fn specialist_available(&self, peer: &Peer, specialist_id: Uuid) -> Result<bool> {
        Ok(self
            .specialists_available(peer)
            .await?
            .contains(&specialist_id))
    }

    async fn specialists_available(&self, peer: &Peer) -> Result<Vec<Uuid>> {
        let response: SpecialistsResponse = self
            .call_json(Method::POST, SPECIALISTS_AVAILABLE_PATH, peer_body(peer))
            .await?;
        Ok(response.specialists)
    }

    async fn appoint_specialist(&self, peer: &Peer, specialist_id: Uuid) -> Result<()> {
        self.call_unit(
            APPOINT_SPECIALIST_PATH,
            peer_body_with(peer, "spec_id", specialist_id.to_string()),
        )
        .await
    }

    async fn subscriptions(&self, peer: &Peer, line_id: Uuid) -> Result<Vec<Uuid>> {
        let body = json!({ "line_id": line_id, "user_id": peer.user_id });
        let response: SubscriptionsResponse = self
            .call_json(Method::POST, SUBSCRIPTIONS_PATH, body)
            .await?;
        Ok(response.subscriptions)
    }

    async fn reroute(&self, peer: &Peer, line_id: Uuid) -> Result<()> {
        self.call_unit(
            REROUTE_PATH,
            peer_body_with(peer, "to_line_id", line_id.to_string()),
        )
        .await
    }

    async fn subscriber(&self, peer: &Peer) -> Result<Subscriber> {
        self.call_json(Method::POST, SUBSCRIBER_PATH, peer_body(peer))
            .await
    }

    async fn ticket_executors(&self, peer: &Peer) -> Result<Vec<CatalogEntry>> {
        let response: CatalogResponse = self
            .call_json(Method::POST, TICKET_EXECUTORS_PATH, peer_body(peer))
            .await?;
        Ok(response.items)
    }

    async fn ticket_services(&self, peer: &Peer) -> Result<Vec<CatalogEntry>> {
        let response: CatalogResponse = self
            .call_json(Method::POST, TICKET_SERVICES_PATH, peer_body(peer))
            .await?;
        Ok(response.items)
    }

    async fn ticket_service_types(
        &self,
        peer: &Peer,
        service_id: Uuid,
    ) -> Result<Vec<CatalogEntry>> {
        let response: CatalogResponse = self
            .call_json(
                Method::POST,
                TICKET_SERVICE_TYPES_PATH,
                peer_body_with(peer, "service_id", service_id.to_string()),
            )
            .await?;
        Ok(response.items)
    }

    async fn create_ticket(&self, peer: &Peer, ticket: &NewTicket) -> Result<Uuid> {
        let mut body = serde_json::to_value(ticket).context("failed to encode ticket")?;
        body["line_id"] = json!(peer.line_id);
        body["user_id"] = json!(peer.user_id);
        let response: IdResponse = self
            .call_json(Method::POST, TICKET_CREATE_PATH, body)
            .await?;
        Ok(response.id)
    }

    async fn ticket_exists(&self, peer: &Peer, ticket_id: Uuid) -> Result<bool> {
        let response = self
            .request(Method::GET, TICKET_GET_PATH)
            .query(&[
                ("line_id", peer.line_id.to_string()),
                ("ticket_id", ticket_id.to_string()),
            ])
            .send()
            .await
            .context("connect ticket lookup failed")?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(TICKET_GET_PATH, response).await.map(|_| true)
    }
}

#[async_trait]
impl KnowledgeBase for ConnectClient {
    async fn query(&self, peer: &Peer) -> Result<KbResponse> {
        let mut body = peer_body(peer);
        body["skip_greetings"] = json!(false);
        body["skip_goodbyes"] = json!(false);
        self.call_json(Method::POST, QNA_PATH, body).await
    }

    async fn selected(&self, request_id: Uuid, result_id: Uuid) -> Result<()> {
        let body = json!({ "request_id": request_id, "result_id": result_id });
        self.call(Method::PUT, QNA_SELECTED_PATH, body)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl OutboundSender for ConnectClient {
    async fn send_text(&self, peer: &Peer, text: &str, keyboard: Option<&Keyboard>) -> Result<()> {
        let mut body = peer_body_with(peer, "text", text);
        if let Some(keyboard) = keyboard {
            body["keyboard"] = serde_json::to_value(keyboard).context("failed to encode keyboard")?;
        }
        self.call_unit(SEND_MESSAGE_PATH, body).await
    }

    async fn send_file(
        &self,
        peer: &Peer,
        file: &OutboundFile,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("failed to read attachment {}", file.path.display()))?;
        let mut form = Form::new()
            .text("line_id", peer.line_id.to_string())
            .text("user_id", peer.user_id.to_string())
            .text("file_name", file.file_name.clone())
            .text("text", file.caption.clone())
            .part(
                if file.is_image { "image" } else { "file" },
                Part::bytes(bytes).file_name(file.file_name.clone()),
            );
        if let Some(keyboard) = keyboard {
            let encoded = serde_json::to_string(keyboard).context("failed to encode keyboard")?;
            form = form.text("keyboard", encoded);
        }
        let response = self
            .request(Method::POST, SEND_FILE_PATH)
            .multipart(form)
            .send()
            .await
            .context("connect file upload failed")?;
        ensure_success(SEND_FILE_PATH, response).await.map(|_| ())
    }
}
