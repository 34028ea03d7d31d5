//! Terminal rendition of the browser chat form.
//!
//! [`ChatForm`] walks the same states as the page: `Idle`, then `Submitting`
//! while a request is in flight, then `Succeeded` or `Failed`.

use crate::page::paid_key_flag;
use crate::types::{ChatRequest, ChatResponse};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, warn};

pub const EMPTY_REPLY_PLACEHOLDER: &str = "(empty response)";
pub const NETWORK_ERROR_MESSAGE: &str = "A network or server error occurred.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
    Succeeded { reply: String, latency: Duration },
    Failed { message: String },
}

impl FormState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FormState::Submitting)
    }
}

/// User input of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDraft {
    pub model: String,
    pub message: String,
    pub paid_key_use: bool,
}

impl ChatDraft {
    pub fn new(model: impl Into<String>, message: impl Into<String>, paid_key_use: bool) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
            paid_key_use,
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.model.trim().is_empty() && !self.message.trim().is_empty()
    }
}

#[derive(Debug)]
pub struct ChatForm {
    http: Client,
    base_url: String,
    paid_key_available: bool,
    state: watch::Sender<FormState>,
}

impl ChatForm {
    pub fn new(base_url: impl Into<String>, paid_key_available: bool) -> Self {
        let (state, _) = watch::channel(FormState::Idle);
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            paid_key_available,
            state,
        }
    }

    /// Load the served page and pick up its paid-key flag.
    ///
    /// An unreachable page or a page without the flag leaves the paid key disabled.
    pub async fn connect(base_url: impl Into<String>) -> Self {
        let mut form = Self::new(base_url, false);

        match form.fetch_page().await {
            Ok(html) => form.paid_key_available = paid_key_flag(&html).unwrap_or(false),
            Err(e) => warn!("Could not load {}/: {}", form.base_url, e),
        }

        form
    }

    async fn fetch_page(&self) -> Result<String, reqwest::Error> {
        self.http
            .get(format!("{}/", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    pub fn paid_key_available(&self) -> bool {
        self.paid_key_available
    }

    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    /// Follow state changes, `Submitting` included.
    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    /// Submit `draft`. Blank drafts are ignored.
    ///
    /// Dropping the returned future before it completes puts the form back to `Idle`.
    pub async fn submit(&mut self, draft: &ChatDraft) -> FormState {
        if !draft.is_submittable() {
            return self.state();
        }

        let request = ChatRequest::new(
            draft.model.clone(),
            draft.message.clone(),
            draft.paid_key_use && self.paid_key_available,
        );

        let in_flight = InFlight::start(&self.state);
        let outcome = send(&self.http, &self.base_url, &request, Instant::now()).await;
        in_flight.finish(outcome.clone());

        outcome
    }
}

/// Holds the form in `Submitting`; leaves it on completion or drop.
struct InFlight<'a> {
    state: &'a watch::Sender<FormState>,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a watch::Sender<FormState>) -> Self {
        state.send_replace(FormState::Submitting);
        Self { state }
    }

    fn finish(self, outcome: FormState) {
        self.state.send_replace(outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            if state.is_loading() {
                debug!("Chat request cancelled");
                *state = FormState::Idle;
                true
            } else {
                false
            }
        });
    }
}

async fn send(http: &Client, base_url: &str, request: &ChatRequest, started: Instant) -> FormState {
    let response = match http
        .post(format!("{}/api/chat", base_url))
        .json(request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return network_failure(e),
    };

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return FormState::Failed {
            message: format!("Error: {} {}", status.as_u16(), text),
        };
    }

    match response.json::<ChatResponse>().await {
        Ok(body) => {
            let latency = started.elapsed();
            debug!("Reply received in {:.2} ms", latency.as_secs_f64() * 1000.0);
            let reply = if body.reply.is_empty() {
                EMPTY_REPLY_PLACEHOLDER.to_string()
            } else {
                body.reply
            };
            FormState::Succeeded { reply, latency }
        }
        Err(e) => network_failure(e),
    }
}

fn network_failure(error: reqwest::Error) -> FormState {
    warn!("Chat request failed: {}", error);
    FormState::Failed {
        message: NETWORK_ERROR_MESSAGE.to_string(),
    }
}
