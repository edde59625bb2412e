//! Reqwest-backed client for the devs API.
//!
//! Every call made on behalf of a user carries the acting user's id in the
//! `user` header.

use std::time::Duration;

use reqwest::{Client, Response, Url};

use crate::error::ClientError;
use crate::messages::{Candidate, RegisterRequest};
use crate::session::Session;

/// Header carrying the acting user's id.
pub const USER_HEADER: &str = "user";

/// Like or dislike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Like,
    Dislike,
}

impl Action {
    fn path_segment(self) -> &'static str {
        match self {
            Action::Like => "likes",
            Action::Dislike => "dislikes",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Like => write!(f, "like"),
            Action::Dislike => write!(f, "dislike"),
        }
    }
}

/// Devs API client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::Url(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Url(format!("{} cannot be a base url", base_url)));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Registers (or looks up) a developer by GitHub handle and returns the
    /// session for the resulting profile id.
    pub async fn register(&self, handle: &str) -> Result<Session, ClientError> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(ClientError::InvalidInput("username must not be empty".into()));
        }
        let response = self
            .http
            .post(self.endpoint(&["devs"])?)
            .json(&RegisterRequest { username: handle })
            .send()
            .await?;
        let profile: Candidate = decode(check_status(response).await?).await?;
        if profile.id.is_empty() {
            return Err(ClientError::Decode("registered profile has no _id".into()));
        }
        tracing::info!(handle, user_id = %profile.id, "registered");
        Ok(Session::new(profile.id))
    }

    /// Candidates the acting user has not judged yet, in server ranking order.
    pub async fn candidates(&self, session: &Session) -> Result<Vec<Candidate>, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&["devs"])?)
            .header(USER_HEADER, session.user_id())
            .send()
            .await?;
        let candidates: Vec<Candidate> = decode(check_status(response).await?).await?;
        tracing::debug!(user_id = session.user_id(), count = candidates.len(), "fetched candidates");
        Ok(candidates)
    }

    pub async fn like(&self, session: &Session, candidate_id: &str) -> Result<(), ClientError> {
        self.judge(session, Action::Like, candidate_id).await
    }

    pub async fn dislike(&self, session: &Session, candidate_id: &str) -> Result<(), ClientError> {
        self.judge(session, Action::Dislike, candidate_id).await
    }

    /// Posts a like or dislike. The response body is not consumed.
    pub async fn judge(
        &self,
        session: &Session,
        action: Action,
        candidate_id: &str,
    ) -> Result<(), ClientError> {
        if candidate_id.is_empty() {
            return Err(ClientError::InvalidInput("candidate id must not be empty".into()));
        }
        let url = self.endpoint(&["devs", candidate_id, action.path_segment()])?;
        let response = self
            .http
            .post(url)
            .header(USER_HEADER, session.user_id())
            .send()
            .await?;
        check_status(response).await?;
        tracing::debug!(user_id = session.user_id(), candidate_id, %action, "judged");
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status,
        body: body.chars().take(200).collect(),
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
