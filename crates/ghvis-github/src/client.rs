//! GitHub REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use ghvis_core::error::{Error, RemoteError, TransportError, ValidationError};
use ghvis_core::repo::RepositoryInfo;
use ghvis_core::types::{ApiUrl, RepoRef, Visibility};
use ghvis_core::{BearerToken, Result, VisibilityRemote};

use crate::endpoints::{
    self, ErrorResponse, ListReposQuery, PER_PAGE, RepositoryResponse, UpdateVisibilityRequest,
    UserResponse,
};

/// Pause between pages of a repository listing.
const PAGE_PAUSE: Duration = Duration::from_millis(100);

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn map_transport(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        TransportError::Decode {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

/// Client for the GitHub REST API bound to one credential.
///
/// The token is sent as a bearer authorization header on every request and
/// is never logged.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api: ApiUrl,
}

impl GithubClient {
    /// Create a client for `api` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Fails if the token cannot be sent as a header or the HTTP client
    /// cannot be built.
    pub fn new(api: ApiUrl, token: &BearerToken) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| ValidationError::TokenCharacters)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(endpoints::ACCEPT));

        let client = reqwest::Client::builder()
            .user_agent(concat!("ghvis/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(map_transport)?;

        Ok(Self { client, api })
    }

    /// Returns the API base this client talks to.
    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// All repositories the credential can see, most recently updated first.
    ///
    /// Pages through `GET /user/repos`, pausing briefly between pages.
    #[instrument(skip(self), fields(api = %self.api))]
    pub async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>> {
        let url = self.api.endpoint(endpoints::USER_REPOS);
        let mut repositories = Vec::new();
        let mut page = 1;

        loop {
            debug!(page, "listing repositories");
            let response = self
                .client
                .get(&url)
                .query(&ListReposQuery::page(page))
                .send()
                .await
                .map_err(map_transport)?;
            let batch: Vec<RepositoryResponse> = handle_response(response).await?;

            let last = batch.len() < PER_PAGE;
            repositories.extend(batch.into_iter().map(RepositoryInfo::from));
            if last {
                break;
            }

            page += 1;
            tokio::time::sleep(PAGE_PAUSE).await;
        }

        debug!(count = repositories.len(), "repositories listed");
        Ok(repositories)
    }
}

#[async_trait]
impl VisibilityRemote for GithubClient {
    #[instrument(skip(self), fields(api = %self.api))]
    async fn validate(&self) -> Result<String> {
        let response = self
            .client
            .get(self.api.endpoint(endpoints::USER))
            .send()
            .await
            .map_err(map_transport)?;
        let user: UserResponse = handle_response(response).await?;

        debug!(login = %user.login, "token validated");
        Ok(user.login)
    }

    #[instrument(skip(self), fields(api = %self.api, %repo))]
    async fn get_repository(&self, repo: &RepoRef) -> Result<Option<RepositoryInfo>> {
        let response = self
            .client
            .get(self.api.endpoint(&endpoints::repository(repo)))
            .send()
            .await
            .map_err(map_transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("repository not found");
            return Ok(None);
        }

        let info: RepositoryResponse = handle_response(response).await?;
        Ok(Some(info.into()))
    }

    #[instrument(skip(self), fields(api = %self.api, %repo))]
    async fn set_visibility(&self, repo: &RepoRef, make_private: bool) -> Result<String> {
        let response = self
            .client
            .patch(self.api.endpoint(&endpoints::repository(repo)))
            .json(&UpdateVisibilityRequest {
                private: make_private,
            })
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        trace!(%status, "visibility response");
        if !status.is_success() {
            return Err(parse_error_response(response).await.into());
        }

        let visibility = Visibility::from_private(make_private);
        debug!(%visibility, "visibility changed");
        Ok(format!("Repository {} is now {}", repo.name(), visibility))
    }
}

/// Decode a success body or turn the response into a [`RemoteError`].
async fn handle_response<R: DeserializeOwned>(response: Response) -> Result<R> {
    let status = response.status();
    trace!(%status, "GitHub response");

    if status.is_success() {
        response.json::<R>().await.map_err(map_transport)
    } else {
        Err(parse_error_response(response).await.into())
    }
}

/// Build a [`RemoteError`] carrying GitHub's `message` verbatim.
async fn parse_error_response(response: Response) -> RemoteError {
    let status = response.status().as_u16();

    match response.json::<ErrorResponse>().await {
        Ok(ErrorResponse {
            message: Some(message),
        }) => RemoteError::new(status, message),
        _ => RemoteError::from_status(status),
    }
}
