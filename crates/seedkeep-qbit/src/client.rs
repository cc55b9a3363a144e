//! `reqwest`-backed qBittorrent Web API v2 client.
//!
//! # Design
//! - Login is the only call that inspects a response body: the client answers `Ok.` or
//!   `Fails.` with a 200 status, so the body decides between success and `AuthFailure`.
//! - The `SID` cookie from login is replayed by hand on every later request.
//! - Mutations map 4xx to `RemoteRejected` and everything else non-2xx to `Unreachable`.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use seedkeep_config::{ClientEndpoint, Credentials};
use tracing::{debug, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::model::{TorrentInfo, TorrentProperties};
use crate::session::{RemoteClient, RemoteSession};

const LOGIN_PATH: &str = "api/v2/auth/login";
const LOGOUT_PATH: &str = "api/v2/auth/logout";
const INFO_PATH: &str = "api/v2/torrents/info";
const SET_LOCATION_PATH: &str = "api/v2/torrents/setLocation";
const SET_CATEGORY_PATH: &str = "api/v2/torrents/setCategory";
const LOGIN_OK: &str = "Ok.";
const SESSION_COOKIE: &str = "SID";

/// Factory for authenticated qBittorrent sessions.
#[derive(Clone)]
pub struct QbitClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
}

impl QbitClient {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] for an unparsable endpoint and
    /// [`RemoteError::Unreachable`] when the HTTP client cannot be constructed.
    pub fn new(endpoint: &ClientEndpoint) -> RemoteResult<Self> {
        let raw = endpoint.base_url();
        let mut base_url = Url::parse(&raw).map_err(|source| RemoteError::InvalidUrl {
            value: raw.clone(),
            source,
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(endpoint.timeout)
            .build()
            .map_err(|source| RemoteError::transport("client.build", source))?;
        Ok(Self {
            http,
            base_url,
            credentials: endpoint.credentials.clone(),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl RemoteClient for QbitClient {
    async fn login(&self) -> RemoteResult<Box<dyn RemoteSession>> {
        let url = resolve(&self.base_url, LOGIN_PATH)?;
        let response = self
            .http
            .post(url)
            .form(&[
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|source| RemoteError::transport("auth.login", source))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(RemoteError::AuthFailure {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(RemoteError::status("auth.login", status.as_u16()));
        }

        let cookie = session_cookie(&response);
        let body = response
            .text()
            .await
            .map_err(|source| RemoteError::transport("auth.login", source))?;
        if !body.contains(LOGIN_OK) {
            return Err(RemoteError::AuthFailure {
                status: status.as_u16(),
            });
        }

        debug!(has_cookie = cookie.is_some(), "remote session established");
        Ok(Box::new(QbitSession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            cookie,
        }))
    }
}

struct QbitSession {
    http: Client,
    base_url: Url,
    cookie: Option<String>,
}

impl QbitSession {
    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie.as_str()),
            None => builder,
        }
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        form: &[(&str, &str)],
    ) -> RemoteResult<()> {
        let url = resolve(&self.base_url, path)?;
        let response = self
            .request(self.http.post(url))
            .form(form)
            .send()
            .await
            .map_err(|source| RemoteError::transport(operation, source))?;
        mutation_status(operation, response.status())
    }
}

#[async_trait]
impl RemoteSession for QbitSession {
    async fn read_properties(&self, hash: &str) -> RemoteResult<TorrentProperties> {
        const OPERATION: &str = "torrents.info";
        let url = resolve(&self.base_url, INFO_PATH)?;
        let response = self
            .request(self.http.get(url))
            .query(&[("hashes", hash)])
            .send()
            .await
            .map_err(|source| RemoteError::transport(OPERATION, source))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                hash: hash.to_string(),
            });
        }
        if !status.is_success() {
            return Err(RemoteError::status(OPERATION, status.as_u16()));
        }

        let torrents: Vec<TorrentInfo> = response
            .json()
            .await
            .map_err(|source| RemoteError::transport(OPERATION, source))?;
        torrents
            .into_iter()
            .find(|info| info.hash.eq_ignore_ascii_case(hash))
            .map(TorrentProperties::from)
            .ok_or_else(|| RemoteError::NotFound {
                hash: hash.to_string(),
            })
    }

    async fn set_location(&self, hash: &str, location: &Path) -> RemoteResult<()> {
        let location = location.to_string_lossy();
        self.post_form(
            "torrents.setLocation",
            SET_LOCATION_PATH,
            &[("hashes", hash), ("location", location.as_ref())],
        )
        .await
    }

    async fn set_category(&self, hash: &str, category: &str) -> RemoteResult<()> {
        self.post_form(
            "torrents.setCategory",
            SET_CATEGORY_PATH,
            &[("hashes", hash), ("category", category)],
        )
        .await
    }

    async fn logout(&self) {
        if let Err(err) = self.post_form("auth.logout", LOGOUT_PATH, &[]).await {
            warn!(error = %err, "remote session logout failed");
        }
    }
}

fn resolve(base_url: &Url, path: &str) -> RemoteResult<Url> {
    base_url.join(path).map_err(|source| RemoteError::InvalidUrl {
        value: path.to_string(),
        source,
    })
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| {
            pair.split_once('=')
                .is_some_and(|(name, _)| name == SESSION_COOKIE)
        })
        .map(str::to_string)
}

fn mutation_status(operation: &'static str, status: StatusCode) -> RemoteResult<()> {
    if status.is_success() {
        Ok(())
    } else if status.is_client_error() {
        Err(RemoteError::RemoteRejected {
            operation,
            status: status.as_u16(),
        })
    } else {
        Err(RemoteError::status(operation, status.as_u16()))
    }
}
