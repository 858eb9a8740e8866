//! Fetching images over HTTP, authenticated with a Box API token or with
//! the cookies of a web session.

use std::time::Duration;

use ecow::{eco_format, EcoString};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::Deserialize;

use super::box_api::{self, BoxFile};
use super::{Credential, ImageResolver, ResolveError};
use crate::model::ImageRef;
use crate::{Error, Result};

/// Resolves image references with a blocking HTTP client.
pub struct HttpResolver {
    client: Client,
    credential: Credential,
    cookie_header: Option<String>,
}

impl HttpResolver {
    /// Creates a resolver whose requests time out after `timeout`.
    pub fn new(credential: Credential, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("boxnote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::from(format!("cannot build http client: {e}")))?;

        Ok(Self {
            client,
            cookie_header: credential.cookie_header(),
            credential,
        })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match (&self.credential, &self.cookie_header) {
            (Credential::Token(token), _) => request.bearer_auth(token),
            (Credential::Session(_), Some(cookies)) => request.header(COOKIE, cookies),
            (Credential::Session(_), None) => request,
        }
    }

    fn fetch(&self, request: RequestBuilder, target: &str) -> Result<Vec<u8>, ResolveError> {
        let response = request
            .send()
            .map_err(|err| ResolveError::NetworkFailure(eco_format!("{target}: {err}")))?;
        error_for_status(response.status().as_u16(), target)?;

        // An expired session is answered with the login page.
        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            return Err(ResolveError::Unauthorized(eco_format!(
                "{target}: received a web page instead of image data"
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|err| ResolveError::NetworkFailure(eco_format!("{target}: {err}")))?;
        Ok(bytes.to_vec())
    }

    /// Looks up the file id behind a shared link.
    fn shared_link_file_id(&self, link: &str) -> Result<String, ResolveError> {
        #[derive(Deserialize)]
        struct SharedItem {
            id: String,
        }

        let request = self
            .get(&box_api::shared_items_url())
            .header("BoxApi", format!("shared_link={link}"));
        let body = self.fetch(request, link)?;
        let item: SharedItem = serde_json::from_slice(&body).map_err(|err| {
            ResolveError::NetworkFailure(eco_format!("{link}: malformed shared item: {err}"))
        })?;
        Ok(item.id)
    }
}

impl ImageResolver for HttpResolver {
    fn resolve(&self, image: &ImageRef) -> Result<Vec<u8>, ResolveError> {
        let source = image.source.as_str();

        if let Credential::Token(_) = self.credential {
            let file_id = match box_api::extract_file(source) {
                Some(BoxFile::Id(id)) => Some(id),
                Some(BoxFile::SharedLink(link)) => Some(self.shared_link_file_id(&link)?),
                None => None,
            };
            if let Some(file_id) = file_id {
                debug!("downloading box file {file_id} for {source}");
                return self.fetch(self.get(&box_api::content_url(&file_id)), source);
            }
        }

        if !(source.starts_with("https://") || source.starts_with("http://")) {
            return Err(ResolveError::NotFound(eco_format!(
                "{source}: not an HTTP reference"
            )));
        }
        debug!("downloading {source}");
        self.fetch(self.get(source), source)
    }
}

/// Maps a response status onto the resolve error taxonomy.
pub(crate) fn error_for_status(status: u16, target: &str) -> Result<(), ResolveError> {
    let msg = || -> EcoString { eco_format!("{target} (HTTP {status})") };
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(ResolveError::Unauthorized(msg())),
        404 | 410 => Err(ResolveError::NotFound(msg())),
        _ => Err(ResolveError::NetworkFailure(msg())),
    }
}
