use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::header::SET_COOKIE;
use reqwest::Client;

use crate::config::ExchangeConfig;
use crate::error::{AppError, Result};

/// Shared holder for the exchange session credential.
///
/// The lock is held only for a single read or write, never across a request,
/// so two overlapping fetches can both observe an empty store and bootstrap
/// twice. The credential is a stateless bearer string, so the loser of that
/// race costs one redundant round trip and nothing else. There is no expiry
/// clock: a credential stays cached until a failed fetch clears it.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current credential; empty means no session is established.
    pub fn get(&self) -> String {
        self.lock().clone()
    }

    pub fn set(&self, credential: String) {
        *self.lock() = credential;
    }

    /// Forget the credential so the next fetch re-bootstraps.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Visit the exchange landing page and assemble a session credential from the
/// cookies it sets.
///
/// Each `Set-Cookie` value contributes its name=value pair; attributes such as
/// path and expiry are dropped. An upstream that sets no cookies yields an
/// empty credential, which callers treat like any other dead session.
pub async fn bootstrap_session(client: &Client, config: &ExchangeConfig) -> Result<String> {
    let response = client
        .get(&config.landing_url)
        .headers(config.header_map()?)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::UpstreamUnavailable {
            status: Some(status.as_u16()),
        });
    }

    let cookies: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    let credential = join_cookie_pairs(&cookies);
    if credential.is_empty() {
        log::warn!("Session bootstrap returned no cookies from {}", config.landing_url);
    } else {
        log::debug!("Session established from {} cookie(s)", cookies.len());
    }

    Ok(credential)
}

fn join_cookie_pairs(cookies: &[&str]) -> String {
    cookies
        .iter()
        .filter_map(|raw| raw.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
