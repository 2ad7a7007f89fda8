//! Decides when a cached document must be refetched, and refetches it

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Url;

use crate::cache::Cache;
use crate::client::Transport;
use crate::credentials::CredentialStore;
use crate::error::{PortalError, Result};
use crate::settings::Settings;

/// Status code reported when the server could not be reached at all
pub const TRANSPORT_FAILURE: i32 = -1;

/// Tells [`CachedResourceFetcher::refresh`] whether it may use the network
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RefreshPolicy {
    /// Always fetch, e.g. because the user explicitly asked for it
    pub force: bool,
    /// The "automatic updates" setting. Fetching only happens when it is `Some(true)`
    pub automatic_updates: Option<bool>,
}

impl RefreshPolicy {
    pub fn forced() -> Self {
        Self { force: true, automatic_updates: None }
    }

    pub fn from_settings(settings: &Settings, force: bool) -> Self {
        Self { force, automatic_updates: settings.enable_automatic_updates }
    }

    fn allows_automatic_update(&self) -> bool {
        self.automatic_updates == Some(true)
    }
}

/// The outcome of a refresh
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchResult {
    /// The HTTP status code, or [`TRANSPORT_FAILURE`]
    pub status_code: i32,
    /// Whether the network was skipped and the cached copy is used as-is
    pub served_from_cache: bool,
}

impl FetchResult {
    fn from_cache() -> Self {
        Self { status_code: 200, served_from_cache: true }
    }

    /// Whether the cache now holds the server's latest copy (or the network was deliberately skipped)
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status_code == TRANSPORT_FAILURE
    }

    /// Whether the user should be told something went wrong. Any cached data stays displayable
    pub fn needs_user_notice(&self) -> bool {
        self.is_success() == false
    }

    /// The error this result stands for, if any
    pub fn error(&self) -> Option<PortalError> {
        match self.status_code {
            200 => None,
            TRANSPORT_FAILURE => Some(PortalError::Transport("server unreachable".to_string())),
            code => Some(PortalError::HttpStatus(code as u16)),
        }
    }
}

/// Fetches signed documents and keeps their latest successful copy in a [`Cache`]
///
/// At most one refresh of a given resource name is in flight at any time: concurrent calls for the same name wait for each other.
/// Different names are refreshed independently.
pub struct CachedResourceFetcher<T: Transport> {
    transport: T,
    cache: Cache,
    credentials: CredentialStore,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<T: Transport> CachedResourceFetcher<T> {
    pub fn new(transport: T, cache: Cache, credentials: CredentialStore) -> Self {
        Self {
            transport,
            cache,
            credentials,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Cache { &self.cache }
    pub fn transport(&self) -> &T { &self.transport }
    pub fn credentials(&self) -> &CredentialStore { &self.credentials }
    pub fn credentials_mut(&mut self) -> &mut CredentialStore { &mut self.credentials }

    /// Make sure the cached copy of `resource_name` is as fresh as `policy` requires.
    ///
    /// Network failures and unexpected statuses are reported in the returned [`FetchResult`], and leave the cache untouched.
    /// Only incomplete credentials are an error, since retrying cannot fix them.
    pub async fn refresh(&self, resource_name: &str, remote_url: &Url, policy: RefreshPolicy) -> Result<FetchResult> {
        let lock = self.lock_for(resource_name);
        let _guard = lock.lock().await;

        let must_fetch = policy.force
            || self.cache.exists(resource_name) == false
            || policy.allows_automatic_update();
        if must_fetch == false {
            log::debug!("Using cached copy of {}", resource_name);
            return Ok(FetchResult::from_cache());
        }

        let signed = crate::signer::sign("GET", remote_url, &self.credentials)?;

        let response = match self.transport.get(remote_url, &signed.authorization_header()).await {
            Err(err) => {
                log::warn!("Unable to fetch {}: {}", remote_url, err);
                return Ok(FetchResult { status_code: TRANSPORT_FAILURE, served_from_cache: false });
            },
            Ok(r) => r,
        };

        if response.status == 200 {
            if let Err(err) = self.cache.store(resource_name, &response.body) {
                log::error!("Unable to cache {}: {}", resource_name, err);
            }
        } else {
            log::warn!("Fetching {} returned HTTP {}, keeping the cached copy", remote_url, response.status);
        }

        Ok(FetchResult { status_code: i32::from(response.status), served_from_cache: false })
    }

    fn lock_for(&self, resource_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.in_flight.lock().unwrap();
        locks.entry(resource_name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_transport::{MockReply, MockTransport};

    fn url() -> Url {
        "https://portal.test/api-v1/avisos.json".parse().unwrap()
    }

    fn signed_in() -> CredentialStore {
        let mut creds = CredentialStore::new("key", "secret");
        creds.set_token("token", "token-secret");
        creds
    }

    fn fetcher(dir: &tempfile::TempDir, replies: Vec<MockReply>) -> CachedResourceFetcher<MockTransport> {
        let cache = Cache::new(dir.path()).unwrap();
        CachedResourceFetcher::new(MockTransport::with_replies(replies), cache, signed_in())
    }

    #[tokio::test]
    async fn forced_refresh_always_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, vec![MockReply::ok("new")]);
        fetcher.cache().store("avisos.json", b"old").unwrap();

        let policy = RefreshPolicy { force: true, automatic_updates: Some(false) };
        let result = fetcher.refresh("avisos.json", &url(), policy).await.unwrap();
        assert_eq!(result, FetchResult { status_code: 200, served_from_cache: false });
        assert_eq!(fetcher.transport().call_count(), 1);
        assert_eq!(fetcher.cache().load("avisos.json").unwrap().unwrap().payload, b"new".to_vec());
    }

    #[tokio::test]
    async fn missing_cache_always_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, vec![MockReply::ok("fresh")]);

        let result = fetcher.refresh("avisos.json", &url(), RefreshPolicy::default()).await.unwrap();
        assert_eq!(result.served_from_cache, false);
        assert_eq!(fetcher.transport().call_count(), 1);
        assert!(fetcher.cache().exists("avisos.json"));
    }

    #[tokio::test]
    async fn cached_copy_is_used_without_automatic_updates() {
        for setting in vec![None, Some(false)] {
            let dir = tempfile::tempdir().unwrap();
            let fetcher = fetcher(&dir, vec![MockReply::ok("new")]);
            fetcher.cache().store("avisos.json", b"old").unwrap();

            let policy = RefreshPolicy { force: false, automatic_updates: setting };
            let result = fetcher.refresh("avisos.json", &url(), policy).await.unwrap();
            assert_eq!(result, FetchResult { status_code: 200, served_from_cache: true });
            assert_eq!(fetcher.transport().call_count(), 0);
            assert_eq!(fetcher.cache().load("avisos.json").unwrap().unwrap().payload, b"old".to_vec());
        }
    }

    #[tokio::test]
    async fn automatic_updates_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, vec![MockReply::ok("new")]);
        fetcher.cache().store("avisos.json", b"old").unwrap();

        let policy = RefreshPolicy { force: false, automatic_updates: Some(true) };
        fetcher.refresh("avisos.json", &url(), policy).await.unwrap();
        assert_eq!(fetcher.transport().call_count(), 1);
        assert_eq!(fetcher.cache().load("avisos.json").unwrap().unwrap().payload, b"new".to_vec());
    }

    #[tokio::test]
    async fn failures_keep_the_cached_copy() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, vec![MockReply::Status(404, b"not found".to_vec()), MockReply::Unreachable]);
        fetcher.cache().store("avisos.json", b"old").unwrap();

        let result = fetcher.refresh("avisos.json", &url(), RefreshPolicy::forced()).await.unwrap();
        assert_eq!(result, FetchResult { status_code: 404, served_from_cache: false });
        assert!(result.needs_user_notice());
        assert!(matches!(result.error(), Some(PortalError::HttpStatus(404))));

        let result = fetcher.refresh("avisos.json", &url(), RefreshPolicy::forced()).await.unwrap();
        assert_eq!(result.status_code, TRANSPORT_FAILURE);
        assert!(result.is_transport_failure());

        assert_eq!(fetcher.cache().load("avisos.json").unwrap().unwrap().payload, b"old".to_vec());
    }

    #[tokio::test]
    async fn requests_are_signed() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, vec![MockReply::ok("{}")]);
        fetcher.refresh("avisos.json", &url(), RefreshPolicy::forced()).await.unwrap();

        let (requested_url, authorization) = fetcher.transport().requests().remove(0);
        assert_eq!(requested_url, url());
        assert!(authorization.starts_with("OAuth "));
        assert!(authorization.contains("oauth_token=\"token\""));
        assert!(authorization.contains("oauth_signature=\""));
    }

    #[tokio::test]
    async fn signed_out_users_cannot_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher(&dir, vec![MockReply::ok("{}")]);
        fetcher.credentials_mut().clear_token();

        let result = fetcher.refresh("avisos.json", &url(), RefreshPolicy::forced()).await;
        assert!(matches!(result, Err(PortalError::Signing(_))));
        assert_eq!(fetcher.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_refreshes_of_one_resource() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, vec![MockReply::ok("a"), MockReply::ok("b")]);
        let url = url();

        let (r1, r2) = tokio::join!(
            fetcher.refresh("avisos.json", &url, RefreshPolicy::forced()),
            fetcher.refresh("avisos.json", &url, RefreshPolicy::forced()),
        );
        assert!(r1.unwrap().is_success());
        assert!(r2.unwrap().is_success());
        assert_eq!(fetcher.transport().call_count(), 2);
        assert_eq!(fetcher.transport().max_in_flight(), 1);
        assert_eq!(fetcher.cache().load("avisos.json").unwrap().unwrap().payload, b"b".to_vec());
    }

    #[tokio::test]
    async fn different_resources_are_fetched_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, vec![MockReply::ok("notices"), MockReply::ok("subjects")]);
        let notices_url = url();
        let subjects_url: Url = "https://portal.test/api-v1/assignatures.json".parse().unwrap();

        let (r1, r2) = tokio::join!(
            fetcher.refresh("avisos.json", &notices_url, RefreshPolicy::forced()),
            fetcher.refresh("assignatures.json", &subjects_url, RefreshPolicy::forced()),
        );
        assert!(r1.unwrap().is_success());
        assert!(r2.unwrap().is_success());
        assert_eq!(fetcher.transport().max_in_flight(), 2);
    }
}
