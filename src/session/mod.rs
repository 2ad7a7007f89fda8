//! This module ties the fetcher, the cache and the parsers together for one signed-in user
//!
//! A [`Session`] owns every piece of state (settings, credentials, cache). Front-ends hold one and call its
//! `refresh_*` functions from a background task; each call reports its own outcome.

use std::path::{Path, PathBuf};

use crate::aggregator::NoticeBoard;
use crate::cache::Cache;
use crate::client::{Client, Transport};
use crate::credentials::CredentialStore;
use crate::error::{PortalError, Result};
use crate::fetcher::{CachedResourceFetcher, FetchResult, RefreshPolicy, TRANSPORT_FAILURE};
use crate::formats::rss::FeedItem;
use crate::formats::Payload;
use crate::resource::{Resource, ResourceSet};
use crate::settings::Settings;
use crate::{Profile, ScheduleEvent, Subject};

pub mod refresh_progress;
use refresh_progress::{FeedbackSender, RefreshEvent, RefreshProgress};

/// Name of the cache directory, inside the data directory
pub const CACHE_DIR: &str = "cache";

/// Data to display, and how fresh it is
#[derive(Clone, Debug)]
pub struct View<D> {
    pub outcome: FetchResult,
    pub data: D,
}

impl<D> View<D> {
    /// Whether the user should be told about connection problems. `data` is displayable anyway
    pub fn needs_user_notice(&self) -> bool {
        self.outcome.needs_user_notice()
    }
}

pub struct Session<T: Transport> {
    data_dir: PathBuf,
    settings: Settings,
    fetcher: CachedResourceFetcher<T>,
}

impl Session<Client> {
    /// Open the session stored in `data_dir`, that talks to the actual portal
    pub fn open(data_dir: &Path) -> Result<Self> {
        let settings = Settings::load(data_dir)?;
        let credentials = CredentialStore::from_file(data_dir)?;
        let client = Client::new(settings.request_timeout(), &settings.user_agent)?;
        Self::with_transport(data_dir, settings, credentials, client)
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(data_dir: &Path, settings: Settings, credentials: CredentialStore, transport: T) -> Result<Self> {
        let cache = Cache::new(&data_dir.join(CACHE_DIR))?;
        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            settings,
            fetcher: CachedResourceFetcher::new(transport, cache, credentials),
        })
    }

    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn cache(&self) -> &Cache { self.fetcher.cache() }
    pub fn transport(&self) -> &T { self.fetcher.transport() }

    pub fn is_signed_in(&self) -> bool {
        self.fetcher.credentials().is_signed_in()
    }

    pub fn set_automatic_updates(&mut self, enabled: bool) -> Result<()> {
        self.settings.enable_automatic_updates = Some(enabled);
        self.settings.save(&self.data_dir)
    }

    pub fn set_language(&mut self, code: &str) -> Result<()> {
        self.settings.set_language(code)?;
        self.settings.save(&self.data_dir)
    }

    /// Store the token pair obtained at the end of the OAuth dance
    pub fn sign_in(&mut self, token: &str, token_secret: &str) -> Result<()> {
        let credentials = self.fetcher.credentials_mut();
        credentials.set_token(token, token_secret);
        credentials.save(&self.data_dir)
    }

    /// Forget the user token and language preference. Cached documents are kept
    pub fn sign_out(&mut self) -> Result<()> {
        let credentials = self.fetcher.credentials_mut();
        credentials.clear_token();
        credentials.save(&self.data_dir)?;

        self.settings.language = None;
        self.settings.save(&self.data_dir)?;
        log::info!("Signed out");
        Ok(())
    }

    /// Refresh a resource according to the current settings, or unconditionally if `force` is set.
    ///
    /// A base URL the resource path cannot be joined to counts as a transport failure.
    pub async fn refresh(&self, resource: Resource, force: bool) -> Result<FetchResult> {
        let url = match resource.url(&self.settings.base_url) {
            Ok(url) => url,
            Err(err) => {
                log::warn!("No usable URL for {} under {}: {}", resource, self.settings.base_url, err);
                return Ok(FetchResult { status_code: TRANSPORT_FAILURE, served_from_cache: false });
            },
        };
        let policy = RefreshPolicy::from_settings(&self.settings, force);
        self.fetcher.refresh(resource.name(), &url, policy).await
    }

    /// Decode the cached copy of a resource.
    ///
    /// A missing or unreadable copy is `None`; the reason is logged.
    pub fn cached_payload(&self, resource: Resource) -> Option<Payload> {
        let entry = match self.cache().load(resource.name()) {
            Err(err) => {
                log::warn!("Unable to read cached {}: {}", resource, err);
                return None;
            },
            Ok(None) => {
                log::debug!("Nothing cached for {}", resource);
                return None;
            },
            Ok(Some(entry)) => entry,
        };

        match Payload::parse(resource, &entry.payload) {
            Err(err) => {
                log::warn!("Ignoring cached {}: {}", resource, err);
                None
            },
            Ok(payload) => Some(payload),
        }
    }

    /// The subjects the user is enrolled in, from the cached enrollment list
    pub fn enrolled_subjects(&self) -> Vec<Subject> {
        match self.cached_payload(Resource::Subjects) {
            Some(Payload::Subjects(subjects)) => subjects,
            _ => Vec::new(),
        }
    }

    pub fn profile(&self) -> Option<Profile> {
        match self.cached_payload(Resource::Profile) {
            Some(Payload::Profile(profile)) => Some(profile),
            _ => None,
        }
    }

    /// Cached notices of the enrolled subjects
    pub fn notice_board(&self) -> NoticeBoard {
        let subjects = self.enrolled_subjects();
        match self.cached_payload(Resource::Notices) {
            Some(Payload::Notices(by_subject)) => NoticeBoard::new(&subjects, &by_subject),
            _ => NoticeBoard::default(),
        }
    }

    pub fn news(&self) -> Vec<FeedItem> {
        match self.cached_payload(Resource::NewsFeed) {
            Some(Payload::News(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Cached events of [`Resource::Timetable`] or [`Resource::Calendar`]
    pub fn schedule(&self, resource: Resource) -> Vec<ScheduleEvent> {
        match self.cached_payload(resource) {
            Some(Payload::Schedule(events)) => events,
            _ => Vec::new(),
        }
    }

    pub async fn refresh_notices(&self, force: bool) -> Result<View<NoticeBoard>> {
        let outcome = self.refresh(Resource::Notices, force).await?;
        Ok(View { outcome, data: self.notice_board() })
    }

    pub async fn refresh_news(&self, force: bool) -> Result<View<Vec<FeedItem>>> {
        let outcome = self.refresh(Resource::NewsFeed, force).await?;
        Ok(View { outcome, data: self.news() })
    }

    pub async fn refresh_schedule(&self, resource: Resource, force: bool) -> Result<View<Vec<ScheduleEvent>>> {
        if ResourceSet::SCHEDULES.contains(resource.into()) == false {
            return Err(PortalError::Config(format!("{} is not a schedule", resource)));
        }
        let outcome = self.refresh(resource, force).await?;
        Ok(View { outcome, data: self.schedule(resource) })
    }

    pub async fn refresh_enrollment(&self, force: bool) -> Result<View<Vec<Subject>>> {
        let outcome = self.refresh(Resource::Subjects, force).await?;
        Ok(View { outcome, data: self.enrolled_subjects() })
    }

    pub async fn refresh_profile(&self, force: bool) -> Result<View<Option<Profile>>> {
        let outcome = self.refresh(Resource::Profile, force).await?;
        Ok(View { outcome, data: self.profile() })
    }

    /// Refresh several resources in a row, and provide feedback to the user about the progress.
    ///
    /// It returns whether every refresh was successful (details about errors are logged using the `log::*` macros).
    /// Failures leave the previous cached copies untouched. Incomplete credentials abort the whole batch.
    pub async fn refresh_all(&self, resources: ResourceSet, force: bool, feedback: Option<FeedbackSender>) -> bool {
        let mut progress = match feedback {
            Some(sender) => RefreshProgress::new_with_feedback_channel(sender),
            None => RefreshProgress::new(),
        };
        progress.feedback(RefreshEvent::Started);

        let resources = resources.resources();
        let total = resources.len();
        for (done_already, resource) in resources.into_iter().enumerate() {
            progress.feedback(RefreshEvent::InProgress{ resource, done_already, total });
            match self.refresh(resource, force).await {
                Err(err @ PortalError::Signing(_)) => {
                    progress.error(&format!("Refresh aborted at {}: {}", resource, err));
                    break;
                },
                Err(err) => progress.error(&format!("Unable to refresh {}: {}", resource, err)),
                Ok(outcome) => match outcome.error() {
                    Some(err) => progress.warn(&format!("Unable to refresh {}: {}", resource, err)),
                    None => progress.debug(&format!("{} is up to date", resource)),
                },
            }
        }

        progress.info("Refresh ended");
        progress.feedback(RefreshEvent::Finished{ success: progress.is_success() });
        progress.is_success()
    }
}
