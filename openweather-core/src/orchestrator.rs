//! Request orchestration: validates, fetches and publishes the current outcome.
//!
//! State lives in a single [`Snapshot`] behind a `watch` channel. The variant,
//! query and outcome of a resolved request are always written together, so a
//! reader never pairs the outcome of one call with the variant of another.
//!
//! Every call to [`RequestOrchestrator::get_data`] takes a fresh token. A
//! completion is only published if its token is still the latest issued one;
//! late responses from superseded calls are dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    client::WeatherFetcher,
    error::ErrorKind,
    model::WeatherModel,
    query::{EndpointBuilder, LocationQuery, QueryVariant},
};

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(WeatherModel),
    Failure(ErrorKind),
}

impl FetchOutcome {
    pub fn model(&self) -> Option<&WeatherModel> {
        match self {
            FetchOutcome::Success(model) => Some(model),
            FetchOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(kind) => Some(*kind),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

/// A request as issued by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub token: u64,
    pub variant: QueryVariant,
    pub query: LocationQuery,
}

/// A request together with the outcome it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub request: Request,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Most recently issued request.
    pub requested: Option<Request>,
    /// Most recently published outcome, paired with the request that produced it.
    pub current: Option<Resolved>,
}

impl Snapshot {
    /// True while the latest issued request has not resolved yet.
    pub fn is_loading(&self) -> bool {
        match (&self.requested, &self.current) {
            (Some(req), Some(cur)) => req.token != cur.request.token,
            (Some(_), None) => true,
            _ => false,
        }
    }

    pub fn outcome(&self) -> Option<&FetchOutcome> {
        self.current.as_ref().map(|c| &c.outcome)
    }

    pub fn variant(&self) -> Option<QueryVariant> {
        self.current.as_ref().map(|c| c.request.variant)
    }
}

#[derive(Debug)]
pub struct RequestOrchestrator {
    builder: EndpointBuilder,
    fetcher: Box<dyn WeatherFetcher>,
    next_token: AtomicU64,
    state: watch::Sender<Snapshot>,
}

impl RequestOrchestrator {
    pub fn new(builder: EndpointBuilder, fetcher: Box<dyn WeatherFetcher>) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self {
            builder,
            fetcher,
            next_token: AtomicU64::new(0),
            state,
        }
    }

    /// Receiver that is notified on every published state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn current_outcome(&self) -> Option<FetchOutcome> {
        self.state.borrow().outcome().cloned()
    }

    pub fn current_variant(&self) -> Option<QueryVariant> {
        self.state.borrow().variant()
    }

    /// Looks up the weather for `query` using the `variant` template and
    /// publishes the outcome. Validation failures never touch the network.
    pub async fn get_data(&self, variant: QueryVariant, query: LocationQuery) -> FetchOutcome {
        let request = self.issue(variant, query);
        debug!(token = request.token, %variant, query = %request.query, "issuing weather request");

        let outcome = match self.builder.build(variant, &request.query) {
            Ok(url) => match self.fetcher.fetch(&url).await {
                Ok(model) => FetchOutcome::Success(model),
                Err(err) => {
                    warn!(token = request.token, error = %err, "weather request failed");
                    FetchOutcome::Failure(err.kind())
                }
            },
            Err(err) => {
                warn!(token = request.token, error = %err, "rejected location query");
                FetchOutcome::Failure(err.kind())
            }
        };

        self.publish(request, outcome.clone());
        outcome
    }

    /// Repeats the most recently issued request with its own variant.
    pub async fn retry(&self) -> FetchOutcome {
        let last = self.state.borrow().requested.clone();

        match last {
            Some(req) => {
                info!(variant = %req.variant, query = %req.query, "retrying weather request");
                self.get_data(req.variant, req.query).await
            }
            None => {
                warn!("retry requested before any request was issued");
                FetchOutcome::Failure(ErrorKind::InvalidQuery)
            }
        }
    }

    fn issue(&self, variant: QueryVariant, query: LocationQuery) -> Request {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let request = Request { token, variant, query };

        self.state.send_if_modified(|snap| {
            if snap.requested.as_ref().is_some_and(|r| r.token > token) {
                return false;
            }
            snap.requested = Some(request.clone());
            true
        });

        request
    }

    fn publish(&self, request: Request, outcome: FetchOutcome) {
        let token = request.token;
        let published = self.state.send_if_modified(|snap| {
            let latest = snap.requested.as_ref().map(|r| r.token);
            if latest != Some(token) {
                return false;
            }
            snap.current = Some(Resolved { request, outcome });
            true
        });

        if !published {
            debug!(token, "discarding outcome of superseded request");
        }
    }
}
