//! The mindful minutes aggregation service.
//!
//! [`MindfulService`] is created once and reused. Each call runs an
//! independent [`Pipeline`] on the tokio runtime and hands the result to the
//! completion callback on the service's [`DeliveryQueue`] thread.

use crate::core::pipeline::{Pipeline, PipelineOutcome};
use crate::core::window::TimeWindow;
use crate::delivery::{DeliveryError, DeliveryQueue};
use crate::error::{AggregationResult, MindfulError};
use crate::store::HealthStore;
use crate::transparency::SharedTransparencyLog;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::warn;

/// Errors that can occur while setting up the service.
#[derive(Debug)]
pub enum ServiceError {
    /// The tokio runtime could not be built
    Runtime(std::io::Error),
    /// The delivery thread could not be started
    Delivery(DeliveryError),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Runtime(e) => write!(f, "Failed to create runtime: {e}"),
            ServiceError::Delivery(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<DeliveryError> for ServiceError {
    fn from(e: DeliveryError) -> Self {
        ServiceError::Delivery(e)
    }
}

/// Aggregates mindful session minutes from a health data store.
#[derive(Clone)]
pub struct MindfulService {
    store: Arc<dyn HealthStore>,
    runtime: Handle,
    delivery: DeliveryQueue,
    log: Option<SharedTransparencyLog>,
    timezone: Option<Tz>,
}

impl MindfulService {
    /// Create a service that runs pipelines on `runtime`.
    pub fn new(store: Arc<dyn HealthStore>, runtime: Handle) -> Result<Self, ServiceError> {
        Ok(Self {
            store,
            runtime,
            delivery: DeliveryQueue::spawn()?,
            log: None,
            timezone: None,
        })
    }

    /// Count every request and outcome in `log`.
    pub fn with_transparency_log(mut self, log: SharedTransparencyLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Compute "today" in `timezone` instead of the system zone.
    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    /// The context every completion runs on.
    pub fn delivery(&self) -> &DeliveryQueue {
        &self.delivery
    }

    /// Window from the start of the current local day until now.
    pub fn today_window(&self) -> TimeWindow {
        TimeWindow::today(self.timezone)
    }

    /// Total minutes across every mindful session ever recorded.
    pub fn total_mindful_minutes<F>(&self, completion: F)
    where
        F: FnOnce(AggregationResult) + Send + 'static,
    {
        self.total_mindful_minutes_in(None, completion);
    }

    /// Total minutes of mindful sessions since the start of the local day.
    pub fn total_mindful_minutes_for_today<F>(&self, completion: F)
    where
        F: FnOnce(AggregationResult) + Send + 'static,
    {
        self.total_mindful_minutes_in(Some(self.today_window()), completion);
    }

    /// Total minutes of mindful sessions intersecting `window` (all, when `None`).
    ///
    /// Returns immediately. `completion` is called exactly once, on the
    /// delivery thread.
    pub fn total_mindful_minutes_in<F>(&self, window: Option<TimeWindow>, completion: F)
    where
        F: FnOnce(AggregationResult) + Send + 'static,
    {
        let store = self.store.clone();
        let runtime = self.runtime.clone();
        let delivery = self.delivery.clone();
        let log = self.log.clone();

        self.runtime.spawn(async move {
            let result = aggregate(store, window, log, runtime).await;
            if let Err(e) = delivery.dispatch(move || completion(result)) {
                warn!(error = %e, "could not deliver mindful minutes result");
            }
        });
    }

    /// Run one aggregation and return its result to the awaiting caller.
    pub async fn fetch_total_minutes(&self, window: Option<TimeWindow>) -> AggregationResult {
        aggregate(
            self.store.clone(),
            window,
            self.log.clone(),
            self.runtime.clone(),
        )
        .await
    }
}

/// Run a pipeline in its own task so a panicking store still yields a result.
async fn aggregate(
    store: Arc<dyn HealthStore>,
    window: Option<TimeWindow>,
    log: Option<SharedTransparencyLog>,
    runtime: Handle,
) -> AggregationResult {
    if let Some(log) = &log {
        log.record_request();
    }

    let outcome = match runtime.spawn(Pipeline::new(store, window).run()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "pipeline task failed");
            PipelineOutcome {
                result: Err(MindfulError::PlatformError),
                records_read: 0,
            }
        }
    };

    if let Some(log) = &log {
        log.record_outcome(&outcome.result, outcome.records_read);
    }
    outcome.result
}

/// Blocking wrapper for synchronous contexts.
pub struct BlockingMindfulService {
    inner: MindfulService,
    runtime: tokio::runtime::Runtime,
}

impl BlockingMindfulService {
    /// Create a blocking service with its own runtime.
    ///
    /// The runtime keeps one worker thread so pipelines started through
    /// [`service`](Self::service) run without anyone calling `block_on`.
    pub fn new(store: Arc<dyn HealthStore>) -> Result<Self, ServiceError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("mindful-runtime")
            .enable_all()
            .build()
            .map_err(ServiceError::Runtime)?;
        let inner = MindfulService::new(store, runtime.handle().clone())?;

        Ok(Self { inner, runtime })
    }

    /// Count every request and outcome in `log`.
    pub fn with_transparency_log(mut self, log: SharedTransparencyLog) -> Self {
        self.inner = self.inner.with_transparency_log(log);
        self
    }

    /// Compute "today" in `timezone` instead of the system zone.
    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.inner = self.inner.with_timezone(timezone);
        self
    }

    /// Run one aggregation over `window` and wait for its result.
    pub fn fetch(&self, window: Option<TimeWindow>) -> AggregationResult {
        self.runtime.block_on(self.inner.fetch_total_minutes(window))
    }

    /// Total minutes across every mindful session ever recorded.
    pub fn total_minutes(&self) -> AggregationResult {
        self.fetch(None)
    }

    /// Total minutes of mindful sessions since the start of the local day.
    pub fn total_minutes_for_today(&self) -> AggregationResult {
        self.fetch(Some(self.inner.today_window()))
    }

    /// The underlying callback-based service.
    pub fn service(&self) -> &MindfulService {
        &self.inner
    }
}
