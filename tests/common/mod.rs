//! Scripted health store shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mindful_minutes::error::StoreError;
use mindful_minutes::store::{
    HealthStore, MindfulRecord, RecordTypeHandle, RecordTypeId, SampleQuery,
};
use std::sync::Mutex;

/// How the fake answers the authorization request.
#[derive(Debug, Clone, Copy)]
pub enum AuthAnswer {
    Grant,
    Deny,
    Fail,
}

/// How the fake answers the sample query.
#[derive(Debug, Clone)]
pub enum QueryAnswer {
    Records(Vec<MindfulRecord>),
    Missing,
    Fail,
    Panic,
}

/// A store whose every answer is fixed up front and whose calls are recorded.
pub struct ScriptedStore {
    pub available: bool,
    pub resolvable: bool,
    pub auth: AuthAnswer,
    pub query: QueryAnswer,
    calls: Mutex<Vec<&'static str>>,
    last_query: Mutex<Option<SampleQuery>>,
}

impl ScriptedStore {
    pub fn with_records(records: Vec<MindfulRecord>) -> Self {
        Self {
            available: true,
            resolvable: true,
            auth: AuthAnswer::Grant,
            query: QueryAnswer::Records(records),
            calls: Mutex::new(Vec::new()),
            last_query: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> Option<SampleQuery> {
        self.last_query.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl HealthStore for ScriptedStore {
    async fn is_data_available(&self) -> bool {
        self.record("is_data_available");
        self.available
    }

    async fn resolve_record_type(&self, id: &RecordTypeId) -> Option<RecordTypeHandle> {
        self.record("resolve_record_type");
        self.resolvable
            .then(|| RecordTypeHandle::new(format!("scripted:{id}")))
    }

    async fn request_authorization(&self, _read: &[RecordTypeHandle]) -> Result<bool, StoreError> {
        self.record("request_authorization");
        match self.auth {
            AuthAnswer::Grant => Ok(true),
            AuthAnswer::Deny => Ok(false),
            AuthAnswer::Fail => Err(StoreError::Backend("prompt failed".to_string())),
        }
    }

    async fn execute_query(
        &self,
        query: SampleQuery,
    ) -> Result<Option<Vec<MindfulRecord>>, StoreError> {
        self.record("execute_query");
        *self.last_query.lock().unwrap() = Some(query);
        match &self.query {
            QueryAnswer::Records(records) => Ok(Some(records.clone())),
            QueryAnswer::Missing => Ok(None),
            QueryAnswer::Fail => Err(StoreError::Backend("query failed".to_string())),
            QueryAnswer::Panic => panic!("store crashed"),
        }
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap()
}

/// A record starting at `start` seconds after the base time and lasting `len` seconds.
pub fn session(start: i64, len: i64) -> MindfulRecord {
    let start = base_time() + Duration::seconds(start);
    MindfulRecord::new(start, start + Duration::seconds(len))
}
