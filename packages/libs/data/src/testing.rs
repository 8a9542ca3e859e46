//! 테스트용 기록 저장소

use std::sync::Mutex;

use async_trait::async_trait;

use mcrud_core::{Error, Result, Row, Value};
use mcrud_sql::{CountRequest, DeleteRequest, InsertRequest, SelectRequest, UpdateRequest};

use crate::store::DataStore;

/// 저장소 호출 기록
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Select(SelectRequest),
    Count(CountRequest),
    Insert(InsertRequest),
    InsertBatch(InsertRequest),
    Update(UpdateRequest),
    Delete(DeleteRequest),
}

/// 요청을 기록하고 미리 정한 결과를 돌려주는 저장소
#[derive(Default)]
pub struct RecordingStore {
    pub rows: Vec<Row>,
    pub count: u64,
    pub generated_id: Option<Value>,
    pub fail_with: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_generated_id(mut self, id: impl Into<Value>) -> Self {
        self.generated_id = Some(id.into());
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(message) => Err(Error::execution(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataStore for RecordingStore {
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Row>> {
        self.record(Call::Select(request.clone()))?;
        Ok(self.rows.clone())
    }

    async fn count(&self, request: &CountRequest) -> Result<u64> {
        self.record(Call::Count(request.clone()))?;
        Ok(self.count)
    }

    async fn insert(&self, request: &InsertRequest) -> Result<Option<Value>> {
        self.record(Call::Insert(request.clone()))?;
        Ok(self.generated_id.clone())
    }

    async fn insert_batch(&self, request: &InsertRequest) -> Result<u64> {
        self.record(Call::InsertBatch(request.clone()))?;
        Ok(request.rows.len() as u64)
    }

    async fn update(&self, request: &UpdateRequest) -> Result<u64> {
        self.record(Call::Update(request.clone()))?;
        Ok(request.ids.len() as u64)
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<u64> {
        self.record(Call::Delete(request.clone()))?;
        Ok(request.ids.len() as u64)
    }
}
