//! 실행 계층 트레이트
//!
//! 실제 SQL 실행, 커넥션 풀, 트랜잭션은 구현체가 담당합니다.
//! 한 번의 호출은 하나의 트랜잭션 경계 안에서 실행되어야 합니다.

use async_trait::async_trait;

use mcrud_core::{Result, Row, Value};
use mcrud_sql::{CountRequest, DeleteRequest, InsertRequest, SelectRequest, UpdateRequest};

/// 데이터 저장소
///
/// 실행 실패는 `Error::Execution`으로 돌려줍니다.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// 목록 조회
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Row>>;

    /// 건수 조회
    async fn count(&self, request: &CountRequest) -> Result<u64>;

    /// 단건 insert, 생성된 기본 키 반환
    async fn insert(&self, request: &InsertRequest) -> Result<Option<Value>>;

    /// 배치 insert, 영향받은 행 수 반환
    async fn insert_batch(&self, request: &InsertRequest) -> Result<u64>;

    /// update, 영향받은 행 수 반환
    async fn update(&self, request: &UpdateRequest) -> Result<u64>;

    /// delete, 영향받은 행 수 반환
    async fn delete(&self, request: &DeleteRequest) -> Result<u64>;
}
