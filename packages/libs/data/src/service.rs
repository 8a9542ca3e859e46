//! 범용 데이터 접근 파사드
//!
//! 테이블 이름과 느슨한 타입의 파라미터/레코드만으로 목록 조회, 건수, 저장,
//! 배치 저장, 수정, 삭제를 수행합니다.
//!
//! 메타데이터 조회 → 값 변환 → 조건 컴파일 → (쓰기) 기본값/감사 해석 → 규칙 검사 → 실행 순서로 진행하며,
//! 해석이 전부 끝난 뒤에만 저장소를 호출합니다.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mcrud_core::schema::TableMeta;
use mcrud_core::{
    DefaultResolver, Error, MetadataCatalog, Params, Record, Result, Row, UserContext, Value,
};
use mcrud_sql::params::{text_param, DEFAULT_PAGE_SIZE};
use mcrud_sql::{
    compile_params, enhance_filters, guard, CountRequest, DeleteRequest, InsertRequest,
    Pagination, SelectRequest, UpdateRequest,
};

use crate::rules::check_rules;
use crate::store::DataStore;

/// 목록 조회 요청
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// 0부터 시작하는 페이지 번호
    #[serde(default)]
    pub page_index: i64,

    /// 페이지 크기 (0 이하 = 기본값)
    #[serde(default)]
    pub page_size: i64,

    /// 컬럼 목록 (None = `*`)
    #[serde(default)]
    pub columns: Option<String>,

    /// 필터 파라미터
    #[serde(default)]
    pub params: Params,

    /// JOIN 표현식
    #[serde(default)]
    pub join: Option<String>,

    /// 정렬 (None = 테이블 기본 정렬)
    #[serde(default)]
    pub sort: Option<String>,

    /// 그룹
    #[serde(default)]
    pub group: Option<String>,
}

impl ListQuery {
    /// 필터 파라미터만으로 생성
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// 평면 파라미터 맵에서 생성
    ///
    /// `pageIndex`, `pageSize`, `sortByAndType`, `columns`, `groupBy`를 읽고
    /// 나머지는 필터로 남깁니다 (예약 키는 조건 컴파일 단계에서 제외).
    pub fn from_params(params: Params) -> Self {
        Self {
            page_index: params.get("pageIndex").and_then(Value::as_i64).unwrap_or(0),
            page_size: params.get("pageSize").and_then(Value::as_i64).unwrap_or(0),
            columns: text_param(&params, "columns"),
            sort: text_param(&params, "sortByAndType"),
            group: text_param(&params, "groupBy"),
            join: None,
            params,
        }
    }

    pub fn page(mut self, page_index: i64, page_size: i64) -> Self {
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn join(mut self, join: impl Into<String>) -> Self {
        self.join = Some(join.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// 데이터 서비스
pub struct DataService {
    catalog: Arc<MetadataCatalog>,
    store: Arc<dyn DataStore>,
    default_page_size: u64,
}

impl DataService {
    /// 새 서비스 생성
    pub fn new(catalog: Arc<MetadataCatalog>, store: Arc<dyn DataStore>) -> Self {
        Self {
            catalog,
            store,
            default_page_size: DEFAULT_PAGE_SIZE as u64,
        }
    }

    /// 기본 페이지 크기 설정
    pub fn with_default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size.max(1);
        self
    }

    /// 메타데이터 카탈로그
    pub fn catalog(&self) -> &Arc<MetadataCatalog> {
        &self.catalog
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Read
    // ─────────────────────────────────────────────────────────────────────────────

    /// 목록 조회
    ///
    /// 반환되는 Row의 키는 소문자로 정규화됩니다.
    pub async fn query_list(
        &self,
        ctx: &UserContext,
        table: &str,
        query: &ListQuery,
    ) -> Result<Vec<Row>> {
        guard::check_table(table)?;
        let meta = self.catalog.table(table).await;

        let mut params = query.params.clone();
        enhance_filters(&meta, ctx, &mut params);
        let condition = compile_params(&meta, &params)?;

        let columns = non_blank(query.columns.as_deref()).unwrap_or("*").to_string();
        guard::check_column_list(&columns)?;

        let join = non_blank(query.join.as_deref()).map(str::to_string);
        if let Some(join) = &join {
            guard::check_join(join)?;
        }

        let order_by = non_blank(query.sort.as_deref())
            .or_else(|| non_blank(meta.defaults.default_sort.as_deref()))
            .map(str::to_string);
        if let Some(sort) = &order_by {
            guard::check_sort(sort)?;
        }

        let group_by = non_blank(query.group.as_deref()).map(str::to_string);
        if let Some(group) = &group_by {
            guard::check_group(group)?;
        }

        let page = Pagination::new(query.page_index, query.page_size, self.default_page_size);

        let request = SelectRequest {
            table: meta.table.clone(),
            columns,
            join,
            condition,
            group_by,
            order_by,
            limit: page.page_size,
            offset: page.offset(),
        };
        tracing::debug!(table = %meta.table, sql = %request.to_sql(), "query list");

        let rows = logged(&meta.table, "select", self.store.select(&request).await)?;
        Ok(rows.into_iter().map(normalize_row).collect())
    }

    /// 건수 조회
    pub async fn count(
        &self,
        ctx: &UserContext,
        table: &str,
        params: &Params,
        join: Option<&str>,
    ) -> Result<u64> {
        guard::check_table(table)?;
        let meta = self.catalog.table(table).await;

        let mut params = params.clone();
        enhance_filters(&meta, ctx, &mut params);
        let condition = compile_params(&meta, &params)?;

        let join = non_blank(join).map(str::to_string);
        if let Some(join) = &join {
            guard::check_join(join)?;
        }

        let request = CountRequest {
            table: meta.table.clone(),
            join,
            condition,
        };
        logged(&meta.table, "count", self.store.count(&request).await)
    }

    /// 단건 조회 (없으면 `None`)
    pub async fn get_one(
        &self,
        ctx: &UserContext,
        table: &str,
        params: &Params,
    ) -> Result<Option<Row>> {
        let query = ListQuery::new(params.clone()).page(0, 1);
        let rows = self.query_list(ctx, table, &query).await?;
        Ok(rows.into_iter().next())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Write
    // ─────────────────────────────────────────────────────────────────────────────

    /// 단건 저장, 생성된 기본 키 반환
    pub async fn save(
        &self,
        ctx: &UserContext,
        table: &str,
        mut record: Record,
    ) -> Result<Option<Value>> {
        guard::check_table(table)?;
        let meta = self.catalog.table(table).await;

        DefaultResolver::new(&meta, ctx).resolve_for_insert(&mut record)?;
        check_keys(&record)?;
        check_rules(self.store.as_ref(), &meta, &record, None).await?;

        let request = InsertRequest::single(meta.table.clone(), meta.primary_key(), record);
        logged(&meta.table, "insert", self.store.insert(&request).await)
    }

    /// 배치 저장, 삽입된 행 수 반환
    ///
    /// 모든 레코드의 해석/검증이 끝난 뒤 하나의 문장으로 실행합니다.
    pub async fn save_batch(
        &self,
        ctx: &UserContext,
        table: &str,
        mut records: Vec<Record>,
    ) -> Result<u64> {
        guard::check_table(table)?;
        if records.is_empty() {
            return Ok(0);
        }
        let meta = self.catalog.table(table).await;

        DefaultResolver::new(&meta, ctx).resolve_batch(&mut records)?;
        for record in &records {
            check_keys(record)?;
            check_rules(self.store.as_ref(), &meta, record, None).await?;
        }

        let request = InsertRequest::batch(meta.table.clone(), meta.primary_key(), records);
        logged(&meta.table, "insert batch", self.store.insert_batch(&request).await)
    }

    /// 기본 키로 수정, 영향받은 행 수 반환
    pub async fn update(
        &self,
        ctx: &UserContext,
        table: &str,
        record: Record,
        id: Value,
    ) -> Result<u64> {
        guard::check_table(table)?;
        let meta = self.catalog.table(table).await;
        if id.is_empty() {
            return Err(Error::required(meta.primary_key()));
        }

        self.update_ids(ctx, &meta, record, vec![id]).await
    }

    /// 여러 기본 키에 같은 레코드를 적용
    pub async fn update_batch(
        &self,
        ctx: &UserContext,
        table: &str,
        record: Record,
        ids: Vec<Value>,
    ) -> Result<u64> {
        guard::check_table(table)?;
        let ids: Vec<Value> = ids.into_iter().filter(|id| !id.is_empty()).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let meta = self.catalog.table(table).await;

        self.update_ids(ctx, &meta, record, ids).await
    }

    async fn update_ids(
        &self,
        ctx: &UserContext,
        meta: &TableMeta,
        mut record: Record,
        ids: Vec<Value>,
    ) -> Result<u64> {
        let pk = meta.primary_key();
        record.remove(pk);

        DefaultResolver::new(meta, ctx).resolve_for_update(&mut record)?;
        record.remove(pk);
        check_keys(&record)?;

        if record.is_empty() {
            tracing::debug!(table = %meta.table, "nothing to update");
            return Ok(0);
        }

        let current_id = if ids.len() == 1 { ids.first() } else { None };
        check_rules(self.store.as_ref(), meta, &record, current_id).await?;

        let request = UpdateRequest {
            table: meta.table.clone(),
            primary_key: pk.to_string(),
            ids,
            record,
        };
        logged(&meta.table, "update", self.store.update(&request).await)
    }

    /// 기본 키로 삭제
    pub async fn delete(&self, table: &str, id: Value) -> Result<u64> {
        self.delete_batch(table, vec![id]).await
    }

    /// 여러 기본 키로 삭제 (빈 목록이면 아무것도 하지 않음)
    pub async fn delete_batch(&self, table: &str, ids: Vec<Value>) -> Result<u64> {
        guard::check_table(table)?;
        let ids: Vec<Value> = ids.into_iter().filter(|id| !id.is_empty()).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let meta = self.catalog.table(table).await;

        let request = DeleteRequest {
            table: meta.table.clone(),
            primary_key: meta.primary_key().to_string(),
            ids,
        };
        logged(&meta.table, "delete", self.store.delete(&request).await)
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn check_keys(record: &Record) -> Result<()> {
    record.keys().try_for_each(|key| guard::check_column(key))
}

fn normalize_row(row: Row) -> Row {
    row.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

/// 실행 실패 로그
fn logged<T>(table: &str, operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::error!(table, operation, error = %e, "store operation failed");
    }
    result
}
