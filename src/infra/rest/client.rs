use async_trait::async_trait;
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::wire::{
    DeleteBody, Envelope, FetchParams, GRADE_FIELDS, GradeFields, RecordResult, RecordsBody,
    WireGrade,
};
use crate::fetch::{HttpClient, json_request};
use crate::grading::types::{GradeRecord, GradeUpdate, NewGrade};
use crate::services::record_store::{FieldFailure, RecordFilter, RecordStore, StoreError};

/// [`RecordStore`] backed by the record store's REST API.
///
/// All endpoints live under `{base_url}/projects/{project_id}/tables/{table}/records`.
/// Authentication is the job of the wrapped [`HttpClient`].
pub struct RestRecordStore<C> {
    client: C,
    records_url: Url,
}

impl<C: HttpClient> RestRecordStore<C> {
    pub fn new(client: C, base_url: &str, project_id: &str, table: &str) -> Result<Self, StoreError> {
        let mut records_url =
            Url::parse(base_url).map_err(|e| StoreError::InvalidUrl(format!("{base_url}: {e}")))?;
        records_url
            .path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(format!("{base_url}: cannot be a base")))?
            .pop_if_empty()
            .extend(["projects", project_id, "tables", table, "records"]);

        Ok(Self {
            client,
            records_url,
        })
    }

    fn url_with(&self, segment: &str) -> Url {
        let mut url = self.records_url.clone();
        // records_url was checked to be a base in `new`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(segment);
        }
        url
    }

    pub(crate) fn list_request(&self, filter: RecordFilter) -> Result<Request, StoreError> {
        json_request(
            Method::POST,
            self.url_with("query"),
            &FetchParams::for_filter(filter),
        )
        .map_err(StoreError::Encode)
    }

    pub(crate) fn get_request(&self, id: i64) -> Request {
        let mut url = self.url_with(&id.to_string());
        url.query_pairs_mut()
            .append_pair("fields", &GRADE_FIELDS.join(","));
        Request::new(Method::GET, url)
    }

    pub(crate) fn create_request(&self, grade: NewGrade) -> Result<Request, StoreError> {
        let body = RecordsBody {
            records: vec![grade.into()],
        };
        json_request(Method::POST, self.records_url.clone(), &body).map_err(StoreError::Encode)
    }

    pub(crate) fn update_request(&self, id: i64, update: GradeUpdate) -> Result<Request, StoreError> {
        let body = RecordsBody {
            records: vec![GradeFields::for_update(id, update)],
        };
        json_request(Method::PATCH, self.records_url.clone(), &body).map_err(StoreError::Encode)
    }

    pub(crate) fn delete_request(&self, id: i64) -> Result<Request, StoreError> {
        let body = DeleteBody {
            record_ids: vec![id],
        };
        json_request(Method::DELETE, self.records_url.clone(), &body).map_err(StoreError::Encode)
    }

    async fn send<T: DeserializeOwned>(&self, req: Request) -> Result<Envelope<T>, StoreError> {
        debug!(method = %req.method(), url = %req.url(), "Record store request");

        let response = self.client.execute(req).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        decode_envelope(&bytes)
    }
}

/// Parses a response body and turns `success: false` into [`StoreError::Rejected`].
pub(crate) fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<T>, StoreError> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes).map_err(StoreError::Decode)?;
    if !envelope.success {
        return Err(StoreError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| "no message".to_string()),
        ));
    }
    Ok(envelope)
}

/// Splits bulk results into successes and failures, logging the failures.
///
/// Errors only when every result failed.
pub(crate) fn successful<T>(
    operation: &str,
    results: Vec<RecordResult<T>>,
) -> Result<Vec<Option<T>>, StoreError> {
    let total = results.len();
    let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.success);

    if failed.is_empty() {
        return Ok(ok.into_iter().map(|r| r.data).collect());
    }

    let failures: Vec<FieldFailure> = failed
        .into_iter()
        .flat_map(|r| {
            let message = r.message;
            let errors = r.errors.unwrap_or_default();
            if errors.is_empty() {
                vec![FieldFailure {
                    field: "record".to_string(),
                    message: message.unwrap_or_else(|| "unknown error".to_string()),
                }]
            } else {
                errors.into_iter().map(FieldFailure::from).collect()
            }
        })
        .collect();

    for failure in &failures {
        error!(operation, field = %failure.field, message = %failure.message, "Record failed");
    }

    if ok.is_empty() {
        return Err(StoreError::RecordFailures {
            count: total,
            failures,
        });
    }
    Ok(ok.into_iter().map(|r| r.data).collect())
}

fn first_record(
    operation: &str,
    envelope: Envelope<WireGrade>,
) -> Result<Option<GradeRecord>, StoreError> {
    let Some(results) = envelope.results else {
        return Ok(None);
    };
    Ok(successful(operation, results)?
        .into_iter()
        .next()
        .flatten()
        .map(GradeRecord::from))
}

#[async_trait]
impl<C: HttpClient> RecordStore for RestRecordStore<C> {
    #[tracing::instrument(skip(self))]
    async fn list(&self, filter: RecordFilter) -> Result<Vec<GradeRecord>, StoreError> {
        let envelope: Envelope<Vec<WireGrade>> = self.send(self.list_request(filter)?).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(GradeRecord::from)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<GradeRecord>, StoreError> {
        let envelope: Envelope<WireGrade> = self.send(self.get_request(id)).await?;
        Ok(envelope.data.map(GradeRecord::from))
    }

    #[tracing::instrument(skip(self, grade), fields(course_id = grade.course_id))]
    async fn create(&self, grade: NewGrade) -> Result<Option<GradeRecord>, StoreError> {
        let envelope = self.send(self.create_request(grade)?).await?;
        first_record("create", envelope)
    }

    #[tracing::instrument(skip(self, update))]
    async fn update(
        &self,
        id: i64,
        update: GradeUpdate,
    ) -> Result<Option<GradeRecord>, StoreError> {
        let envelope = self.send(self.update_request(id, update)?).await?;
        first_record("update", envelope)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let envelope: Envelope<serde_json::Value> = self.send(self.delete_request(id)?).await?;
        match envelope.results {
            Some(results) => Ok(!successful("delete", results)?.is_empty()),
            None => Ok(false),
        }
    }
}
