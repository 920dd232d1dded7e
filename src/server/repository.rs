use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};

use crate::auth::RequireAccount;
use crate::server::AppState;
use crate::server::dto::{ReadRepositoryParams, RepositoryList, SubmitRepositoryRequest};
use crate::server::response::{ApiError, METHOD_NOT_MATCH_MESSAGE, Message};
use crate::server::validation::validate_submission;
use crate::types::Repository;

/// Number of records returned when no id is given.
pub const RECENT_LIMIT: i32 = 10;

pub async fn read_repositories(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ReadRepositoryParams>, QueryRejection>,
) -> Result<Message<RepositoryList>, ApiError> {
    // A query that names no single id, such as a repeated `id`, matches nothing.
    let Ok(Query(params)) = query else {
        return Ok(Message::ok(RepositoryList { repository: vec![] }));
    };
    let store = state.store.as_ref();

    let repository = match params.id.as_deref().filter(|id| !id.is_empty()) {
        None => store.list_recent_repositories(RECENT_LIMIT)?,
        Some(id) => store.get_repository(id)?.into_iter().collect(),
    };

    Ok(Message::ok(RepositoryList { repository }))
}

pub async fn submit_repository(
    auth: RequireAccount,
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubmitRepositoryRequest>, JsonRejection>,
) -> Result<Message<Repository>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    validate_submission(&req.organization, &req.project, &req.readme)?;

    let repository = state
        .reconciler()
        .submit(auth.account(), req.into())
        .await?;

    Ok(Message::ok(repository))
}

pub async fn method_not_match() -> ApiError {
    ApiError::bad_request(METHOD_NOT_MATCH_MESSAGE)
}
