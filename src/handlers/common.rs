use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query,
    },
    http::header,
    response::{IntoResponse, Response},
};

use crate::errors::ApiError;

/// A body that is already serialized JSON, e.g. after field selection.
#[derive(Debug, Clone)]
pub struct RawJson(pub String);

impl IntoResponse for RawJson {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/json")], self.0).into_response()
    }
}

/// Unparseable query strings answer 400 with the offending message.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::bad_request("query", rejection.body_text()))
}

/// Route id that is not an integer answers 400 `{"id": ["invalid id"]}`.
pub fn path_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("id", "invalid id"))
}
