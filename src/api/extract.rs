use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{HeaderMap, header, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Numeric id from a JSON route. Anything that is not an integer cannot
/// name a record, so it is answered as not found.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

/// Numeric id from a page route; unparsable ids get the 404 page.
#[derive(Debug, Clone, Copy)]
pub struct PageId(pub i64);

async fn path_id<S>(parts: &mut Parts, state: &S) -> Option<i64>
where
    S: Send + Sync,
{
    Path::<i64>::from_request_parts(parts, state)
        .await
        .ok()
        .map(|Path(id)| id)
}

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state)
            .await
            .map(Self)
            .ok_or_else(|| AppError::not_found("Not found"))
    }
}

impl<S> FromRequestParts<S> for PageId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        path_id(parts, state).await.map(Self).ok_or(AppError::PageNotFound)
    }
}

/// Header set by page scripts to ask for a JSON answer instead of a page.
pub const AJAX_MARKER: (&str, &str) = ("x-requested-with", "XMLHttpRequest");

/// A task body decoded from either a JSON or a url-encoded request,
/// together with whether the caller expects a JSON answer.
#[derive(Debug)]
pub struct Submission<T> {
    pub fields: T,
    pub wants_json: bool,
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get(AJAX_MARKER.0)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == AJAX_MARKER.1)
        .unwrap_or(false)
}

impl<S, T> FromRequest<S> for Submission<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let headers = req.headers();
        let json = is_json(headers);
        let wants_json = json || is_ajax(headers);
        let has_content_type = headers.contains_key(header::CONTENT_TYPE);

        let fields = if json {
            let Json(fields) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            fields
        } else if has_content_type {
            let Form(fields) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            fields
        } else {
            // bodiless post; required fields are checked by the handler
            T::default()
        };

        Ok(Self { fields, wants_json })
    }
}
