//! Request extractors that turn malformed input into the API's error
//! envelope instead of axum's default plain-text rejections.

use crate::api::models::{AppError, SearchParams};
use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Numeric recipe id taken from the single path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeId(pub i64);

impl RecipeId {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().map(RecipeId)
    }
}

impl<S> FromRequestParts<S> for RecipeId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::invalid_id())?;
        RecipeId::parse(&raw).ok_or_else(AppError::invalid_id)
    }
}

/// JSON body decoded regardless of the declared content type.
///
/// The body is consumed in full before decoding, so it is released on
/// both the success and the failure path.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::invalid_payload())?;
        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            debug!(error = %e, "Rejected request payload");
            AppError::invalid_payload()
        })
    }
}

/// Search form read from the query string plus a multipart or urlencoded
/// body. Body fields override query fields; a broken body is ignored.
#[derive(Debug, Default)]
pub struct SearchForm(pub SearchParams);

impl SearchForm {
    fn set(&mut self, name: &str, value: String) {
        match name {
            "count" => self.0.page.count = Some(value),
            "start" => self.0.page.start = Some(value),
            "preptime" => self.0.preptime = Some(value),
            _ => {}
        }
    }
}

impl<S> FromRequest<S> for SearchForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut form = SearchForm::default();

        if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
            for (name, value) in pairs {
                form.set(&name, value);
            }
        }

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            match Multipart::from_request(req, state).await {
                Ok(mut multipart) => loop {
                    match multipart.next_field().await {
                        Ok(Some(field)) => {
                            let Some(name) = field.name().map(str::to_string) else {
                                continue;
                            };
                            match field.text().await {
                                Ok(value) => form.set(&name, value),
                                Err(e) => {
                                    debug!(error = %e, "Unreadable multipart field");
                                    break;
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            debug!(error = %e, "Malformed multipart search form");
                            break;
                        }
                    }
                },
                Err(e) => debug!(error = %e, "Malformed multipart search form"),
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            match Form::<Vec<(String, String)>>::from_request(req, state).await {
                Ok(Form(pairs)) => {
                    for (name, value) in pairs {
                        form.set(&name, value);
                    }
                }
                Err(e) => debug!(error = %e, "Malformed urlencoded search form"),
            }
        }

        Ok(form)
    }
}
