// Extractors that turn axum rejections into ApiError bodies
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::{header, request::Parts};
use axum::{Form, Json};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body; malformed JSON is a 400, a mistyped field a 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Path parameters; an unparsable id is a 422 on `id`.
#[derive(Debug, Clone, Copy)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Body accepted either as JSON or as `application/x-www-form-urlencoded`,
/// chosen by the request's content type. Anything that is not form-encoded is
/// treated as JSON.
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state).await?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            Ok(Self(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Login {
        login: String,
        password: String,
    }

    fn request(content_type: &str, body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/auth")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn json_or_form_reads_both_encodings() {
        let expected = Login {
            login: "ana".to_string(),
            password: "pw".to_string(),
        };

        let JsonOrForm(from_json) =
            JsonOrForm::<Login>::from_request(request("application/json", r#"{"login":"ana","password":"pw"}"#), &())
                .await
                .unwrap();
        assert_eq!(from_json, expected);

        let JsonOrForm(from_form) = JsonOrForm::<Login>::from_request(
            request("application/x-www-form-urlencoded", "login=ana&password=pw"),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(from_form, expected);
    }

    #[tokio::test]
    async fn broken_json_is_invalid_json() {
        let err = ValidJson::<Login>::from_request(request("application/json", "{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_JSON");
    }

    #[tokio::test]
    async fn mistyped_json_is_validation_error() {
        let err = ValidJson::<Login>::from_request(request("application/json", r#"{"login":1,"password":"x"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
    }
}
