// src/common/json.rs

use axum::{
    extract::{rejection::JsonRejection, FromRef, FromRequest, Request},
    http::StatusCode,
    Json,
};

use crate::{common::error::ApiError, config::AppState, middleware::i18n::Locale};

// `Json<T>` que responde con nuestro sobre {"error": ...} y status 400 cuando el
// cuerpo no se puede leer, en vez del texto plano / 422 que devuelve axum.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let app_state = AppState::from_ref(state);
                tracing::warn!("Cuerpo JSON rechazado: {}", rejection.body_text());
                Err(ApiError::new(
                    StatusCode::BAD_REQUEST,
                    app_state.i18n_store.translate(
                        &locale.0,
                        "invalid_json",
                        &[("reason", rejection.body_text())],
                    ),
                ))
            }
        }
    }
}
