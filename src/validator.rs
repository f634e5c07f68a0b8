//! JSON body extractor that runs `validator` rules before the handler.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use educa_core::AppError;

/// Joins every field error into one message, in field order.
fn format_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn rejection_to_error(rejection: &JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let error_msg = rejection.body_text();

    if let Some(field) = error_msg
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return AppError::bad_request(anyhow!("{field} is required"));
    }

    if error_msg.contains("unknown variant") {
        return AppError::bad_request(anyhow!("Invalid value for an enumerated field"));
    }

    if error_msg.contains("invalid type") || error_msg.contains("invalid value") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| rejection_to_error(&rejection))?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}
