//! Contact form endpoint

use axum::{http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::contact::ContactMessage,
};

#[derive(Serialize, ToSchema)]
pub struct ContactResponse {
    pub message: String,
}

/// Send a message to the library
#[utoipa::path(
    post,
    path = "/contact",
    tag = "contact",
    request_body = ContactMessage,
    responses(
        (status = 202, description = "Message received", body = ContactResponse),
        (status = 400, description = "Invalid form")
    )
)]
pub async fn send_message(
    WithRejection(Json(message), _): WithRejection<Json<ContactMessage>, AppError>,
) -> AppResult<(StatusCode, Json<ContactResponse>)> {
    message.validate()?;

    tracing::info!(
        from = %message.email,
        subject = %message.subject,
        "Contact message received"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ContactResponse {
            message: "Your message has been sent. Thank you.".to_string(),
        }),
    ))
}
