//! Location route handlers.
//!
//! Detection requests return as soon as the lookup finishes or the soft
//! deadline passes, whichever is first. In the latter case the lookup keeps
//! running in the background and its progress is reported by
//! `GET /api/location` until it finishes.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{Coordinates, LocationState};
use crate::services::DetectionPhase;
use crate::state::AppState;
use crate::storage::ClientStore;

/// Location as seen by the UI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub location: Option<LocationState>,
    /// Shopping is blocked behind the "delivery paused" overlay.
    pub is_disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionPhase>,
    /// No detection tried yet and nothing saved: the UI may ask for the
    /// device position.
    pub should_auto_detect: bool,
    /// Nothing saved and the visitor has not closed the modal.
    pub show_location_modal: bool,
}

#[derive(Debug, Deserialize)]
pub struct PincodeForm {
    pub pincode: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeForm {
    pub global: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectionPending {
    phase: DetectionPhase,
}

/// Current location, revalidated when due.
#[instrument(skip(state, store))]
pub async fn show(State(state): State<AppState>, store: ClientStore) -> Result<Json<LocationView>> {
    let location = state.location().load(&store).await?;
    let visitor = store.visitor_id().await?;
    let attempted = store.has_attempted_auto_detection().await?;
    let dismissed = store.has_dismissed_location_modal().await?;

    Ok(Json(LocationView {
        is_disabled: location.as_ref().is_some_and(LocationState::is_disabled),
        detection: state.detections().phase(&visitor),
        should_auto_detect: location.is_none() && !attempted,
        show_location_modal: location.is_none() && !dismissed,
        location,
    }))
}

/// Apply a typed pincode.
#[instrument(skip(state, store, form))]
pub async fn set_pincode(
    State(state): State<AppState>,
    store: ClientStore,
    Json(form): Json<PincodeForm>,
) -> Result<Json<LocationState>> {
    let location = state
        .location()
        .set_user_pincode(&store, &form.pincode)
        .await?;
    Ok(Json(location))
}

/// Detect the pincode from a device position.
#[instrument(skip(state, store))]
pub async fn detect(
    State(state): State<AppState>,
    store: ClientStore,
    Json(position): Json<Coordinates>,
) -> Result<Response> {
    let visitor = store.visitor_id().await?;
    let progress = state.detections().track(&visitor);
    let mut phase = progress.subscribe();

    let resolver = state.location().clone();
    let task_store = store.clone();
    let task = tokio::spawn(async move {
        let result = resolver
            .detect_location(&task_store, position, &progress)
            .await;
        // The response may already be gone; save explicitly.
        if result.is_ok()
            && let Err(e) = task_store.persist().await
        {
            tracing::warn!(error = %e, "Failed to persist detected location");
        }
        result
    });

    let reached = phase
        .wait_for(|p| *p != DetectionPhase::Detecting)
        .await
        .map(|p| *p);

    if matches!(reached, Ok(DetectionPhase::ManualEntrySuggested)) {
        let body = DetectionPending {
            phase: DetectionPhase::ManualEntrySuggested,
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }

    let location = task
        .await
        .map_err(|e| AppError::Internal(format!("location detection task failed: {e}")))??;
    Ok(Json(location).into_response())
}

/// Switch global fulfilment on or off.
#[instrument(skip(state, store))]
pub async fn set_mode(
    State(state): State<AppState>,
    store: ClientStore,
    Json(form): Json<ModeForm>,
) -> Result<Json<LocationState>> {
    Ok(Json(
        state.location().set_global_mode(&store, form.global).await?,
    ))
}

/// Record that the visitor closed the location modal.
pub async fn dismiss(State(state): State<AppState>, store: ClientStore) -> Result<StatusCode> {
    state.location().dismiss_modal(&store).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Forget the saved location.
pub async fn clear(State(state): State<AppState>, store: ClientStore) -> Result<StatusCode> {
    state.location().clear(&store).await?;
    Ok(StatusCode::NO_CONTENT)
}
