//! Tournament browsing and slot reservation handlers.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use esport_arena::{
    Identity,
    tournament::{
        JoinForm, JoinRequest, TournamentDetail, TournamentError, TournamentId, TournamentListing,
    },
};

use super::{
    AppState,
    flash::{ApiError, Flash},
    request_id::RequestId,
};
use crate::metrics;

/// All tournaments, newest first, with the ids the caller has joined.
/// Room credentials are only shown for joined tournaments (all of them for admins).
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<TournamentListing>, ApiError> {
    state
        .tournaments
        .list(&identity)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_tournament(e, "/tournaments"))
}

/// One tournament with its players ordered by slot
pub async fn detail(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<TournamentId>,
) -> Result<Json<TournamentDetail>, ApiError> {
    state
        .tournaments
        .detail(&identity, id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_tournament(e, "/tournaments"))
}

/// The join form: the tournament and the slots already taken.
///
/// Full, closed or already joined tournaments answer `303` to `/tournaments`.
pub async fn join_form(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<TournamentId>,
) -> Result<Json<JoinForm>, ApiError> {
    state
        .tournaments
        .join_form(&identity, id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_tournament(e, "/tournaments"))
}

/// Reserve a slot and pay the entry fee.
///
/// # Response
///
/// `303` to `/tournaments` with "Tournament join ho gaya. Best of luck!".
/// Slot, wallet and balance problems send the player back to the join form;
/// full, closed or already joined tournaments back to the list.
pub async fn join(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    request_id: RequestId,
    Path(id): Path<TournamentId>,
    request: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(request) = request.map_err(|e| {
        metrics::tournament_joins_total("invalid_form");
        ApiError::from_form(e, &format!("/tournaments/{id}/join"))
    })?;

    match state.tournaments.join(&identity, id, request).await {
        Ok(join) => {
            metrics::tournament_joins_total("reserved");
            tracing::info!(
                request_id = request_id.as_str(),
                tournament_id = id,
                slot = join.slot,
                "Slot reserved"
            );
            Ok(Flash::new(
                "Tournament join ho gaya. Best of luck!",
                "/tournaments",
            ))
        }
        Err(TournamentError::Join(rejection)) => {
            metrics::tournament_joins_total(rejection.kind());
            let redirect = if rejection.returns_to_form() {
                format!("/tournaments/{id}/join")
            } else {
                "/tournaments".to_string()
            };
            Err(ApiError::from_tournament(rejection.into(), &redirect))
        }
        Err(err) => Err(ApiError::from_tournament(err, "/tournaments")),
    }
}
