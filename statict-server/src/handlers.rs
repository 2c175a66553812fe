use crate::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use statict_core::{
    Appender, DedupStorage, IssuerStorage,
    v1::responses::{AddChainRequest, AddChainResponse, GetRootsResponse},
};
use std::sync::Arc;

pub(crate) async fn add_chain<D, I, A>(
    State(state): State<Arc<AppState<D, I, A>>>,
    Json(request): Json<AddChainRequest>,
) -> Response
where
    D: DedupStorage,
    I: IssuerStorage,
    A: Appender,
{
    submit(&state, request, false).await
}

pub(crate) async fn add_pre_chain<D, I, A>(
    State(state): State<Arc<AppState<D, I, A>>>,
    Json(request): Json<AddChainRequest>,
) -> Response
where
    D: DedupStorage,
    I: IssuerStorage,
    A: Appender,
{
    submit(&state, request, true).await
}

async fn submit<D, I, A>(state: &AppState<D, I, A>, request: AddChainRequest, is_precert: bool) -> Response
where
    D: DedupStorage,
    I: IssuerStorage,
    A: Appender,
{
    let result = state.coordinator.submit(&request.der_chain(), is_precert).await;

    match result {
        Ok(sct) => match AddChainResponse::from_sct(&sct) {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(error) => {
                tracing::error!(%error, "failed to encode a signed SCT signature for the response body");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        Err(error) => {
            if error.is_internal() {
                tracing::error!(%error, "submission failed");
            } else {
                tracing::info!(%error, "submission rejected");
            }

            let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, error.response_body(state.mask_internal_errors)).into_response()
        }
    }
}

pub(crate) async fn get_roots<D, I, A>(State(state): State<Arc<AppState<D, I, A>>>) -> Json<GetRootsResponse>
where
    D: DedupStorage,
    I: IssuerStorage,
    A: Appender,
{
    Json(GetRootsResponse::from_trust_pool(&state.coordinator.trust_pool))
}
