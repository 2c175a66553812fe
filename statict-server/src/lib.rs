//! The HTTP surface in front of [`statict_core::SubmissionCoordinator`]:
//! the three `ct/v1` endpoints, CORS, and request logging.

mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use statict_core::{Appender, DedupStorage, IssuerStorage, SubmissionCoordinator};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Process-lifetime state shared by every handler.
pub struct AppState<D, I, A> {
    pub coordinator: SubmissionCoordinator<D, I, A>,
    pub mask_internal_errors: bool,
}

/// Build the router, mounted under `/<origin>/ct/v1/` per the external
/// interface table. CORS is permissive: log data is public, so cross-origin
/// requests are allowed unconditionally.
pub fn router<D, I, A>(origin: &str, state: Arc<AppState<D, I, A>>) -> Router
where
    D: DedupStorage + 'static,
    I: IssuerStorage + 'static,
    A: Appender + 'static,
{
    let routes = Router::new()
        .route("/add-chain", post(handlers::add_chain::<D, I, A>))
        .route("/add-pre-chain", post(handlers::add_pre_chain::<D, I, A>))
        .route("/get-roots", get(handlers::get_roots::<D, I, A>))
        .with_state(state);

    Router::new()
        .nest(&format!("/{origin}/ct/v1"), routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use p256::{ecdsa::SigningKey, pkcs8::EncodePrivateKey};
    use rand::rngs::OsRng;
    use statict_core::{SctSigner, SystemTimeSource, TrustPool, ValidationOpts};
    use statict_storage::{MemoryAppender, MemoryDedupStore, MemoryIssuerStore};
    use statict_test::Fixture;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app(fixture: &Fixture) -> Router {
        let trust_pool = TrustPool::from_pem(&fixture.root_pem()).unwrap();
        let policy = ValidationOpts::new(false, false, None, None, "Any", "").unwrap();

        let key = SigningKey::random(&mut OsRng);
        let pem = key.to_pkcs8_pem(Default::default()).unwrap().to_string();
        let signer = SctSigner::from_pkcs8_pem(&pem).unwrap();

        let coordinator = SubmissionCoordinator {
            trust_pool,
            policy,
            signer,
            dedup: MemoryDedupStore::default(),
            issuers: MemoryIssuerStore::default(),
            appender: MemoryAppender::default(),
            time_source: Box::new(SystemTimeSource),
            deadline: Duration::from_secs(5),
        };

        let state = Arc::new(AppState { coordinator, mask_internal_errors: false });
        router("testlog", state)
    }

    fn chain_request_body(chain: &[Vec<u8>]) -> String {
        use base64::{Engine, prelude::BASE64_STANDARD};

        let der_b64: Vec<String> = chain.iter().map(|der| BASE64_STANDARD.encode(der)).collect();
        format!("{{\"chain\":[{}]}}", der_b64.iter().map(|s| format!("\"{s}\"")).collect::<Vec<_>>().join(","))
    }

    #[tokio::test]
    async fn get_roots_returns_the_trust_pool() {
        let fixture = Fixture::new();
        let app = test_app(&fixture);

        let request = Request::builder().method("GET").uri("/testlog/ct/v1/get-roots").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn add_chain_succeeds_for_a_leaf_signed_by_a_pool_intermediate() {
        let fixture = Fixture::new();
        let app = test_app(&fixture);

        let body = chain_request_body(&[fixture.leaf.der(), fixture.intermediate.der()]);
        let request = Request::builder()
            .method("POST")
            .uri("/testlog/ct/v1/add-chain")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn add_pre_chain_rejects_a_chain_without_the_poison_extension() {
        let fixture = Fixture::new();
        let app = test_app(&fixture);

        let body = chain_request_body(&[fixture.leaf.der(), fixture.intermediate.der()]);
        let request = Request::builder()
            .method("POST")
            .uri("/testlog/ct/v1/add-pre-chain")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_method_on_add_chain_is_rejected() {
        let fixture = Fixture::new();
        let app = test_app(&fixture);

        let request = Request::builder().method("GET").uri("/testlog/ct/v1/add-chain").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
