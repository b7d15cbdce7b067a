use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Realtor scheduling API is running!" }))
        .nest("/agents", appointment_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use appointment_cell::services::InMemoryAppointmentStore;
    use shared_utils::test_utils::TestConfig;

    fn app() -> Router {
        let state = AppState::new(
            TestConfig::unconfigured().to_app_config(),
            Arc::new(InMemoryAppointmentStore::new()),
        );
        create_router(Arc::new(state))
    }

    #[tokio::test]
    async fn root_reports_liveness() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn agent_routes_are_nested() {
        let app = app();
        let put = |uri: &str| {
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(r#"{"monday":[{"from":"09:00","to":"12:00"}]}"#))
                .unwrap()
        };

        let response = app.clone().oneshot(put("/agents/agent-1/opening-hours")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(put("/agent-1/opening-hours")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
