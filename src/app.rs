use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::state::AppState;
use crate::{auth, pages, submissions};

pub fn build_app(state: AppState) -> Router {
    let max_submission_bytes = state.config.max_submission_bytes;
    Router::new()
        .route("/", get(pages::welcome))
        .merge(auth::router())
        .merge(submissions::router(max_submission_bytes))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, server: &ServerConfig) -> anyhow::Result<()> {
    let addr = server.addr()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        repo_types::Account,
        session::{SessionKeys, SESSION_COOKIE},
    };
    use crate::submissions::handlers::SUBMITTED;
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use tower::ServiceExt;

    async fn send(req: Request<Body>) -> Response {
        build_app(AppState::fake()).oneshot(req).await.expect("infallible")
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    async fn body_json(res: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(res).await).expect("json")
    }

    fn location(res: &Response) -> &str {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn static_pages_are_served() {
        for uri in ["/", "/register", "/login", "/compile"] {
            let res = send(get_req(uri)).await;
            assert_eq!(res.status(), StatusCode::OK, "GET {uri}");
            let ct = res.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
            assert!(ct.starts_with("text/html"), "GET {uri}: {ct}");
        }
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let res = send(get_req("/health")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "ok");
    }

    #[tokio::test]
    async fn profile_without_cookie_redirects_to_login() {
        let res = send(get_req("/profile")).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn profile_with_forged_cookie_redirects_to_login() {
        let req = Request::builder()
            .uri("/profile")
            .header(header::COOKIE, format!("{SESSION_COOKIE}=your_session_token"))
            .body(Body::empty())
            .unwrap();
        let res = send(req).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }

    #[tokio::test]
    async fn profile_with_issued_cookie_is_served_for_any_account() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        for (id, name) in [(1, "ali"), (2, "ayse")] {
            let account = Account {
                id,
                name: name.into(),
                surname: "veli".into(),
                barcode: id,
                email: format!("{name}@b.com"),
                password: String::new(),
            };
            let cookie = keys.issue(&account).expect("issue");
            let req = Request::builder()
                .uri("/profile")
                .header(header::COOKIE, format!("{SESSION_COOKIE}={}", cookie.value()))
                .body(Body::empty())
                .unwrap();
            let res = build_app(state.clone()).oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            assert!(body_text(res).await.contains("<html"));
        }
    }

    #[tokio::test]
    async fn register_rejects_non_numeric_barcode_before_touching_database() {
        // The fake pool cannot connect, so reaching it would yield a 500.
        let res = send(form_post(
            "/register",
            "name=ali&surname=veli&barcode=abc&email=a%40b.com&password=pw",
        ))
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["message"], "barcode must be a number");
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let res = send(form_post("/register", "barcode=5&name=ali")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn register_reports_database_failure_as_500() {
        let res = send(form_post(
            "/register",
            "name=ali&surname=veli&barcode=123&email=a%40b.com&password=pw",
        ))
        .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(res).await["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn register_without_form_content_type_is_bad_request() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/register")
            .body(Body::from("name=ali"))
            .unwrap();
        let res = send(req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn login_reports_database_failure_as_500() {
        let res = send(form_post("/login", "name=ali&password=pw")).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_clears_cookie_and_redirects() {
        let res = send(
            Request::builder()
                .method(Method::POST)
                .uri("/logout")
                .header(header::COOKIE, format!("{SESSION_COOKIE}=whatever"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
        let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE}=")));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn compile_rejects_oversized_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/compile")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("x".repeat(1024)))
            .unwrap();
        let res = send(req).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn compile_rejects_non_utf8_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/compile")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(vec![0xff, 0xfe, 0xfd]))
            .unwrap();
        let res = send(req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn compile_reports_insert_failure_as_500() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/compile")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("print('hi')"))
            .unwrap();
        let res = send(req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_ne!(body_text(res).await, SUBMITTED);
    }

    #[tokio::test]
    async fn profile_lets_any_method_through_with_session() {
        let state = AppState::fake();
        let account = Account {
            id: 3,
            name: "ali".into(),
            surname: "veli".into(),
            barcode: 3,
            email: "ali@b.com".into(),
            password: String::new(),
        };
        let cookie = SessionKeys::from_ref(&state).issue(&account).expect("issue");
        for method in [Method::POST, Method::PUT] {
            let req = Request::builder()
                .method(method.clone())
                .uri("/profile")
                .header(header::COOKIE, format!("{SESSION_COOKIE}={}", cookie.value()))
                .body(Body::empty())
                .unwrap();
            let res = build_app(state.clone()).oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{method} /profile");
        }
    }

    #[tokio::test]
    async fn anonymous_post_to_profile_redirects_to_login() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/profile")
            .body(Body::empty())
            .unwrap();
        let res = send(req).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/login");
    }
}
