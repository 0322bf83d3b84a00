pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/match", post(handlers::handle_match))
        .route("/api/v1/match/upload", post(handlers::handle_match_upload))
        .route(
            "/api/v1/skills/extract",
            post(handlers::handle_extract_skills),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::matching::engine::MatchEngine;
    use crate::matching::vocabulary::SkillVocabulary;
    use crate::similarity::tfidf::TfIdfScorer;
    use crate::similarity::UnavailableScorer;

    const BOUNDARY: &str = "resume-matcher-test-boundary";

    fn test_router() -> Router {
        let engine = MatchEngine::new(
            Arc::new(SkillVocabulary::builtin().unwrap()),
            Arc::new(TfIdfScorer),
            Arc::new(UnavailableScorer::new("semantic", "disabled in tests")),
        );
        build_router(AppState {
            config: Config::default(),
            engine: Arc::new(engine),
        })
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = test_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_body(files: &[(&str, &str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (field, filename, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::post("/api/v1/match/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-matcher");
    }

    #[tokio::test]
    async fn test_match_json() {
        let (status, body) = send(post_json(
            "/api/v1/match",
            json!({
                "resume_text": "Skills: Python, SQL, Docker",
                "job_text": "Required: Python, AWS, Docker, CI/CD"
            }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"], "resume");
        assert_eq!(body["job_description"], "job_description");
        assert_eq!(body["skills_matched"], json!(["docker", "python"]));
        assert_eq!(body["skills_missing"], json!(["aws", "ci/cd"]));
        assert_eq!(body["breakdown"]["skill_score"], 50.0);
        assert_eq!(body["breakdown"]["semantic_score"], 0.0);
    }

    #[tokio::test]
    async fn test_match_json_rejects_empty_resume() {
        let (status, body) = send(post_json(
            "/api/v1/match",
            json!({ "resume_text": "  ", "job_text": "python" }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_match_upload() {
        let (status, body) = send(multipart_body(&[
            ("resume", "resume.txt", "Jane Doe\nSkills: Python, SQL, Docker"),
            ("job_description", "job.txt", "Required experience: Python, AWS"),
        ]))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"], "resume.txt");
        assert_eq!(body["job_description"], "job.txt");
        assert_eq!(body["skills_matched"], json!(["python"]));
        assert_eq!(body["skills_missing"], json!(["aws"]));
    }

    #[tokio::test]
    async fn test_match_upload_rejects_unsupported_format() {
        let (status, body) = send(multipart_body(&[
            ("resume", "resume.docx", "Python"),
            ("job_description", "job.txt", "Python"),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_match_upload_requires_both_files() {
        let (status, body) = send(multipart_body(&[("resume", "resume.txt", "Python")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("job_description"));
    }

    #[tokio::test]
    async fn test_extract_skills_open_mode() {
        let (status, body) = send(post_json(
            "/api/v1/skills/extract",
            json!({ "text": "Experience with Kubernetes and Python", "mode": "open" }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"], json!(["python"]));
        assert_eq!(body["candidates"], json!(["kubernetes"]));
        assert_eq!(body["mode"], "open");
    }

    #[tokio::test]
    async fn test_extract_skills_defaults_to_restricted() {
        let (status, body) = send(post_json(
            "/api/v1/skills/extract",
            json!({ "text": "Experience with Kubernetes and Python" }),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"], json!(["python"]));
        assert_eq!(body["candidates"], json!([]));
        assert_eq!(body["mode"], "restricted");
    }
}
