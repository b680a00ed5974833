use crate::api::error::ApiError;
use crate::config::config::ServerCfg;
use crate::core::types::DeckAnalysis;
use crate::pipeline::analyzer::DeckAnalyzer;
use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<DeckAnalyzer>,
}

#[derive(Debug, Deserialize)]
pub struct DecklistInput {
    pub decklist: String,
}

/// Deck routes are served both at the root and under `/api`.
pub fn router(state: AppState, cfg: &ServerCfg) -> Result<Router> {
    let deck_routes = Router::new()
        .route("/", get(root))
        .route("/analyze-deck", post(analyze_deck))
        .route("/upload-decklist", post(upload_decklist));

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(deck_routes.clone())
        .nest("/api", deck_routes)
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(cors_layer(&cfg.cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "MTG Deck Analyzer API" }))
}

async fn analyze_deck(
    State(state): State<AppState>,
    Json(input): Json<DecklistInput>,
) -> Result<Json<DeckAnalysis>, ApiError> {
    let analysis = state.analyzer.analyze(&input.decklist).await?;
    Ok(Json(analysis))
}

async fn upload_decklist(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DeckAnalysis>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Error processing file: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("<unnamed>").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Error processing file: {e}")))?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::BadRequest("Uploaded decklist is not valid UTF-8".into()))?;

        info!(filename = %filename, bytes = text.len(), "Received decklist upload");
        let analysis = state.analyzer.analyze(&text).await?;
        return Ok(Json(analysis));
    }

    Err(ApiError::BadRequest(
        "Missing 'file' field in upload".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::png::PngChartRenderer;
    use crate::charts::renderer::ChartRenderer;
    use crate::charts::svg::SvgChartRenderer;
    use crate::resolver::fixture::StaticResolver;
    use crate::resolver::rate::RateGate;
    use axum::body::{Body, to_bytes};
    use base64::Engine;
    use base64::prelude::*;
    use axum::http::{Request, StatusCode, header};
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "deckstat-boundary";

    fn app() -> Router {
        app_with(&ServerCfg::default())
    }

    fn app_with(cfg: &ServerCfg) -> Router {
        app_rendering(cfg, Arc::new(SvgChartRenderer::new()))
    }

    fn app_rendering(cfg: &ServerCfg, renderer: Arc<dyn ChartRenderer>) -> Router {
        let analyzer = DeckAnalyzer::new(
            Arc::new(StaticResolver::standard()),
            renderer,
            RateGate::new(Duration::from_millis(1)).unwrap(),
        );
        router(
            AppState {
                analyzer: Arc::new(analyzer),
            },
            cfg,
        )
        .unwrap()
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_request(uri: &str, field: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"deck.txt\"\r\nContent-Type: text/plain\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_message_on_both_prefixes() {
        for uri in ["/", "/api"] {
            let resp = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(body_json(resp).await["message"], "MTG Deck Analyzer API");
        }
    }

    #[tokio::test]
    async fn test_health() {
        let resp = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_deck() {
        let resp = app()
            .oneshot(json_request(
                "/api/analyze-deck",
                json!({ "decklist": "4 Lightning Bolt\n1 Forest\n2 Counterspell" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["cards"].as_array().unwrap().len(), 3);
        assert_eq!(body["cards"][0]["cmc"], 1.0);
        assert_eq!(body["color_distribution"], json!({ "U": 2, "R": 4 }));
        assert_eq!(body["mana_curve"], json!({ "1": 4, "2": 2 }));
        assert!(body["color_percentages"]["R"].as_f64().unwrap() > 66.6);
        assert_eq!(body["chart_media_type"], "image/svg+xml");
        assert!(!body["color_chart_base64"].as_str().unwrap().is_empty());
        assert_eq!(body["summary"]["land_count"], 1);
    }

    #[tokio::test]
    async fn test_analyze_deck_returns_png_charts() {
        let resp = app_rendering(&ServerCfg::default(), Arc::new(PngChartRenderer::new()))
            .oneshot(json_request(
                "/api/analyze-deck",
                json!({ "decklist": "4 Lightning Bolt\n1 Forest\n2 Counterspell" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["chart_media_type"], "image/png");
        for field in [
            "color_chart_base64",
            "mana_curve_chart_base64",
            "color_breakdown_chart_base64",
        ] {
            let bytes = BASE64_STANDARD
                .decode(body[field].as_str().unwrap())
                .unwrap();
            assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"), "{field}");
        }
    }

    #[tokio::test]
    async fn test_unprefixed_analyze_route() {
        let resp = app()
            .oneshot(json_request(
                "/analyze-deck",
                json!({ "decklist": "Counterspell" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_decklist_is_bad_request() {
        let resp = app()
            .oneshot(json_request(
                "/api/analyze-deck",
                json!({ "decklist": "   \n\n" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["detail"], "No cards found in decklist");
    }

    #[tokio::test]
    async fn test_unresolvable_decklist_is_bad_request() {
        let resp = app()
            .oneshot(json_request(
                "/api/analyze-deck",
                json!({ "decklist": "1 Nonexistent Card" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["detail"],
            "No valid cards found in decklist"
        );
    }

    #[tokio::test]
    async fn test_missing_decklist_field_is_rejected() {
        let resp = app()
            .oneshot(json_request("/api/analyze-deck", json!({ "deck": "x" })))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_upload_decklist() {
        let resp = app()
            .oneshot(upload_request(
                "/api/upload-decklist",
                "file",
                b"4 Lightning Bolt\r\n2 Counterspell\r\n",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["cards"].as_array().unwrap().len(), 2);
        assert_eq!(body["mana_curve"], json!({ "1": 4, "2": 2 }));
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let resp = app()
            .oneshot(upload_request("/upload-decklist", "other", b"4 Lightning Bolt"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await["detail"],
            "Missing 'file' field in upload"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_non_utf8() {
        let resp = app()
            .oneshot(upload_request("/upload-decklist", "file", &[0xff, 0xfe, 0x00]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let cfg = ServerCfg {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..ServerCfg::default()
        };
        let resp = app_with(&cfg)
            .oneshot(
                Request::builder()
                    .uri("/api")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );
    }

    #[test]
    fn test_invalid_cors_origin_fails_router_build() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
