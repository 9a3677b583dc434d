use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{extract::State, middleware, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AssetService, OwnerService, UserService};

/// Everything a handler needs, cloned per request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseManager,
    pub owners: OwnerService,
    pub assets: AssetService,
    pub users: UserService,
    pub tokens: TokenService,
}

impl AppState {
    /// Connect to the configured database, apply migrations and wire services.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let db = DatabaseManager::connect(&config.database).await?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: AppConfig, db: DatabaseManager) -> anyhow::Result<Self> {
        let tokens = TokenService::from_config(&config.security)?;

        Ok(Self {
            owners: OwnerService::new(db.clone()),
            assets: AssetService::new(db.clone()),
            users: UserService::new(db.clone(), PasswordHasher::new()),
            tokens,
            db,
            config: Arc::new(config),
        })
    }

    /// Create the configured seed account if it does not exist yet.
    pub async fn seed_default_user(&self) -> anyhow::Result<()> {
        let seed = match &self.config.security.seed_user {
            Some(seed) => seed,
            None => return Ok(()),
        };

        let (user, created) = self.users.ensure_user(&seed.login, &seed.password).await?;
        if created {
            info!("Seeded default user {} ({})", user.login, user.id);
        } else {
            info!("Default user {} already present", user.login);
        }
        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    let prefix = state.config.api.prefix.clone();
    let api = public_routes().merge(protected_routes(state.clone()));

    let api = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(public::auth::login_post))
        .route("/user", post(public::user::signup_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{asset, owner, user};

    Router::new()
        .route("/owner", post(owner::owner_post).get(owner::owner_list))
        .route(
            "/owner/:id",
            get(owner::owner_get).put(owner::owner_put).delete(owner::owner_delete),
        )
        .route("/asset", post(asset::asset_post).get(asset::asset_list))
        .route(
            "/asset/:id",
            get(asset::asset_get).put(asset::asset_put).delete(asset::asset_delete),
        )
        .route("/users", get(user::user_list))
        .route(
            "/user/:id",
            get(user::user_get).put(user::user_put).delete(user::user_delete),
        )
        .route(
            "/user",
            get(user::me_get).put(user::me_put).delete(user::me_delete),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

/// Bind the configured port and serve until the process is stopped.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting EyesOnAsset API in {:?} mode", config.environment);

    let state = AppState::build(config).await?;
    state.seed_default_user().await?;

    let bind_addr = format!("0.0.0.0:{}", state.config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    info!(
        "EyesOnAsset API listening on http://{}{}",
        bind_addr, state.config.api.prefix
    );

    let db = state.db.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    async fn test_router(configure: impl FnOnce(&mut AppConfig)) -> Router {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "router-test-secret".to_string();
        configure(&mut config);

        let db = DatabaseManager::connect_in_memory().await.unwrap();
        router(AppState::with_database(config, db).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_outside_the_prefix() {
        let app = test_router(|_| {}).await;
        let res = app.clone().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.oneshot(get_request("/integrations/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn protected_routes_live_under_the_prefix() {
        let app = test_router(|_| {}).await;

        let res = app.clone().oneshot(get_request("/integrations/owner")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let res = app.oneshot(get_request("/owner")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_endpoints_require_a_token() {
        let app = test_router(|_| {}).await;

        for uri in ["/integrations/owner", "/integrations/asset", "/integrations/users"] {
            let res = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn signup_is_public_but_self_lookup_is_not() {
        let app = test_router(|config| config.api.prefix = "/api".to_string()).await;

        let signup = Request::builder()
            .method("POST")
            .uri("/api/user")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"login":"ana","password":"pw"}"#))
            .unwrap();
        let res = app.clone().oneshot(signup).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = app.oneshot(get_request("/api/user")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = test_router(|_| {}).await;
        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/integrations/owner")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let res = app.oneshot(preflight).await.unwrap();
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }
}
