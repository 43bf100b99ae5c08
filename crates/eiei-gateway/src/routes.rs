//! HTTP routes for the account service.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{
    AuthError, AuthState, AuthorizationQuery, BearerToken, ChangePasswordRequest, ClientAddr,
    ListQuery, LoginRequest, LoginResponse, ProfileUpdate, PublicUser, RegisterRequest,
    RequireAuth,
};
use crate::server::GatewayState;

/// Build the router with tracing, CORS and timeout layers.
pub fn router(state: GatewayState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let timeout = state.config.timeout;

    Router::new()
        .route("/health", get(health_handler))
        .route("/users/register", post(register_handler))
        .route("/users/login", post(login_handler))
        .route("/users/logout", post(logout_handler))
        .route("/users/me", get(me_handler).put(edit_profile_handler))
        .route("/users/me/password", put(change_password_handler))
        .route("/users/is-authorized", post(is_authorized_handler))
        .route("/users", get(list_users_handler))
        .route("/users/{id}", get(user_info_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Run a hashing or fsync-bound operation on the blocking pool.
async fn blocking<T, F>(auth: Arc<AuthState>, f: F) -> Result<T, AuthError>
where
    F: FnOnce(&AuthState) -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&auth))
        .await
        .map_err(|e| AuthError::Internal(format!("Blocking task failed: {e}")))?
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn register_handler(
    State(auth): State<Arc<AuthState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, AuthError> {
    blocking(auth, move |auth| auth.register(&request))
        .await
        .map(Json)
}

async fn login_handler(
    State(auth): State<Arc<AuthState>>,
    ClientAddr(client): ClientAddr,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    blocking(auth, move |auth| auth.login(&request, client))
        .await
        .map(Json)
}

async fn logout_handler(
    State(auth): State<Arc<AuthState>>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<Value>, AuthError> {
    blocking(auth, move |auth| auth.logout(&caller)).await?;
    Ok(Json(json!({ "message": "Successfully logged out" })))
}

async fn me_handler(RequireAuth(caller): RequireAuth) -> Json<PublicUser> {
    Json(caller.user.to_public())
}

async fn edit_profile_handler(
    State(auth): State<Arc<AuthState>>,
    RequireAuth(caller): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<PublicUser>, AuthError> {
    blocking(auth, move |auth| auth.edit_profile(&caller, &update))
        .await
        .map(Json)
}

async fn change_password_handler(
    State(auth): State<Arc<AuthState>>,
    RequireAuth(caller): RequireAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AuthError> {
    blocking(auth, move |auth| auth.change_password(&caller, &request)).await?;
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

async fn is_authorized_handler(
    State(auth): State<Arc<AuthState>>,
    BearerToken(token): BearerToken,
    Json(query): Json<AuthorizationQuery>,
) -> Json<Value> {
    let authorized = token.is_some_and(|token| {
        auth.is_authorized(&token, &query.role, query.user_id.as_deref())
    });
    Json(json!({ "authorized": authorized }))
}

async fn list_users_handler(
    State(auth): State<Arc<AuthState>>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PublicUser>>, AuthError> {
    auth.list_users(query).map(Json)
}

async fn user_info_handler(
    State(auth): State<Arc<AuthState>>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, AuthError> {
    auth.user_info(&id).map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::GatewayConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router(dir: &TempDir) -> Router {
        let state = GatewayState {
            auth: Arc::new(crate::auth::test_state(dir)),
            config: GatewayConfig::default(),
        };
        router(state)
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn registration() -> Value {
        json!({
            "email": "a@x.com",
            "first_name": "Ada",
            "last_name": "Obi",
            "password": "Secret123+",
            "phone_number": "+2348000000000",
            "role": "vendor",
        })
    }

    async fn register_and_login(app: &Router) -> (String, String) {
        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/users/register", None, &registration()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/users/login",
                None,
                &json!({ "email": "a@x.com", "password": "Secret123+" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["id"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);

        let response = app.oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_and_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/users/register", None, &registration()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["role"], "vendor");
        assert!(body.get("password_hash").is_none());
        assert!(body.get("salt").is_none());

        let response = app
            .oneshot(json_request(Method::POST, "/users/register", None, &registration()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Email already registered");
    }

    #[tokio::test]
    async fn test_register_invalid_role() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);

        let mut payload = registration();
        payload["role"] = json!("admin");
        let response = app
            .oneshot(json_request(Method::POST, "/users/register", None, &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Invalid role");
    }

    #[tokio::test]
    async fn test_login_and_wrong_password() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);
        let (token, id) = register_and_login(&app).await;
        assert!(!token.is_empty());
        assert!(!id.is_empty());

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/users/login",
                None,
                &json!({ "email": "a@x.com", "password": "wrong-password" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(body_json(response).await["code"], "invalid_credentials");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);

        let response = app
            .clone()
            .oneshot(get_request("/users/me", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["detail"], "Not authenticated");

        let response = app
            .oneshot(get_request("/users/me", Some("not.a.token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["detail"],
            "Could not validate credentials"
        );
    }

    #[tokio::test]
    async fn test_logout_revokes() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);
        let (token, _) = register_and_login(&app).await;

        let response = app
            .clone()
            .oneshot(get_request("/users/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "a@x.com");

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/users/logout", Some(&token), &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Successfully logged out"
        );

        let response = app
            .oneshot(get_request("/users/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Token has been revoked");
        assert_eq!(body["code"], "token_revoked");
    }

    #[tokio::test]
    async fn test_change_password_flow() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);
        let (token, _) = register_and_login(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                "/users/me/password",
                Some(&token),
                &json!({ "current_password": "Secret123+", "new_password": "Better456!" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let login = |password: &str| {
            json_request(
                Method::POST,
                "/users/login",
                None,
                &json!({ "email": "a@x.com", "password": password }),
            )
        };

        let response = app.clone().oneshot(login("Secret123+")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(login("Better456!")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_edit_profile() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);
        let (token, _) = register_and_login(&app).await;

        let response = app
            .oneshot(json_request(
                Method::PUT,
                "/users/me",
                Some(&token),
                &json!({ "last_name": "Okafor", "phone_number": "+234 800 111 2222" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["first_name"], "Ada");
        assert_eq!(body["last_name"], "Okafor");
        assert_eq!(body["phone_number"], "+234 800 111 2222");
    }

    #[tokio::test]
    async fn test_is_authorized_truth_table() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);
        let (token, id) = register_and_login(&app).await;

        let cases = [
            (Some(token.as_str()), json!({ "role": "vendor", "user_id": id }), true),
            (Some(token.as_str()), json!({ "role": "vendor" }), true),
            (Some(token.as_str()), json!({ "role": "organizer", "user_id": id }), false),
            (Some(token.as_str()), json!({ "role": "vendor", "user_id": "someone-else" }), false),
            (Some("garbage"), json!({ "role": "vendor" }), false),
            (None, json!({ "role": "vendor" }), false),
        ];

        for (bearer, query, expected) in cases {
            let response = app
                .clone()
                .oneshot(json_request(
                    Method::POST,
                    "/users/is-authorized",
                    bearer,
                    &query,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["authorized"], expected);
        }
    }

    #[tokio::test]
    async fn test_user_lookup_and_listing() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_router(&temp_dir);
        let (token, id) = register_and_login(&app).await;

        let response = app
            .clone()
            .oneshot(get_request(&format!("/users/{id}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], id.as_str());

        let response = app
            .clone()
            .oneshot(get_request("/users/unknown-id", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(get_request("/users?skip=0&limit=10", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = app.oneshot(get_request("/users", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
