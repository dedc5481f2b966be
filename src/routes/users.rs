use actix_web::{
    cookie::{Cookie, SameSite},
    http::header,
    web, HttpRequest, HttpResponse,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{CreateUserRequest, SessionResponse, SigninRequest, TokenResponse};
use crate::services::UserService;
use crate::utils::auth::{create_jwt, parse_duration, verify_jwt};
use crate::AppState;

const REFRESH_COOKIE: &str = "refreshToken";

fn refresh_cookie(token: String, max_age_seconds: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::None);
    cookie.set_secure(true);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(max_age_seconds));
    cookie
}

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(register))
        .route("/auth", web::post().to(authenticate))
        .route("/refresh", web::post().to(refresh));
}

async fn register(
    state: web::Data<AppState>,
    req: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    UserService::new(&state.repos)
        .register(&req, state.config.bcrypt_cost)
        .await?;

    Ok(HttpResponse::Created().finish())
}

async fn authenticate(
    state: web::Data<AppState>,
    req: web::Json<SigninRequest>,
) -> AppResult<HttpResponse> {
    req.validate()?;

    let user = UserService::new(&state.repos)
        .authenticate(&req.email, &req.password)
        .await?;

    let config = &state.config;
    let token = create_jwt(&user.id, &config.jwt_secret, &config.jwt_expires_in)?;
    let refresh_token = create_jwt(&user.id, &config.jwt_secret, &config.refresh_expires_in)?;
    let refresh_lifetime = parse_duration(&config.refresh_expires_in)?;
    let cookie = refresh_cookie(refresh_token, refresh_lifetime.num_seconds());

    Ok(HttpResponse::Ok()
        .append_header((header::SET_COOKIE, cookie.to_string()))
        .json(SessionResponse {
            token,
            user: user.into(),
        }))
}

async fn refresh(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    let invalid = || AppError::Unauthorized("Invalid refresh token".to_string());

    let refresh_token = req.cookie(REFRESH_COOKIE).ok_or_else(invalid)?;
    let claims = verify_jwt(refresh_token.value(), &state.config.jwt_secret).map_err(|e| {
        tracing::debug!("Refresh token rejected: {:?}", e);
        invalid()
    })?;

    let user = UserService::new(&state.repos)
        .get_user_by_id(&claims.sub)
        .await?
        .ok_or_else(invalid)?;

    let token = create_jwt(&user.id, &state.config.jwt_secret, &state.config.jwt_expires_in)?;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}
