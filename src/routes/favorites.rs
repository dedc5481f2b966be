use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthMiddleware, AuthUser};
use crate::models::{FavoriteDetailResponse, FavoriteForm, FavoritesQuery};
use crate::services::FavoriteService;
use crate::AppState;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/favorite")
            .wrap(AuthMiddleware)
            .route(web::post().to(create_favorite)),
    )
    .service(
        web::resource("/favorites")
            .wrap(AuthMiddleware)
            .route(web::get().to(list_favorites)),
    )
    .service(
        web::resource("/favorite/{favorite_id}")
            .wrap(AuthMiddleware)
            .route(web::get().to(get_favorite))
            .route(web::put().to(update_favorite))
            .route(web::delete().to(delete_favorite)),
    );
}

fn favorite_id(path: web::Path<String>) -> AppResult<String> {
    let id = path.into_inner();
    Uuid::parse_str(&id)
        .map_err(|_| AppError::Validation("favorite_id must be a valid UUID".to_string()))?;
    Ok(id)
}

async fn create_favorite(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    form: web::Json<FavoriteForm>,
) -> AppResult<HttpResponse> {
    form.validate()?;

    let result = FavoriteService::new(&state.repos)
        .create(&auth_user.id, &form)
        .await?;

    Ok(HttpResponse::Created().json(result))
}

async fn list_favorites(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    query: web::Query<FavoritesQuery>,
) -> AppResult<HttpResponse> {
    query.validate()?;

    let list = FavoriteService::new(&state.repos)
        .list(&auth_user.id, query.into_inner().into_params())
        .await?;

    Ok(HttpResponse::Ok().json(list))
}

async fn get_favorite(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = favorite_id(path)?;

    let favorite = FavoriteService::new(&state.repos)
        .get_by_id(&auth_user.id, &id)
        .await?;

    Ok(HttpResponse::Ok().json(FavoriteDetailResponse { favorite }))
}

async fn update_favorite(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
    form: web::Json<FavoriteForm>,
) -> AppResult<HttpResponse> {
    let id = favorite_id(path)?;
    form.validate()?;

    let result = FavoriteService::new(&state.repos)
        .update(&auth_user.id, &id, &form)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

async fn delete_favorite(
    state: web::Data<AppState>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = favorite_id(path)?;

    FavoriteService::new(&state.repos)
        .delete(&auth_user.id, &id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
