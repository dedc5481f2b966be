pub mod favorites;
pub mod users;

use actix_web::{error, web, HttpRequest};

use crate::error::AppError;

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    AppError::Validation(err.to_string()).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
    AppError::Validation(err.to_string()).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> error::Error {
    AppError::Validation(err.to_string()).into()
}

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(web::scope("/user").configure(users::create_routes))
        .configure(favorites::create_routes);
}

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::web;
    use std::sync::Arc;

    use crate::config::test_config;
    use crate::repositories::{InMemoryStore, Repositories};
    use crate::AppState;

    pub fn test_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            config: Arc::new(test_config()),
            repos: Repositories::in_memory(Arc::new(InMemoryStore::default())),
        })
    }
}
