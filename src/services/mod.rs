pub mod favorites;
pub mod tags;
pub mod user;

pub use favorites::FavoriteService;
pub use tags::TagService;
pub use user::UserService;
