pub mod auth;
pub mod favorite;
pub mod pagination;
pub mod query;
pub mod tag;
pub mod user;

pub use auth::{Claims, SessionResponse, SigninRequest, TokenResponse};
pub use favorite::{
    Favorite, FavoriteDetailResponse, FavoriteForm, FavoriteResult, FavoriteType,
    FavoriteWithTags, NewFavorite,
};
pub use pagination::{PageRequest, PaginationInput, PaginationOutput};
pub use query::{FavoriteFilters, FavoriteList, FavoriteListParams, FavoritesQuery, SortOrder};
pub use tag::{FavoriteTag, NewFavoriteTag, Tag};
pub use user::{CreateUserRequest, NewUser, User, UserResponse};
