// Endpoints behind jwt_auth_middleware
pub mod asset;
pub mod owner;
pub mod user;
