// Endpoints reachable without a token: login and signup.
pub mod auth;
pub mod user;
