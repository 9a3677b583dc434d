// Route handlers, split by whether a bearer token is required.
pub mod protected;
pub mod public;
