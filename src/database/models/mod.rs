pub mod asset;
pub mod owner;
pub mod user;

pub use asset::{Asset, AssetDetail};
pub use owner::Owner;
pub use user::User;
