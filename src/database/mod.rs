pub mod manager;
pub mod models;
pub mod record;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager, WriteTransaction};
pub use record::{Changes, FieldValue};
pub use repository::{Entity, Page, Repository};
