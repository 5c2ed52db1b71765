pub mod initdb;
pub mod reconcile;
pub mod serve;

pub use initdb::init_database;
pub use reconcile::reconcile;
pub use serve::serve;
