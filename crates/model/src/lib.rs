pub mod batch;
pub mod column;
pub mod record;
pub mod schema;
