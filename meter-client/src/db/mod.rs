pub mod literal;
pub mod meter_readings;

pub use literal::{LiteralError, SqlArg};
pub use meter_readings::{insert_batch_statement, InsertStatement};
