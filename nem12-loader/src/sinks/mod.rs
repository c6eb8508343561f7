pub mod sql_file;
pub mod sql_statements;
pub mod statement_files;

pub use sql_file::SqlFileSink;
pub use sql_statements::{generate_insert_statements, DEFAULT_BATCH_SIZE};
pub use statement_files::write_statement_files;
