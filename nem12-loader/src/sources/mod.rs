pub mod nem12;
pub mod nem12_file;

pub use nem12_file::{validate_csv_path, Nem12FileSource};
