pub mod export;
pub mod input;

pub use export::{export_file_name, export_records, flatten_column};
pub use input::load_input;
