pub mod extraction;
pub mod login;
pub mod row_ctx;

pub use extraction::{run_extraction, ExtractionOutcome, ExtractionReport};
pub use login::run_login;
pub use row_ctx::RowCtx;
