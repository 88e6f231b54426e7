pub mod chrome_page;
pub mod page_driver;
pub mod session;

pub use chrome_page::ChromePage;
pub use page_driver::{
    ObservedResponse, OriginStorage, PageDriver, PageProbe, ResponseFeed, SearchHit,
    StorageEntry, StorageState,
};
pub use session::BrowserSession;
