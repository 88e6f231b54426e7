pub mod company;

pub use company::{
    BasicCompanyInfo, CompanyFinancialsAndRelations, CompanyRecord, HistoricalShareholder, Stake,
    Transaction,
};
