pub mod models;
pub mod pii;

pub use models::licensing::{
    Company, CompanyDetails, Contact, License, OrderRequest, OrderedLicense,
    OrderedLicenseResult, SkuPricing, SubmitResultRequest, SubmitResultResponse,
};
pub use pii::Masked;
