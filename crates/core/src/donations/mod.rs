//! Donation import from the fundraising provider

pub mod mapping;
pub mod ports;
pub mod service;

pub use mapping::{MappingError, PaymentRecord};
pub use ports::{
    DonationProvider, DonationRepository, OrganizationInfo, PaymentQuery, ReceiptNumberSequence,
};
pub use service::{DonationImportService, DonationImportSettings};
