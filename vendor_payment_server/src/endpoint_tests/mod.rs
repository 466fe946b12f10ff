mod helpers;
mod mocks;

mod payments;
mod receipts;
mod settings;
mod verification;
