pub mod address_validator;
pub mod chain_id;

pub use address_validator::AddressValidator;
