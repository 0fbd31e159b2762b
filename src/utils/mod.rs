pub mod address_validator;
pub mod chain_normalizer;
pub mod hex_utils;
pub mod time_utils;
