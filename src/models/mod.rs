//! Data models representing store records and API responses.

/// Card key record, status and validation result
pub mod card_key;
