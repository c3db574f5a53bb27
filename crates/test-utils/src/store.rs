//! In-memory backends shared by the issuer and verifier test providers.
//! Every store clones by `Arc`, so clones observe each other's writes.

pub mod authority;
pub mod issuance;
pub mod registry;
pub mod state;
pub mod status;
