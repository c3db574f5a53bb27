//! Fixed holder keys for proof and presentation tests.

use passtrust_core::keys::SigningKeypair;
use serde_json::json;

use crate::Keystore;

/// The holder's DID, a `did:jwk` over the fixed holder key.
pub const HOLDER_DID: &str = "did:jwk:eyJjcnYiOiJFZDI1NTE5Iiwia3R5IjoiT0tQIiwieCI6IlBVQVh3LWhEaVZxU3R3cW5UUnQtdkp5WUxNOHV4SmFNd00xVjhTcjBaZ3cifQ";

const OTHER_DID: &str = "did:jwk:eyJjcnYiOiJFZDI1NTE5Iiwia3R5IjoiT0tQIiwieCI6Il9GSE5qbUlZb2FPTnBIN1FBakR3V0FnVzdSTzZNd09zWGV1UkZVaVFnQ1UifQ";

/// The holder's DID as an owned string.
#[must_use]
pub fn did() -> String {
    HOLDER_DID.to_string()
}

/// A keystore over the holder's fixed key.
///
/// # Panics
///
/// Panics if the embedded JWK fails to load.
#[must_use]
pub fn keystore() -> Keystore {
    let jwk = json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "x": "PUAXw-hDiVqStwqnTRt-vJyYLM8uxJaMwM1V8Sr0Zgw",
        "d": "TM0Imyj_ltqdtsNG7BFOD1uKMZ81q6Yk2oz27U-4pvs",
    });
    let keypair = SigningKeypair::from_jwk(&jwk).expect("holder key is valid");
    Keystore::new(keypair, HOLDER_DID)
}

/// A keystore over a key unrelated to the holder, for key binding tests.
///
/// # Panics
///
/// Panics if the embedded JWK fails to load.
#[must_use]
pub fn other_keystore() -> Keystore {
    let jwk = json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "x": "_FHNjmIYoaONpH7QAjDwWAgW7RO6MwOsXeuRFUiQgCU",
        "d": "xaqN9D-fg3vtt0QvMdy3sWbThTUHbwlLhc46LgtEWPc",
    });
    let keypair = SigningKeypair::from_jwk(&jwk).expect("key is valid");
    Keystore::new(keypair, OTHER_DID)
}
