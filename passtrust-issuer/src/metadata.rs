//! # Metadata Endpoint
//!
//! Public issuer metadata: identification, endpoints, supported credential
//! configurations, and the issuer's signing keys as a JWK set.

use passtrust_openid::issuer::{MetadataRequest, MetadataResponse};
use passtrust_openid::{Error, Result};
use serde_json::json;
use tracing::instrument;

use crate::provider::{Metadata, Provider, Signer};

/// Metadata request handler.
///
/// # Errors
///
/// Returns an error if the provider is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn metadata(
    provider: impl Provider, request: &MetadataRequest,
) -> Result<MetadataResponse> {
    tracing::debug!("metadata::process");

    let issuer = Metadata::issuer(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting issuer metadata: {e}")))?;
    let jwk = Signer::verifying_key(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifying key: {e}")))?;

    Ok(MetadataResponse {
        issuer,
        jwks: json!({ "keys": [jwk] }),
    })
}

#[cfg(test)]
mod tests {
    use test_utils::issuer::{ISSUER_DID, Provider};

    use super::*;

    #[tokio::test]
    async fn returns_issuer_and_keys() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let response =
            metadata(provider, &MetadataRequest {}).await.expect("response is ok");

        assert_eq!(response.issuer.credential_issuer, ISSUER_DID);
        assert!(
            response.issuer.credential_configurations_supported.contains_key("PassportCredential")
        );

        let keys = response.jwks["keys"].as_array().expect("jwks has keys");
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0]["kty"], "OKP");
        assert_eq!(keys[0]["crv"], "Ed25519");
    }
}
