//! # Metadata Endpoint
//!
//! Public verifier metadata: identification, the response URI, and the
//! presentation formats the verifier accepts.

use std::collections::HashMap;

use passtrust_openid::verifier::{FormatSpec, VerifierMetadataRequest, VerifierMetadataResponse};
use passtrust_openid::{Error, Result};
use tracing::instrument;

use crate::provider::{Metadata, Provider};

/// Metadata request handler.
///
/// # Errors
///
/// Returns an error if the provider is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn metadata(
    provider: impl Provider, request: &VerifierMetadataRequest,
) -> Result<VerifierMetadataResponse> {
    tracing::debug!("metadata::process");

    let config = Metadata::verifier(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifier metadata: {e}")))?;

    Ok(VerifierMetadataResponse {
        verifier_did: config.verifier_did,
        response_uri: config.response_uri,
        vp_formats: HashMap::from([
            ("jwt_vc".into(), FormatSpec { alg: vec!["EdDSA".into()] }),
            ("jwt_vp".into(), FormatSpec { alg: vec!["EdDSA".into()] }),
        ]),
    })
}

#[cfg(test)]
mod tests {
    use test_utils::verifier::{Provider, VERIFIER_DID};

    use super::*;

    #[tokio::test]
    async fn returns_verifier_metadata() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let response =
            metadata(provider, &VerifierMetadataRequest {}).await.expect("response is ok");

        assert_eq!(response.verifier_did, VERIFIER_DID);
        assert!(!response.response_uri.is_empty());
        assert_eq!(response.vp_formats["jwt_vp"].alg, vec!["EdDSA".to_string()]);
    }
}
