//! # Presentation Definition Endpoint
//!
//! The static definition of what a wallet must present: passport name,
//! nationality, and birth date are required; passport number is optional.

use std::collections::HashMap;

use passtrust_openid::verifier::{
    Constraints, DefinitionRequest, DefinitionResponse, Field, FormatSpec, InputDescriptor,
    PresentationDefinition,
};
use passtrust_openid::Result;
use tracing::instrument;

use crate::provider::Provider;

/// Presentation definition request handler.
///
/// # Errors
///
/// Infallible today; the signature leaves room for definitions driven by
/// provider configuration.
#[instrument(level = "debug", skip(_provider))]
pub async fn definition(
    _provider: impl Provider, request: &DefinitionRequest,
) -> Result<DefinitionResponse> {
    tracing::debug!("definition::process");

    Ok(DefinitionResponse {
        presentation_definition: passport_definition(),
    })
}

pub(crate) fn passport_definition() -> PresentationDefinition {
    let required = |path: &str| Field {
        path: vec![format!("$.vc.credentialSubject.{path}")],
        optional: None,
    };
    let optional = |path: &str| Field {
        path: vec![format!("$.vc.credentialSubject.{path}")],
        optional: Some(true),
    };

    PresentationDefinition {
        id: "passport-credential".into(),
        input_descriptors: vec![InputDescriptor {
            id: "passport_claims".into(),
            constraints: Constraints {
                fields: vec![
                    required("name"),
                    required("nationality"),
                    required("birth_date"),
                    optional("passport_number"),
                ],
            },
        }],
        format: HashMap::from([
            ("jwt_vc".into(), FormatSpec { alg: vec!["EdDSA".into()] }),
            ("jwt_vp".into(), FormatSpec { alg: vec!["EdDSA".into()] }),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use test_utils::verifier::Provider;

    use super::*;

    #[tokio::test]
    async fn required_and_optional_fields() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let response =
            definition(provider, &DefinitionRequest {}).await.expect("response is ok");

        let def = response.presentation_definition;
        assert_eq!(def.input_descriptors.len(), 1);

        let fields = &def.input_descriptors[0].constraints.fields;
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].path, vec!["$.vc.credentialSubject.name".to_string()]);
        assert_eq!(fields[3].optional, Some(true));

        assert_eq!(def.format["jwt_vc"].alg, vec!["EdDSA".to_string()]);
    }
}
