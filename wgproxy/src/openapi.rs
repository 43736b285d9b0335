//! OpenAPI documentation for the proxy surface

use utoipa::OpenApi;

/// OpenAPI document for the failover proxy API
#[derive(OpenApi)]
#[openapi(
    paths(crate::api::proxy_get, crate::api::proxy_preflight),
    components(schemas(crate::api::ErrorResponse)),
    tags(
        (name = "proxy", description = "Multi-host failover proxy for the Audius discovery network")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        assert!(!doc.paths.paths.is_empty());
    }
}
