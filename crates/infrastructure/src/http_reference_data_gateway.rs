use async_trait::async_trait;
use reqwest::Method;

use frontdesk_application::ReferenceDataGateway;
use frontdesk_core::AppResult;
use frontdesk_domain::{ReferenceCatalog, ReferenceOption, parse_reference_options};

use crate::http_api_client::{Credential, HttpApiClient, RequestBody};

/// Select-field option lists over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReferenceDataGateway {
    client: HttpApiClient,
}

impl HttpReferenceDataGateway {
    /// Creates a reference data gateway.
    #[must_use]
    pub fn new(client: HttpApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReferenceDataGateway for HttpReferenceDataGateway {
    async fn options(&self, catalog: ReferenceCatalog) -> AppResult<Vec<ReferenceOption>> {
        let url = self.client.endpoint(catalog.path(), &[])?;
        let body = self
            .client
            .execute(Method::GET, url, Credential::Session, RequestBody::Empty)
            .await?;

        parse_reference_options(catalog, &body)
    }
}
