use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use frontdesk_application::RemoteCollectionGateway;
use frontdesk_core::{AppResult, RecordId};
use frontdesk_domain::{
    EntityKind, ListQuery, ListResult, Record, SubmissionPayload, parse_list_envelope,
    parse_record_envelope,
};

use crate::http_api_client::{Credential, HttpApiClient, RequestBody};
use crate::mutation::Mutation;

/// REST adapter for one record collection.
#[derive(Debug, Clone)]
pub struct HttpCollectionGateway {
    client: HttpApiClient,
    entity: EntityKind,
}

impl HttpCollectionGateway {
    /// Creates a gateway for `entity` on the client's backend and session.
    #[must_use]
    pub fn new(client: HttpApiClient, entity: EntityKind) -> Self {
        Self { client, entity }
    }
}

#[async_trait]
impl RemoteCollectionGateway for HttpCollectionGateway {
    fn entity(&self) -> EntityKind {
        self.entity
    }

    async fn list(&self, query: &ListQuery) -> AppResult<ListResult> {
        let params = query.query_params(self.entity.sort_param_style());
        let url = self.client.endpoint(self.entity.endpoints().list, &params)?;
        let body = self
            .client
            .execute(Method::GET, url, Credential::Session, RequestBody::Empty)
            .await?;

        parse_list_envelope(self.entity, &body, query.page(), query.page_size())
    }

    async fn get_by_id(&self, record_id: &RecordId) -> AppResult<Record> {
        let path = self.entity.endpoints().item_path(record_id.as_str());
        let url = self.client.endpoint(path.as_str(), &[])?;
        let body = self
            .client
            .execute(Method::GET, url, Credential::Session, RequestBody::Empty)
            .await?;

        parse_record_envelope(self.entity, &body)
    }

    async fn create(&self, mut payload: SubmissionPayload) -> AppResult<Record> {
        let session = self.client.session();
        Mutation::Create.authorize(session, self.entity)?;
        Mutation::Create.stamp(session, self.entity, &mut payload);

        let url = self.client.endpoint(self.entity.endpoints().create, &[])?;
        let body = RequestBody::for_payload(self.entity.body_encoding(), &payload)?;
        let response = self
            .client
            .execute(Method::POST, url, Credential::Session, body)
            .await?;

        parse_record_envelope(self.entity, &response)
    }

    async fn update(&self, record_id: &RecordId, mut payload: SubmissionPayload) -> AppResult<Record> {
        let session = self.client.session();
        Mutation::Update.authorize(session, self.entity)?;
        Mutation::Update.stamp(session, self.entity, &mut payload);

        let path = self.entity.endpoints().item_path(record_id.as_str());
        let url = self.client.endpoint(path.as_str(), &[])?;
        let body = RequestBody::for_payload(self.entity.body_encoding(), &payload)?;
        let response = self
            .client
            .execute(Method::PATCH, url, Credential::Session, body)
            .await?;

        match parse_record_envelope(self.entity, &response) {
            Ok(record) => Ok(record),
            Err(error) => {
                debug!(entity = %self.entity, error = %error, "update response had no record, refetching");
                self.get_by_id(record_id).await
            }
        }
    }

    async fn delete(&self, record_id: &RecordId) -> AppResult<()> {
        Mutation::Delete.authorize(self.client.session(), self.entity)?;

        let path = self.entity.endpoints().delete_path(record_id.as_str());
        let url = self.client.endpoint(path.as_str(), &[])?;
        self.client
            .execute(Method::DELETE, url, Credential::Session, RequestBody::Empty)
            .await?;

        Ok(())
    }
}
