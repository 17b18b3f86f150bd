use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::{
    error::ApiError,
    models::{Card, CollectionEntry, EntryRequest},
};

pub type ApiResult<T> = Result<T, ApiError>;

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Every card of a set, in catalog order.
    async fn set_cards(&self, set_code: &str) -> ApiResult<Vec<Card>>;
}

#[async_trait]
pub trait CollectionService: Send + Sync {
    async fn entries(&self, user_id: i64) -> ApiResult<Vec<CollectionEntry>>;
    async fn card_ids(&self, user_id: i64) -> ApiResult<Vec<i64>>;
    async fn add(&self, user_id: i64, request: &EntryRequest) -> ApiResult<CollectionEntry>;
    async fn update(
        &self,
        user_id: i64,
        card_id: i64,
        request: &EntryRequest,
    ) -> ApiResult<CollectionEntry>;
    async fn remove(&self, user_id: i64, card_id: i64) -> ApiResult<()>;
}

pub struct HttpCatalog {
    client: Client,
    base: Url,
}

impl HttpCatalog {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn set_cards_url(&self, set_code: &str) -> ApiResult<Url> {
        endpoint(&self.base, &format!("sets/{}/cards", set_code))
    }
}

#[async_trait]
impl CatalogService for HttpCatalog {
    async fn set_cards(&self, set_code: &str) -> ApiResult<Vec<Card>> {
        let url = self.set_cards_url(set_code)?;
        debug!(%url, "fetching catalog");
        get_json(&self.client, url).await
    }
}

pub struct HttpCollection {
    client: Client,
    base: Url,
}

impl HttpCollection {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn user_cards(&self, user_id: i64) -> ApiResult<Url> {
        endpoint(&self.base, &format!("users/{}/cards", user_id))
    }

    fn user_card(&self, user_id: i64, card_id: i64) -> ApiResult<Url> {
        endpoint(&self.base, &format!("users/{}/cards/{}", user_id, card_id))
    }

    fn card_ids_url(&self, user_id: i64) -> ApiResult<Url> {
        endpoint(&self.base, &format!("users/{}/card-ids", user_id))
    }
}

#[async_trait]
impl CollectionService for HttpCollection {
    async fn entries(&self, user_id: i64) -> ApiResult<Vec<CollectionEntry>> {
        get_json(&self.client, self.user_cards(user_id)?).await
    }

    async fn card_ids(&self, user_id: i64) -> ApiResult<Vec<i64>> {
        get_json(&self.client, self.card_ids_url(user_id)?).await
    }

    async fn add(&self, user_id: i64, request: &EntryRequest) -> ApiResult<CollectionEntry> {
        let response = self
            .client
            .post(self.user_cards(user_id)?)
            .json(request)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn update(
        &self,
        user_id: i64,
        card_id: i64,
        request: &EntryRequest,
    ) -> ApiResult<CollectionEntry> {
        let response = self
            .client
            .put(self.user_card(user_id, card_id)?)
            .json(request)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn remove(&self, user_id: i64, card_id: i64) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.user_card(user_id, card_id)?)
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }
}

fn endpoint(base: &Url, path: &str) -> ApiResult<Url> {
    base.join(path)
        .map_err(|e| ApiError::Url(format!("{}{}: {}", base, path, e)))
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: Url) -> ApiResult<T> {
    let response = client.get(url).send().await?;
    Ok(check_status(response)?.json().await?)
}

fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Outcome of a successful mutation: the card it touched and the collection
/// as re-fetched afterwards. The re-fetch can fail on its own.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub card_id: i64,
    pub collection: ApiResult<Vec<CollectionEntry>>,
}

async fn reconcile(
    service: &dyn CollectionService,
    user_id: i64,
    card_id: i64,
) -> Reconciliation {
    let collection = service.entries(user_id).await;
    if let Err(e) = &collection {
        warn!(card_id, error = %e, "collection reload after mutation failed");
    }
    Reconciliation {
        card_id,
        collection,
    }
}

pub async fn add_and_reconcile(
    service: Arc<dyn CollectionService>,
    user_id: i64,
    card_id: i64,
) -> ApiResult<Reconciliation> {
    service
        .add(user_id, &EntryRequest::add_default(card_id))
        .await?;
    info!(card_id, user_id, "card added to collection");
    Ok(reconcile(service.as_ref(), user_id, card_id).await)
}

pub async fn update_and_reconcile(
    service: Arc<dyn CollectionService>,
    user_id: i64,
    request: EntryRequest,
) -> ApiResult<Reconciliation> {
    let card_id = request.card_id;
    service.update(user_id, card_id, &request).await?;
    info!(card_id, user_id, quantity = request.quantity, "collection entry updated");
    Ok(reconcile(service.as_ref(), user_id, card_id).await)
}

pub async fn remove_and_reconcile(
    service: Arc<dyn CollectionService>,
    user_id: i64,
    card_id: i64,
) -> ApiResult<Reconciliation> {
    service.remove(user_id, card_id).await?;
    info!(card_id, user_id, "card removed from collection");
    Ok(reconcile(service.as_ref(), user_id, card_id).await)
}

pub async fn download_image(client: Client, card_id: i64, url: String) -> (i64, Option<Bytes>) {
    let request = client.get(&url).send().await.ok();
    let img = match request.and_then(|res| res.error_for_status().ok()) {
        Some(res) => res.bytes().await.ok(),
        None => None,
    };
    if img.is_none() {
        debug!(card_id, %url, "image download failed");
    }
    (card_id, img)
}


#[cfg(test)]
mod tests {
    use super::fake::FakeCollection;
    use super::*;
    use crate::models::Condition;
    use reqwest::ResponseBuilderExt;

    fn service(fake: FakeCollection) -> (Arc<FakeCollection>, Arc<dyn CollectionService>) {
        let fake = Arc::new(fake);
        let service: Arc<dyn CollectionService> = fake.clone();
        (fake, service)
    }

    #[tokio::test]
    async fn add_then_reconcile_yields_single_default_entry() {
        let (_, service) = service(FakeCollection::default());

        let reconciled = add_and_reconcile(service, 1, 50).await.unwrap();
        let collection = reconciled.collection.unwrap();

        let matching: Vec<_> = collection.iter().filter(|e| e.card_id == 50).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].quantity, 1);
        assert_eq!(matching[0].condition, Condition::NearMint);
        assert!(!matching[0].reverse_holo());
    }

    #[tokio::test]
    async fn remove_then_reconcile_drops_the_card() {
        let (_, service) = service(FakeCollection::default());
        add_and_reconcile(service.clone(), 1, 50).await.unwrap();
        add_and_reconcile(service.clone(), 1, 51).await.unwrap();

        let reconciled = remove_and_reconcile(service, 1, 50).await.unwrap();
        let collection = reconciled.collection.unwrap();

        assert!(collection.iter().all(|e| e.card_id != 50));
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_skips_reconciliation() {
        let (fake, service) = service(FakeCollection {
            fail_mutations: true,
            ..Default::default()
        });

        let result = add_and_reconcile(service, 1, 50).await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
        assert!(fake.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reload_failure_after_mutation_is_reported_separately() {
        let (_, service) = service(FakeCollection {
            fail_reads: true,
            ..Default::default()
        });

        let reconciled = add_and_reconcile(service, 1, 9).await.unwrap();
        assert_eq!(reconciled.card_id, 9);
        assert!(reconciled.collection.is_err());
    }

    #[tokio::test]
    async fn update_changes_quantity_and_condition() {
        let (_, service) = service(FakeCollection::default());
        add_and_reconcile(service.clone(), 1, 7).await.unwrap();

        let request = EntryRequest {
            quantity: 3,
            condition: Condition::Played,
            ..EntryRequest::add_default(7)
        };
        let reconciled = update_and_reconcile(service, 1, request).await.unwrap();
        let entry = reconciled.collection.unwrap().remove(0);

        assert_eq!(entry.quantity, 3);
        assert_eq!(entry.condition, Condition::Played);
    }

    #[test]
    fn endpoints_append_to_base() {
        let base = Url::parse("http://localhost:8080/api/collections/").unwrap();
        let collection = HttpCollection::new(Client::new(), base);

        assert_eq!(
            collection.user_cards(1).unwrap().as_str(),
            "http://localhost:8080/api/collections/users/1/cards"
        );
        assert_eq!(
            collection.user_card(1, 42).unwrap().as_str(),
            "http://localhost:8080/api/collections/users/1/cards/42"
        );
        assert_eq!(
            collection.card_ids_url(1).unwrap().as_str(),
            "http://localhost:8080/api/collections/users/1/card-ids"
        );

        let catalog = HttpCatalog::new(
            Client::new(),
            Url::parse("http://localhost:8080/api/catalog/").unwrap(),
        );
        assert_eq!(
            catalog.set_cards_url("SV01").unwrap().as_str(),
            "http://localhost:8080/api/catalog/sets/SV01/cards"
        );
    }

    fn response(status: u16, url: &str) -> Response {
        let response = http::Response::builder()
            .status(status)
            .url(Url::parse(url).unwrap())
            .body("[]")
            .unwrap();
        Response::from(response)
    }

    #[test]
    fn non_success_status_becomes_status_error() {
        let url = "http://localhost:8080/api/collections/users/1/cards";
        match check_status(response(503, url)) {
            Err(ApiError::Status { status, url: failed }) => {
                assert_eq!(status, 503);
                assert_eq!(failed, url);
            }
            other => panic!("expected a status error, got {:?}", other.map(|r| r.status())),
        }
        assert!(matches!(
            check_status(response(404, url)),
            Err(ApiError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn success_status_passes_response_through() {
        let checked = check_status(response(201, "http://localhost:8080/api/collections/users/1/cards"));
        assert_eq!(checked.unwrap().status().as_u16(), 201);
    }
}
