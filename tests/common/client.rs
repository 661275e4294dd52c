//! Thin HTTP client wrapper for the e2e suites.

use reqwest::Response;
use serde_json::Value as JsonValue;

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn add_to_shelf(&self, user_id: &str, body: JsonValue) -> Response {
        self.client
            .post(format!("{}/v1/shelf/{}", self.base_url, user_id))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_shelf(&self, user_id: &str) -> Response {
        self.client
            .get(format!("{}/v1/shelf/{}", self.base_url, user_id))
            .send()
            .await
            .unwrap()
    }

    pub async fn update_entry(&self, user_id: &str, entry_id: &str, body: JsonValue) -> Response {
        self.client
            .put(format!(
                "{}/v1/shelf/{}/{}",
                self.base_url, user_id, entry_id
            ))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_details(&self, kind: &str, entity_id: &str) -> Response {
        self.client
            .get(format!(
                "{}/v1/catalog/{}/{}/details",
                self.base_url, kind, entity_id
            ))
            .send()
            .await
            .unwrap()
    }

    pub async fn refresh(&self, kind: &str, entity_id: &str) -> Response {
        self.client
            .post(format!(
                "{}/v1/catalog/{}/{}/refresh",
                self.base_url, kind, entity_id
            ))
            .send()
            .await
            .unwrap()
    }

    /// Shelve an entity and return its catalog id.
    pub async fn shelve_and_get_entity_id(&self, user_id: &str, body: JsonValue) -> String {
        let response = self.add_to_shelf(user_id, body).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let created: JsonValue = response.json().await.unwrap();
        created["entity"]["id"].as_str().unwrap().to_string()
    }
}
