use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    BulkUpdateRequest, BulkUpdateResponse, Language, LanguagesResponse, Translation,
    TranslationFields, TranslationId, TranslationPage, TranslationQuery,
};

#[async_trait]
pub trait TranslationApi: Send + Sync {
    /// Read one page of the filtered translation list.
    async fn list_translations(&self, query: &TranslationQuery)
        -> Result<TranslationPage, ApiError>;

    async fn list_languages(&self) -> Result<Vec<Language>, ApiError>;

    /// Overwrite the mutable fields of one translation.
    async fn update_translation(
        &self,
        id: TranslationId,
        fields: &TranslationFields,
    ) -> Result<Translation, ApiError>;

    /// One call for the whole batch; the server partitions ids itself.
    async fn bulk_update_translations(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, ApiError>;
}

#[async_trait]
impl<T: TranslationApi + ?Sized> TranslationApi for Arc<T> {
    async fn list_translations(
        &self,
        query: &TranslationQuery,
    ) -> Result<TranslationPage, ApiError> {
        (**self).list_translations(query).await
    }

    async fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        (**self).list_languages().await
    }

    async fn update_translation(
        &self,
        id: TranslationId,
        fields: &TranslationFields,
    ) -> Result<Translation, ApiError> {
        (**self).update_translation(id, fields).await
    }

    async fn bulk_update_translations(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, ApiError> {
        (**self).bulk_update_translations(request).await
    }
}

/// Error body returned by the backend on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpTranslationApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTranslationApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            debug!("Review API returned {}: {}", status, message);
            return Err(ApiError::new(Some(status.as_u16()), message));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::new(None, format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl TranslationApi for HttpTranslationApi {
    async fn list_translations(
        &self,
        query: &TranslationQuery,
    ) -> Result<TranslationPage, ApiError> {
        let request = self
            .request(Method::GET, "/translations/list")
            .query(&query.to_params());
        self.send(request).await
    }

    async fn list_languages(&self) -> Result<Vec<Language>, ApiError> {
        let response: LanguagesResponse = self
            .send(self.request(Method::GET, "/languages/list"))
            .await?;
        Ok(response.languages)
    }

    async fn update_translation(
        &self,
        id: TranslationId,
        fields: &TranslationFields,
    ) -> Result<Translation, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/translations/{}", id))
            .json(fields);
        self.send(request).await
    }

    async fn bulk_update_translations(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, ApiError> {
        let builder = self
            .request(Method::POST, "/translations/bulk_update")
            .json(request);
        self.send(builder).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{BulkAction, TranslationStatus};
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(server: &MockServer, token: Option<&str>) -> Config {
        Config {
            api_url: format!("{}/api/", server.uri()),
            api_token: token.map(str::to_string),
            ..Config::default()
        }
    }

    fn translation_json(id: i64, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "source_text": "good morning",
            "target_text": "bonjour",
            "source_language": {"id": 1, "name": "English", "iso_code": "en"},
            "target_language": {"id": 2, "name": "French", "iso_code": "fr"},
            "status": status,
            "domain": null
        })
    }

    // ==================== Read Endpoint Tests ====================

    #[tokio::test]
    async fn test_list_translations_sends_filters_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/translations/list"))
            .and(query_param("page", "1"))
            .and(query_param("limit", "25"))
            .and(query_param("status", "pending"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [translation_json(1, "pending")],
                "total": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpTranslationApi::new(&test_config(&server, Some("secret"))).unwrap();
        let query = TranslationQuery {
            page: 0,
            limit: 25,
            status: Some("pending".to_string()),
            ..Default::default()
        };
        let page = api.list_translations(&query).await.unwrap();

        assert_eq!(page.translations.len(), 1);
        assert_eq!(page.total, Some(1));
    }

    #[tokio::test]
    async fn test_list_languages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/languages/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "languages": [
                    {"id": 1, "name": "English", "iso_code": "en"},
                    {"id": 3, "name": "Ghomala", "iso_code": "bbj", "region": "West"}
                ]
            })))
            .mount(&server)
            .await;

        let api = HttpTranslationApi::new(&test_config(&server, None)).unwrap();
        let languages = api.list_languages().await.unwrap();

        assert_eq!(languages.len(), 2);
        assert_eq!(languages[1].iso_code, "bbj");
    }

    // ==================== Mutation Endpoint Tests ====================

    #[tokio::test]
    async fn test_update_translation_puts_full_field_set() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/translations/42"))
            .and(body_json(serde_json::json!({
                "source_text": "good morning",
                "target_text": "bonjour",
                "source_lang_id": 1,
                "target_lang_id": 2,
                "status": "approved",
                "domain": null
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(translation_json(42, "approved")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpTranslationApi::new(&test_config(&server, None)).unwrap();
        let fields = TranslationFields {
            source_text: "good morning".to_string(),
            target_text: "bonjour".to_string(),
            source_lang_id: 1,
            target_lang_id: 2,
            status: TranslationStatus::Approved,
            domain: None,
        };
        let updated = api.update_translation(42, &fields).await.unwrap();

        assert_eq!(updated.status, TranslationStatus::Approved);
    }

    #[tokio::test]
    async fn test_bulk_update_returns_partition() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/translations/bulk_update"))
            .and(body_json(serde_json::json!({
                "translation_ids": [1, 2, 3],
                "action": "approve"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": [1, 2],
                "failed": [3]
            })))
            .mount(&server)
            .await;

        let api = HttpTranslationApi::new(&test_config(&server, None)).unwrap();
        let response = api
            .bulk_update_translations(&BulkUpdateRequest {
                translation_ids: vec![1, 2, 3],
                action: BulkAction::Approve,
                reviewer_id: None,
            })
            .await
            .unwrap();

        assert_eq!(response.success, vec![1, 2]);
        assert_eq!(response.failed, vec![3]);
    }

    // ==================== Error Mapping Tests ====================

    #[tokio::test]
    async fn test_error_body_message_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/translations/9"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": "Translation already exists."
            })))
            .mount(&server)
            .await;

        let api = HttpTranslationApi::new(&test_config(&server, None)).unwrap();
        let fields = TranslationFields {
            source_text: "a".to_string(),
            target_text: "b".to_string(),
            source_lang_id: 1,
            target_lang_id: 2,
            status: TranslationStatus::Pending,
            domain: None,
        };
        let err = api.update_translation(9, &fields).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ClientError);
        assert_eq!(err.status, Some(409));
        assert_eq!(err.message, "Translation already exists.");
    }

    #[tokio::test]
    async fn test_status_codes_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/languages/list"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&server)
            .await;

        let api = HttpTranslationApi::new(&test_config(&server, None)).unwrap();
        let err = api.list_languages().await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "expired");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let config = Config {
            api_url: "http://127.0.0.1:1/api".to_string(),
            ..Config::default()
        };
        let api = HttpTranslationApi::new(&config).unwrap();
        let err = api.list_languages().await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_body_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/languages/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let api = HttpTranslationApi::new(&test_config(&server, None)).unwrap();
        let err = api.list_languages().await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unknown);
    }
}
