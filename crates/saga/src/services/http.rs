//! HTTP client for the hotel service.

use async_trait::async_trait;
use common::{
    AvailabilityConfirmation, ConfirmAvailability, HotelId, RequestId, RoomId, RoomSummary,
    RoomType, correlation, wire::CORRELATION_ID_HEADER,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::SagaError;
use crate::services::room::RoomService;

/// Error body returned by the hotel service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Room service that calls the hotel service over HTTP.
///
/// The correlation ID of the current request, if any, is forwarded on every
/// call. Transport failures and 5xx responses surface as
/// `ServiceUnavailable`; retries and timeouts are left to a wrapping
/// [`ResilientRoomService`](crate::services::ResilientRoomService).
#[derive(Debug, Clone)]
pub struct HttpRoomService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRoomService {
    /// Creates a client for the hotel service at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, SagaError> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            SagaError::ServiceUnavailable(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self::with_client(http, base_url))
    }

    /// Creates a client reusing an existing reqwest client.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SagaError> {
        let request = match correlation::current() {
            Some(id) => request.header(CORRELATION_ID_HEADER, id.as_str()),
            None => request,
        };
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "hotel service request failed");
            SagaError::ServiceUnavailable(format!("hotel service unreachable: {e}"))
        })?;
        Self::check_status(response).await
    }

    /// Maps non-success statuses onto the saga error taxonomy.
    async fn check_status(response: Response) -> Result<Response, SagaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("Unknown").to_string(),
        };
        Err(match status {
            StatusCode::NOT_FOUND => SagaError::NotFound(message),
            StatusCode::CONFLICT => SagaError::ConcurrencyConflict(message),
            StatusCode::FORBIDDEN => SagaError::Forbidden(message),
            s if s.is_server_error() => SagaError::ServiceUnavailable(message),
            _ => SagaError::Validation(message),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SagaError> {
        response.json().await.map_err(|e| {
            SagaError::ServiceUnavailable(format!("invalid hotel service response: {e}"))
        })
    }
}

#[async_trait]
impl RoomService for HttpRoomService {
    async fn get_room(&self, room_id: RoomId) -> Result<RoomSummary, SagaError> {
        let url = self.api_url(&format!("/rooms/{room_id}"));
        let response = self.send(self.http.get(&url)).await?;
        Self::decode(response).await
    }

    async fn recommend(&self) -> Result<Vec<RoomSummary>, SagaError> {
        let url = self.api_url("/rooms/recommend");
        let response = self.send(self.http.get(&url)).await?;
        Self::decode(response).await
    }

    async fn select_room(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
    ) -> Result<RoomSummary, SagaError> {
        let url = self.api_url("/rooms/select");
        let request = self.http.get(&url).query(&[
            ("hotel_id", hotel_id.to_string()),
            ("room_type", room_type.as_str().to_string()),
        ]);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    async fn confirm(
        &self,
        room_id: RoomId,
        request: ConfirmAvailability,
    ) -> Result<AvailabilityConfirmation, SagaError> {
        let url = self.api_url(&format!("/rooms/{room_id}/confirm-availability"));
        let response = self.send(self.http.post(&url).json(&request)).await?;
        Self::decode(response).await
    }

    async fn release(&self, room_id: RoomId, request_id: &RequestId) -> Result<(), SagaError> {
        let url = self.api_url(&format!("/rooms/{room_id}/release"));
        let request = self
            .http
            .post(&url)
            .query(&[("request_id", request_id.as_str())]);
        self.send(request).await?;
        Ok(())
    }
}
