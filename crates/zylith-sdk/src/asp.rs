//! ASP REST client.
//!
//! A thin typed wrapper over the wire contract in `zylith_core::schema`.
//! Non-2xx responses are decoded into the `{error, message}` shape and
//! surfaced as [`SdkError::Asp`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use zylith_core::schema::ops::{
    BurnRequest, BurnResponse, DepositRequest, DepositResponse, ErrorBody, MintRequest,
    MintResponse, NullifierStatusResponse, StatusResponse, SwapRequest, SwapResponse,
    SyncCommitmentsRequest, SyncCommitmentsResponse, TreePathResponse, TreeRootResponse,
    WithdrawRequest, WithdrawResponse,
};

use crate::error::SdkError;

/// HTTP client for one ASP endpoint.
#[derive(Debug, Clone)]
pub struct AspClient {
    http: reqwest::Client,
    base_url: String,
}

impl AspClient {
    /// Create a client for `base_url` (no trailing slash required).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, SdkError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body: ErrorBody = response.json().await.unwrap_or(ErrorBody {
            error: "unknown".into(),
            message: format!("http status {status}"),
        });
        Err(SdkError::Asp {
            status: status.as_u16(),
            kind: body.error,
            message: body.message,
        })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, SdkError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, SdkError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `POST /deposit`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn deposit(&self, req: &DepositRequest) -> Result<DepositResponse, SdkError> {
        self.post("/deposit", req).await
    }

    /// `POST /withdraw`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn withdraw(&self, req: &WithdrawRequest) -> Result<WithdrawResponse, SdkError> {
        self.post("/withdraw", req).await
    }

    /// `POST /swap`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn swap(&self, req: &SwapRequest) -> Result<SwapResponse, SdkError> {
        self.post("/swap", req).await
    }

    /// `POST /mint`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn mint(&self, req: &MintRequest) -> Result<MintResponse, SdkError> {
        self.post("/mint", req).await
    }

    /// `POST /burn`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn burn(&self, req: &BurnRequest) -> Result<BurnResponse, SdkError> {
        self.post("/burn", req).await
    }

    /// `GET /tree/root`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn tree_root(&self) -> Result<TreeRootResponse, SdkError> {
        self.get("/tree/root").await
    }

    /// `GET /tree/path/{leaf_index}`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn tree_path(&self, leaf_index: u64) -> Result<TreePathResponse, SdkError> {
        self.get(&format!("/tree/path/{leaf_index}")).await
    }

    /// `GET /nullifier/{hash}`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn nullifier(&self, hash: &str) -> Result<NullifierStatusResponse, SdkError> {
        self.get(&format!("/nullifier/{hash}")).await
    }

    /// `GET /status`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn status(&self) -> Result<StatusResponse, SdkError> {
        self.get("/status").await
    }

    /// `POST /sync-commitments`.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn sync_commitments(
        &self,
        req: &SyncCommitmentsRequest,
    ) -> Result<SyncCommitmentsResponse, SdkError> {
        self.post("/sync-commitments", req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_normalized() {
        let client = AspClient::new("http://localhost:8787///");
        assert_eq!(client.base_url, "http://localhost:8787");
    }
}
