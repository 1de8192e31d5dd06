//! HTTP client for the ISC node REST API.
//!
//! Only the calls the bridge serves are implemented:
//! - `GET  /v1/node/info`
//! - `GET  /v1/chains/{chain}/core/accounts/account/{address}/balance`
//! - `GET  /v1/chains/{chain}/receipts/{request}`
//! - `POST /v1/chains/{chain}/estimategas-onledger`
//! - `POST /v1/chains/{chain}/estimategas-offledger`

mod responses;

pub use responses::{
    AssetsResponse, BaseToken, CallTarget, GasBurned, L1Params, NativeTokenBalance, NodeError,
    Protocol, ReceiptRequest, ReceiptResponse, WaspInfo,
};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::metadata::{EncodingError, Request};
use crate::types::Bech32Address;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors talking to the node
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, TLS or body read failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Node answered with a non-success status
    #[error("node returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Node URL cannot be used as a base
    #[error("invalid node url: {0}")]
    InvalidUrl(String),
    /// Response body is not what the endpoint documents
    #[error("unexpected response: {0}")]
    Decode(String),
    /// Request could not be encoded for the node
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Client for one ISC node.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct Api {
    client: reqwest::Client,
    url: Url,
}

impl Api {
    /// Client for the node at `url` with [`DEFAULT_TIMEOUT`]
    pub fn new(url: Url) -> Result<Self, ApiError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Client with a custom per-request timeout
    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self, ApiError> {
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("isc-bridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url })
    }

    /// Node base URL
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Node info and L1 parameters
    pub async fn info(&self) -> Result<WaspInfo, ApiError> {
        self.get("v1/node/info").await
    }

    /// L2 balance of the L1 `address` on `chain`
    pub async fn get_balance(
        &self,
        chain: &str,
        address: &Bech32Address,
    ) -> Result<AssetsResponse, ApiError> {
        self.get(&format!(
            "v1/chains/{chain}/core/accounts/account/{address}/balance"
        ))
        .await
    }

    /// Receipt of a processed request
    pub async fn get_receipt(
        &self,
        chain: &str,
        request_id: &str,
    ) -> Result<ReceiptResponse, ApiError> {
        self.get(&format!("v1/chains/{chain}/receipts/{request_id}"))
            .await
    }

    /// Simulate an on-ledger request given the hex of its serialized output
    pub async fn estimate_gas_on_ledger(
        &self,
        chain: &str,
        output_bytes: &str,
    ) -> Result<ReceiptResponse, ApiError> {
        self.post(
            &format!("v1/chains/{chain}/estimategas-onledger"),
            json!({ "outputBytes": output_bytes }),
        )
        .await
    }

    /// Simulate an off-ledger request
    pub async fn estimate_gas_off_ledger(
        &self,
        chain: &str,
        request: &Request,
    ) -> Result<ReceiptResponse, ApiError> {
        let payload = request.encode()?;
        self.post(
            &format!("v1/chains/{chain}/estimategas-offledger"),
            json!({ "requestBytes": payload.to_hex() }),
        )
        .await
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{path}"));
        url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(%url, "POST");
        let response = self.client.post(url).json(&body).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    pub(crate) fn info_json() -> Value {
        json!({
            "peeringUrl": "0.0.0.0:4000",
            "publicKey": "0x52ab",
            "version": "1.0.3",
            "l1Params": {
                "maxPayloadSize": 32_604,
                "protocol": {
                    "rentStructure": { "vByteCost": 100, "vByteFactorData": 1, "vByteFactorKey": 10 },
                    "minPowScore": 0,
                    "tokenSupply": "1813620509061365",
                    "networkName": "testnet-1",
                    "belowMaxDepth": 15,
                    "version": 2,
                    "bech32Hrp": "rms"
                },
                "baseToken": {
                    "unit": "SMR",
                    "decimals": 6,
                    "name": "Shimmer",
                    "tickerSymbol": "SMR",
                    "subunit": "glow",
                    "useMetricPrefix": false
                }
            }
        })
    }

    fn json_response(body: &Value) -> String {
        let s = body.to_string();
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{}",
            s.len(),
            s
        )
    }

    fn not_found() -> String {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found".to_string()
    }

    fn route(request: &str) -> String {
        let first_line = request.lines().next().unwrap_or("");
        let mut parts = first_line.split_whitespace();
        let method = parts.next().unwrap_or("GET");
        let path = parts.next().unwrap_or("/");

        match (method, path) {
            ("GET", "/v1/node/info") => json_response(&info_json()),
            ("GET", p) if p.ends_with("/balance") => {
                json_response(&json!({ "baseTokens": "1304600", "nativeTokens": [] }))
            }
            ("GET", p) if p.contains("/receipts/") => json_response(&json!({
                "gasBudget": "10000",
                "gasBurned": "5200",
                "gasFeeCharged": "520",
                "storageDepositCharged": "0",
                "blockIndex": 42,
                "requestIndex": 1,
                "gasBurnLog": [{ "code": 1, "gasBurned": 5200 }]
            })),
            ("POST", p) if p.ends_with("/estimategas-offledger") => {
                let echoed = request.contains("\"requestBytes\":\"0x");
                json_response(&json!({
                    "gasBurned": if echoed { "100" } else { "0" },
                    "gasFeeCharged": "100"
                }))
            }
            _ => not_found(),
        }
    }

    // Headers plus as much body as Content-Length announces
    fn is_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        buf.len() >= header_end + 4 + content_length
    }

    /// Serve canned node responses on a random local port
    pub(crate) async fn spawn_stub_node() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0; 4096];
                    while !is_complete(&buf) {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let _ = socket.write_all(route(&request).as_bytes()).await;
                });
            }
        });

        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    async fn test_info() {
        let api = Api::new(spawn_stub_node().await).unwrap();
        let info = api.info().await.unwrap();

        assert_eq!(info.l1_params.protocol.bech32_hrp, "rms");
        assert_eq!(info.l1_params.protocol.rent_structure.v_byte_cost, 100);
        assert_eq!(info.l1_params.base_token.decimals, 6);
    }

    #[tokio::test]
    async fn test_balance_and_receipt() {
        let api = Api::new(spawn_stub_node().await).unwrap();
        let address: Bech32Address =
            "rms1ppp00k5mmd2m8my8ukkp58nd3rskw6rx8l09aj35984k74uuc5u2cywn3ex"
                .parse()
                .unwrap();

        let balance = api.get_balance("chain", &address).await.unwrap();
        assert_eq!(balance.base_tokens().unwrap(), 1_304_600);

        let receipt = api.get_receipt("chain", "0x01").await.unwrap();
        assert_eq!(receipt.block_index, 42);
        assert_eq!(receipt.gas_fee_charged().unwrap(), 520);
        assert!(!receipt.is_error());
    }

    #[tokio::test]
    async fn test_estimate_off_ledger_sends_payload_hex() {
        use crate::metadata::core_contracts::{accounts, ACCOUNTS};

        let api = Api::new(spawn_stub_node().await).unwrap();
        let request = Request::builder(ACCOUNTS, accounts::WITHDRAW)
            .gas_budget(10_000)
            .build()
            .unwrap();

        let receipt = api.estimate_gas_off_ledger("chain", &request).await.unwrap();
        assert_eq!(receipt.gas_burned, "100");
    }

    #[tokio::test]
    async fn test_status_error() {
        let api = Api::new(spawn_stub_node().await).unwrap();
        let err = api
            .estimate_gas_on_ledger("chain", "0x00")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = Api::new(Url::parse("https://node.example/wasp/api/").unwrap()).unwrap();
        assert_eq!(
            api.endpoint("v1/node/info").as_str(),
            "https://node.example/wasp/api/v1/node/info"
        );
    }
}
