//! HttpTransport - reqwest によるクライアント側の往復

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::descriptor::TaskDescriptor;
use crate::domain::errors::TransportError;
use crate::ports::Transport;

/// HttpTransport は descriptor を JSON で POST し、本文を text として返す
///
/// `timeout` は既定で無し。設定した場合は `TransportError::Timeout` になる。
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

/// `localhost:8080/warpunit-insider` のように scheme が無ければ http を補う
pub fn normalize_endpoint(endpoint: &str) -> Result<reqwest::Url, TransportError> {
    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    };
    reqwest::Url::parse(&candidate).map_err(|_| TransportError::InvalidEndpoint(endpoint.to_string()))
}

fn classify(endpoint: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(endpoint.to_string())
    } else {
        TransportError::Connect {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(
        &self,
        endpoint: &str,
        descriptor: &TaskDescriptor,
    ) -> Result<String, TransportError> {
        let url = normalize_endpoint(endpoint)?;
        debug!(%url, request_id = ?descriptor.request_id, "posting descriptor");

        let response = self
            .client
            .post(url)
            .json(descriptor)
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify(endpoint, e))?;
        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:8080/warpunit-insider", "http://localhost:8080/warpunit-insider")]
    #[case("localhost:8080/warpunit-insider", "http://localhost:8080/warpunit-insider")]
    #[case("https://qa-host/warpunit-insider", "https://qa-host/warpunit-insider")]
    fn endpoints_are_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_endpoint(raw).unwrap().as_str(), expected);
    }

    #[test]
    fn garbage_endpoint_is_rejected() {
        let err = normalize_endpoint("http://[::1").unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint(_)));
    }

    fn descriptor() -> TaskDescriptor {
        TaskDescriptor {
            operation_name: "add".into(),
            target_identity: "Adder".into(),
            arguments_payload: String::new(),
            artifacts: Default::default(),
            interface_artifact: None,
            request_id: None,
        }
    }

    #[tokio::test]
    async fn silent_host_times_out() {
        // 接続は受けるが何も返さない
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let transport = HttpTransport::new(Some(Duration::from_millis(50))).unwrap();
        let err = transport
            .exchange(&format!("http://{addr}/warpunit-insider"), &descriptor())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)), "got {err:?}");
        silent.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        // 空いているポートを取ってすぐ閉じる
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Some(Duration::from_secs(5))).unwrap();
        let err = transport
            .exchange(&format!("http://{addr}/warpunit-insider"), &descriptor())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
