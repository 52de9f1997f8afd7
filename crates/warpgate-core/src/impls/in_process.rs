//! InProcessTransport - 同じプロセスの Host を直接呼ぶ
//!
//! encode → dispatch → encode の経路はネットワーク版と同じで、
//! ソケットだけを省きます。ホスト無しでテストを回すときや、
//! ローカル実行用のゲート（`Gate::local`）に使います。

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::host::Host;
use crate::domain::descriptor::TaskDescriptor;
use crate::domain::errors::TransportError;
use crate::ports::Transport;

pub struct InProcessTransport {
    host: Arc<Host>,
}

impl InProcessTransport {
    pub fn new(host: Arc<Host>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Transport for InProcessTransport {
    async fn exchange(
        &self,
        _endpoint: &str,
        descriptor: &TaskDescriptor,
    ) -> Result<String, TransportError> {
        self.host
            .serve(descriptor.clone())
            .await
            .map_err(|e| TransportError::MalformedReply(e.to_string()))
    }
}
