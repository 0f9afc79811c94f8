use crate::{
    chain_client::{
        schemas::{
            AccountInfo, AccountRequest, ChainInfo, CodeHash, PushedTransaction, RequiredKeys,
            RequiredKeysRequest, TableRows, TableRowsRequest,
        },
        ChainClient, ChainClientError, ChainClientResult, ChainRejection,
    },
    keys::PublicKey,
    name::Name,
    primitives::Checksum256,
    transaction::{PackedTransaction, Transaction},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::trace;
use url::Url;

/// Default endpoint of a local development node.
pub const LOCAL_ENDPOINT: &str = "http://localhost:8888";

/// [`ChainClient`] talking to the `chain_api_plugin` of a nodeos instance.
#[derive(Debug, Clone)]
pub struct NodeosHttpClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl NodeosHttpClient {
    pub fn new(endpoint: &str) -> ChainClientResult<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| ChainClientError::Transport(Box::new(e)))?;
        Ok(NodeosHttpClient {
            endpoint,
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post_endpoint<B, T>(&self, ext: &str, body: &B) -> ChainClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .endpoint
            .join(ext)
            .map_err(|e| ChainClientError::Transport(Box::new(e)))?;
        trace!(%url, "POST");
        let res = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChainClientError::Transport(Box::new(e)))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ChainClientError::Transport(Box::new(e)))?;
        if !status.is_success() {
            return Err(ChainClientError::Rejected(ChainRejection::from_body(
                status.as_u16(),
                &text,
            )));
        }
        serde_json::from_str(&text).map_err(|e| ChainClientError::Malformed(Box::new(e)))
    }
}

#[async_trait]
impl ChainClient for NodeosHttpClient {
    async fn get_info(&self) -> ChainClientResult<ChainInfo> {
        self.post_endpoint("/v1/chain/get_info", &serde_json::json!({}))
            .await
    }

    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> ChainClientResult<Vec<PublicKey>> {
        let body = RequiredKeysRequest {
            transaction,
            available_keys,
        };
        let res: RequiredKeys = self
            .post_endpoint("/v1/chain/get_required_keys", &body)
            .await?;
        Ok(res.required_keys)
    }

    async fn push_transaction(
        &self,
        transaction: &PackedTransaction,
    ) -> ChainClientResult<PushedTransaction> {
        self.post_endpoint("/v1/chain/push_transaction", transaction)
            .await
    }

    async fn get_account(&self, account: Name) -> ChainClientResult<AccountInfo> {
        let body = AccountRequest {
            account_name: account,
        };
        self.post_endpoint("/v1/chain/get_account", &body).await
    }

    async fn get_code_hash(&self, account: Name) -> ChainClientResult<Checksum256> {
        let body = AccountRequest {
            account_name: account,
        };
        let res: CodeHash = self.post_endpoint("/v1/chain/get_code_hash", &body).await?;
        Ok(res.code_hash)
    }

    async fn get_table_rows(&self, request: &TableRowsRequest) -> ChainClientResult<TableRows> {
        self.post_endpoint("/v1/chain/get_table_rows", request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_endpoint() {
        assert!(matches!(
            NodeosHttpClient::new("not a url"),
            Err(ChainClientError::Transport(_))
        ));
    }

    #[test]
    fn api_paths_resolve_from_host_root() {
        let client = NodeosHttpClient::new("http://localhost:8888/ignored/").unwrap();
        let url = client.endpoint().join("/v1/chain/get_info").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8888/v1/chain/get_info");
    }

    #[ignore]
    #[tokio::test]
    async fn get_info_from_local_node() {
        let client = NodeosHttpClient::new(LOCAL_ENDPOINT).unwrap();
        let info = client.get_info().await.unwrap();
        assert!(info.head_block_num > 0);
    }

    #[ignore]
    #[tokio::test]
    async fn eosio_account_exists_on_local_node() {
        let client = NodeosHttpClient::new(LOCAL_ENDPOINT).unwrap();
        let account = client.get_account(Name::EOSIO).await.unwrap();
        assert!(account.permission(Name::ACTIVE).is_some());
    }
}
