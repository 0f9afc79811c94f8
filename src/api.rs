use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tracing::debug;

use crate::{
    action::Action,
    chain_client::{
        nodeos_http_client::NodeosHttpClient, AccountInfo, ChainClient, TableRows,
        TableRowsRequest,
    },
    error::Result,
    keys::KeyBag,
    name::Name,
    primitives::{Checksum256, TimePointSec},
    transaction::{PackedTransaction, Transaction, TxId, DEFAULT_EXPIRATION},
};

/// Chain client paired with the key bag that signs everything it pushes.
pub struct Api<C> {
    client: C,
    signer: KeyBag,
    expire_in: Duration,
    /// Ids pushed through this Api that have not expired yet.
    submitted: Mutex<HashMap<TxId, TimePointSec>>,
}

impl Api<NodeosHttpClient> {
    /// Api for the node at `endpoint` with an empty key bag
    pub fn connect(endpoint: &str) -> Result<Self> {
        Ok(Api::new(NodeosHttpClient::new(endpoint)?))
    }
}

impl<C: ChainClient> Api<C> {
    pub fn new(client: C) -> Self {
        Api::with_signer(client, KeyBag::new())
    }

    pub fn with_signer(client: C, signer: KeyBag) -> Self {
        Api {
            client,
            signer,
            expire_in: DEFAULT_EXPIRATION,
            submitted: Mutex::new(HashMap::new()),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn signer(&self) -> &KeyBag {
        &self.signer
    }

    /// Builds, signs and pushes one transaction holding `actions`.
    ///
    /// The header references the current head block and expires 30 seconds
    /// after it. Identical action lists pushed within the same block would
    /// produce the same transaction id, so the expiration is moved forward
    /// a second at a time until the id is new for this `Api`.
    pub async fn push_actions(&self, actions: Vec<Action>) -> Result<TxId> {
        let info = self.client.get_info().await?;
        let mut trx = Transaction::new(
            actions,
            &info.head_block_id,
            info.head_block_time,
            self.expire_in,
        );
        {
            let mut submitted = self
                .submitted
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let head = info.head_block_time.to_sec();
            submitted.retain(|_, expiration| *expiration > head);
            while submitted.contains_key(&trx.id()) {
                trx.expiration = trx.expiration + Duration::from_secs(1);
            }
        }

        let available = self.signer.available_keys()?;
        let required = self
            .client
            .get_required_keys(&trx, &available)
            .await?;
        let signatures = self
            .signer
            .sign(&trx.signing_digest(&info.chain_id), &required)?;
        let packed = PackedTransaction::new(&trx, signatures);
        let names: Vec<String> = trx
            .actions
            .iter()
            .map(|a| format!("{}::{}", a.account, a.name))
            .collect();
        debug!(id = %packed.id(), actions = ?names, "pushing transaction");
        let pushed = self.client.push_transaction(&packed).await?;

        self.submitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pushed.transaction_id.clone(), trx.expiration);
        Ok(pushed.transaction_id)
    }

    pub async fn account(&self, account: Name) -> Result<AccountInfo> {
        Ok(self.client.get_account(account).await?)
    }

    pub async fn code_hash(&self, account: Name) -> Result<Checksum256> {
        Ok(self.client.get_code_hash(account).await?)
    }

    pub async fn table_rows(&self, request: &TableRowsRequest) -> Result<TableRows> {
        Ok(self.client.get_table_rows(request).await?)
    }
}
