use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, RwLock},
    time::Duration,
};

use crate::{
    action::{Action, PermissionLevel},
    chain_client::{
        AccountInfo, ChainClient, ChainClientError, ChainClientResult, ChainInfo, ChainRejection,
        Permission, PushedTransaction, TableRows, TableRowsRequest,
    },
    keys::PublicKey,
    name::Name,
    primitives::{Checksum256, TimePoint},
    serialization::{EosDeserialize, SerializationError},
    system::{Authority, NewAccount, SetAbi, SetCode, UpdateAuth},
    transaction::{ref_block_prefix, PackedTransaction, Transaction, TxId},
};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
mod tests;

const BLOCK_INTERVAL: Duration = Duration::from_millis(500);
const MAX_TRX_LIFETIME: Duration = Duration::from_secs(60 * 60);
const MAX_AUTHORITY_DEPTH: usize = 6;
const TAPOS_WINDOW: usize = 0x10000;
// 2020-01-01T00:00:00.000
const GENESIS_TIME_MICROS: i64 = 1_577_836_800_000_000;

// nodeos exception codes
const TRANSACTION_EXCEPTION: i64 = 3_040_000;
const EXPIRED_TX_EXCEPTION: i64 = 3_040_005;
const TX_EXP_TOO_FAR_EXCEPTION: i64 = 3_040_006;
const INVALID_REF_BLOCK_EXCEPTION: i64 = 3_040_007;
const TX_DUPLICATE: i64 = 3_040_008;
const ACCOUNT_NAME_EXISTS_EXCEPTION: i64 = 3_050_001;
const ASSERT_MESSAGE_EXCEPTION: i64 = 3_050_003;
const ACTION_VALIDATE_EXCEPTION: i64 = 3_050_004;
const ACCOUNT_QUERY_EXCEPTION: i64 = 3_060_002;
const UNSATISFIED_AUTHORIZATION: i64 = 3_090_003;
const MISSING_AUTH_EXCEPTION: i64 = 3_090_004;

#[derive(Debug, Error)]
enum TestChainError {
    #[error("Mutex lock error: {0:?}")]
    Mutex(String),
}

fn mutex_error(message: String) -> ChainClientError {
    ChainClientError::Transport(Box::new(TestChainError::Mutex(message)))
}

/// Rejection a contract raises through `eosio::check`.
pub fn assert_failure(message: &str) -> ChainRejection {
    ChainRejection::new(
        ASSERT_MESSAGE_EXCEPTION,
        "eosio_assert_message_exception",
        "eosio_assert_message assertion failure",
        format!("assertion failure with message: {message}"),
    )
}

/// Fails unless `account` is one of the actors authorizing `action`.
pub fn require_auth(action: &Action, account: Name) -> Result<(), ChainRejection> {
    if action.authorization.iter().any(|level| level.actor == account) {
        Ok(())
    } else {
        Err(ChainRejection::new(
            MISSING_AUTH_EXCEPTION,
            "missing_auth_exception",
            "Missing required authority",
            format!("missing authority of {account}"),
        ))
    }
}

fn invalid_payload(action: &Action, err: SerializationError) -> ChainRejection {
    ChainRejection::new(
        ACTION_VALIDATE_EXCEPTION,
        "action_validate_exception",
        "Action validate exception",
        format!("could not unpack {}::{}: {err}", action.account, action.name),
    )
}

fn missing_account(account: Name) -> ChainRejection {
    ChainRejection::new(
        ACTION_VALIDATE_EXCEPTION,
        "action_validate_exception",
        "Action validate exception",
        format!("account '{account}' does not exist"),
    )
}

/// Contract logic run by the in-memory chain for actions sent to the account
/// it is registered on.
pub trait ContractBehavior: Send + Sync {
    fn apply(&self, action: &Action, context: &mut ContractContext<'_>)
        -> Result<(), ChainRejection>;
}

impl<F> ContractBehavior for F
where
    F: Fn(&Action, &mut ContractContext<'_>) -> Result<(), ChainRejection> + Send + Sync,
{
    fn apply(
        &self,
        action: &Action,
        context: &mut ContractContext<'_>,
    ) -> Result<(), ChainRejection> {
        self(action, context)
    }
}

/// View of chain state handed to a [`ContractBehavior`]. Writes only become
/// visible if the whole transaction succeeds.
pub struct ContractContext<'a> {
    receiver: Name,
    state: &'a mut ChainState,
}

impl ContractContext<'_> {
    pub fn receiver(&self) -> Name {
        self.receiver
    }

    pub fn block_time(&self) -> TimePoint {
        self.state.head_block_time
    }

    pub fn account_exists(&self, account: Name) -> bool {
        self.state.accounts.contains_key(&account)
    }

    pub fn rows(&self, scope: &str, table: Name) -> &[Value] {
        self.state
            .tables
            .get(&(self.receiver, scope.to_string(), table))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rows of `table` in `scope`, owned by the receiving contract
    pub fn rows_mut(&mut self, scope: &str, table: Name) -> &mut Vec<Value> {
        self.state
            .tables
            .entry((self.receiver, scope.to_string(), table))
            .or_default()
    }
}

/// Action applied by the in-memory chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedAction {
    pub trx_id: TxId,
    pub block_num: u32,
    pub action: Action,
}

#[derive(Debug, Clone)]
struct AccountState {
    permissions: Vec<Permission>,
    code: Vec<u8>,
    abi: Vec<u8>,
}

impl AccountState {
    fn new(owner: Authority, active: Authority) -> Self {
        AccountState {
            permissions: vec![
                Permission {
                    perm_name: Name::OWNER,
                    parent: Name::default(),
                    required_auth: owner,
                },
                Permission {
                    perm_name: Name::ACTIVE,
                    parent: Name::OWNER,
                    required_auth: active,
                },
            ],
            code: Vec::new(),
            abi: Vec::new(),
        }
    }

    fn permission(&self, name: Name) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.perm_name == name)
    }
}

type TableKey = (Name, String, Name);

#[derive(Debug, Clone)]
struct ChainState {
    chain_id: Checksum256,
    // blocks[n - 1] is the id of block n
    blocks: Vec<Checksum256>,
    head_block_time: TimePoint,
    accounts: BTreeMap<Name, AccountState>,
    tables: HashMap<TableKey, Vec<Value>>,
    applied: HashSet<TxId>,
    executed: Vec<ExecutedAction>,
}

impl ChainState {
    fn genesis(genesis_key: PublicKey) -> Self {
        let mut state = ChainState {
            chain_id: Checksum256::hash(b"accounting in-memory chain"),
            blocks: Vec::new(),
            head_block_time: TimePoint::from_micros(GENESIS_TIME_MICROS),
            accounts: BTreeMap::new(),
            tables: HashMap::new(),
            applied: HashSet::new(),
            executed: Vec::new(),
        };
        state.accounts.insert(
            Name::EOSIO,
            AccountState::new(
                Authority::single_key(genesis_key),
                Authority::single_key(genesis_key),
            ),
        );
        state.produce_block(TimePoint::from_micros(GENESIS_TIME_MICROS));
        state
    }

    fn head_block_num(&self) -> u32 {
        self.blocks.len() as u32
    }

    fn head_block_id(&self) -> Checksum256 {
        self.blocks.last().copied().unwrap_or_default()
    }

    fn produce_block(&mut self, time: TimePoint) {
        let num = self.head_block_num() + 1;
        let mut data = self.head_block_id().as_bytes().to_vec();
        data.extend_from_slice(&num.to_le_bytes());
        let mut id = *Checksum256::hash(&data).as_bytes();
        id[..4].copy_from_slice(&num.to_be_bytes());
        self.blocks.push(Checksum256::new(id));
        self.head_block_time = time;
    }

    fn info(&self) -> ChainInfo {
        ChainInfo {
            server_version: "in-memory".to_string(),
            chain_id: self.chain_id,
            head_block_num: self.head_block_num(),
            last_irreversible_block_num: self.head_block_num(),
            head_block_id: self.head_block_id(),
            head_block_time: self.head_block_time,
            head_block_producer: Name::EOSIO,
        }
    }

    fn account(&self, account: Name) -> Result<&AccountState, ChainRejection> {
        self.accounts.get(&account).ok_or_else(|| {
            ChainRejection::new(
                ACCOUNT_QUERY_EXCEPTION,
                "account_query_exception",
                "Account Query Exception",
                format!("unknown key (eosio::chain::name): {account}"),
            )
        })
    }

    /// Most recent block whose number matches the 16-bit reference.
    fn tapos_matches(&self, trx: &Transaction) -> bool {
        self.blocks
            .iter()
            .enumerate()
            .rev()
            .take(TAPOS_WINDOW)
            .find(|(index, _)| ((*index + 1) & 0xffff) as u16 == trx.ref_block_num)
            .map_or(false, |(_, id)| ref_block_prefix(id) == trx.ref_block_prefix)
    }

    /// Keys among `provided` that satisfy `level`, or `None` when their
    /// weight stays below the threshold.
    fn satisfy(
        &self,
        level: &PermissionLevel,
        provided: &BTreeSet<PublicKey>,
        depth: usize,
    ) -> Result<Option<BTreeSet<PublicKey>>, ChainRejection> {
        let account = self.accounts.get(&level.actor).ok_or_else(|| {
            ChainRejection::new(
                TRANSACTION_EXCEPTION,
                "transaction_exception",
                "Transaction exception",
                format!("action's authorizing actor '{}' does not exist", level.actor),
            )
        })?;
        let permission = account.permission(level.permission).ok_or_else(|| {
            ChainRejection::new(
                TRANSACTION_EXCEPTION,
                "transaction_exception",
                "Transaction exception",
                format!(
                    "action's authorizing permission '{}' is not declared on '{}'",
                    level.permission, level.actor
                ),
            )
        })?;
        let auth = &permission.required_auth;
        let mut weight = 0u32;
        let mut used = BTreeSet::new();
        for key_weight in &auth.keys {
            if weight >= auth.threshold {
                break;
            }
            if provided.contains(&key_weight.key) {
                weight += u32::from(key_weight.weight);
                used.insert(key_weight.key);
            }
        }
        for account_weight in &auth.accounts {
            if weight >= auth.threshold || depth >= MAX_AUTHORITY_DEPTH {
                break;
            }
            // eosio.code is only satisfied by inline actions
            if account_weight.permission.permission == Name::EOSIO_CODE {
                continue;
            }
            if let Ok(Some(keys)) = self.satisfy(&account_weight.permission, provided, depth + 1) {
                weight += u32::from(account_weight.weight);
                used.extend(keys);
            }
        }
        Ok((weight >= auth.threshold).then_some(used))
    }

    fn authorize(
        &self,
        trx: &Transaction,
        provided: &BTreeSet<PublicKey>,
    ) -> Result<BTreeSet<PublicKey>, ChainRejection> {
        let mut used = BTreeSet::new();
        for action in trx.context_free_actions.iter().chain(&trx.actions) {
            for level in &action.authorization {
                let keys = self.satisfy(level, provided, 0)?.ok_or_else(|| {
                    ChainRejection::new(
                        UNSATISFIED_AUTHORIZATION,
                        "unsatisfied_authorization",
                        "Unsatisfied authorization",
                        format!(
                            "transaction declares authority '{}@{}', but does not have signatures for it",
                            level.actor, level.permission
                        ),
                    )
                })?;
                used.extend(keys);
            }
        }
        Ok(used)
    }

    fn validate_authority(&self, auth: &Authority, owner: Name) -> Result<(), ChainRejection> {
        auth.accounts
            .iter()
            .map(|weight| weight.permission.actor)
            .filter(|actor| *actor != owner)
            .try_for_each(|actor| {
                if self.accounts.contains_key(&actor) {
                    Ok(())
                } else {
                    Err(missing_account(actor))
                }
            })
    }

    fn apply_action(
        &mut self,
        action: &Action,
        trx_id: &TxId,
        contracts: &HashMap<Name, Arc<dyn ContractBehavior>>,
    ) -> Result<(), ChainRejection> {
        if !self.accounts.contains_key(&action.account) {
            return Err(missing_account(action.account));
        }
        if action.account == Name::EOSIO {
            self.apply_native(action)?;
        } else if let Some(behavior) = contracts.get(&action.account) {
            let mut context = ContractContext {
                receiver: action.account,
                state: self,
            };
            behavior.apply(action, &mut context)?;
        }
        self.executed.push(ExecutedAction {
            trx_id: trx_id.clone(),
            block_num: self.head_block_num(),
            action: action.clone(),
        });
        Ok(())
    }

    fn apply_native(&mut self, action: &Action) -> Result<(), ChainRejection> {
        match action.name.to_string().as_str() {
            "newaccount" => {
                let payload =
                    NewAccount::unpack(&action.data).map_err(|e| invalid_payload(action, e))?;
                require_auth(action, payload.creator)?;
                if self.accounts.contains_key(&payload.name) {
                    return Err(ChainRejection::new(
                        ACCOUNT_NAME_EXISTS_EXCEPTION,
                        "account_name_exists_exception",
                        "Account name already exists",
                        format!(
                            "Cannot create account named {}, as that name is already taken",
                            payload.name
                        ),
                    ));
                }
                self.validate_authority(&payload.owner, payload.name)?;
                self.validate_authority(&payload.active, payload.name)?;
                self.accounts.insert(
                    payload.name,
                    AccountState::new(payload.owner, payload.active),
                );
            }
            "updateauth" => {
                let payload =
                    UpdateAuth::unpack(&action.data).map_err(|e| invalid_payload(action, e))?;
                require_auth(action, payload.account)?;
                self.validate_authority(&payload.auth, payload.account)?;
                let account = self
                    .accounts
                    .get_mut(&payload.account)
                    .ok_or_else(|| missing_account(payload.account))?;
                let permission = Permission {
                    perm_name: payload.permission,
                    parent: payload.parent,
                    required_auth: payload.auth,
                };
                match account
                    .permissions
                    .iter_mut()
                    .find(|p| p.perm_name == payload.permission)
                {
                    Some(existing) => *existing = permission,
                    None => account.permissions.push(permission),
                }
            }
            "setcode" => {
                let payload =
                    SetCode::unpack(&action.data).map_err(|e| invalid_payload(action, e))?;
                require_auth(action, payload.account)?;
                self.accounts
                    .get_mut(&payload.account)
                    .ok_or_else(|| missing_account(payload.account))?
                    .code = payload.code;
            }
            "setabi" => {
                let payload =
                    SetAbi::unpack(&action.data).map_err(|e| invalid_payload(action, e))?;
                require_auth(action, payload.account)?;
                self.accounts
                    .get_mut(&payload.account)
                    .ok_or_else(|| missing_account(payload.account))?
                    .abi = payload.abi;
            }
            other => {
                return Err(ChainRejection::new(
                    ACTION_VALIDATE_EXCEPTION,
                    "action_validate_exception",
                    "Action validate exception",
                    format!("eosio::{other} is not supported by the in-memory chain"),
                ))
            }
        }
        Ok(())
    }
}

/// In-memory EOSIO chain. Produces one block per accepted transaction and
/// enforces TAPOS, expiration, duplicate detection and signature-based
/// authorization. Contract logic is supplied per account with
/// [`TestChainClient::register_contract`]; actions to other accounts are
/// accepted without effect.
#[derive(Clone)]
pub struct TestChainClient {
    state: Arc<Mutex<ChainState>>,
    contracts: Arc<RwLock<HashMap<Name, Arc<dyn ContractBehavior>>>>,
}

impl TestChainClient {
    /// New chain whose `eosio` account is controlled by `genesis_key`.
    pub fn new(genesis_key: PublicKey) -> Self {
        TestChainClient {
            state: Arc::new(Mutex::new(ChainState::genesis(genesis_key))),
            contracts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn lock_state(&self) -> ChainClientResult<MutexGuard<'_, ChainState>> {
        self.state.lock().map_err(|e| mutex_error(e.to_string()))
    }

    pub fn register_contract(
        &self,
        account: Name,
        behavior: impl ContractBehavior + 'static,
    ) -> ChainClientResult<()> {
        self.contracts
            .write()
            .map_err(|e| mutex_error(e.to_string()))?
            .insert(account, Arc::new(behavior));
        Ok(())
    }

    /// Every action applied so far, in execution order.
    pub fn executed_actions(&self) -> ChainClientResult<Vec<ExecutedAction>> {
        Ok(self.lock_state()?.executed.clone())
    }

    /// Produces an empty block `duration` after the head block.
    pub fn advance_time(&self, duration: Duration) -> ChainClientResult<()> {
        let mut state = self.lock_state()?;
        let time = state.head_block_time + duration;
        state.produce_block(time);
        Ok(())
    }

    pub fn code(&self, account: Name) -> ChainClientResult<Vec<u8>> {
        let state = self.lock_state()?;
        let account = state.account(account).map_err(ChainClientError::Rejected)?;
        Ok(account.code.clone())
    }

    pub fn abi(&self, account: Name) -> ChainClientResult<Vec<u8>> {
        let state = self.lock_state()?;
        let account = state.account(account).map_err(ChainClientError::Rejected)?;
        Ok(account.abi.clone())
    }
}

#[async_trait]
impl ChainClient for TestChainClient {
    async fn get_info(&self) -> ChainClientResult<ChainInfo> {
        Ok(self.lock_state()?.info())
    }

    async fn get_required_keys(
        &self,
        transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> ChainClientResult<Vec<PublicKey>> {
        let state = self.lock_state()?;
        let provided = available_keys.iter().copied().collect();
        let required = state
            .authorize(transaction, &provided)
            .map_err(ChainClientError::Rejected)?;
        Ok(required.into_iter().collect())
    }

    async fn push_transaction(
        &self,
        packed: &PackedTransaction,
    ) -> ChainClientResult<PushedTransaction> {
        let reject = |detail: String, code: i64, name: &str, what: &str| {
            ChainClientError::Rejected(ChainRejection::new(code, name, what, detail))
        };
        let trx = packed.transaction().map_err(|e| {
            reject(
                e.to_string(),
                TRANSACTION_EXCEPTION,
                "transaction_exception",
                "Transaction exception",
            )
        })?;
        let id = packed.id();

        let contracts = self
            .contracts
            .read()
            .map_err(|e| mutex_error(e.to_string()))?;
        let mut state = self.lock_state()?;

        if state.applied.contains(&id) {
            return Err(reject(
                format!("duplicate transaction {id}"),
                TX_DUPLICATE,
                "tx_duplicate",
                "Duplicate transaction",
            ));
        }
        let head_time = state.head_block_time.to_sec();
        if trx.expiration <= head_time {
            return Err(reject(
                format!(
                    "expired transaction {id}, expiration {}, block time {head_time}",
                    trx.expiration
                ),
                EXPIRED_TX_EXCEPTION,
                "expired_tx_exception",
                "Expired Transaction",
            ));
        }
        if trx.expiration > head_time + MAX_TRX_LIFETIME {
            return Err(reject(
                format!(
                    "Transaction expiration is too far in the future relative to the reference time of {head_time}, expiration is {}",
                    trx.expiration
                ),
                TX_EXP_TOO_FAR_EXCEPTION,
                "tx_exp_too_far_exception",
                "Transaction Expiration Too Far",
            ));
        }
        if !state.tapos_matches(&trx) {
            return Err(reject(
                "Transaction's reference block did not match. Is this transaction from a different fork?".to_string(),
                INVALID_REF_BLOCK_EXCEPTION,
                "invalid_ref_block_exception",
                "Invalid Reference Block",
            ));
        }
        if trx.actions.is_empty() {
            return Err(reject(
                "transaction must have at least one action".to_string(),
                TRANSACTION_EXCEPTION,
                "transaction_exception",
                "Transaction exception",
            ));
        }

        let digest = trx.signing_digest(&state.chain_id);
        let recovered = packed
            .signatures
            .iter()
            .map(|signature| signature.recover(&digest))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| {
                reject(
                    e.to_string(),
                    UNSATISFIED_AUTHORIZATION,
                    "unsatisfied_authorization",
                    "Unsatisfied authorization",
                )
            })?;
        state
            .authorize(&trx, &recovered)
            .map_err(ChainClientError::Rejected)?;

        let mut next = state.clone();
        let block_time = next.head_block_time + BLOCK_INTERVAL;
        next.produce_block(block_time);
        for action in &trx.actions {
            next.apply_action(action, &id, &contracts)
                .map_err(ChainClientError::Rejected)?;
        }
        next.applied.insert(id.clone());
        debug!(%id, block_num = next.head_block_num(), "applied transaction");
        *state = next;

        Ok(PushedTransaction {
            transaction_id: id,
            processed: Value::Null,
        })
    }

    async fn get_account(&self, account: Name) -> ChainClientResult<AccountInfo> {
        let state = self.lock_state()?;
        let found = state.account(account).map_err(ChainClientError::Rejected)?;
        Ok(AccountInfo {
            account_name: account,
            permissions: found.permissions.clone(),
        })
    }

    async fn get_code_hash(&self, account: Name) -> ChainClientResult<Checksum256> {
        let state = self.lock_state()?;
        let found = state.account(account).map_err(ChainClientError::Rejected)?;
        if found.code.is_empty() {
            Ok(Checksum256::default())
        } else {
            Ok(Checksum256::hash(&found.code))
        }
    }

    async fn get_table_rows(&self, request: &TableRowsRequest) -> ChainClientResult<TableRows> {
        let state = self.lock_state()?;
        let key = (request.code, request.scope.clone(), request.table);
        let rows = state.tables.get(&key).map(Vec::as_slice).unwrap_or_default();
        let limit = request.limit as usize;
        let selected: Vec<Value> = if request.reverse {
            rows.iter().rev().take(limit).cloned().collect()
        } else {
            rows.iter().take(limit).cloned().collect()
        };
        Ok(TableRows {
            more: rows.len() > selected.len(),
            rows: selected,
        })
    }
}
