//! Construction of deposit, deposit-to and withdraw calls to a chain's
//! `accounts` contract, sized and funded for the L1 output carrying them.

mod output;

pub use output::{packed_len, BasicOutputSpec, RentStructure};

use tracing::{debug, info};

use crate::config::NetworkConfig;
use crate::ledger::{await_inclusion, BlockId, LedgerClient, TransactionId};
use crate::metadata::core_contracts::{accounts, ACCOUNTS};
use crate::metadata::{AgentId, ContractIdentity, MetadataPayload, Request};
use crate::types::{Assets, Bech32Address, ChainId, EvmAddress};
use crate::{Error, Result};

// Re-encoding after inflating the allowance can only grow the payload by a
// few varint bytes, so this is reached in two or three rounds.
const MAX_SIZING_ROUNDS: usize = 8;

/// Kind of call to the `accounts` contract
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// Credit the sender's L2 account
    Deposit,
    /// Credit an EVM account on the chain
    DepositTo(EvmAddress),
    /// Move L2 funds back to the sender on L1
    Withdraw,
}

impl CallKind {
    /// Entry point name
    #[must_use]
    pub const fn entry_point(&self) -> &'static str {
        match self {
            Self::Deposit => accounts::DEPOSIT,
            Self::DepositTo(_) => accounts::TRANSFER_ALLOWANCE_TO,
            Self::Withdraw => accounts::WITHDRAW,
        }
    }
}

/// A call ready to be handed to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedOutput {
    kind: CallKind,
    request: Request,
    storage_deposit: u64,
    output: BasicOutputSpec,
}

impl PreparedOutput {
    /// Call kind
    #[must_use]
    pub const fn kind(&self) -> CallKind {
        self.kind
    }

    /// The request, as encoded in the output
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Minimum storage deposit of the output
    #[must_use]
    pub const fn storage_deposit(&self) -> u64 {
        self.storage_deposit
    }

    /// The output description
    #[must_use]
    pub const fn output(&self) -> &BasicOutputSpec {
        &self.output
    }

    /// Encoded request
    #[must_use]
    pub const fn metadata(&self) -> &MetadataPayload {
        self.output.metadata()
    }
}

/// Builds `accounts` calls for one chain.
#[derive(Clone, Debug)]
pub struct IscCallBuilder {
    config: NetworkConfig,
    chain_address: Bech32Address,
    chain_id: ChainId,
}

impl IscCallBuilder {
    /// Builder for the chain in `config`; fails if its chain address is not
    /// an alias address
    pub fn new(config: NetworkConfig) -> Result<Self> {
        let chain_address = config.chain_address()?;
        let chain_id = ChainId::try_from(&chain_address)?;
        Ok(Self {
            config,
            chain_address,
            chain_id,
        })
    }

    /// Network configuration in use
    #[must_use]
    pub const fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Chain id requests are routed to
    #[must_use]
    pub const fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Credit `amount` base tokens to the sender's L2 account
    pub fn deposit(&self, amount: u64) -> Result<Request> {
        self.request(CallKind::Deposit, amount)
    }

    /// Credit `amount` base tokens to the EVM account `destination`
    pub fn deposit_to(&self, amount: u64, destination: &EvmAddress) -> Result<Request> {
        self.request(CallKind::DepositTo(*destination), amount)
    }

    /// Withdraw `amount` base tokens from L2
    pub fn withdraw(&self, amount: u64) -> Result<Request> {
        self.request(CallKind::Withdraw, amount)
    }

    /// Request for `kind` with an allowance of `amount` base tokens
    pub fn request(&self, kind: CallKind, amount: u64) -> Result<Request> {
        self.request_with_allowance(kind, Assets::base(amount))
    }

    fn request_with_allowance(&self, kind: CallKind, allowance: Assets) -> Result<Request> {
        let mut builder = Request::builder(ACCOUNTS, kind.entry_point())
            .sender(ContractIdentity::Null)
            .gas_budget(self.config.gas_budget())
            .allowance(allowance);
        if let CallKind::DepositTo(destination) = kind {
            let agent = AgentId::ethereum(self.chain_id, destination);
            builder = builder.param(accounts::PARAM_AGENT_ID, agent.to_bytes());
        }
        Ok(builder.build()?)
    }

    /// Storage deposit of an output carrying `metadata`
    #[must_use]
    pub fn storage_deposit(&self, metadata: &MetadataPayload) -> u64 {
        self.config.rent.minimum_deposit(packed_len(metadata.len()))
    }

    /// Size and fund the output for a call of `amount` base tokens sent by
    /// `sender`.
    ///
    /// Deposits put `amount` in the output. Withdrawals add the storage
    /// deposit to the allowance, since the chain pays it back out of L2
    /// funds, and put only `storage_deposit + min_gas_fee` in the output.
    pub fn prepare(
        &self,
        kind: CallKind,
        amount: u64,
        sender: &Bech32Address,
    ) -> Result<PreparedOutput> {
        let min_gas_fee = self.config.min_gas_fee;

        let (request, metadata, storage_deposit, output_amount) = match kind {
            CallKind::Deposit | CallKind::DepositTo(_) => {
                let request = self.request(kind, amount)?;
                let metadata = request.encode()?;
                let storage_deposit = self.storage_deposit(&metadata);
                (request, metadata, storage_deposit, amount)
            }
            CallKind::Withdraw => {
                let (request, metadata, storage_deposit) = self.size_withdraw(amount)?;
                let output_amount = storage_deposit.saturating_add(min_gas_fee);
                (request, metadata, storage_deposit, output_amount)
            }
        };

        let need = storage_deposit.saturating_add(min_gas_fee);
        if amount < need {
            return Err(Error::InsufficientAmount { need, have: amount });
        }

        debug!(
            ?kind,
            amount,
            storage_deposit,
            output_amount,
            metadata = %metadata,
            "prepared output"
        );

        Ok(PreparedOutput {
            kind,
            request,
            storage_deposit,
            output: BasicOutputSpec::new(
                output_amount,
                self.chain_address.clone(),
                sender.clone(),
                metadata,
            ),
        })
    }

    // Inflate the allowance by the deposit until the deposit stops changing.
    fn size_withdraw(&self, amount: u64) -> Result<(Request, MetadataPayload, u64)> {
        let mut storage_deposit = 0;
        for _ in 0..MAX_SIZING_ROUNDS {
            let allowance = Assets::base(amount.saturating_add(storage_deposit));
            let request = self.request_with_allowance(CallKind::Withdraw, allowance)?;
            let metadata = request.encode()?;
            let required = self.storage_deposit(&metadata);
            if required == storage_deposit {
                return Ok((request, metadata, storage_deposit));
            }
            storage_deposit = required;
        }
        Err(Error::Ledger(format!(
            "storage deposit did not settle after {MAX_SIZING_ROUNDS} rounds"
        )))
    }

    /// Hand the output to `ledger` and wait for its inclusion
    pub async fn submit<L: LedgerClient + ?Sized>(
        &self,
        ledger: &L,
        prepared: &PreparedOutput,
    ) -> Result<(TransactionId, BlockId)> {
        let tx = ledger
            .send_outputs(std::slice::from_ref(prepared.output()))
            .await?;
        info!(
            %tx,
            kind = ?prepared.kind(),
            amount = prepared.output().amount(),
            "transaction sent"
        );

        let block = await_inclusion(ledger, &tx, &self.config.inclusion).await?;
        Ok((tx, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InclusionConfig;
    use crate::ledger::tests::MockLedger;
    use crate::metadata::{derive_agent_id, hname, Hname};
    use crate::types::AddressKind;
    use crate::{GAS_BUDGET_MULTIPLIER, MIN_GAS_FEE, TESTNET_CHAIN_ADDRESS};

    fn builder() -> IscCallBuilder {
        IscCallBuilder::new(NetworkConfig::testnet()).unwrap()
    }

    fn sender() -> Bech32Address {
        Bech32Address::new("rms", AddressKind::Ed25519, [5u8; 32]).unwrap()
    }

    #[test]
    fn test_deposit_request() {
        for amount in [0, 1, 1_000_000, u64::MAX] {
            let request = builder().deposit(amount).unwrap();
            assert_eq!(request.gas_budget(), GAS_BUDGET_MULTIPLIER * MIN_GAS_FEE);
            assert_eq!(request.allowance().base_tokens(), amount);
            assert_eq!(request.sender_contract(), &ContractIdentity::Null);
            assert_eq!(request.target_contract(), Hname::of(ACCOUNTS));
            assert_eq!(request.target_entry_point(), Hname::of(accounts::DEPOSIT));
        }
    }

    #[test]
    fn test_deposit_to_end_to_end() {
        let destination = EvmAddress::from_bytes([0xab; 20]);
        let request = builder().deposit_to(1_000_000, &destination).unwrap();

        let expected = derive_agent_id(TESTNET_CHAIN_ADDRESS, destination.as_bytes()).unwrap();
        assert_eq!(request.param(accounts::PARAM_AGENT_ID), Some(expected.as_slice()));
        assert_eq!(request.allowance().base_tokens(), 1_000_000);
        assert_eq!(
            request.target_entry_point().value(),
            hname(accounts::TRANSFER_ALLOWANCE_TO)
        );

        let prepared = builder()
            .prepare(CallKind::DepositTo(destination), 1_000_000, &sender())
            .unwrap();
        assert_eq!(prepared.output().amount(), 1_000_000);
        assert_eq!(prepared.output().chain_address().to_string(), TESTNET_CHAIN_ADDRESS);
        assert_eq!(prepared.output().sender(), &sender());
        assert_eq!(Request::decode(prepared.metadata().as_bytes()).unwrap(), request);
    }

    #[test]
    fn test_deposit_insufficient() {
        let builder = builder();
        let metadata = builder.deposit(1_000).unwrap().encode().unwrap();
        let need = builder.storage_deposit(&metadata) + MIN_GAS_FEE;

        let err = builder
            .prepare(CallKind::Deposit, 1_000, &sender())
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientAmount { need: n, have: 1_000 } if n == need));
    }

    #[test]
    fn test_withdraw_sizing() {
        let builder = builder();
        let probe = builder
            .prepare(CallKind::Withdraw, 50_000, &sender())
            .unwrap();
        let minimum = probe.storage_deposit() + MIN_GAS_FEE;
        assert_eq!(probe.output().amount(), minimum);
        assert_eq!(
            probe.request().allowance().base_tokens(),
            50_000 + probe.storage_deposit()
        );
        assert_eq!(probe.storage_deposit(), builder.storage_deposit(probe.metadata()));

        let exact = builder
            .prepare(CallKind::Withdraw, minimum + 1, &sender())
            .unwrap();
        assert_eq!(exact.storage_deposit(), probe.storage_deposit());
        assert_eq!(exact.output().amount(), minimum);

        let err = builder
            .prepare(CallKind::Withdraw, minimum - 1, &sender())
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientAmount { .. }));
    }

    #[test]
    fn test_rejects_non_alias_chain_address() {
        let config = NetworkConfig {
            chain_address: sender().to_string(),
            ..NetworkConfig::testnet()
        };
        assert!(matches!(
            IscCallBuilder::new(config),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_waits_for_inclusion() {
        let config = NetworkConfig {
            inclusion: InclusionConfig {
                poll_interval_ms: 1,
                max_attempts: 5,
            },
            ..NetworkConfig::testnet()
        };
        let builder = IscCallBuilder::new(config).unwrap();
        let prepared = builder
            .prepare(CallKind::Deposit, 1_000_000, &sender())
            .unwrap();

        let ledger = MockLedger::new(2);
        let (tx, block) = builder.submit(&ledger, &prepared).await.unwrap();

        assert_eq!(tx, TransactionId::from_bytes([0xaa; 32]));
        assert_eq!(block, BlockId::from_bytes([0xbb; 32]));
        assert_eq!(ledger.sent.lock().unwrap().as_slice(), &[prepared.output().clone()]);
    }
}
