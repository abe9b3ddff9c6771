//! # Chain Specification
//!
//! Immutable, explicitly constructed chain-wide parameters: economic limits,
//! validator-set sizing and the fork schedule. One instance is built at
//! startup and shared by `Arc` with the executor, the validator selector,
//! consensus, sync and the transaction pool.

use crate::amount::Amount;
use crate::entities::Network;
use crate::transaction::TransactionType;
use serde::{Deserialize, Serialize};

/// Consensus-relevant protocol upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fork {
    /// Uniformly distributed primary selection with no repeat across views.
    UniformDistribution,
    /// CREATE/CALL transactions.
    VirtualMachine,
    /// Corrected vote-query precompiles.
    VotingPrecompiledUpgrade,
}

impl Fork {
    /// All known forks.
    pub const ALL: [Fork; 3] = [
        Fork::UniformDistribution,
        Fork::VirtualMachine,
        Fork::VotingPrecompiledUpgrade,
    ];

    /// Wire id used in header signals.
    pub fn id(self) -> u16 {
        match self {
            Self::UniformDistribution => 1,
            Self::VirtualMachine => 2,
            Self::VotingPrecompiledUpgrade => 3,
        }
    }

    /// Parse a wire id.
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|fork| fork.id() == id)
    }
}

/// Activation window of a fork. The fork is active for every height at or
/// above `activation_height`; `signal_until` bounds the window in which
/// proposers advertise it in header data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkActivation {
    pub activation_height: u64,
    pub signal_until: u64,
}

impl ForkActivation {
    /// Window `[from, to]`.
    pub const fn window(from: u64, to: u64) -> Self {
        Self {
            activation_height: from,
            signal_until: to,
        }
    }
}

/// Per-network fork schedule. `None` disables the fork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkSchedule {
    pub uniform_distribution: Option<ForkActivation>,
    pub virtual_machine: Option<ForkActivation>,
    pub voting_precompiled_upgrade: Option<ForkActivation>,
}

impl ForkSchedule {
    fn activation(&self, fork: Fork) -> Option<ForkActivation> {
        match fork {
            Fork::UniformDistribution => self.uniform_distribution,
            Fork::VirtualMachine => self.virtual_machine,
            Fork::VotingPrecompiledUpgrade => self.voting_precompiled_upgrade,
        }
    }

    /// Schedule with every fork active from `height`.
    pub fn all_from(height: u64) -> Self {
        let window = Some(ForkActivation::window(height, height));
        Self {
            uniform_distribution: window,
            virtual_machine: window,
            voting_precompiled_upgrade: window,
        }
    }
}

/// Halving schedule: `(last height of the era, reward in coins)`.
const REWARD_ERAS: [(u64, u64); 10] = [
    (5_635_000, 1_280_000),
    (11_270_000, 640_000),
    (16_905_000, 320_000),
    (22_540_000, 160_000),
    (28_175_000, 80_000),
    (33_810_000, 40_000),
    (39_445_000, 20_000),
    (45_080_000, 10_000),
    (55_016_500, 5_000),
    (58_963_500, 2_500),
];

/// Reward in coins after the last era.
const TAIL_REWARD: u64 = 2_288;

/// Chain-wide immutable parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub network: Network,
    /// Gas limit of a block; also the upper bound on a VM transaction's gas.
    pub max_block_gas_limit: u64,
    /// Flat gas charged against the block limit for each non-VM transaction.
    pub non_vm_transaction_gas_cost: u64,
    pub min_transaction_fee: Amount,
    pub min_delegate_burn_amount: Amount,
    pub max_vote_amount: Amount,
    pub max_vote_count: u32,
    pub max_unvote_amount: Amount,
    pub max_unvote_count: u32,
    /// Size of the validator set.
    pub validator_count: usize,
    /// Validator set is recomputed after blocks whose height is a multiple.
    pub validator_update_interval: u64,
    /// Block rewards are paid on heights that are a multiple of this.
    pub reward_interval: u64,
    pub forks: ForkSchedule,
}

impl ChainSpec {
    const MAINNET_MAX_BLOCK_GAS_LIMIT: u64 = 30_000_000;

    fn base(network: Network, forks: ForkSchedule) -> Self {
        let gas_multiplier = if network == Network::Mainnet { 1 } else { 5 };
        Self {
            network,
            max_block_gas_limit: Self::MAINNET_MAX_BLOCK_GAS_LIMIT * gas_multiplier,
            non_vm_transaction_gas_cost: 5_000,
            min_transaction_fee: Amount::from_micro(100),
            min_delegate_burn_amount: Amount::from_coins(1_000),
            max_vote_amount: Amount::from_coins(10_000_000),
            max_vote_count: 1_000,
            max_unvote_amount: Amount::from_coins(10_000_000),
            max_unvote_count: 1_000,
            validator_count: 6,
            validator_update_interval: 200,
            reward_interval: 17_000,
            forks,
        }
    }

    /// Production parameters.
    pub fn mainnet() -> Self {
        Self::base(
            Network::Mainnet,
            ForkSchedule {
                uniform_distribution: Some(ForkActivation::window(200_001, 400_000)),
                virtual_machine: Some(ForkActivation::window(1_500_001, 1_700_000)),
                voting_precompiled_upgrade: Some(ForkActivation::window(1_600_001, 1_800_000)),
            },
        )
    }

    /// Public test network parameters.
    pub fn testnet() -> Self {
        Self::base(
            Network::Testnet,
            ForkSchedule {
                uniform_distribution: Some(ForkActivation::window(1, 200_000)),
                virtual_machine: Some(ForkActivation::window(1, 200_000)),
                voting_precompiled_upgrade: Some(ForkActivation::window(150_001, 350_000)),
            },
        )
    }

    /// Local development parameters: every fork active from height 1.
    pub fn devnet() -> Self {
        let mut spec = Self::base(Network::Devnet, ForkSchedule::all_from(1));
        spec.validator_count = 1;
        spec.reward_interval = 1;
        spec
    }

    /// Parameters for `network`.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Devnet => Self::devnet(),
        }
    }

    /// Whether `fork` is active at `height`.
    pub fn is_fork_active(&self, fork: Fork, height: u64) -> bool {
        self.forks
            .activation(fork)
            .is_some_and(|activation| height >= activation.activation_height)
    }

    /// Forks a proposer at `height` advertises in header data.
    pub fn fork_signals(&self, height: u64) -> Vec<Fork> {
        Fork::ALL
            .into_iter()
            .filter(|fork| {
                self.forks.activation(*fork).is_some_and(|activation| {
                    height >= activation.activation_height && height <= activation.signal_until
                })
            })
            .collect()
    }

    /// Data payload cap per transaction type.
    pub fn max_transaction_data_size(&self, tx_type: TransactionType) -> usize {
        match tx_type {
            TransactionType::Coinbase | TransactionType::Vote | TransactionType::Unvote => 0,
            TransactionType::Transfer => 128,
            TransactionType::Delegate => 50,
            TransactionType::Create | TransactionType::Call => 512 * 1024,
            TransactionType::Reward | TransactionType::Burn => 0,
        }
    }

    /// Block reward credited to the coinbase of the block at `height`.
    pub fn block_reward(&self, height: u64) -> Amount {
        if height == 0 || self.reward_interval == 0 || height % self.reward_interval != 0 {
            return Amount::ZERO;
        }
        let coins = REWARD_ERAS
            .iter()
            .find(|(last_height, _)| height <= *last_height)
            .map_or(TAIL_REWARD, |(_, reward)| *reward);
        Amount::from_coins(coins)
    }

    /// Whether the validator set is recomputed after the block at `height`.
    pub fn is_validator_refresh_height(&self, height: u64) -> bool {
        self.validator_update_interval != 0 && height % self.validator_update_interval == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_constants() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.max_block_gas_limit, 30_000_000);
        assert_eq!(spec.min_transaction_fee.nano(), 100_000);
        assert_eq!(spec.min_delegate_burn_amount, Amount::from_coins(1_000));
        assert_eq!(spec.validator_count, 6);
        assert_eq!(ChainSpec::testnet().max_block_gas_limit, 150_000_000);
    }

    #[test]
    fn test_fork_activation() {
        let spec = ChainSpec::mainnet();
        assert!(!spec.is_fork_active(Fork::UniformDistribution, 200_000));
        assert!(spec.is_fork_active(Fork::UniformDistribution, 200_001));
        assert!(spec.is_fork_active(Fork::UniformDistribution, 10_000_000));
        assert!(!spec.is_fork_active(Fork::VirtualMachine, 1_000_000));

        let devnet = ChainSpec::devnet();
        assert!(Fork::ALL.iter().all(|f| devnet.is_fork_active(*f, 1)));
        assert!(!devnet.is_fork_active(Fork::VirtualMachine, 0));
    }

    #[test]
    fn test_fork_signals_window() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.fork_signals(300_000), vec![Fork::UniformDistribution]);
        assert!(spec.fork_signals(500_000).is_empty());
    }

    #[test]
    fn test_data_caps() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.max_transaction_data_size(TransactionType::Vote), 0);
        assert_eq!(spec.max_transaction_data_size(TransactionType::Transfer), 128);
        assert_eq!(spec.max_transaction_data_size(TransactionType::Delegate), 50);
        assert_eq!(spec.max_transaction_data_size(TransactionType::Call), 524_288);
    }

    #[test]
    fn test_block_reward_schedule() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.block_reward(0), Amount::ZERO);
        assert_eq!(spec.block_reward(16_999), Amount::ZERO);
        assert_eq!(spec.block_reward(17_000), Amount::from_coins(1_280_000));
        assert_eq!(spec.block_reward(17_000 * 331), Amount::from_coins(1_280_000));
        assert_eq!(spec.block_reward(17_000 * 332), Amount::from_coins(640_000));
        assert_eq!(spec.block_reward(17_000 * 4_000), Amount::from_coins(2_288));
    }

    #[test]
    fn test_fork_ids() {
        for fork in Fork::ALL {
            assert_eq!(Fork::from_id(fork.id()), Some(fork));
        }
        assert_eq!(Fork::from_id(99), None);
    }
}
