//! Cross-chain protocol message.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, HashLock, MessageDirection, MessageHash, MessageStatus, MessageType, Secret};

/// One cross-chain protocol message, keyed by its content-addressed hash.
///
/// A message is created by whichever handler observes its hash first. Both
/// chains report on it independently, so a progress event can legitimately
/// arrive before the declaration it logically follows; the transition
/// methods below absorb any delivery order while keeping each status field
/// monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Content-addressed identity. Set exactly once, never changes.
    pub message_hash: MessageHash,
    /// Protocol operation (stake-and-mint or redeem-and-unstake). Immutable.
    pub message_type: MessageType,
    /// Originating chain. Immutable.
    pub direction: MessageDirection,
    /// Lifecycle checkpoint as seen on the source chain.
    pub source_status: MessageStatus,
    /// Lifecycle checkpoint as seen on the target chain.
    pub target_status: MessageStatus,
    /// Account that initiated the message (staker or redeemer).
    pub sender: Option<Address>,
    /// Sender's message nonce on the gateway.
    pub nonce: Option<BigDecimal>,
    /// Gateway contract the message was observed on.
    pub gateway_address: Option<Address>,
    /// Gas price the sender offered for facilitation.
    pub gas_price: Option<BigDecimal>,
    /// Gas limit the sender offered for facilitation.
    pub gas_limit: Option<BigDecimal>,
    /// Source-chain block at which the declaration was observed.
    pub source_declaration_block_height: Option<BigDecimal>,
    /// Hashed-timelock unlock secret, revealed by progress events.
    pub secret: Option<Secret>,
    /// Hashed-timelock lock committed at declaration.
    pub hash_lock: Option<HashLock>,
    /// Row creation time, assigned by storage.
    pub created_at: Option<DateTime<Utc>>,
    /// Last save time, assigned by storage.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a message in its initial state (both sides undeclared).
    pub fn new(
        message_hash: MessageHash,
        message_type: MessageType,
        direction: MessageDirection,
    ) -> Self {
        Self {
            message_hash,
            message_type,
            direction,
            source_status: MessageStatus::Undeclared,
            target_status: MessageStatus::Undeclared,
            sender: None,
            nonce: None,
            gateway_address: None,
            gas_price: None,
            gas_limit: None,
            source_declaration_block_height: None,
            secret: None,
            hash_lock: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Apply a source-chain declaration observed at `block_height`.
    ///
    /// Only an undeclared source advances; a message already declared or
    /// progressed keeps its status and declaration height (re-declarations
    /// are duplicates, not corrections). Returns whether the status moved.
    pub fn declare_source(&mut self, block_height: BigDecimal) -> bool {
        if self.source_status == MessageStatus::Undeclared {
            self.source_status = MessageStatus::Declared;
            self.source_declaration_block_height = Some(block_height);
            true
        } else {
            false
        }
    }

    /// Apply a source-chain progress event revealing `secret`.
    ///
    /// Advances undeclared or declared messages to progressed; the secret is
    /// recorded unconditionally, even when the status is already progressed,
    /// so a replayed or duplicate event always leaves the latest revealed
    /// secret on the row. Returns whether the status moved.
    pub fn progress_source(&mut self, secret: Secret) -> bool {
        let advanced = matches!(
            self.source_status,
            MessageStatus::Undeclared | MessageStatus::Declared
        );
        if advanced {
            self.source_status = MessageStatus::Progressed;
        }
        self.secret = Some(secret);
        advanced
    }

    /// Apply a target-chain confirmation (declaration on the target side).
    ///
    /// Same monotonicity rule as [`declare_source`](Self::declare_source);
    /// the target side carries no declaration height. Returns whether the
    /// status moved.
    pub fn declare_target(&mut self) -> bool {
        if self.target_status == MessageStatus::Undeclared {
            self.target_status = MessageStatus::Declared;
            true
        } else {
            false
        }
    }

    /// Apply a target-chain progress event (mint or unstake) revealing
    /// `secret`.
    ///
    /// Same rule as [`progress_source`](Self::progress_source), applied to
    /// the target status. Returns whether the status moved.
    pub fn progress_target(&mut self, secret: Secret) -> bool {
        let advanced = matches!(
            self.target_status,
            MessageStatus::Undeclared | MessageStatus::Declared
        );
        if advanced {
            self.target_status = MessageStatus::Progressed;
        }
        self.secret = Some(secret);
        advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stake_message() -> Message {
        Message::new(
            MessageHash::from([0x01; 32]),
            MessageType::Stake,
            MessageDirection::OriginToAuxiliary,
        )
    }

    #[test]
    fn new_message_starts_undeclared_on_both_sides() {
        let message = stake_message();
        assert_eq!(message.source_status, MessageStatus::Undeclared);
        assert_eq!(message.target_status, MessageStatus::Undeclared);
        assert!(message.secret.is_none());
        assert!(message.source_declaration_block_height.is_none());
    }

    #[test]
    fn declare_source_advances_from_undeclared() {
        let mut message = stake_message();
        assert!(message.declare_source(BigDecimal::from(42u32)));
        assert_eq!(message.source_status, MessageStatus::Declared);
        assert_eq!(
            message.source_declaration_block_height,
            Some(BigDecimal::from(42u32))
        );
    }

    #[test]
    fn declare_source_is_a_noop_once_declared() {
        // Test critique: une re-déclaration ne doit pas écraser la hauteur
        // de bloc d'origine.
        let mut message = stake_message();
        message.declare_source(BigDecimal::from(42u32));
        assert!(!message.declare_source(BigDecimal::from(77u32)));
        assert_eq!(message.source_status, MessageStatus::Declared);
        assert_eq!(
            message.source_declaration_block_height,
            Some(BigDecimal::from(42u32))
        );
    }

    #[test]
    fn declare_source_never_regresses_a_progressed_message() {
        let mut message = stake_message();
        message.progress_source(Secret::from([0xaa; 32]));
        assert!(!message.declare_source(BigDecimal::from(42u32)));
        assert_eq!(message.source_status, MessageStatus::Progressed);
        assert!(message.source_declaration_block_height.is_none());
    }

    #[test]
    fn progress_source_skips_declared_when_arriving_first() {
        // Les deux chaînes livrent indépendamment: le progrès peut précéder
        // la déclaration.
        let mut message = stake_message();
        assert!(message.progress_source(Secret::from([0xaa; 32])));
        assert_eq!(message.source_status, MessageStatus::Progressed);
        assert_eq!(message.secret, Some(Secret::from([0xaa; 32])));
    }

    #[test]
    fn progress_source_always_records_the_secret() {
        let mut message = stake_message();
        message.progress_source(Secret::from([0xaa; 32]));
        // Duplicate delivery with another secret: status untouched, secret
        // overwritten.
        assert!(!message.progress_source(Secret::from([0xbb; 32])));
        assert_eq!(message.source_status, MessageStatus::Progressed);
        assert_eq!(message.secret, Some(Secret::from([0xbb; 32])));
    }

    #[test]
    fn target_side_follows_the_same_lattice() {
        let mut message = stake_message();
        assert!(message.declare_target());
        assert!(!message.declare_target());
        assert!(message.progress_target(Secret::from([0xcc; 32])));
        assert!(!message.declare_target());
        assert_eq!(message.target_status, MessageStatus::Progressed);
        // Source side is independent of the target side.
        assert_eq!(message.source_status, MessageStatus::Undeclared);
    }

    #[test]
    fn monotonicity_over_any_delivery_order() {
        // Toutes les permutations déclaration/progrès convergent vers
        // Progressed dès qu'un événement de progrès est présent.
        let orders: [&[&str]; 4] = [
            &["declare", "progress"],
            &["progress", "declare"],
            &["declare", "progress", "declare"],
            &["progress", "progress"],
        ];
        for order in orders {
            let mut message = stake_message();
            for step in order {
                match *step {
                    "declare" => {
                        message.declare_source(BigDecimal::from(10u32));
                    }
                    _ => {
                        message.progress_source(Secret::from([0x55; 32]));
                    }
                }
            }
            assert_eq!(
                message.source_status,
                MessageStatus::Progressed,
                "order {order:?} must converge to Progressed"
            );
        }
    }
}
