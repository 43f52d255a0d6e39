//! Stake-and-mint handler family (origin to auxiliary flow).
//!
//! Covers the full lifecycle of a stake: the user's off-chain request,
//! the source-side declaration and progress on the origin gateway, and
//! the target-side confirmation and mint on the auxiliary co-gateway.
//!
//! # Handled Events
//!
//! - `stakeRequesteds` - stake request occurrences (composer)
//! - `stakeIntentDeclareds` - source declaration (gateway)
//! - `stakeProgresseds` - source progress + secret (gateway)
//! - `stakeIntentConfirmeds` - target declaration (co-gateway)
//! - `mintProgresseds` - target progress + secret (co-gateway)

mod mint_progressed;
mod stake_intent_confirmed;
mod stake_intent_declared;
mod stake_progressed;
mod stake_requested;

pub use mint_progressed::MintProgressedHandler;
pub use stake_intent_confirmed::StakeIntentConfirmedHandler;
pub use stake_intent_declared::StakeIntentDeclaredHandler;
pub use stake_progressed::StakeProgressedHandler;
pub use stake_requested::StakeRequestedHandler;
