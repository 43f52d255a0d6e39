//! Redeem-and-unstake handler family (auxiliary to origin flow).
//!
//! Mirror of the stake family on the other side of the bridge: the
//! user's redeem request, the source-side declaration and progress on
//! the auxiliary co-gateway, and the target-side confirmation and
//! unstake on the origin gateway.
//!
//! # Handled Events
//!
//! - `redeemRequesteds` - redeem request occurrences (composer)
//! - `redeemIntentDeclareds` - source declaration (co-gateway)
//! - `redeemProgresseds` - source progress + secret (co-gateway)
//! - `redeemIntentConfirmeds` - target declaration (gateway)
//! - `unstakeProgresseds` - target progress + secret (gateway)

mod redeem_intent_confirmed;
mod redeem_intent_declared;
mod redeem_progressed;
mod redeem_requested;
mod unstake_progressed;

pub use redeem_intent_confirmed::RedeemIntentConfirmedHandler;
pub use redeem_intent_declared::RedeemIntentDeclaredHandler;
pub use redeem_progressed::RedeemProgressedHandler;
pub use redeem_requested::RedeemRequestedHandler;
pub use unstake_progressed::UnstakeProgressedHandler;
