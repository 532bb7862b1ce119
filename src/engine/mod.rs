//! Settlement engine.
//!
//! [`RingSettler`] drives a ring through the whole pipeline in one call and
//! returns a [`crate::types::SettlementPlan`]. Use [`crate::ring::Ring`]
//! directly when the stages need to be run (or inspected) one at a time.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use alloy_primitives::{Address, U256};
//! use ring_settlement::context::{BalanceLedger, RingContext, StaticTokenRegistry};
//! use ring_settlement::engine::RingSettler;
//! use ring_settlement::types::OrderRecord;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ring_settlement::Result<()> {
//! let (t1, t2) = (Address::repeat_byte(0x01), Address::repeat_byte(0x02));
//! let (alice, bob) = (Address::repeat_byte(0xaa), Address::repeat_byte(0xbb));
//!
//! let ledger = Arc::new(BalanceLedger::new());
//! ledger.fund(t1, alice, U256::from(100u64)).await;
//! ledger.fund(t2, bob, U256::from(40u64)).await;
//! let registry = Arc::new(StaticTokenRegistry::new([t1, t2]));
//! let context = Arc::new(RingContext::new(ledger, registry, Address::repeat_byte(0xfe)));
//!
//! let settler = RingSettler::new(context, 20)?;
//! let plan = settler
//!     .settle(
//!         vec![
//!             OrderRecord::new(alice, t1, U256::from(100u64), U256::from(50u64), U256::ZERO),
//!             OrderRecord::new(bob, t2, U256::from(40u64), U256::from(20u64), U256::ZERO),
//!         ],
//!         alice,
//!         Address::repeat_byte(0xee),
//!     )
//!     .await?;
//!
//! assert_eq!(plan.fills.len(), 2);
//! assert!(!plan.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod settler;

pub use settler::RingSettler;
