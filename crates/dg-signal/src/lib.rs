//! dg-signal: the signal layer of the dynamic graph runtime.
//!
//! Provides:
//! - [`Signal`]: a named node producing a value on demand (constant or computed,
//!   cached by logical time)
//! - [`SignalLink`]: a rebindable input edge forwarding to a producer signal
//! - [`SignalBase`]: the type-erased view entities store and callers look up
//! - [`ValueRegistry`]: per-type stream casts for generic payload I/O
//!
//! Evaluation is a synchronous depth-first pull: asking a signal for time `t`
//! pulls its inputs at `t`, each of which is computed at most once for `t`.
//!
//! # Example
//!
//! ```
//! use dg_signal::{Signal, SignalLink};
//!
//! let position = Signal::computed("position", |t| Ok(t as f64 * 0.5));
//! let input = SignalLink::new("input");
//! input.bind(&position);
//!
//! let link = input.clone();
//! let doubled = Signal::computed("doubled", move |t| Ok(2.0 * link.get(t)?));
//! assert_eq!(doubled.get(4).unwrap(), 4.0);
//! ```

pub mod base;
pub mod link;
pub mod registry;
pub mod signal;

pub use base::SignalBase;
pub use link::SignalLink;
pub use registry::{TypeKey, ValueRegistry};
pub use signal::{ComputeFn, Signal};
