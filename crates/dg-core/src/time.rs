//! Logical time used to stamp signal caches.

/// Monotonically comparable index deciding whether a cached value is current.
///
/// Drivers usually advance it by one per control period.
pub type Time = i64;

/// Time stamp of a signal that has never been computed.
pub const NEVER: Time = Time::MIN;
