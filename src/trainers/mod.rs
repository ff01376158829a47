//! Vendor-specific trainer control protocols
//!
//! Each vendor module follows the same contract: command encoders return the
//! exact bytes to write (first byte an opcode unless the vendor frames
//! differently), and response decoders take the raw notified bytes. Stateful
//! vendor quirks (unlock preconditions, brake settle intervals) live in
//! [`crate::control`], not here.

/// CycleOps/Saris control protocol
pub mod cycleops;
/// Elite control protocol
pub mod elite;
/// JetBlack FE-C-over-GATT pages
pub mod jetblack;
/// Kinetic Smart Control protocol and USB serial framing
pub mod kinetic;
/// Tacx ANT+ FE-C bridge framing
pub mod tacx;
/// Wahoo trainer control protocol
pub mod wahoo;
