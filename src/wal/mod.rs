//! Commit Log Module
//!
//! Durability for the record table through append-only frames.
//!
//! ## Responsibilities
//! - Append one frame per committed transaction
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery: replay frames, truncate a torn tail
//!
//! ## Frame Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Frame 1                                      │
//! │ ┌─────────┬─────────┬─────────┬───────────┐  │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ Payload   │  │
//! │ └─────────┴─────────┴─────────┴───────────┘  │
//! ├──────────────────────────────────────────────┤
//! │ Frame 2                                      │
//! │ ┌─────────┬─────────┬─────────┬───────────┐  │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ Payload   │  │
//! │ └─────────┴─────────┴─────────┴───────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Payload is bincode `{ timestamp, mutations }`. A frame is the unit of
//! atomicity: it is either fully present and checksummed, or discarded.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Mutation, WalEntry, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
