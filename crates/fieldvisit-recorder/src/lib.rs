//! Fieldvisit Recorder
//!
//! Turns a validated visit and its photos into files on disk plus one row in the
//! spreadsheet ledger.

pub mod ledger;
pub mod recorder;

pub use ledger::{Ledger, LedgerRow};
pub use recorder::{Receipt, SubmissionRecorder};
