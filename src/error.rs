use std::path::PathBuf;

use thiserror::Error;

use crate::translation::MemoryLayout;

/// Failures reported by the virtual memory engine. Both are raised before
/// any side effect on physical memory or the backing store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// Virtual address falls outside the configured address space
    #[error("virtual address {address} is outside the {width}-bit virtual space")]
    AddressOutOfRange { address: u64, width: u32 },

    /// The geometry cannot keep a full table path resident
    #[error("infeasible memory layout: {0}")]
    InfeasibleLayout(MemoryLayout),
}

/// Failures reported by the trace driver.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("trace line {line}: {message}")]
    Parse { line: usize, message: String },
}
