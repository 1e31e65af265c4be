//! Integration tests: CSV files on disk through load, simulate,
//! summarize and export.

mod mock_oracle;
mod simulation;
