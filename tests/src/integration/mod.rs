//! Integration scenarios, one module per flow.

mod download_flow;
mod overflow_flow;
mod upload_flow;
