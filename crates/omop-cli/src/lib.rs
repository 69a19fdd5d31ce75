//! Library side of the `omop` command: logging setup and pipeline stages.

pub mod logging;
pub mod pipeline;
