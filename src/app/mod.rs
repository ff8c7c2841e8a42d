// Application layer: wires adapters into the orchestrator and renders results.

pub mod report_writer;
pub mod runner;
