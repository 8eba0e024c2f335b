pub mod all_cmd;
pub mod base_commands;
pub mod completions_cmd;
pub mod developers_cmd;
pub mod overview_cmd;
pub mod planning_cmd;
pub mod project_context;
pub mod reports_cmd;
pub mod starvation_cmd;
pub mod throughput_cmd;
