pub mod backlog;
pub mod burndown;
pub mod data_source;
pub mod developer_load;
pub mod distribution;
pub mod lead_time;
pub mod pivotal_api;
pub mod pivotal_config;
pub mod planning_followup;
pub mod project_cache;
pub mod project_loader;
pub mod report_yaml;
pub mod starvation;
pub mod throughput;
pub mod time_windows;
pub mod velocity_calculation;
