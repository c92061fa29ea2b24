pub mod paths;
pub mod report_files;
