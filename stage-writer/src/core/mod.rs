/*!
Core modules for the staging writer
*/

pub mod config;
pub mod error;
pub mod report;
pub mod stager;
