//! whateat core library — LINE webhook gateway, event routing, reply rules,
//! and the LINE and Places API clients used by the CLI.

pub mod answers;
pub mod channels;
pub mod config;
pub mod gateway;
pub mod places;
pub mod routing;
pub mod rules;
