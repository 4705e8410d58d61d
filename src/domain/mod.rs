// Domain layer: records, statuses and the ports the remote system is reached through.

pub mod model;
pub mod ports;
