// Domain layer: models, ports and the enrollment rules. Nothing here knows
// about files, logs or transports.

pub mod model;
pub mod ports;
pub mod rules;
