// Domain layer: configuration model and ports (interfaces).

pub mod model;
pub mod ports;
