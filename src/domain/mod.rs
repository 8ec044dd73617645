// Domain layer: listing/search models and the ports the scanner talks through.

pub mod model;
pub mod ports;
