// Domain layer: conversation model, webhook payload shape and the ports the
// core depends on.

pub mod model;
pub mod ports;
