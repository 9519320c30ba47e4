//! Ports - Traits at the boundary between the application and the outside world

pub mod outbound;
