pub mod api;
pub mod bridge;
pub mod ds;
pub mod std_lib;
