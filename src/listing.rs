pub mod date;
pub mod dialect;
pub mod future;
pub mod model;
pub mod venue;
