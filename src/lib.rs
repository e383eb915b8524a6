pub mod geom;
pub mod sim;

// Prelude
pub use geom::ray::Ray;
pub use geom::vector::{Vec3, eta_to_theta, theta_to_eta};
pub use sim::elements::{
    InactiveElement, Layer, Module, Orientation, ServiceCategory, Subdetector, Tracker,
};
pub use sim::materials::Material;
pub use sim::scan::{EtaScan, ScanConfig, ScanResult};
pub use sim::track::{Hit, HitKind, Track};
