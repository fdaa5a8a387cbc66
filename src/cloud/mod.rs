mod bridge;
mod registry;
mod surface;
#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{ActiveSurface, CloudImportBridge};
pub use registry::CloudSourceRegistry;
pub use surface::{CloudImportRequest, SurfaceCatalog};
