//! I/O layer: the raster backend capability traits, the in-process GDAL
//! backend, the GDAL command-line backend, and GeoTIFF writers.
pub mod relief;
pub use relief::{
    ColorRelief, OverviewBuilder, OverviewRequest, RasterBackend, ReliefError, ReliefRequest,
};

pub mod gdal;
pub use self::gdal::{GdalBackend, GdalRasterReader, RasterMetadata};

pub mod tools;
pub use tools::GdalToolsBackend;

pub mod writers;
