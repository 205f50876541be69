#![doc = r###"
wxramp: color ramps for single-band weather rasters.

This crate turns grayscale rasters of physical quantities (temperature in °C,
wind speed in m/s, reflectivity in dBZ, ...) into 4-band RGBA GeoTIFFs for web
map rendering. Each variable is bound to a named color ramp in a YAML
catalogue; values are linearly interpolated between ramp breakpoints, no-data
pixels become fully transparent, and outputs are compressed, tiled and carry
an overview pyramid. It powers the `wxramp` CLI and can be embedded in your
own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- For the `gdal-tools` backend, `gdaldem` and `gdaladdo` on `PATH`.

Catalogue
---------
```yaml
models: [hrrr, gfs]
color_ramps:
  temperature:
    type: gradient
    colors:
      - { value: -40, color: "#1a0066" }
      - { value: 0,   color: "#00ff00" }
      - { value: 50,  color: "#ff0000" }
variables:
  temperature_2m:
    color_ramp: temperature
    units_display: "°C"
```

Quick start: colorize a directory
---------------------------------
```rust,no_run
use std::path::Path;
use wxramp::{BatchRunner, GdalBackend, RampConfig};

fn main() -> wxramp::Result<()> {
    let config = RampConfig::load("config/variables.yaml")?;
    let backend = GdalBackend;
    let report = BatchRunner::new(&config, &backend).run(
        Path::new("/data/hrrr"),
        Some(Path::new("/data/hrrr/colored")),
        None, // infer each variable from its filename
    )?;

    println!(
        "attempted={} succeeded={} failed={}",
        report.attempted, report.succeeded, report.failed
    );
    Ok(())
}
```

Look up colors directly
-----------------------
```rust
use wxramp::{RampConfig, RampTable, Rgb};

let config = RampConfig::from_yaml_str(r##"
color_ramps:
  temperature:
    colors:
      - { value: -40, color: "#1a0066" }
      - { value: 0, color: "#00ff00" }
variables:
  temperature_2m:
    color_ramp: temperature
"##).unwrap();

let table = RampTable::compile(config.ramp_for("temperature_2m").unwrap());
assert_eq!(table.color_at(-20.0), Rgb::new(13, 128, 51));
assert_eq!(table.color_at(-100.0), Rgb::new(0x1a, 0x00, 0x66));
```

Error handling
--------------
Public functions return `wxramp::Result<T>`. `Error::Config` is fatal; the
other variants describe per-file failures, which `BatchRunner` records in the
`BatchReport` instead of returning.

Useful modules
--------------
- [`api`]: batch runner and report types.
- [`core`]: catalogue, variable resolution, ramp tables, colorize/finish steps.
- [`io`]: raster backend traits and the GDAL implementations.
- [`types`]: shared enums and the `Rgb` color type.
- [`error`]: crate-level `Error` and `Result`.
"###]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
pub use self::core::config::{Breakpoint, RampConfig, RampDefinition, VariableEntry};
pub use self::core::params::ColorizeParams;
pub use self::core::processing::{Colorizer, OutputFinisher, OutputRaster};
pub use self::core::ramp::{RampTable, ReliefKey, ReliefRow, ReliefTable};
pub use self::core::resolver::VariableResolver;
pub use error::{Error, Result};
pub use types::{Backend, RampKind, Rgb, Stage};

// Backends
pub use io::{
    ColorRelief, GdalBackend, GdalRasterReader, GdalToolsBackend, OverviewBuilder, OverviewRequest,
    RasterBackend, RasterMetadata, ReliefError, ReliefRequest,
};

// High-level API re-exports
pub use api::{
    BatchReport, BatchRunner, FileOutcome, FileStatus, collect_inputs, colored_file_name,
    default_output_dir,
};
