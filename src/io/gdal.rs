use gdal::{Dataset, DatasetOptions, GdalOpenFlags, Metadata, config};
use ndarray::Array2;
use std::path::Path;
use tracing::debug;

use crate::io::relief::{
    ColorRelief, OverviewBuilder, OverviewRequest, RasterBackend, ReliefError, ReliefRequest,
};
use crate::io::writers::tiff::write_tiff_rgba_u8;

const NUM_THREADS_KEY: &str = "GDAL_NUM_THREADS";

/// Grid and georeferencing of a single-band input raster
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform, when the dataset declares one
    pub geotransform: Option<[f64; 6]>,
    /// Projection in WKT format (may be empty)
    pub projection: String,
    /// Declared no-data value of band 1
    pub no_data: Option<f64>,
}

/// Reader for GDAL-supported single-band rasters (GeoTIFF, COG, NetCDF slices, ...)
pub struct GdalRasterReader {
    pub dataset: Dataset,
    pub metadata: RasterMetadata,
}

impl GdalRasterReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReliefError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReliefError::MissingInput(path.to_path_buf()));
        }
        let dataset = Dataset::open(path)?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(ReliefError::Unsupported(format!(
                "{} has no raster bands",
                path.display()
            )));
        }
        let geotransform = dataset.geo_transform().ok();
        let projection = dataset.projection();
        let no_data = dataset.rasterband(1)?.no_data_value();
        Ok(GdalRasterReader {
            dataset,
            metadata: RasterMetadata {
                size_x,
                size_y,
                bands,
                geotransform,
                projection,
                no_data,
            },
        })
    }

    /// Read a band (1-based index) as an f64 array of shape (height, width)
    pub fn read_band(&self, index: usize) -> Result<Array2<f64>, ReliefError> {
        if index == 0 || index > self.metadata.bands {
            return Err(ReliefError::Unsupported(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, None)?;
        let data_vec = buf.data().to_vec();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(
            |_| {
                ReliefError::Unsupported(format!(
                    "band {} does not match {}x{}",
                    index, self.metadata.size_x, self.metadata.size_y
                ))
            },
        )
    }
}

/// In-process backend built on the GDAL library.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalBackend;

impl ColorRelief for GdalBackend {
    fn color_relief(&self, request: &ReliefRequest<'_>) -> Result<(), ReliefError> {
        let reader = GdalRasterReader::open(request.input)?;
        let meta = &reader.metadata;
        let data = reader.read_band(1)?;

        let pixels = meta.size_x * meta.size_y;
        let mut planes: [Vec<u8>; 4] = std::array::from_fn(|_| Vec::with_capacity(pixels));
        let mut transparent = 0usize;
        for &value in data.iter() {
            let rgba = request.table.rgba_for(value, meta.no_data);
            if rgba[3] == 0 {
                transparent += 1;
            }
            for (plane, channel) in planes.iter_mut().zip(rgba) {
                plane.push(channel);
            }
        }
        debug!(
            "color relief {}x{}: {} of {} pixels transparent (no-data={:?})",
            meta.size_x, meta.size_y, transparent, pixels, meta.no_data
        );

        let [red, green, blue, alpha] = &planes;
        let mut ds = write_tiff_rgba_u8(
            request.output,
            meta.size_x,
            meta.size_y,
            [red.as_slice(), green.as_slice(), blue.as_slice(), alpha.as_slice()],
            request.creation_options,
        )?;
        if let Some(gt) = meta.geotransform {
            ds.set_geo_transform(&gt)?;
        }
        if !meta.projection.is_empty() {
            ds.set_projection(&meta.projection)?;
        }
        for (key, value) in request.metadata {
            ds.set_metadata_item(key, value, "")?;
        }
        Ok(())
    }
}

impl OverviewBuilder for GdalBackend {
    fn build_overviews(&self, request: &OverviewRequest<'_>) -> Result<(), ReliefError> {
        let mut ds = Dataset::open_ex(
            request.path,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
                ..Default::default()
            },
        )?;
        let levels: Vec<i32> = request.factors.iter().map(|&f| f as i32).collect();

        // Scoped to this thread so concurrent builds keep their own setting.
        let previous = config::get_thread_local_config_option(NUM_THREADS_KEY, "")?;
        config::set_thread_local_config_option(NUM_THREADS_KEY, request.num_threads)?;
        debug!(
            "Building overviews {:?} ({}) with {}={}",
            levels, request.resampling, NUM_THREADS_KEY, request.num_threads
        );
        let built = ds.build_overviews(request.resampling, &levels, &[]);
        if previous.is_empty() {
            config::clear_thread_local_config_option(NUM_THREADS_KEY)?;
        } else {
            config::set_thread_local_config_option(NUM_THREADS_KEY, &previous)?;
        }
        built?;
        Ok(())
    }
}

impl RasterBackend for GdalBackend {
    fn name(&self) -> &'static str {
        "gdal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Breakpoint, RampDefinition};
    use crate::core::params::ColorizeParams;
    use crate::core::ramp::RampTable;
    use crate::types::{RampKind, Rgb};
    use gdal::DriverManager;
    use gdal::raster::{Buffer, ColorInterpretation};

    const NO_DATA: f64 = -9999.0;

    fn write_input(path: &Path) {
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut ds = driver
            .create_with_band_type::<f32, _>(path, 4, 2, 1)
            .unwrap();
        ds.set_geo_transform(&[-73.5, 0.25, 0.0, 45.0, 0.0, -0.25])
            .unwrap();
        let mut band = ds.rasterband(1).unwrap();
        band.set_no_data_value(Some(NO_DATA)).unwrap();
        let mut buf = Buffer::new(
            (4, 2),
            vec![-50.0, -40.0, -20.0, 0.0, 25.0, 50.0, NO_DATA as f32, 80.0],
        );
        band.write((0, 0), (4, 2), &mut buf).unwrap();
    }

    fn table() -> RampTable {
        let def = RampDefinition::new(
            "temperature",
            RampKind::Gradient,
            vec![
                Breakpoint::new(-40.0, Rgb::from_hex("#1a0066").unwrap()),
                Breakpoint::new(0.0, Rgb::from_hex("#00ff00").unwrap()),
                Breakpoint::new(50.0, Rgb::from_hex("#ff0000").unwrap()),
            ],
        )
        .unwrap();
        RampTable::compile(&def)
    }

    fn read_u8_band(ds: &Dataset, index: usize) -> Vec<u8> {
        let band = ds.rasterband(index).unwrap();
        band.read_as::<u8>((0, 0), (4, 2), (4, 2), None)
            .unwrap()
            .data()
            .to_vec()
    }

    #[test]
    fn colorizes_with_transparent_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("temperature_2m_hrrr.20260110.t00z.f00.tif");
        let output = dir.path().join("out.tif");
        write_input(&input);

        let relief = table().to_external_table();
        let options = vec!["COMPRESS=DEFLATE".to_string(), "PREDICTOR=2".to_string()];
        let metadata = vec![("WXRAMP_VARIABLE".to_string(), "temperature_2m".to_string())];
        GdalBackend
            .color_relief(&ReliefRequest {
                input: &input,
                output: &output,
                table: &relief,
                creation_options: &options,
                metadata: &metadata,
            })
            .unwrap();

        let ds = Dataset::open(&output).unwrap();
        assert_eq!(ds.raster_size(), (4, 2));
        assert_eq!(ds.raster_count() as usize, 4);
        assert_eq!(
            ds.geo_transform().unwrap(),
            [-73.5, 0.25, 0.0, 45.0, 0.0, -0.25]
        );
        assert_eq!(
            ds.rasterband(4).unwrap().color_interpretation(),
            ColorInterpretation::AlphaBand
        );
        assert_eq!(
            ds.metadata_item("WXRAMP_VARIABLE", "").as_deref(),
            Some("temperature_2m")
        );

        let red = read_u8_band(&ds, 1);
        let green = read_u8_band(&ds, 2);
        let alpha = read_u8_band(&ds, 4);
        assert_eq!(alpha, vec![255, 255, 255, 255, 255, 255, 0, 255]);
        assert_eq!(red[0], 0x1a); // clamped below
        assert_eq!(green[2], 128); // midpoint of first segment
        assert_eq!(red[7], 255); // clamped above
    }

    #[test]
    fn builds_overviews_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tif");
        let output = dir.path().join("out.tif");
        write_input(&input);
        let relief = table().to_external_table();
        GdalBackend
            .color_relief(&ReliefRequest {
                input: &input,
                output: &output,
                table: &relief,
                creation_options: &[],
                metadata: &[],
            })
            .unwrap();

        GdalBackend
            .build_overviews(&OverviewRequest {
                path: &output,
                resampling: "AVERAGE",
                factors: &[2],
                num_threads: "2",
            })
            .unwrap();
        let ds = Dataset::open(&output).unwrap();
        assert!(ds.rasterband(1).unwrap().overview_count().unwrap() >= 1);
        // the thread setting does not leak past the build
        assert_eq!(
            config::get_thread_local_config_option(NUM_THREADS_KEY, "unset").unwrap(),
            "unset"
        );
    }

    #[test]
    fn float32_sentinel_is_transparent() {
        // GRIB missing value; not representable as f32
        const GRIB_MISSING: f64 = 9.999e20;
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wind_speed_10m_gfs.20260110.t00z.f00.tif");
        let output = dir.path().join("out.tif");
        {
            let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
            let ds = driver
                .create_with_band_type::<f32, _>(&input, 3, 1, 1)
                .unwrap();
            let mut band = ds.rasterband(1).unwrap();
            band.set_no_data_value(Some(GRIB_MISSING)).unwrap();
            let mut buf = Buffer::new((3, 1), vec![GRIB_MISSING as f32, 0.0, 25.0]);
            band.write((0, 0), (3, 1), &mut buf).unwrap();
        }

        let relief = table().to_external_table();
        GdalBackend
            .color_relief(&ReliefRequest {
                input: &input,
                output: &output,
                table: &relief,
                creation_options: &[],
                metadata: &[],
            })
            .unwrap();

        let ds = Dataset::open(&output).unwrap();
        let alpha = ds
            .rasterband(4)
            .unwrap()
            .read_as::<u8>((0, 0), (3, 1), (3, 1), None)
            .unwrap()
            .data()
            .to_vec();
        assert_eq!(alpha, vec![0, 255, 255]);
    }

    #[test]
    fn reruns_with_default_options_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("temperature_2m_hrrr.20260110.t00z.f00.tif");
        write_input(&input);
        let relief = table().to_external_table();
        let params = ColorizeParams::default();
        let options = params.creation_options();
        let metadata = vec![("WXRAMP_RAMP".to_string(), "temperature".to_string())];

        let render = |output: &Path| -> Vec<u8> {
            GdalBackend
                .color_relief(&ReliefRequest {
                    input: &input,
                    output,
                    table: &relief,
                    creation_options: &options,
                    metadata: &metadata,
                })
                .unwrap();
            GdalBackend
                .build_overviews(&OverviewRequest {
                    path: output,
                    resampling: &params.overview_resampling,
                    factors: &[2],
                    num_threads: &params.num_threads,
                })
                .unwrap();
            std::fs::read(output).unwrap()
        };

        let first = render(&dir.path().join("a.tif"));
        let second = render(&dir.path().join("b.tif"));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let relief = table().to_external_table();
        let err = GdalBackend
            .color_relief(&ReliefRequest {
                input: &dir.path().join("absent.tif"),
                output: &dir.path().join("out.tif"),
                table: &relief,
                creation_options: &[],
                metadata: &[],
            })
            .unwrap_err();
        assert!(matches!(err, ReliefError::MissingInput(_)));
    }
}
