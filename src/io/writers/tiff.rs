use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, ColorInterpretation};
use gdal::{Dataset, DriverManager};
use std::path::Path;

use crate::io::relief::ReliefError;

const RGBA: [ColorInterpretation; 4] = [
    ColorInterpretation::RedBand,
    ColorInterpretation::GreenBand,
    ColorInterpretation::BlueBand,
    ColorInterpretation::AlphaBand,
];

/// Create a 4-band 8-bit GeoTIFF from planar R, G, B, A buffers.
pub fn write_tiff_rgba_u8(
    output: &Path,
    cols: usize,
    rows: usize,
    bands: [&[u8]; 4],
    creation_options: &[String],
) -> Result<Dataset, ReliefError> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut options = CslStringList::new();
    for opt in creation_options {
        options.add_string(opt)?;
    }
    let ds = driver.create_with_band_type_with_options::<u8, _>(output, cols, rows, 4, &options)?;

    for (index, (data, interpretation)) in bands.into_iter().zip(RGBA).enumerate() {
        let mut band = ds.rasterband(index + 1)?;
        band.set_color_interpretation(interpretation)?;
        let mut buf = Buffer::new((cols, rows), data.to_vec());
        band.write((0, 0), (cols, rows), &mut buf)?;
    }

    Ok(ds)
}
