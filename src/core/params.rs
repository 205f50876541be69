use serde::{Deserialize, Serialize};

/// Output encoding parameters shared by the colorize and finish steps.
/// Suitable for config files; `Default` matches the web-tile layout
/// (DEFLATE + horizontal predictor, 512px tiles, 2/4/8/16 overviews).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorizeParams {
    pub compression: String,
    /// GeoTIFF PREDICTOR (2 = horizontal differencing, suits 8-bit bands)
    pub predictor: u8,
    pub zlevel: u8,
    /// Square tile edge in pixels; 0 writes a striped file
    pub block_size: usize,
    /// GDAL NUM_THREADS value, e.g. "ALL_CPUS" or "4"
    pub num_threads: String,
    pub overview_resampling: String,
    /// Decimation factors; empty skips overview generation
    pub overview_factors: Vec<u32>,
}

impl Default for ColorizeParams {
    fn default() -> Self {
        Self {
            compression: "DEFLATE".to_string(),
            predictor: 2,
            zlevel: 6,
            block_size: 512,
            num_threads: "ALL_CPUS".to_string(),
            overview_resampling: "AVERAGE".to_string(),
            overview_factors: vec![2, 4, 8, 16],
        }
    }
}

impl ColorizeParams {
    /// GTiff creation options in `KEY=VALUE` form.
    pub fn creation_options(&self) -> Vec<String> {
        let mut options = vec![format!("COMPRESS={}", self.compression)];
        if self.predictor > 0 {
            options.push(format!("PREDICTOR={}", self.predictor));
        }
        if self.compression.eq_ignore_ascii_case("DEFLATE") {
            options.push(format!("ZLEVEL={}", self.zlevel));
        }
        if self.block_size > 0 {
            options.push("TILED=YES".to_string());
            options.push(format!("BLOCKXSIZE={}", self.block_size));
            options.push(format!("BLOCKYSIZE={}", self.block_size));
        }
        options.push(format!("NUM_THREADS={}", self.num_threads));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_creation_options() {
        assert_eq!(
            ColorizeParams::default().creation_options(),
            vec![
                "COMPRESS=DEFLATE",
                "PREDICTOR=2",
                "ZLEVEL=6",
                "TILED=YES",
                "BLOCKXSIZE=512",
                "BLOCKYSIZE=512",
                "NUM_THREADS=ALL_CPUS",
            ]
        );
    }

    #[test]
    fn striped_lzw_without_predictor() {
        let params = ColorizeParams {
            compression: "LZW".into(),
            predictor: 0,
            block_size: 0,
            ..Default::default()
        };
        assert_eq!(
            params.creation_options(),
            vec!["COMPRESS=LZW", "NUM_THREADS=ALL_CPUS"]
        );
    }

    #[test]
    fn partial_params_from_json() {
        let params: ColorizeParams =
            serde_json::from_str(r#"{"block_size": 256, "overview_factors": []}"#).unwrap();
        assert_eq!(params.block_size, 256);
        assert!(params.overview_factors.is_empty());
        assert_eq!(params.compression, "DEFLATE");
    }
}
