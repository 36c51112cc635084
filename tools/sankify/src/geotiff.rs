//! Single-band integer GeoTIFFs as class rasters.
//!
//! TIFF storage order: row 0 = northernmost (N→S).
//! ClassRaster storage order: row 0 = min_lat (S→N).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tiff::decoder::{Decoder, DecodingResult};

use sankee_core::coords::Bbox;
use sankee_core::raster::ClassRaster;
use sankee_core::ClassCode;

pub fn read_class_tiff(path: &Path, bbox: Bbox, nodata: Option<ClassCode>) -> Result<ClassRaster> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut decoder =
        Decoder::new(BufReader::new(file)).with_context(|| format!("Not a valid TIFF: {}", path.display()))?;
    let (width, height) = decoder
        .dimensions()
        .with_context(|| format!("Cannot read dimensions of {}", path.display()))?;

    let values: Vec<ClassCode> = match decoder
        .read_image()
        .with_context(|| format!("Cannot decode {}", path.display()))?
    {
        DecodingResult::U8(v) => v.into_iter().map(ClassCode::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(ClassCode::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(ClassCode::from).collect(),
        DecodingResult::I8(v) => v.into_iter().map(ClassCode::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(ClassCode::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(ClassCode::from).collect(),
        DecodingResult::I64(v) => v,
        _ => bail!("{}: unsupported pixel type; class rasters must hold integers", path.display()),
    };

    let raster = class_raster(&values, width as usize, height as usize, bbox, nodata)
        .with_context(|| format!("Bad raster layout in {}", path.display()))?;
    tracing::debug!(path = %path.display(), width, height, "decoded class raster");
    Ok(raster)
}

/// Build a raster from TIFF-ordered values, reversing rows and masking `nodata`.
pub fn class_raster(
    values: &[ClassCode],
    width: usize,
    height: usize,
    bbox: Bbox,
    nodata: Option<ClassCode>,
) -> Result<ClassRaster> {
    if width == 0 || height == 0 {
        bail!("zero-sized raster ({width}×{height})");
    }
    if values.len() != width * height {
        bail!(
            "expected {} single-band values for {width}×{height}, found {}",
            width * height,
            values.len()
        );
    }
    let mut raster = ClassRaster::new(width, height, bbox, None);
    for tiff_row in 0..height {
        let row = height - 1 - tiff_row;
        for col in 0..width {
            let v = values[tiff_row * width + col];
            raster.set(row, col, if Some(v) == nodata { None } else { Some(v) });
        }
    }
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{colortype, TiffEncoder};

    const BOX: Bbox = Bbox {
        min_lat: 10.0,
        max_lat: 12.0,
        min_lon: 20.0,
        max_lon: 21.0,
    };

    #[test]
    fn rows_reversed_and_nodata_masked() {
        // TIFF row 0 (north) = [1, 2], row 1 (south) = [3, 0]
        let r = class_raster(&[1, 2, 3, 0], 2, 2, BOX, Some(0)).unwrap();
        assert_eq!(r.get(0, 0), Some(3));
        assert_eq!(r.get(0, 1), None);
        assert_eq!(r.get(1, 0), Some(1));
        assert_eq!(r.get(1, 1), Some(2));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(class_raster(&[1, 2, 3], 2, 2, BOX, None).is_err());
        assert!(class_raster(&[], 0, 0, BOX, None).is_err());
    }

    #[test]
    fn reads_gray8_tiff() {
        let file = tempfile::NamedTempFile::new().unwrap();
        {
            let mut encoder = TiffEncoder::new(file.reopen().unwrap()).unwrap();
            encoder.write_image::<colortype::Gray8>(2, 2, &[41, 42, 82, 255]).unwrap();
        }
        let r = read_class_tiff(file.path(), BOX, Some(255)).unwrap();
        assert_eq!(r.width, 2);
        assert_eq!(r.height, 2);
        // South row comes from the last TIFF row.
        assert_eq!(r.get(0, 0), Some(82));
        assert_eq!(r.get(0, 1), None);
        assert_eq!(r.get(1, 1), Some(42));
    }

    #[test]
    fn missing_file_has_context() {
        let err = read_class_tiff(Path::new("/nonexistent/lc.tif"), BOX, None).unwrap_err();
        assert!(err.to_string().contains("Cannot open"));
    }
}
