//! Single-band GeoTIFF reading and writing
//!
//! Reads the geotransform from the ModelTransformation tag, or from the
//! ModelPixelScale + ModelTiepoint pair, and the no-data value from the
//! GDAL_NODATA tag. Samples of any numeric type are widened to `f64`.

use crate::app::models::GeoTransform;
use crate::error::{IndicatorError, Result};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;
use tracing::trace;

/// Contents of a single-band georeferenced raster
#[derive(Debug, Clone)]
pub struct GeoTiffRaster {
    pub grid: Array2<f64>,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
}

/// Read a single-band GeoTIFF
pub fn read_geotiff(path: &Path) -> Result<GeoTiffRaster> {
    let file = File::open(path)
        .map_err(|e| IndicatorError::io(format!("Failed to open {}", path.display()), e))?;

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| IndicatorError::tiff(path, e))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| IndicatorError::tiff(path, e))?;

    match decoder.colortype().map_err(|e| IndicatorError::tiff(path, e))? {
        ColorType::Gray(_) => {}
        other => {
            return Err(IndicatorError::raster_format(
                path,
                format!("expected a single band, found {:?}", other),
            ));
        }
    }

    let transform = read_geotransform(&mut decoder, path)?;
    let nodata = read_nodata(&mut decoder, path)?;

    let samples: Vec<f64> = match decoder
        .read_image()
        .map_err(|e| IndicatorError::tiff(path, e))?
    {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
    };

    let expected_len = width as usize * height as usize;
    if samples.len() != expected_len {
        return Err(IndicatorError::raster_format(
            path,
            format!(
                "data length mismatch: got {}, expected {}",
                samples.len(),
                expected_len
            ),
        ));
    }

    let grid = Array2::from_shape_vec((height as usize, width as usize), samples)
        .map_err(|e| IndicatorError::raster_format(path, e.to_string()))?;

    trace!(
        "Read {} ({}x{}, nodata {:?})",
        path.display(),
        width,
        height,
        nodata
    );

    Ok(GeoTiffRaster {
        grid,
        transform,
        nodata,
    })
}

fn read_geotransform<R>(decoder: &mut Decoder<R>, path: &Path) -> Result<GeoTransform>
where
    R: std::io::Read + std::io::Seek,
{
    if let Some(value) = decoder
        .find_tag(Tag::ModelTransformationTag)
        .map_err(|e| IndicatorError::tiff(path, e))?
    {
        let m = value
            .into_f64_vec()
            .map_err(|e| IndicatorError::tiff(path, e))?;
        if m.len() < 8 {
            return Err(IndicatorError::raster_format(
                path,
                "ModelTransformation tag holds fewer than 8 values",
            ));
        }
        return checked_transform(
            GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]),
            path,
        );
    }

    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)
        .map_err(|e| IndicatorError::tiff(path, e))?
        .ok_or_else(|| IndicatorError::raster_format(path, "missing ModelPixelScale tag"))?
        .into_f64_vec()
        .map_err(|e| IndicatorError::tiff(path, e))?;

    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)
        .map_err(|e| IndicatorError::tiff(path, e))?
        .ok_or_else(|| IndicatorError::raster_format(path, "missing ModelTiepoint tag"))?
        .into_f64_vec()
        .map_err(|e| IndicatorError::tiff(path, e))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(IndicatorError::raster_format(
            path,
            "incomplete ModelPixelScale or ModelTiepoint tag",
        ));
    }

    // Tiepoint maps raster (i, j) to model (x, y)
    let (pixel_width, pixel_height) = (scale[0], scale[1]);
    let origin_x = tiepoint[3] - tiepoint[0] * pixel_width;
    let origin_y = tiepoint[4] + tiepoint[1] * pixel_height;

    checked_transform(
        GeoTransform::north_up(origin_x, origin_y, pixel_width, -pixel_height),
        path,
    )
}

/// Reject transforms that cannot map coordinates to pixels
fn checked_transform(transform: GeoTransform, path: &Path) -> Result<GeoTransform> {
    let usable = |v: f64| v.is_finite() && v != 0.0;
    if !usable(transform.pixel_width) || !usable(transform.pixel_height) {
        return Err(IndicatorError::raster_format(
            path,
            format!(
                "unusable pixel size {} x {}",
                transform.pixel_width, transform.pixel_height
            ),
        ));
    }
    if !transform.origin_x.is_finite() || !transform.origin_y.is_finite() {
        return Err(IndicatorError::raster_format(path, "non-finite raster origin"));
    }
    Ok(transform)
}

fn read_nodata<R>(decoder: &mut Decoder<R>, path: &Path) -> Result<Option<f64>>
where
    R: std::io::Read + std::io::Seek,
{
    let Some(value) = decoder
        .find_tag(Tag::GdalNodata)
        .map_err(|e| IndicatorError::tiff(path, e))?
    else {
        return Ok(None);
    };

    let text = value
        .into_string()
        .map_err(|e| IndicatorError::tiff(path, e))?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());

    text.parse::<f64>().map(Some).map_err(|_| {
        IndicatorError::raster_format(path, format!("unparsable GDAL_NODATA value '{}'", text))
    })
}

/// Write a north-up single-band Float32 GeoTIFF
pub fn write_geotiff(
    path: &Path,
    grid: &Array2<f64>,
    transform: &GeoTransform,
    nodata: Option<f64>,
) -> Result<()> {
    let (height, width) = grid.dim();
    let file = File::create(path)
        .map_err(|e| IndicatorError::io(format!("Failed to create {}", path.display()), e))?;

    let mut encoder =
        TiffEncoder::new(BufWriter::new(file)).map_err(|e| IndicatorError::tiff(path, e))?;
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(width as u32, height as u32)
        .map_err(|e| IndicatorError::tiff(path, e))?;

    let pixel_scale = [transform.pixel_width, -transform.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];

    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &pixel_scale[..])
        .map_err(|e| IndicatorError::tiff(path, e))?;
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(|e| IndicatorError::tiff(path, e))?;
    if let Some(nodata) = nodata {
        image
            .encoder()
            .write_tag(Tag::GdalNodata, nodata.to_string().as_str())
            .map_err(|e| IndicatorError::tiff(path, e))?;
    }

    let samples: Vec<f32> = grid.iter().map(|&v| v as f32).collect();
    image
        .write_data(&samples)
        .map_err(|e| IndicatorError::tiff(path, e))?;

    Ok(())
}
