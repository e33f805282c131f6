//! GeoTIFF reading/writing via the `tiff` crate.
//!
//! Whole-image, in-memory loads. Multi-band scenes are expected in the
//! default pixel-interleaved layout (PlanarConfiguration = 1). Writing
//! always produces a single-band 32-bit float GeoTIFF with minimal geo
//! tags (ModelPixelScale + ModelTiepoint + GeoKeyDirectory).

use crate::error::{Error, Result};
use crate::raster::{BandStack, GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Read a single-band GeoTIFF into a `Raster`.
///
/// Multi-band files are accepted; only the first band is returned.
/// Fails with `Error::Io` when the path does not exist and `Error::Tiff`
/// when the file cannot be decoded — callers are not expected to pre-check.
pub fn read_raster<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let mut decoder = open_decoder(path)?;
    let (rows, cols, samples) = dimensions(&mut decoder)?;

    let interleaved: Vec<T> = decode_samples(&mut decoder)?;
    expect_len(&interleaved, rows * cols * samples)?;

    // Keep the first sample of each pixel
    let data: Vec<T> = if samples == 1 {
        interleaved
    } else {
        interleaved.chunks(samples).map(|px| px[0]).collect()
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;
    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    Ok(raster)
}

/// Read a GeoTIFF into a `BandStack`, one band per sample.
pub fn read_stack<T, P>(path: P) -> Result<BandStack<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let mut decoder = open_decoder(path)?;
    let (rows, cols, samples) = dimensions(&mut decoder)?;

    let interleaved: Vec<T> = decode_samples(&mut decoder)?;
    expect_len(&interleaved, rows * cols * samples)?;

    // Deinterleave pixel-major samples into (band, row, col) order
    let mut planar = vec![T::zero(); interleaved.len()];
    let pixels = rows * cols;
    for (i, px) in interleaved.chunks(samples).enumerate() {
        for (b, &v) in px.iter().enumerate() {
            planar[b * pixels + i] = v;
        }
    }

    let mut stack = BandStack::from_vec(planar, samples, rows, cols)?;
    if let Ok(transform) = read_geotransform(&mut decoder) {
        stack.set_transform(transform);
    }
    Ok(stack)
}

/// Write a raster to a single-band GeoTIFF.
///
/// Cell values are converted to 32-bit float; the raster's geotransform
/// is written as ModelPixelScale + ModelTiepoint tags.
pub fn write_raster<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Tiff(format!("encoder: {}", e)))?;

    let (rows, cols) = raster.shape();
    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Tiff(format!("cannot create image: {}", e)))?;

    let gt = raster.transform();

    // The named Tag variants matter: the decoder keys its directory by
    // Tag::from_u16, so entries written as Tag::Unknown(33550) would not
    // be found again under ModelPixelScaleTag.
    let scale = vec![gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, scale.as_slice())
        .map_err(|e| Error::Tiff(format!("cannot write scale tag: {}", e)))?;

    let tiepoint = vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, tiepoint.as_slice())
        .map_err(|e| Error::Tiff(format!("cannot write tiepoint tag: {}", e)))?;

    // Minimal GeoKey directory: projected model, pixel-is-area
    let geokeys: Vec<u16> = vec![
        1, 1, 0, 2, //
        1024, 0, 1, 1, //
        1025, 0, 1, 1, //
    ];
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
        .map_err(|e| Error::Tiff(format!("cannot write geokey tag: {}", e)))?;

    image
        .write_data(&data)
        .map_err(|e| Error::Tiff(format!("cannot write image data: {}", e)))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_decoder<P: AsRef<Path>>(path: P) -> Result<Decoder<File>> {
    let file = File::open(path.as_ref())?;
    Decoder::new(file).map_err(|e| Error::Tiff(format!("decode: {}", e)))
}

fn dimensions(decoder: &mut Decoder<File>) -> Result<(usize, usize, usize)> {
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Tiff(format!("cannot read dimensions: {}", e)))?;

    let samples = match decoder.find_tag(Tag::SamplesPerPixel) {
        Ok(Some(v)) => v.into_u16().unwrap_or(1) as usize,
        _ => 1,
    };
    if samples == 0 {
        return Err(Error::UnsupportedDataType("zero samples per pixel".into()));
    }

    Ok((height as usize, width as usize, samples))
}

fn decode_samples<T: RasterElement>(decoder: &mut Decoder<File>) -> Result<Vec<T>> {
    let result = decoder
        .read_image()
        .map_err(|e| Error::Tiff(format!("cannot read image data: {}", e)))?;

    macro_rules! cast_buf {
        ($buf:expr) => {
            $buf.iter()
                .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
                .collect()
        };
    }

    Ok(match result {
        DecodingResult::U8(buf) => cast_buf!(buf),
        DecodingResult::U16(buf) => cast_buf!(buf),
        DecodingResult::U32(buf) => cast_buf!(buf),
        DecodingResult::I8(buf) => cast_buf!(buf),
        DecodingResult::I16(buf) => cast_buf!(buf),
        DecodingResult::I32(buf) => cast_buf!(buf),
        DecodingResult::F32(buf) => cast_buf!(buf),
        DecodingResult::F64(buf) => cast_buf!(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF pixel format".to_string(),
            ))
        }
    })
}

fn expect_len<T>(data: &[T], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(Error::Tiff(format!(
            "decoded {} samples, expected {}",
            data.len(),
            expected
        )));
    }
    Ok(())
}

/// Geotransform from ModelPixelScale + ModelTiepoint tags
fn read_geotransform(decoder: &mut Decoder<File>) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| Error::Tiff("no pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| Error::Tiff("no tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Tiff("cannot determine geotransform".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let result: Result<Raster<f64>> = read_raster("/nonexistent/scene.tif");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn write_read_roundtrip() {
        let dir = std::env::temp_dir().join("selvagis-io-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roundtrip.tif");

        let mut raster: Raster<f64> = Raster::new(3, 4);
        raster.set_transform(GeoTransform::new(500.0, 1000.0, 10.0, -10.0));
        for row in 0..3 {
            for col in 0..4 {
                raster.set(row, col, (row * 4 + col) as f64).unwrap();
            }
        }

        write_raster(&raster, &path).unwrap();
        let back: Raster<f64> = read_raster(&path).unwrap();

        assert_eq!(back.shape(), (3, 4));
        assert_eq!(back.get(2, 3).unwrap(), 11.0);
        assert!((back.transform().origin_x - 500.0).abs() < 1e-9);
        assert!((back.transform().origin_y - 1000.0).abs() < 1e-9);
        assert!((back.transform().pixel_width - 10.0).abs() < 1e-9);
        assert!((back.transform().pixel_height + 10.0).abs() < 1e-9);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn plain_tiff_without_geo_tags_gets_default_transform() {
        let dir = std::env::temp_dir().join("selvagis-io-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("plain.tif");

        // Encode directly, skipping the geo tags write_raster adds
        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<Gray32Float>(2, 2, &[1.0f32, 2.0, 3.0, 4.0])
            .unwrap();

        let back: Raster<f64> = read_raster(&path).unwrap();
        assert_eq!(back.get(1, 1).unwrap(), 4.0);
        assert_eq!(back.transform(), &GeoTransform::default());

        std::fs::remove_file(&path).ok();
    }
}
