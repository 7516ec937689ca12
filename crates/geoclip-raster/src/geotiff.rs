//! GeoTIFF reading and writing
//!
//! Pure Rust on top of the `tiff` crate. Georeferencing is carried by the
//! standard GeoTIFF tags: ModelPixelScale + ModelTiepoint (or
//! ModelTransformation for rotated grids), the GeoKey directory for the
//! EPSG code, and the GDAL no-data tag.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::Path;

use geoclip_core::error::{GeoclipError, Result};
use geoclip_core::models::Crs;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tiff::ColorType;

use crate::models::{Affine, Raster, SampleType};

const FORMAT: &str = "GeoTIFF";

// GeoTIFF tag ids
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;

// GeoKey ids
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

fn tiff_error(context: &str, err: tiff::TiffError) -> GeoclipError {
    GeoclipError::format(FORMAT, format!("{}: {}", context, err))
}

/// Read the first image of a GeoTIFF
pub fn read_geotiff(path: &Path) -> Result<Raster> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| tiff_error("Failed to open", e))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().map_err(|e| tiff_error("Failed to read dimensions", e))?;

    let planar: Option<u16> = decoder
        .find_tag_unsigned(Tag::PlanarConfiguration)
        .map_err(|e| tiff_error("Failed to read PlanarConfiguration", e))?;
    if planar == Some(2) {
        return Err(GeoclipError::format(FORMAT, "Band-separate (planar) layout is not supported"));
    }

    let colortype = decoder.colortype().map_err(|e| tiff_error("Failed to read color type", e))?;
    let bands = samples_per_pixel(colortype)?;

    let transform = read_transform(&mut decoder)?;
    let geo_keys = read_geo_keys(&mut decoder)?;
    let transform = if geo_keys.get(&GT_RASTER_TYPE_GEO_KEY) == Some(&RASTER_PIXEL_IS_POINT) {
        // Tiepoints address pixel centers; shift to the corner convention
        Affine {
            c: transform.c - 0.5 * (transform.a + transform.b),
            f: transform.f - 0.5 * (transform.d + transform.e),
            ..transform
        }
    } else {
        transform
    };
    let crs = crs_from_geo_keys(&geo_keys, path);
    let nodata = read_nodata(&mut decoder)?;

    let image = decoder.read_image().map_err(|e| tiff_error("Failed to decode image", e))?;
    let (sample_type, data) = decoded_samples(image);

    tracing::debug!(
        "Read {}: {}x{} px, {} band(s), {}, crs {}",
        path.display(),
        width,
        height,
        bands,
        sample_type,
        crs.as_ref().map(Crs::label).unwrap_or_else(|| "unknown".to_string())
    );

    Raster::new(bands, width as usize, height as usize, sample_type, data, transform, crs, nodata)
        .map_err(|e| GeoclipError::format(FORMAT, format!("{}: {}", path.display(), e)))
}

fn samples_per_pixel(colortype: ColorType) -> Result<usize> {
    match colortype {
        ColorType::Gray(_) | ColorType::Palette(_) => Ok(1),
        ColorType::GrayA(_) => Ok(2),
        ColorType::RGB(_) | ColorType::YCbCr(_) => Ok(3),
        ColorType::RGBA(_) | ColorType::CMYK(_) => Ok(4),
        ColorType::CMYKA(_) => Ok(5),
        ColorType::Multiband { num_samples, .. } => Ok(num_samples as usize),
        other => Err(GeoclipError::format(FORMAT, format!("Unsupported color type {:?}", other))),
    }
}

fn decoded_samples(image: DecodingResult) -> (SampleType, Vec<f64>) {
    match image {
        DecodingResult::U8(v) => (SampleType::U8, v.into_iter().map(f64::from).collect()),
        DecodingResult::I8(v) => (SampleType::I8, v.into_iter().map(f64::from).collect()),
        DecodingResult::U16(v) => (SampleType::U16, v.into_iter().map(f64::from).collect()),
        DecodingResult::I16(v) => (SampleType::I16, v.into_iter().map(f64::from).collect()),
        DecodingResult::U32(v) => (SampleType::U32, v.into_iter().map(f64::from).collect()),
        DecodingResult::I32(v) => (SampleType::I32, v.into_iter().map(f64::from).collect()),
        DecodingResult::U64(v) => (SampleType::U64, v.into_iter().map(|s| s as f64).collect()),
        DecodingResult::I64(v) => (SampleType::I64, v.into_iter().map(|s| s as f64).collect()),
        DecodingResult::F16(v) => (SampleType::F32, v.into_iter().map(|s| s.to_f64()).collect()),
        DecodingResult::F32(v) => (SampleType::F32, v.into_iter().map(f64::from).collect()),
        DecodingResult::F64(v) => (SampleType::F64, v),
    }
}

fn read_f64_tag<R: std::io::Read + Seek>(decoder: &mut Decoder<R>, tag: u16) -> Result<Option<Vec<f64>>> {
    match decoder.find_tag(Tag::Unknown(tag)).map_err(|e| tiff_error("Failed to read tag", e))? {
        Some(value) => value
            .into_f64_vec()
            .map(Some)
            .map_err(|e| tiff_error(&format!("Tag {} is not a list of doubles", tag), e)),
        None => Ok(None),
    }
}

fn read_transform<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Result<Affine> {
    if let Some(m) = read_f64_tag(decoder, MODEL_TRANSFORMATION)? {
        if m.len() >= 8 {
            return Ok(Affine::new(m[0], m[1], m[3], m[4], m[5], m[7]));
        }
    }

    let scale = read_f64_tag(decoder, MODEL_PIXEL_SCALE)?;
    let tiepoint = read_f64_tag(decoder, MODEL_TIEPOINT)?;

    match (scale, tiepoint) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => {
            let (sx, sy) = (s[0], s[1]);
            let (i, j, x, y) = (t[0], t[1], t[3], t[4]);
            Ok(Affine::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy))
        }
        _ => Err(GeoclipError::format(FORMAT, "Raster has no georeferencing (pixel scale/tiepoint or transformation)")),
    }
}

fn read_geo_keys<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Result<HashMap<u16, u16>> {
    let Some(value) = decoder
        .find_tag(Tag::Unknown(GEO_KEY_DIRECTORY))
        .map_err(|e| tiff_error("Failed to read GeoKeyDirectory", e))?
    else {
        return Ok(HashMap::new());
    };

    let directory = value.into_u16_vec().map_err(|e| tiff_error("Malformed GeoKeyDirectory", e))?;

    // Header: version, revision, minor, key count; then 4 shorts per key.
    // Only keys stored inline (location 0) are of interest here.
    Ok(directory
        .get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
        .collect())
}

fn crs_from_geo_keys(keys: &HashMap<u16, u16>, path: &Path) -> Option<Crs> {
    let code = [PROJECTED_CS_TYPE_GEO_KEY, GEOGRAPHIC_TYPE_GEO_KEY]
        .iter()
        .find_map(|key| keys.get(key).copied().filter(|code| *code != 0))?;

    if code == USER_DEFINED {
        tracing::warn!("{} uses a user-defined CRS that cannot be resolved", path.display());
        return None;
    }

    Some(Crs::from_epsg(u32::from(code)))
}

fn read_nodata<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>> {
    let Some(value) = decoder
        .find_tag(Tag::GdalNodata)
        .map_err(|e| tiff_error("Failed to read GDAL_NODATA", e))?
    else {
        return Ok(None);
    };

    let text = value.into_string().map_err(|e| tiff_error("Malformed GDAL_NODATA", e))?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());

    match text.parse::<f64>() {
        Ok(nodata) => Ok(Some(nodata)),
        Err(_) => {
            tracing::warn!("Ignoring unparseable no-data value '{}'", text);
            Ok(None)
        }
    }
}

/// Write `raster` as a single-strip, uncompressed GeoTIFF
pub fn write_geotiff(raster: &Raster, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let encoder = TiffEncoder::new(BufWriter::new(file)).map_err(|e| tiff_error("Failed to create encoder", e))?;
    write_image(raster, encoder).map_err(|e| tiff_error(&format!("Failed to write {}", path.display()), e))?;

    tracing::debug!(
        "Wrote {}: {}x{} px, {} band(s)",
        path.display(),
        raster.width(),
        raster.height(),
        raster.bands()
    );
    Ok(())
}

fn write_image<W: Write + Seek>(raster: &Raster, mut encoder: TiffEncoder<W>) -> tiff::TiffResult<()> {
    let bands = raster.bands();
    let sample_type = raster.sample_type();
    let mut dir = encoder.image_directory()?;

    dir.write_tag(Tag::ImageWidth, raster.width() as u32)?;
    dir.write_tag(Tag::ImageLength, raster.height() as u32)?;
    dir.write_tag(Tag::BitsPerSample, vec![sample_type.bits(); bands].as_slice())?;
    dir.write_tag(Tag::Compression, 1u16)?;
    dir.write_tag(Tag::PhotometricInterpretation, 1u16)?;
    dir.write_tag(Tag::SamplesPerPixel, bands as u16)?;
    dir.write_tag(Tag::SampleFormat, vec![sample_type.sample_format(); bands].as_slice())?;
    dir.write_tag(Tag::PlanarConfiguration, 1u16)?;
    dir.write_tag(Tag::RowsPerStrip, raster.height() as u32)?;
    if bands > 1 {
        dir.write_tag(Tag::ExtraSamples, vec![0u16; bands - 1].as_slice())?;
    }

    write_geotiff_tags(raster, &mut dir)?;

    if let Some(nodata) = raster.nodata() {
        dir.write_tag(Tag::GdalNodata, format!("{}", nodata).as_str())?;
    }

    let samples = raster.data();
    let offset = match sample_type {
        SampleType::U8 => dir.write_data(cast(samples, |v| v as u8).as_slice())?,
        SampleType::I8 => dir.write_data(cast(samples, |v| v as i8).as_slice())?,
        SampleType::U16 => dir.write_data(cast(samples, |v| v as u16).as_slice())?,
        SampleType::I16 => dir.write_data(cast(samples, |v| v as i16).as_slice())?,
        SampleType::U32 => dir.write_data(cast(samples, |v| v as u32).as_slice())?,
        SampleType::I32 => dir.write_data(cast(samples, |v| v as i32).as_slice())?,
        SampleType::U64 => dir.write_data(cast(samples, |v| v as u64).as_slice())?,
        SampleType::I64 => dir.write_data(cast(samples, |v| v as i64).as_slice())?,
        SampleType::F32 => dir.write_data(cast(samples, |v| v as f32).as_slice())?,
        SampleType::F64 => dir.write_data(samples)?,
    };
    let byte_count = samples.len() as u64 * u64::from(sample_type.bits() / 8);

    dir.write_tag(Tag::StripOffsets, offset as u32)?;
    dir.write_tag(Tag::StripByteCounts, byte_count as u32)?;
    dir.finish()
}

fn cast<T>(samples: &[f64], f: impl Fn(f64) -> T) -> Vec<T> {
    samples.iter().map(|v| f(*v)).collect()
}

fn write_geotiff_tags<W: Write + Seek, K: TiffKind>(
    raster: &Raster,
    dir: &mut DirectoryEncoder<'_, W, K>,
) -> tiff::TiffResult<()> {
    let t = raster.transform();

    if t.is_rotated() {
        let matrix = [t.a, t.b, 0.0, t.c, t.d, t.e, 0.0, t.f, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), matrix.as_slice())?;
    } else {
        let pixel_scale = [t.a, -t.e, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;

        // Ties pixel (0, 0) to the top-left corner
        let tiepoint = [0.0, 0.0, 0.0, t.c, t.f, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())?;
    }

    let geokeys = build_geokey_directory(raster.crs());
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys.as_slice())?;
    Ok(())
}

fn build_geokey_directory(crs: Option<&Crs>) -> Vec<u16> {
    let code = crs.and_then(|c| c.epsg).and_then(|code| u16::try_from(code).ok());
    if code.is_none() {
        if let Some(crs) = crs {
            tracing::warn!("CRS {} has no EPSG code; GeoTIFF written without CRS keys", crs.label());
        }
    }

    let mut entries: Vec<[u16; 4]> = Vec::new();
    match code {
        Some(code) if is_geographic(code) => {
            entries.push([GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            entries.push([GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, code]);
        }
        Some(code) => {
            entries.push([GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_PROJECTED]);
            entries.push([GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([PROJECTED_CS_TYPE_GEO_KEY, 0, 1, code]);
        }
        None => entries.push([GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]),
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}

/// EPSG geographic 2D systems live in the 4000 range
fn is_geographic(code: u16) -> bool {
    (4000..5000).contains(&code)
}
