//! GPS coordinates from photo EXIF metadata
//!
//! Works on any container `kamadak-exif` understands (JPEG, TIFF, HEIF,
//! PNG, WebP). Coordinates are stored as degree/minute/second rationals
//! with a hemisphere reference tag alongside.

use std::io::Cursor;

use exif::{Exif, In, Reader, Tag, Value};
use tracing::debug;

use core_kernel::GeoPoint;

/// Minutes and seconds divisors for the three DMS components
const DMS_DIVISION: [f64; 3] = [1.0, 60.0, 3600.0];

/// Reads the GPS position embedded in a photo
///
/// Returns `None` when the bytes carry no EXIF block, no GPS tags, or
/// coordinates outside the valid range.
pub fn read_gps(bytes: &[u8]) -> Option<GeoPoint> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(error = %e, "no readable EXIF block");
            return None;
        }
    };

    let latitude = coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    GeoPoint::new(latitude, longitude).ok()
}

fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let degrees = match &field.value {
        Value::Rational(parts) if parts.len() == 3 => parts
            .iter()
            .zip(DMS_DIVISION)
            .map(|(part, divisor)| part.to_f64() / divisor)
            .sum::<f64>(),
        _ => return None,
    };
    if !degrees.is_finite() {
        return None;
    }

    let negate = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Ascii(values) => values.first().and_then(|v| v.first().copied()),
            _ => None,
        })
        .is_some_and(|c| c.to_ascii_uppercase() == negative_ref);

    Some(if negate { -degrees } else { degrees })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, Rational};

    fn dms(value: f64) -> Vec<Rational> {
        let value = value.abs();
        let degrees = value.trunc();
        let minutes = ((value - degrees) * 60.0).trunc();
        let seconds = ((value - degrees) * 60.0 - minutes) * 60.0;
        vec![
            Rational { num: degrees as u32, denom: 1 },
            Rational { num: minutes as u32, denom: 1 },
            Rational { num: (seconds * 1000.0).round() as u32, denom: 1000 },
        ]
    }

    fn tiff_with_gps(lat: f64, lat_ref: &str, lon: f64, lon_ref: &str) -> Vec<u8> {
        let fields = [
            Field {
                tag: Tag::ImageDescription,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![b"evidence".to_vec()]),
            },
            Field {
                tag: Tag::GPSLatitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![lat_ref.as_bytes().to_vec()]),
            },
            Field { tag: Tag::GPSLatitude, ifd_num: In::PRIMARY, value: Value::Rational(dms(lat)) },
            Field {
                tag: Tag::GPSLongitudeRef,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![lon_ref.as_bytes().to_vec()]),
            },
            Field { tag: Tag::GPSLongitude, ifd_num: In::PRIMARY, value: Value::Rational(dms(lon)) },
        ];
        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_reads_northern_eastern_point() {
        let bytes = tiff_with_gps(18.5204, "N", 73.8567, "E");
        let point = read_gps(&bytes).unwrap();
        assert!((point.latitude - 18.5204).abs() < 1e-4);
        assert!((point.longitude - 73.8567).abs() < 1e-4);
    }

    #[test]
    fn test_south_and_west_negate() {
        let bytes = tiff_with_gps(33.8688, "S", 70.6693, "W");
        let point = read_gps(&bytes).unwrap();
        assert!(point.latitude < 0.0);
        assert!(point.longitude < 0.0);
    }

    #[test]
    fn test_no_exif_is_none() {
        assert!(read_gps(b"definitely not an image").is_none());
        assert!(read_gps(&[]).is_none());
    }
}
