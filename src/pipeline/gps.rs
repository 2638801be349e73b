//! GPS position from an image's EXIF block.
//!
//! Phones stamp the capture position into EXIF. When it survives upload it
//! becomes a [`TrustedLocation`], which switches the orchestrator to the
//! trusted plan.

use crate::request::{ImagePayload, TrustedLocation};
use exif::{Exif, In, Reader, Tag, Value};
use std::io::Cursor;
use tracing::debug;

/// Read the GPS position embedded in `image`, if any.
///
/// Returns `None` for images without EXIF, without GPS tags, with a
/// malformed position, or with the all-zero position cameras write when they
/// have no fix. Missing metadata is the common case, so this never fails.
pub fn exif_gps_location(image: &ImagePayload) -> Option<TrustedLocation> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(&image.data[..])) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No EXIF metadata in {} image: {}", image.mime_type, e);
            return None;
        }
    };

    let latitude = coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
    if latitude == 0.0 && longitude == 0.0 {
        debug!("EXIF GPS position is 0, 0; treating as unset");
        return None;
    }

    match TrustedLocation::new(latitude, longitude) {
        Ok(location) => {
            debug!("EXIF GPS position: {}", location.coordinates());
            Some(location)
        }
        Err(e) => {
            debug!("Ignoring EXIF GPS position: {}", e);
            None
        }
    }
}

/// Degrees/minutes/seconds rationals plus a hemisphere reference to signed
/// decimal degrees.
fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        debug!("EXIF {} is not rational", value_tag);
        return None;
    };
    if parts.is_empty() {
        return None;
    }
    let degrees: f64 = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(part, divisor)| part.to_f64() / divisor)
        .sum();

    let hemisphere = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Ascii(values) => values.first().and_then(|v| v.first().copied()),
            _ => None,
        });
    match hemisphere {
        Some(h) if h.eq_ignore_ascii_case(&negative_ref) => Some(-degrees),
        _ => Some(degrees),
    }
}

#[cfg(test)]
mod fixtures {
    /// DMS value as three `(numerator, denominator)` rationals.
    pub type Dms = [(u32, u32); 3];

    /// A minimal JPEG (SOI, APP1 Exif, EOI) whose EXIF holds only a GPS IFD.
    pub fn gps_jpeg(latitude: Dms, lat_ref: u8, longitude: Dms, lon_ref: u8) -> Vec<u8> {
        const GPS_IFD: u32 = 26;
        const LAT_DATA: u32 = 80;
        const LON_DATA: u32 = 104;

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II*\0");
        tiff.extend_from_slice(&8u32.to_le_bytes());

        // IFD0: just the GPS pointer.
        tiff.extend_from_slice(&1u16.to_le_bytes());
        entry(&mut tiff, 0x8825, 4, 1, GPS_IFD);
        tiff.extend_from_slice(&0u32.to_le_bytes());

        // GPS IFD.
        tiff.extend_from_slice(&4u16.to_le_bytes());
        entry(&mut tiff, 0x0001, 2, 2, u32::from(lat_ref));
        entry(&mut tiff, 0x0002, 5, 3, LAT_DATA);
        entry(&mut tiff, 0x0003, 2, 2, u32::from(lon_ref));
        entry(&mut tiff, 0x0004, 5, 3, LON_DATA);
        tiff.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(tiff.len() as u32, LAT_DATA);

        for (num, denom) in latitude.into_iter().chain(longitude) {
            tiff.extend_from_slice(&num.to_le_bytes());
            tiff.extend_from_slice(&denom.to_le_bytes());
        }

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn entry(buf: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
        buf.extend_from_slice(&tag.to_le_bytes());
        buf.extend_from_slice(&kind.to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::gps_jpeg;
    use super::*;

    // 43° 8' 48.12" N, 4° 13' 55.92" W
    const LAT: [(u32, u32); 3] = [(43, 1), (8, 1), (4812, 100)];
    const LON: [(u32, u32); 3] = [(4, 1), (13, 1), (5592, 100)];

    fn jpeg(bytes: Vec<u8>) -> ImagePayload {
        ImagePayload::new(bytes, "image/jpeg")
    }

    #[test]
    fn reads_tagged_position() {
        let loc = exif_gps_location(&jpeg(gps_jpeg(LAT, b'N', LON, b'W'))).unwrap();
        assert!((loc.latitude - 43.1467).abs() < 1e-6, "{}", loc.latitude);
        assert!((loc.longitude + 4.2322).abs() < 1e-6, "{}", loc.longitude);
        assert_eq!(loc.label, None);
    }

    #[test]
    fn fixture_file_matches_builder() {
        let file = include_bytes!("../../tests/fixtures/gps_tagged.jpg");
        assert_eq!(file.to_vec(), gps_jpeg(LAT, b'N', LON, b'W'));
    }

    #[test]
    fn hemisphere_refs_set_the_sign() {
        let loc = exif_gps_location(&jpeg(gps_jpeg(LAT, b'S', LON, b'E'))).unwrap();
        assert!(loc.latitude < 0.0);
        assert!(loc.longitude > 0.0);
    }

    #[test]
    fn untagged_images_have_no_position() {
        let plain = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        assert_eq!(exif_gps_location(&jpeg(plain)), None);

        let png = ImagePayload::new(b"\x89PNG\r\n\x1a\n".to_vec(), "image/png");
        assert_eq!(exif_gps_location(&png), None);
    }

    #[test]
    fn zero_and_out_of_range_positions_are_ignored() {
        let zero = [(0, 1), (0, 1), (0, 1)];
        assert_eq!(exif_gps_location(&jpeg(gps_jpeg(zero, b'N', zero, b'E'))), None);

        let ninety_five = [(95, 1), (0, 1), (0, 1)];
        assert_eq!(
            exif_gps_location(&jpeg(gps_jpeg(ninety_five, b'N', LON, b'W'))),
            None
        );
    }
}
