//! Minimal EXIF/TIFF serializer for the GPS IFD.
//!
//! Emits a self-contained little-endian TIFF block (`II*\0`) holding one
//! zeroth-IFD entry (the GPS IFD pointer) and a GPS IFD with version,
//! hemisphere references, and DMS rationals for latitude and longitude.
//! The block is spliced into a JPEG APP1 segment by the geotag writer.

use crate::geo::DmsCoordinate;

// TIFF field types
const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

// Tags
const TAG_GPS_IFD_POINTER: u16 = 0x8825;
const TAG_GPS_VERSION_ID: u16 = 0x0000;
const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
const TAG_GPS_LATITUDE: u16 = 0x0002;
const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
const TAG_GPS_LONGITUDE: u16 = 0x0004;

/// GPSVersionID 2.3.0.0
const GPS_VERSION: [u8; 4] = [2, 3, 0, 0];

const TIFF_HEADER_LEN: u32 = 8;
const IFD_ENTRY_LEN: u32 = 12;

/// Build the raw TIFF block carrying only a GPS IFD.
///
/// Layout: header, zeroth IFD (1 entry), GPS IFD (5 entries), then the
/// out-of-line rational arrays. All offsets are relative to the TIFF header
/// as the format requires.
pub fn build(latitude: &DmsCoordinate, longitude: &DmsCoordinate) -> Vec<u8> {
    // 1 entry + count + next-IFD pointer
    let ifd0_len = 2 + IFD_ENTRY_LEN + 4;
    let gps_ifd_offset = TIFF_HEADER_LEN + ifd0_len;
    // 5 entries + count + next-IFD pointer
    let gps_ifd_len = 2 + 5 * IFD_ENTRY_LEN + 4;
    let data_offset = gps_ifd_offset + gps_ifd_len;

    let mut out = Vec::with_capacity((data_offset + 48) as usize);

    // TIFF header: little-endian marker, magic, offset of zeroth IFD
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&TIFF_HEADER_LEN.to_le_bytes());

    // Zeroth IFD: single pointer entry to the GPS IFD
    out.extend_from_slice(&1u16.to_le_bytes());
    push_entry(&mut out, TAG_GPS_IFD_POINTER, TYPE_LONG, 1, gps_ifd_offset);
    out.extend_from_slice(&0u32.to_le_bytes());

    // GPS IFD; entries must be sorted by tag
    out.extend_from_slice(&5u16.to_le_bytes());
    push_entry_bytes(&mut out, TAG_GPS_VERSION_ID, TYPE_BYTE, &GPS_VERSION);
    push_entry_ref(&mut out, TAG_GPS_LATITUDE_REF, latitude.reference);
    push_entry(&mut out, TAG_GPS_LATITUDE, TYPE_RATIONAL, 3, data_offset);
    push_entry_ref(&mut out, TAG_GPS_LONGITUDE_REF, longitude.reference);
    push_entry(&mut out, TAG_GPS_LONGITUDE, TYPE_RATIONAL, 3, data_offset + 24);
    out.extend_from_slice(&0u32.to_le_bytes());

    // Out-of-line data: 3 rationals each, 8 bytes per rational
    push_rationals(&mut out, latitude);
    push_rationals(&mut out, longitude);

    out
}

fn push_entry(out: &mut Vec<u8>, tag: u16, field_type: u16, count: u32, value: u32) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&field_type.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&value.to_le_bytes());
}

/// Entry whose value fits in the 4-byte value slot (left-justified, zero padded).
fn push_entry_bytes(out: &mut Vec<u8>, tag: u16, field_type: u16, value: &[u8]) {
    debug_assert!(value.len() <= 4);
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&field_type.to_le_bytes());
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    let mut slot = [0u8; 4];
    slot[..value.len()].copy_from_slice(value);
    out.extend_from_slice(&slot);
}

/// Hemisphere reference: one ASCII char plus NUL terminator, inline.
fn push_entry_ref(out: &mut Vec<u8>, tag: u16, reference: char) {
    push_entry_bytes(out, tag, TYPE_ASCII, &[reference as u8, 0]);
}

fn push_rationals(out: &mut Vec<u8>, coord: &DmsCoordinate) {
    for r in [coord.dms.degrees, coord.dms.minutes, coord.dms.seconds] {
        out.extend_from_slice(&r.num.to_le_bytes());
        out.extend_from_slice(&r.den.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{encode, Axis};

    fn sample() -> Vec<u8> {
        let lat = encode(24.7136, Axis::Latitude);
        let lon = encode(46.6753, Axis::Longitude);
        build(&lat, &lon)
    }

    #[test]
    fn test_header_and_length() {
        let block = sample();
        assert_eq!(&block[0..4], b"II\x2a\x00");
        // header 8 + ifd0 18 + gps ifd 66 + 6 rationals * 8
        assert_eq!(block.len(), 8 + 18 + 66 + 48);
    }

    #[test]
    fn test_parses_back_with_exif_reader() {
        let block = sample();
        let exif = exif::Reader::new().read_raw(block).unwrap();

        let lat_ref = exif
            .get_field(exif::Tag::GPSLatitudeRef, exif::In::PRIMARY)
            .unwrap();
        assert_eq!(ascii_value(lat_ref), "N");

        let lat = exif
            .get_field(exif::Tag::GPSLatitude, exif::In::PRIMARY)
            .unwrap();
        match &lat.value {
            exif::Value::Rational(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0].num, 24);
                assert_eq!(parts[0].denom, 1);
                assert_eq!(parts[1].num, 42);
                assert_eq!(parts[1].denom, 1);
                assert_eq!(parts[2].num, 1224);
                assert_eq!(parts[2].denom, 25);
            }
            other => panic!("Expected rationals, got {:?}", other),
        }

        let lon_ref = exif
            .get_field(exif::Tag::GPSLongitudeRef, exif::In::PRIMARY)
            .unwrap();
        assert_eq!(ascii_value(lon_ref), "E");
    }

    fn ascii_value(field: &exif::Field) -> String {
        match &field.value {
            exif::Value::Ascii(parts) => String::from_utf8_lossy(&parts[0]).to_string(),
            other => panic!("Expected ASCII, got {:?}", other),
        }
    }

    #[test]
    fn test_version_marker() {
        let block = sample();
        let exif = exif::Reader::new().read_raw(block).unwrap();
        let version = exif
            .get_field(exif::Tag::GPSVersionID, exif::In::PRIMARY)
            .unwrap();
        match &version.value {
            exif::Value::Byte(bytes) => assert_eq!(bytes.as_slice(), &[2, 3, 0, 0]),
            other => panic!("Expected bytes, got {:?}", other),
        }
    }

    #[test]
    fn test_southern_western_references() {
        let lat = encode(-33.8688, Axis::Latitude);
        let lon = encode(-151.2093, Axis::Longitude);
        let block = build(&lat, &lon);
        let exif = exif::Reader::new().read_raw(block).unwrap();
        assert_eq!(
            ascii_value(
                exif.get_field(exif::Tag::GPSLatitudeRef, exif::In::PRIMARY)
                    .unwrap()
            ),
            "S"
        );
        assert_eq!(
            ascii_value(
                exif.get_field(exif::Tag::GPSLongitudeRef, exif::In::PRIMARY)
                    .unwrap()
            ),
            "W"
        );
    }
}
