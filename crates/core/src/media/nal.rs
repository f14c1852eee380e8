//! Annex B start-code scanning.
//!
//! Both H.264 and H.265 byte streams delimit NAL units with start codes:
//! - 4-byte: `0x00 0x00 0x00 0x01`
//! - 3-byte: `0x00 0x00 0x01`
//!
//! [`split_nal_units`] demuxes one camera frame into NAL units and
//! [`is_keyframe`] decides whether a frame lets a decoder start. Both work
//! on a single frame; nothing is carried over between calls.

use crate::config::Codec;

/// H.264 IDR slice (ITU-T H.264 Table 7-1).
const H264_NAL_IDR: u8 = 5;

/// H.265 IRAP types accepted as a stream start: BLA_W_LP (16) through
/// IDR_N_LP (20). CRA_NUT (21) is deliberately outside this range.
const HEVC_KEYFRAME_TYPES: std::ops::RangeInclusive<u8> = 16..=20;

/// Split an Annex B frame into NAL units, start codes removed.
///
/// Bytes before the first start code are returned as a unit of their own
/// when non-empty. Units are returned in input order and borrow from
/// `data`. Empty units (adjacent start codes, a start code at the very
/// end) are never emitted.
pub fn split_nal_units(data: &[u8]) -> Vec<&[u8]> {
    let mut nal_units = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i + 3 < data.len() {
        if data[i] == 0 && data[i + 1] == 0 {
            let code_len = if data[i + 2] == 1 {
                Some(3)
            } else if data[i + 2] == 0 && data[i + 3] == 1 {
                Some(4)
            } else {
                None
            };

            if let Some(code_len) = code_len {
                if i > start {
                    nal_units.push(&data[start..i]);
                }
                start = i + code_len;
                i += code_len;
                continue;
            }
        }
        i += 1;
    }

    if start < data.len() {
        nal_units.push(&data[start..]);
    }

    nal_units
}

/// Returns true when `data` contains a NAL unit a decoder can start from.
///
/// - H.264: a NAL header whose type (`header & 0x1F`) is 5 (IDR).
/// - H.265: a NAL header whose type (`(header >> 1) & 0x3F`) is in 16..=20.
/// - Any other codec: always true, so an unknown codec never stalls the
///   stream waiting for a keyframe it cannot recognize.
pub fn is_keyframe(data: &[u8], codec: &Codec) -> bool {
    match codec {
        Codec::H264 => nal_headers(data).any(|header| header & 0x1f == H264_NAL_IDR),
        Codec::Hevc => {
            nal_headers(data).any(|header| HEVC_KEYFRAME_TYPES.contains(&((header >> 1) & 0x3f)))
        }
        Codec::Other(_) => true,
    }
}

/// Iterate over the first header byte of every NAL unit reachable in `data`.
///
/// Only positions that leave at least four bytes after them are scanned,
/// so the header byte is always in bounds.
fn nal_headers(data: &[u8]) -> impl Iterator<Item = u8> + '_ {
    let mut i = 0usize;
    std::iter::from_fn(move || {
        while i + 4 < data.len() {
            if data[i] == 0 && data[i + 1] == 0 {
                if data[i + 2] == 1 {
                    let header = data[i + 3];
                    i += 3;
                    return Some(header);
                }
                if data[i + 2] == 0 && data[i + 3] == 1 {
                    let header = data[i + 4];
                    i += 4;
                    return Some(header);
                }
            }
            i += 1;
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- splitting ---

    #[test]
    fn split_single_nal_4byte_sc() {
        let data = [0, 0, 0, 1, 0x65, 0xAA, 0xBB];
        assert_eq!(split_nal_units(&data), vec![&[0x65, 0xAA, 0xBB][..]]);
    }

    #[test]
    fn split_single_nal_3byte_sc() {
        let data = [0, 0, 1, 0x67, 0x42, 0x11];
        assert_eq!(split_nal_units(&data), vec![&[0x67, 0x42, 0x11][..]]);
    }

    #[test]
    fn split_mixed_start_codes() {
        let mut data = vec![0, 0, 0, 1, 0x67, 0x42];
        data.extend_from_slice(&[0, 0, 1, 0x68, 0xCE]);
        data.extend_from_slice(&[0, 0, 0, 1, 0x65, 0x88, 0x84]);
        let nals = split_nal_units(&data);
        assert_eq!(nals.len(), 3);
        assert_eq!(nals[0], &[0x67, 0x42]);
        assert_eq!(nals[1], &[0x68, 0xCE]);
        assert_eq!(nals[2], &[0x65, 0x88, 0x84]);
    }

    #[test]
    fn split_leading_bytes_become_a_unit() {
        let data = [0xAA, 0xBB, 0, 0, 1, 0x41, 0x9A];
        let nals = split_nal_units(&data);
        assert_eq!(nals, vec![&[0xAA, 0xBB][..], &[0x41, 0x9A][..]]);
    }

    #[test]
    fn split_no_start_code_returns_whole_buffer() {
        assert_eq!(split_nal_units(&[0xFF, 0xFE]), vec![&[0xFF, 0xFE][..]]);
    }

    #[test]
    fn split_empty_data() {
        assert!(split_nal_units(&[]).is_empty());
    }

    #[test]
    fn split_never_emits_empty_units() {
        // Adjacent start codes and a bare trailing start code.
        let data = [0, 0, 0, 1, 0, 0, 1, 0x65, 0x01, 0, 0, 0, 1];
        let nals = split_nal_units(&data);
        assert!(nals.iter().all(|nal| !nal.is_empty()));
        assert_eq!(nals[0], &[0x65, 0x01]);
    }

    #[test]
    fn split_reconstructs_input() {
        let units: [&[u8]; 4] = [
            &[0x67, 0x42, 0xC0, 0x1F],
            &[0x68, 0xCE, 0x3C, 0x80],
            &[0x65, 0x88, 0x84, 0x21, 0x7F],
            &[0x41, 0x9A],
        ];
        for four_byte_mask in 0u8..16 {
            let mut frame = Vec::new();
            let mut codes = Vec::new();
            for (idx, unit) in units.iter().enumerate() {
                let code: &[u8] = if four_byte_mask & (1 << idx) != 0 {
                    &[0, 0, 0, 1]
                } else {
                    &[0, 0, 1]
                };
                codes.push(code);
                frame.extend_from_slice(code);
                frame.extend_from_slice(unit);
            }

            let nals = split_nal_units(&frame);
            assert_eq!(nals.len(), units.len());

            let mut rebuilt = Vec::new();
            for (code, nal) in codes.iter().zip(&nals) {
                rebuilt.extend_from_slice(code);
                rebuilt.extend_from_slice(nal);
            }
            assert_eq!(rebuilt, frame, "mask {four_byte_mask:#06b}");
        }
    }

    // --- H.264 keyframes ---

    #[test]
    fn h264_idr_3byte_sc() {
        assert!(is_keyframe(&[0, 0, 1, 0x05, 0x00], &Codec::H264));
    }

    #[test]
    fn h264_idr_4byte_sc() {
        assert!(is_keyframe(&[0, 0, 0, 1, 0x05, 0x00], &Codec::H264));
    }

    #[test]
    fn h264_idr_with_nri_bits() {
        assert!(is_keyframe(&[0, 0, 0, 1, 0x65, 0x88, 0x84], &Codec::H264));
    }

    #[test]
    fn h264_non_idr() {
        assert!(!is_keyframe(&[0, 0, 1, 0x01, 0x00], &Codec::H264));
        assert!(!is_keyframe(&[0, 0, 0, 1, 0x41, 0x9A], &Codec::H264));
    }

    #[test]
    fn h264_idr_after_parameter_sets() {
        let frame = [
            0, 0, 0, 1, 0x67, 0x42, 0, 0, 0, 1, 0x68, 0xCE, 0, 0, 0, 1, 0x65, 0x88,
        ];
        assert!(is_keyframe(&frame, &Codec::H264));
    }

    #[test]
    fn h264_short_data() {
        assert!(!is_keyframe(&[0, 0, 1], &Codec::H264));
        // A 3-byte code at the last scannable position is out of bounds.
        assert!(!is_keyframe(&[0, 0, 1, 0x65], &Codec::H264));
        assert!(is_keyframe(&[0, 0, 0, 1, 0x65], &Codec::H264));
        assert!(!is_keyframe(&[], &Codec::H264));
    }

    // --- H.265 keyframes ---

    #[test]
    fn hevc_idr_w_radl() {
        // 0x26 >> 1 = 19
        assert!(is_keyframe(&[0, 0, 1, 0x26, 0x01], &Codec::Hevc));
    }

    #[test]
    fn hevc_idr_n_lp() {
        // 0x28 >> 1 = 20
        assert!(is_keyframe(&[0, 0, 1, 0x28, 0x01], &Codec::Hevc));
    }

    #[test]
    fn hevc_bla_w_lp() {
        // 0x20 >> 1 = 16
        assert!(is_keyframe(&[0, 0, 0, 1, 0x20, 0x01], &Codec::Hevc));
    }

    #[test]
    fn hevc_cra_is_not_a_start() {
        // 0x2A >> 1 = 21
        assert!(!is_keyframe(&[0, 0, 0, 1, 0x2A, 0x01], &Codec::Hevc));
    }

    #[test]
    fn hevc_trail_r() {
        // 0x02 >> 1 = 1
        assert!(!is_keyframe(&[0, 0, 1, 0x02, 0x01], &Codec::Hevc));
    }

    #[test]
    fn hevc_idr_after_vps_sps_pps() {
        let frame = [
            0, 0, 0, 1, 0x40, 0x01, 0, 0, 0, 1, 0x42, 0x01, 0, 0, 0, 1, 0x44, 0x01, 0, 0, 0, 1,
            0x26, 0x01, 0xAF,
        ];
        assert!(is_keyframe(&frame, &Codec::Hevc));
    }

    #[test]
    fn unknown_codec_always_starts() {
        let codec = Codec::Other("mjpeg".into());
        assert!(is_keyframe(&[], &codec));
        assert!(is_keyframe(&[0xFF, 0xD8], &codec));
    }
}
