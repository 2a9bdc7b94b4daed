//! Encoded polyline codec (precision 1e5).
//!
//! Each coordinate is stored as the zig-zag encoded delta from the previous
//! one, split into 5-bit chunks, least significant first. Every chunk except
//! the last carries the `0x20` continuation bit, and `63` is added so the
//! output stays in printable ASCII.

use crate::constants::POLYLINE_PRECISION;
use crate::models::Waypoint;

/// Decodes an encoded polyline into its points.
///
/// The empty string decodes to an empty path. Input is assumed to come from
/// a trusted provider: a dangling half pair or an unterminated chunk at the
/// end is dropped rather than reported.
pub fn decode(encoded: &str) -> Vec<Waypoint> {
    deltas(encoded)
        .chunks_exact(2)
        .scan((0i64, 0i64), |(lat, lng), pair| {
            *lat = lat.wrapping_add(pair[0]);
            *lng = lng.wrapping_add(pair[1]);
            Some(Waypoint {
                lat: *lat as f64 / POLYLINE_PRECISION,
                lng: *lng as f64 / POLYLINE_PRECISION,
            })
        })
        .collect()
}

/// Encodes a path. Used to build fixtures and for symmetry with [`decode`].
pub fn encode(path: &[Waypoint]) -> String {
    path.iter()
        .map(|w| (scaled(w.lat), scaled(w.lng)))
        .scan((0i64, 0i64), |prev, (lat, lng)| {
            let delta = (lat - prev.0, lng - prev.1);
            *prev = (lat, lng);
            Some(delta)
        })
        .fold(String::new(), |mut out, (dlat, dlng)| {
            push_value(&mut out, dlat);
            push_value(&mut out, dlng);
            out
        })
}

/// Signed values in stream order (lat, lng, lat, lng, ...).
fn deltas(encoded: &str) -> Vec<i64> {
    let (values, _, _) = encoded.bytes().fold(
        (Vec::new(), 0i64, 0u32),
        |(mut values, acc, shift), byte| {
            let chunk = i64::from(byte.wrapping_sub(63));
            let acc = acc | (chunk & 0x1f).checked_shl(shift).unwrap_or(0);
            if chunk & 0x20 != 0 {
                (values, acc, shift.saturating_add(5))
            } else {
                values.push(unzigzag(acc));
                (values, 0, 0)
            }
        },
    );
    values
}

fn unzigzag(value: i64) -> i64 {
    if value & 1 != 0 {
        !(value >> 1)
    } else {
        value >> 1
    }
}

fn scaled(coordinate: f64) -> i64 {
    (coordinate * POLYLINE_PRECISION).round() as i64
}

fn push_value(out: &mut String, value: i64) {
    let mut v = ((value << 1) ^ (value >> 63)) as u64;
    while v >= 0x20 {
        out.push(char::from((0x20 | (v & 0x1f)) as u8 + 63));
        v >>= 5;
    }
    out.push(char::from(v as u8 + 63));
}
