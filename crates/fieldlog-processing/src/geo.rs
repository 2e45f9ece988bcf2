//! Decimal degrees to degree/minute/second rationals.
//!
//! The EXIF GPS format stores coordinates as three unsigned rationals.
//! Float decomposition leaves binary noise in the seconds component, so each
//! value is collapsed to its best rational approximation under a denominator
//! cap (continued-fraction convergents plus the closing semiconvergent).

/// Denominator cap for rational approximation. Two-decimal seconds reduce
/// exactly within this bound.
const MAX_DENOMINATOR: u32 = 1_000_000;

/// An unsigned rational number, reduced to lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub fn new(num: u32, den: u32) -> Self {
        debug_assert!(den != 0);
        let g = gcd(num, den);
        Rational {
            num: num / g,
            den: den / g,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

/// Degrees, minutes, seconds as EXIF-ready rationals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmsRational {
    pub degrees: Rational,
    pub minutes: Rational,
    pub seconds: Rational,
}

impl DmsRational {
    /// Recombine to decimal degrees (magnitude only).
    pub fn to_decimal_degrees(self) -> f64 {
        self.degrees.to_f64() + self.minutes.to_f64() / 60.0 + self.seconds.to_f64() / 3600.0
    }
}

/// A coordinate magnitude plus its hemisphere reference letter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DmsCoordinate {
    pub dms: DmsRational,
    /// `N`/`S` for latitude, `E`/`W` for longitude.
    pub reference: char,
}

/// Coordinate axis, used to pick the hemisphere reference pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Encode decimal degrees into DMS rationals with a hemisphere reference.
///
/// Total over any finite float. Magnitudes outside the nominal axis range
/// are encoded arithmetically; range validation belongs to the caller.
pub fn encode(decimal_degrees: f64, axis: Axis) -> DmsCoordinate {
    let magnitude = decimal_degrees.abs();
    let degrees = magnitude.trunc();
    let minutes_float = (magnitude - degrees) * 60.0;
    let minutes = minutes_float.trunc();
    // Seconds carry the float noise; round to 2 decimals before approximating.
    let seconds = ((minutes_float - minutes) * 60.0 * 100.0).round() / 100.0;

    let reference = match (axis, decimal_degrees >= 0.0) {
        (Axis::Latitude, true) => 'N',
        (Axis::Latitude, false) => 'S',
        (Axis::Longitude, true) => 'E',
        (Axis::Longitude, false) => 'W',
    };

    DmsCoordinate {
        dms: DmsRational {
            degrees: best_rational(degrees, MAX_DENOMINATOR),
            minutes: best_rational(minutes, MAX_DENOMINATOR),
            seconds: best_rational(seconds, MAX_DENOMINATOR),
        },
        reference,
    }
}

/// Best rational approximation of a non-negative finite float with
/// denominator at most `max_denominator`.
///
/// Walks the continued-fraction convergents of `value`; when the next
/// convergent would overflow the cap, compares the last convergent against
/// the closing semiconvergent and returns whichever is nearer.
pub fn best_rational(value: f64, max_denominator: u32) -> Rational {
    debug_assert!(value.is_finite() && value >= 0.0);
    let max_den = u64::from(max_denominator.max(1));

    let (mut p0, mut q0) = (0u64, 1u64);
    let (mut p1, mut q1) = (1u64, 0u64);
    let mut x = value;

    for _ in 0..64 {
        let a = x.floor() as u64;
        let p2 = a * p1 + p0;
        let q2 = a * q1 + q0;

        if q2 > max_den {
            // Largest k with q0 + k*q1 <= max_den gives the semiconvergent.
            let k = (max_den - q0) / q1;
            let (ps, qs) = (p0 + k * p1, q0 + k * q1);
            let err_conv = (value - p1 as f64 / q1 as f64).abs();
            let err_semi = (value - ps as f64 / qs as f64).abs();
            return if err_semi < err_conv {
                Rational::new(ps as u32, qs as u32)
            } else {
                Rational::new(p1 as u32, q1 as u32)
            };
        }

        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;

        let frac = x - a as f64;
        if frac < 1e-12 {
            break;
        }
        x = 1.0 / frac;
    }

    Rational::new(p1 as u32, q1 as u32)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0.01 arc-second in decimal degrees
    const TOLERANCE: f64 = 0.01 / 3600.0;

    #[test]
    fn test_round_trip_within_hundredth_arcsecond() {
        let values = [
            0.0, 0.5, 1.0 / 3.0, 24.7136, 46.6753, -33.8688, 151.2093, -179.999, 180.0, 90.0,
            -90.0, 12.345678, 0.000123,
        ];
        for v in values {
            let encoded = encode(v, Axis::Latitude);
            let decoded = encoded.dms.to_decimal_degrees();
            assert!(
                (decoded - v.abs()).abs() < TOLERANCE,
                "value {} decoded to {}",
                v,
                decoded
            );
        }
    }

    #[test]
    fn test_round_trip_sweep() {
        let mut v = -180.0;
        while v <= 180.0 {
            let decoded = encode(v, Axis::Longitude).dms.to_decimal_degrees();
            assert!((decoded - v.abs()).abs() < TOLERANCE, "value {}", v);
            v += 0.73; // irregular step to avoid only hitting friendly floats
        }
    }

    #[test]
    fn test_hemisphere_references() {
        assert_eq!(encode(24.7, Axis::Latitude).reference, 'N');
        assert_eq!(encode(-24.7, Axis::Latitude).reference, 'S');
        assert_eq!(encode(46.6, Axis::Longitude).reference, 'E');
        assert_eq!(encode(-46.6, Axis::Longitude).reference, 'W');
        // Zero is conventionally N/E
        assert_eq!(encode(0.0, Axis::Latitude).reference, 'N');
        assert_eq!(encode(0.0, Axis::Longitude).reference, 'E');
    }

    #[test]
    fn test_minutes_and_seconds_in_range() {
        let mut v = 0.0;
        while v < 180.0 {
            let dms = encode(v, Axis::Longitude).dms;
            assert!(dms.minutes.to_f64() < 60.0, "value {}", v);
            assert!(dms.seconds.to_f64() <= 60.0, "value {}", v);
            v += 1.37;
        }
    }

    #[test]
    fn test_two_decimal_seconds_reduce_exactly() {
        // 24.7136 deg = 24 deg 42 min 48.96 sec; 48.96 = 1224/25
        let dms = encode(24.7136, Axis::Latitude).dms;
        assert_eq!(dms.degrees, Rational { num: 24, den: 1 });
        assert_eq!(dms.minutes, Rational { num: 42, den: 1 });
        assert_eq!(dms.seconds, Rational { num: 1224, den: 25 });
    }

    #[test]
    fn test_out_of_range_magnitude_is_accepted() {
        // Accepted arithmetically; validation is the caller's concern.
        let encoded = encode(200.0, Axis::Latitude);
        assert_eq!(encoded.dms.degrees, Rational { num: 200, den: 1 });
        assert_eq!(encoded.reference, 'N');
    }

    #[test]
    fn test_best_rational_integer() {
        assert_eq!(best_rational(42.0, 1_000_000), Rational { num: 42, den: 1 });
        assert_eq!(best_rational(0.0, 1_000_000), Rational { num: 0, den: 1 });
    }

    #[test]
    fn test_best_rational_respects_cap() {
        let r = best_rational(std::f64::consts::PI, 100);
        assert!(r.den <= 100);
        // 311/99 and 22/7 are the contenders; 311/99 is nearer.
        assert_eq!(r, Rational { num: 311, den: 99 });
    }

    #[test]
    fn test_best_rational_one_third() {
        let r = best_rational(1.0 / 3.0, 1_000_000);
        assert!((r.to_f64() - 1.0 / 3.0).abs() < 1e-9);
        assert!(r.den <= 1_000_000);
    }
}
