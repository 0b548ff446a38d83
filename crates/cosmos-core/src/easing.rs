//! Easing curves mapping linear progress in \[0, 1\] to eased progress.
//!
//! Names follow the GSAP vocabulary used when authoring timelines
//! (`"power3.out"`, `"sine.inOut"`, `"elastic.out(1, 0.8)"`, `"none"`).

use crate::error::CosmosError;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EaseKind {
    In,
    Out,
    InOut,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    /// `power1` (quadratic) through `power4` (quintic).
    Power(u8, EaseKind),
    Sine(EaseKind),
    ElasticOut {
        amplitude: f32,
        period: f32,
    },
    CubicBezier(f32, f32, f32, f32),
}

impl Default for Easing {
    fn default() -> Self {
        // GSAP's default tween ease
        Easing::Power(1, EaseKind::Out)
    }
}

impl Easing {
    pub const POWER2_OUT: Easing = Easing::Power(2, EaseKind::Out);
    pub const POWER3_OUT: Easing = Easing::Power(3, EaseKind::Out);
    pub const POWER3_IN: Easing = Easing::Power(3, EaseKind::In);
    pub const SINE_IN_OUT: Easing = Easing::Sine(EaseKind::InOut);

    pub fn apply(&self, t: f32) -> f32 {
        if !(t > 0.0) {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::Linear => t,
            Easing::Power(power, kind) => {
                let exp = (power.clamp(1, 4) + 1) as i32;
                with_kind(kind, t, |x| x.powi(exp))
            }
            Easing::Sine(kind) => with_kind(kind, t, |x| 1.0 - (x * FRAC_PI_2).cos()),
            Easing::ElasticOut { amplitude, period } => elastic_out(t, amplitude, period),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
        }
    }
}

/// Derive out/in-out variants from an ease-in curve.
#[inline]
fn with_kind(kind: EaseKind, t: f32, ease_in: impl Fn(f32) -> f32) -> f32 {
    match kind {
        EaseKind::In => ease_in(t),
        EaseKind::Out => 1.0 - ease_in(1.0 - t),
        EaseKind::InOut => {
            if t < 0.5 {
                ease_in(t * 2.0) / 2.0
            } else {
                1.0 - ease_in((1.0 - t) * 2.0) / 2.0
            }
        }
    }
}

fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    let a = amplitude.max(1.0);
    let p = if period > 0.0 { period } else { 0.3 } / amplitude.min(1.0).max(f32::EPSILON);
    let shift = p / TAU * (1.0 / a).asin();
    a * 2f32.powf(-10.0 * t) * ((t - shift) * TAU / p).sin() + 1.0
}

fn cubic_bezier(x: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let bez = |t: f32, p1: f32, p2: f32| {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    };
    let d_bez = |t: f32, p1: f32, p2: f32| {
        let u = 1.0 - t;
        3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    };
    // Newton first, bisection if the slope collapses.
    let mut t = x;
    for _ in 0..8 {
        let err = bez(t, x1, x2) - x;
        if err.abs() < 1e-6 {
            return bez(t, y1, y2);
        }
        let slope = d_bez(t, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        t = (t - err / slope).clamp(0.0, 1.0);
    }
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    t = x;
    for _ in 0..32 {
        let v = bez(t, x1, x2);
        if (v - x).abs() < 1e-6 {
            break;
        }
        if v < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    bez(t, y1, y2)
}

fn parse_args(s: &str) -> Option<Vec<f32>> {
    let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
    inner
        .split(',')
        .map(|v| v.trim().parse::<f32>().ok())
        .collect()
}

impl FromStr for Easing {
    type Err = CosmosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || CosmosError::UnknownEasing(s.to_string());
        let s_trim = s.trim();
        if matches!(s_trim, "none" | "linear") {
            return Ok(Easing::Linear);
        }
        if let Some(rest) = s_trim.strip_prefix("cubic-bezier") {
            return match parse_args(rest).as_deref() {
                Some([x1, y1, x2, y2]) => Ok(Easing::CubicBezier(*x1, *y1, *x2, *y2)),
                _ => Err(unknown()),
            };
        }
        let (name, args) = match s_trim.find('(') {
            Some(i) => (&s_trim[..i], Some(&s_trim[i..])),
            None => (s_trim, None),
        };
        let (family, kind) = match name.split_once('.') {
            Some((f, "in")) => (f, EaseKind::In),
            Some((f, "out")) => (f, EaseKind::Out),
            Some((f, "inOut")) => (f, EaseKind::InOut),
            Some(_) => return Err(unknown()),
            None => (name, EaseKind::Out),
        };
        match family {
            "power1" | "power2" | "power3" | "power4" => {
                let power = family[5..].parse::<u8>().map_err(|_| unknown())?;
                Ok(Easing::Power(power, kind))
            }
            "sine" => Ok(Easing::Sine(kind)),
            "elastic" if kind == EaseKind::Out => {
                let (amplitude, period) = match args.map(parse_args) {
                    None => (1.0, 0.3),
                    Some(Some(v)) if v.len() == 2 => (v[0], v[1]),
                    Some(Some(v)) if v.len() == 1 => (v[0], 0.3),
                    _ => return Err(unknown()),
                };
                Ok(Easing::ElasticOut { amplitude, period })
            }
            _ => Err(unknown()),
        }
    }
}

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn every_curve_pins_endpoints() {
        let curves = [
            Easing::Linear,
            Easing::Power(1, EaseKind::In),
            Easing::POWER2_OUT,
            Easing::Power(4, EaseKind::InOut),
            Easing::SINE_IN_OUT,
            Easing::ElasticOut {
                amplitude: 1.0,
                period: 0.8,
            },
            Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
        ];
        for c in curves {
            assert_eq!(c.apply(0.0), 0.0, "{c:?}");
            assert_eq!(c.apply(1.0), 1.0, "{c:?}");
            assert_eq!(c.apply(-3.0), 0.0, "{c:?}");
            assert_eq!(c.apply(7.0), 1.0, "{c:?}");
        }
    }

    #[test]
    fn power_out_is_fast_then_slow() {
        let e = Easing::POWER2_OUT;
        assert!(e.apply(0.5) > 0.5);
        assert!(approx_eq(e.apply(0.5), 1.0 - 0.5f32.powi(3)));
        assert!(Easing::POWER3_IN.apply(0.5) < 0.5);
    }

    #[test]
    fn in_out_is_symmetric() {
        let e = Easing::SINE_IN_OUT;
        assert!(approx_eq(e.apply(0.5), 0.5));
        assert!(approx_eq(e.apply(0.25) + e.apply(0.75), 1.0));
    }

    #[test]
    fn bezier_matches_linear_control_points() {
        let e = Easing::CubicBezier(1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0);
        for i in 1..10 {
            let t = i as f32 / 10.0;
            assert!(approx_eq(e.apply(t), t), "t={t}");
        }
    }

    #[test]
    fn parses_authoring_names() {
        assert_eq!("none".parse::<Easing>().unwrap(), Easing::Linear);
        assert_eq!("power3.out".parse::<Easing>().unwrap(), Easing::POWER3_OUT);
        assert_eq!("power3.in".parse::<Easing>().unwrap(), Easing::POWER3_IN);
        assert_eq!("sine.inOut".parse::<Easing>().unwrap(), Easing::SINE_IN_OUT);
        assert_eq!(
            "elastic.out(1, 0.8)".parse::<Easing>().unwrap(),
            Easing::ElasticOut {
                amplitude: 1.0,
                period: 0.8
            }
        );
        assert_eq!(
            "cubic-bezier(0.25, 0.1, 0.25, 1)".parse::<Easing>().unwrap(),
            Easing::CubicBezier(0.25, 0.1, 0.25, 1.0)
        );
        assert!("bounce.out".parse::<Easing>().is_err());
        assert!("power9.out".parse::<Easing>().is_err());
        assert!("sine.sideways".parse::<Easing>().is_err());
    }
}
