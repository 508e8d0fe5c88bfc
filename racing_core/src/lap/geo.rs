//! Geometry helpers for line-crossing detection (`spec.md` §4.6).
//!
//! Distances use a local equirectangular projection rather than full
//! great-circle segment math — accurate to well under a meter at the
//! sub-kilometer scale of start/finish and sector lines, and cheap enough
//! to run every GPS tick.

use racing_common::consts::EARTH_RADIUS_M;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A start/finish or sector line: two endpoints plus a detection radius and
/// optional required heading.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub p1: GeoPoint,
    pub p2: GeoPoint,
    pub radius_m: f64,
    pub required_heading_deg: Option<f64>,
    pub heading_tolerance_deg: f64,
}

/// Great-circle distance between two points, `spec.md` §4.6.
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

fn local_xy_m(origin: GeoPoint, p: GeoPoint) -> (f64, f64) {
    let x = (p.lon - origin.lon).to_radians() * EARTH_RADIUS_M * origin.lat.to_radians().cos();
    let y = (p.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
    (x, y)
}

/// Shortest distance from `p` to the line segment, in meters.
pub fn distance_to_line_m(p: GeoPoint, line: &Line) -> f64 {
    let (ax, ay) = (0.0, 0.0);
    let (bx, by) = local_xy_m(line.p1, line.p2);
    let (px, py) = local_xy_m(line.p1, p);

    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq < f64::EPSILON {
        0.0
    } else {
        ((px - ax) * dx + (py - ay) * dy) / len_sq
    }
    .clamp(0.0, 1.0);

    let cx = ax + t * dx;
    let cy = ay + t * dy;
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Initial bearing from `a` to `b`, in degrees `[0, 360)`.
pub fn bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlon = (b.lon - a.lon).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Smallest angular difference between two headings, in `[0, 180]`.
pub fn angular_diff_deg(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Hysteresis-on-entry crossing detector bound to one line.
#[derive(Debug, Clone, Copy)]
pub struct LineCrossingDetector {
    was_outside: bool,
}

impl Default for LineCrossingDetector {
    fn default() -> Self {
        Self { was_outside: true }
    }
}

impl LineCrossingDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one GPS sample against `line`. Returns `true` exactly on
    /// the tick the position enters the detection radius (with heading
    /// gate satisfied) having been outside it on the previous sample.
    pub fn update(&mut self, pos: GeoPoint, heading_deg: f64, line: &Line) -> bool {
        let distance = distance_to_line_m(pos, line);
        let inside = distance <= line.radius_m;
        let heading_ok = match line.required_heading_deg {
            None => true,
            Some(required) => angular_diff_deg(heading_deg, required) <= line.heading_tolerance_deg,
        };

        let crossed = inside && heading_ok && self.was_outside;
        self.was_outside = !inside;
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // Roughly one degree of latitude ~= 111 km.
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = haversine_distance_m(a, b);
        assert!((110_000.0..112_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn distance_to_line_is_zero_on_the_line() {
        let line = Line {
            p1: GeoPoint::new(0.0, 0.0),
            p2: GeoPoint::new(0.0, 0.001),
            radius_m: 15.0,
            required_heading_deg: None,
            heading_tolerance_deg: 0.0,
        };
        let midpoint = GeoPoint::new(0.0, 0.0005);
        assert!(distance_to_line_m(midpoint, &line) < 1.0);
    }

    #[test]
    fn crossing_requires_hysteresis_on_entry() {
        let line = Line {
            p1: GeoPoint::new(0.0, -0.0001),
            p2: GeoPoint::new(0.0, 0.0001),
            radius_m: 15.0,
            required_heading_deg: None,
            heading_tolerance_deg: 0.0,
        };
        let mut detector = LineCrossingDetector::new();
        let far = GeoPoint::new(0.01, 0.0);
        let near = GeoPoint::new(0.0, 0.0);

        assert!(!detector.update(far, 0.0, &line));
        assert!(detector.update(near, 0.0, &line));
        // Staying inside on the next sample must not re-fire.
        assert!(!detector.update(near, 0.0, &line));
    }

    #[test]
    fn heading_gate_blocks_crossing() {
        let line = Line {
            p1: GeoPoint::new(0.0, -0.0001),
            p2: GeoPoint::new(0.0, 0.0001),
            radius_m: 15.0,
            required_heading_deg: Some(90.0),
            heading_tolerance_deg: 10.0,
        };
        let mut detector = LineCrossingDetector::new();
        let far = GeoPoint::new(0.01, 0.0);
        let near = GeoPoint::new(0.0, 0.0);
        detector.update(far, 180.0, &line);
        assert!(!detector.update(near, 180.0, &line));
    }
}
