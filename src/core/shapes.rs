//! Shape recognition for air-drawn strokes
//!
//! Two classifiers share the `path -> shape` interface:
//! - `PointCountClassifier`: buckets strokes by point count only
//! - `GeometricClassifier`: circularity plus corner count of the simplified closed path

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::types::Point;

/// Shape labels a stroke can be classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Triangle,
    Square,
    Rectangle,
    Circle,
    Polygon,
    Unknown,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Polygon => "polygon",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which classifier a session should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierChoice {
    #[default]
    Geometric,
    PointCount,
}

impl ClassifierChoice {
    pub fn build(&self) -> Box<dyn ShapeClassifier> {
        match self {
            Self::Geometric => Box::new(GeometricClassifier::default()),
            Self::PointCount => Box::new(PointCountClassifier),
        }
    }
}

/// Maps a drawn path to a shape label
pub trait ShapeClassifier: Send + Sync + std::fmt::Debug {
    fn classify(&self, path: &[Point]) -> ShapeKind;
}

/// Buckets by number of sampled points: <10 unknown, <30 triangle, <50 square, else circle
#[derive(Debug, Clone, Copy, Default)]
pub struct PointCountClassifier;

impl ShapeClassifier for PointCountClassifier {
    fn classify(&self, path: &[Point]) -> ShapeKind {
        match path.len() {
            n if n < 10 => ShapeKind::Unknown,
            n if n < 30 => ShapeKind::Triangle,
            n if n < 50 => ShapeKind::Square,
            _ => ShapeKind::Circle,
        }
    }
}

/// Geometry-based recognition of closed strokes
#[derive(Debug, Clone, Copy)]
pub struct GeometricClassifier {
    /// Circularity above this reads as a circle
    pub circularity_threshold: f64,
    /// Simplification tolerance as a fraction of the bounding-box diagonal
    pub tolerance: f64,
}

impl Default for GeometricClassifier {
    fn default() -> Self {
        Self {
            circularity_threshold: 0.8,
            tolerance: 0.08,
        }
    }
}

impl ShapeClassifier for GeometricClassifier {
    fn classify(&self, path: &[Point]) -> ShapeKind {
        if path.len() < 3 {
            return ShapeKind::Unknown;
        }

        let (width, height) = extent(path);
        let diagonal = (width * width + height * height).sqrt();
        if diagonal < f64::EPSILON {
            return ShapeKind::Unknown;
        }
        let epsilon = self.tolerance * diagonal;
        let path = trim_overshoot(path, epsilon);

        let perimeter = closed_perimeter(path);
        let circularity = if perimeter > 0.0 {
            4.0 * PI * polygon_area(path) / (perimeter * perimeter)
        } else {
            0.0
        };
        if circularity > self.circularity_threshold {
            return ShapeKind::Circle;
        }

        match corner_count(path, epsilon) {
            3 => ShapeKind::Triangle,
            4 => {
                let aspect = if height > 0.0 { width / height } else { f64::INFINITY };
                if (0.6..1.4).contains(&aspect) && (width - height).abs() < 0.2 * width.max(height) {
                    ShapeKind::Square
                } else {
                    ShapeKind::Rectangle
                }
            }
            n if n > 4 => ShapeKind::Polygon,
            _ => ShapeKind::Unknown,
        }
    }
}

fn extent(path: &[Point]) -> (f64, f64) {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in path {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (max_x - min_x, max_y - min_y)
}

/// Shoelace area of the path closed back to its start
fn polygon_area(path: &[Point]) -> f64 {
    let n = path.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (path[i], path[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice.abs() / 2.0
}

fn closed_perimeter(path: &[Point]) -> f64 {
    let n = path.len();
    (0..n).map(|i| path[i].distance(&path[(i + 1) % n])).sum()
}

/// Distance from `p` to the segment `a`-`b`
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return p.distance(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Ramer-Douglas-Peucker simplification of an open polyline
fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let (first, last) = (points[0], points[points.len() - 1]);
    let mut split = 0;
    let mut max = 0.0;
    for (i, p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = segment_distance(*p, first, last);
        if d > max {
            split = i;
            max = d;
        }
    }
    if max > epsilon {
        let mut left = simplify(&points[..=split], epsilon);
        let right = simplify(&points[split..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn farthest_from_start(path: &[Point]) -> usize {
    let start = path[0];
    path.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| start.distance(a).total_cmp(&start.distance(b)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Cut a closed stroke at its last return to the start point
///
/// Hand-drawn strokes usually run a little past where they began. Open
/// strokes never come back within `epsilon` and are left whole.
fn trim_overshoot(path: &[Point], epsilon: f64) -> &[Point] {
    let start = path[0];
    let far = farthest_from_start(path);
    match (far + 1..path.len()).rev().find(|&i| path[i].distance(&start) <= epsilon) {
        Some(end) => &path[..=end],
        None => path,
    }
}

/// Number of corners of the closed stroke after simplification
fn corner_count(path: &[Point], epsilon: f64) -> usize {
    let start = path[0];
    let far = farthest_from_start(path);
    if far == 0 {
        return 0;
    }

    let mut ring = simplify(&path[..=far], epsilon);
    let mut back: Vec<Point> = path[far..].to_vec();
    back.push(start);
    let back = simplify(&back, epsilon);
    if back.len() > 2 {
        ring.extend_from_slice(&back[1..back.len() - 1]);
    }

    // The stroke may start mid-edge; drop vertices that sit on a straight run
    while ring.len() > 3 {
        let n = ring.len();
        let flat = (0..n).find(|&i| {
            segment_distance(ring[i], ring[(i + n - 1) % n], ring[(i + 1) % n]) < epsilon
        });
        match flat {
            Some(i) => {
                ring.remove(i);
            }
            None => break,
        }
    }
    ring.len()
}
