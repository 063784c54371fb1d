//! Exact shape-pair intersection.
//!
//! [`collide`] dispatches on the canonical kind order (`Circle < Polygon`) and
//! returns up to [`MAX_CONTACTS`] points. Normals always point from the first
//! operand toward the second, so swapping the operands negates every normal and
//! leaves positions unchanged. Polygon contacts sit midway between the two
//! surfaces and are ordered by position, so the result does not depend on which
//! polygon supplied the reference face.

use smallvec::SmallVec;

use crate::fixed_math::{FixedNum, FixedVec2};
use crate::shape::{closest_on_segment, Axis, Circle, Polygon, Shape, ShapeGeometry};

pub const MAX_CONTACTS: usize = 2;

/// Bias toward the first polygon as reference so the choice does not flip
/// between ticks on near-equal separations.
const REFERENCE_TOLERANCE: FixedNum = FixedNum::from_bits(64);

/// One world-space contact point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContactPoint {
    pub position: FixedVec2,
    /// Unit normal from the first shape toward the second.
    pub normal: FixedVec2,
    /// Positive while overlapping.
    pub penetration: FixedNum,
    /// Stable id of the features that produced this point, for warm starting.
    pub feature: u32,
}

pub type ContactList = SmallVec<[ContactPoint; MAX_CONTACTS]>;

/// Collide two shapes using their world-space geometry.
pub fn collide(a: &Shape, b: &Shape) -> ContactList {
    if a.kind() > b.kind() {
        let mut contacts = collide(b, a);
        for contact in &mut contacts {
            contact.normal = -contact.normal;
        }
        return contacts;
    }

    match (&a.geometry, &b.geometry) {
        (ShapeGeometry::Circle(ca), ShapeGeometry::Circle(cb)) => circle_circle(ca, cb),
        (ShapeGeometry::Circle(c), ShapeGeometry::Polygon(p)) => circle_polygon(c, p),
        (ShapeGeometry::Polygon(pa), ShapeGeometry::Polygon(pb)) => polygon_polygon(pa, pb),
        // Kind ordering above rules this out
        (ShapeGeometry::Polygon(_), ShapeGeometry::Circle(_)) => ContactList::new(),
    }
}

fn circle_circle(a: &Circle, b: &Circle) -> ContactList {
    let mut out = ContactList::new();
    let delta = b.world_origin - a.world_origin;
    let reach = a.radius + b.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return out;
    }

    let dist = delta.length();
    let normal = if dist != FixedNum::ZERO {
        delta / dist
    } else if a.radius > b.radius {
        // Concentric: the normal still has to flip with operand order
        -FixedVec2::UNIT_Y
    } else {
        FixedVec2::UNIT_Y
    };
    let penetration = reach - dist;
    let half = FixedNum::from_num(2);
    out.push(ContactPoint {
        // Midway between the two surfaces
        position: a.world_origin + normal * (a.radius - penetration / half),
        normal,
        penetration,
        feature: 0,
    });
    out
}

/// Circle first: the normal points from the circle into the polygon.
fn circle_polygon(circle: &Circle, poly: &Polygon) -> ContactList {
    let mut out = ContactList::new();
    let center = circle.world_origin;

    let mut best_index = 0;
    let mut best_sep = FixedNum::MIN;
    for (i, axis) in poly.world_axes.iter().enumerate() {
        let sep = axis.distance(center);
        if sep > circle.radius {
            return out;
        }
        if sep > best_sep {
            best_sep = sep;
            best_index = i;
        }
    }

    if best_sep <= FixedNum::ZERO {
        // Center inside: push out through the least penetrated face
        let face = poly.world_axes[best_index];
        out.push(ContactPoint {
            position: center - face.normal * best_sep,
            normal: -face.normal,
            penetration: circle.radius - best_sep,
            feature: best_index as u32,
        });
        return out;
    }

    // Center outside: nearest boundary point decides face versus vertex region
    let count = poly.world_vertices.len();
    let mut nearest = FixedVec2::ZERO;
    let mut nearest_dist_sq = FixedNum::MAX;
    let mut nearest_index = 0;
    for i in 0..count {
        let a = poly.world_vertices[i];
        let b = poly.world_vertices[(i + 1) % count];
        let point = closest_on_segment(center, a, b);
        let d = point.distance_squared(center);
        if d < nearest_dist_sq {
            nearest_dist_sq = d;
            nearest = point;
            nearest_index = i;
        }
    }
    if nearest_dist_sq >= circle.radius * circle.radius {
        return out;
    }

    let offset = nearest - center;
    let dist = offset.length();
    let normal = if dist == FixedNum::ZERO {
        -poly.world_axes[nearest_index].normal
    } else {
        offset / dist
    };
    out.push(ContactPoint {
        position: nearest,
        normal,
        penetration: circle.radius - dist,
        feature: nearest_index as u32,
    });
    out
}

/// Deepest separation of `b`'s vertices along each of `a`'s axes.
/// Returns the axis index with the largest (least negative) separation.
fn max_separation(a: &Polygon, b: &Polygon) -> (usize, FixedNum) {
    let mut best_index = 0;
    let mut best = FixedNum::MIN;
    for (i, axis) in a.world_axes.iter().enumerate() {
        let sep = b
            .world_vertices
            .iter()
            .map(|v| axis.distance(*v))
            .fold(FixedNum::MAX, FixedNum::min);
        if sep > best {
            best = sep;
            best_index = i;
        }
    }
    (best_index, best)
}

#[derive(Clone, Copy)]
struct ClipVertex {
    point: FixedVec2,
    id: u32,
}

/// Keep the part of the segment with `normal.dot(p) <= offset`.
fn clip_segment(input: [ClipVertex; 2], normal: FixedVec2, offset: FixedNum) -> SmallVec<[ClipVertex; 2]> {
    let mut out = SmallVec::new();
    let d0 = normal.dot(input[0].point) - offset;
    let d1 = normal.dot(input[1].point) - offset;

    if d0 <= FixedNum::ZERO {
        out.push(input[0]);
    }
    if d1 <= FixedNum::ZERO {
        out.push(input[1]);
    }
    if (d0 < FixedNum::ZERO && d1 > FixedNum::ZERO) || (d0 > FixedNum::ZERO && d1 < FixedNum::ZERO) {
        let t = d0 / (d0 - d1);
        let point = input[0].point + (input[1].point - input[0].point) * t;
        let id = if d0 > FixedNum::ZERO { input[0].id } else { input[1].id };
        out.push(ClipVertex { point, id: id | 0x80 });
    }
    out
}

/// SAT over both axis sets, then reference-face clipping.
fn polygon_polygon(a: &Polygon, b: &Polygon) -> ContactList {
    let mut out = ContactList::new();

    let (edge_a, sep_a) = max_separation(a, b);
    if sep_a >= FixedNum::ZERO {
        return out;
    }
    let (edge_b, sep_b) = max_separation(b, a);
    if sep_b >= FixedNum::ZERO {
        return out;
    }

    let flip = sep_b > sep_a + REFERENCE_TOLERANCE;
    let (reference, incident, ref_edge) = if flip { (b, a, edge_b) } else { (a, b, edge_a) };
    let ref_axis: Axis = reference.world_axes[ref_edge];

    // Incident edge: the one most anti-parallel to the reference normal
    let inc_edge = incident
        .world_axes
        .iter()
        .enumerate()
        .fold((0usize, FixedNum::MAX), |(best_i, best_dot), (i, axis)| {
            let dot = axis.normal.dot(ref_axis.normal);
            if dot < best_dot {
                (i, dot)
            } else {
                (best_i, best_dot)
            }
        })
        .0;

    let inc_count = incident.world_vertices.len();
    let inc_next = (inc_edge + 1) % inc_count;
    let incident_segment = [
        ClipVertex {
            point: incident.world_vertices[inc_edge],
            id: inc_edge as u32,
        },
        ClipVertex {
            point: incident.world_vertices[inc_next],
            id: inc_next as u32,
        },
    ];

    let ref_count = reference.world_vertices.len();
    let r1 = reference.world_vertices[ref_edge];
    let r2 = reference.world_vertices[(ref_edge + 1) % ref_count];
    let tangent = (r2 - r1).normalize();

    let clipped = clip_segment(incident_segment, -tangent, -tangent.dot(r1));
    if clipped.len() < 2 {
        return out;
    }
    let clipped = clip_segment([clipped[0], clipped[1]], tangent, tangent.dot(r2));
    if clipped.len() < 2 {
        return out;
    }

    let normal = if flip { -ref_axis.normal } else { ref_axis.normal };
    let flip_bit = if flip { 1u32 << 24 } else { 0 };
    let two = FixedNum::from_num(2);
    for vertex in clipped {
        let separation = ref_axis.distance(vertex.point);
        if separation < FixedNum::ZERO {
            out.push(ContactPoint {
                // Midway between the incident vertex and the reference face, which
                // is the same point whichever polygon ends up as reference
                position: vertex.point - ref_axis.normal * (separation / two),
                normal,
                penetration: -separation,
                feature: flip_bit | ((ref_edge as u32) << 16) | vertex.id,
            });
        }
    }
    out.sort_unstable_by_key(|c| (c.position.x, c.position.y));
    out
}
