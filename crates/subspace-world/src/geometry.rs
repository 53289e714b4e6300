use subspace_types::Vec2;

/// Slab-method ray/AABB test. `box_pos` is the box's minimum corner,
/// `box_extent` its width/height. Returns the entry distance along `origin
/// + direction * t` and the hit face's normal.
pub fn ray_box_intersect(origin: Vec2, direction: Vec2, box_pos: Vec2, box_extent: Vec2) -> Option<(f32, Vec2)> {
    let recip = Vec2::new(1.0 / direction.x, 1.0 / direction.y);
    let lb = box_pos;
    let rt = box_pos + box_extent;

    let t1 = (lb.x - origin.x) * recip.x;
    let t2 = (rt.x - origin.x) * recip.x;
    let t3 = (lb.y - origin.y) * recip.y;
    let t4 = (rt.y - origin.y) * recip.y;

    let tmin = t1.min(t2).max(t3.min(t4));
    let tmax = t1.max(t2).min(t3.max(t4));

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    let t = tmin;
    let norm = if t == t1 {
        Vec2::new(-1.0, 0.0)
    } else if t == t2 {
        Vec2::new(1.0, 0.0)
    } else if t == t3 {
        Vec2::new(0.0, 1.0)
    } else if t == t4 {
        Vec2::new(0.0, -1.0)
    } else {
        Vec2::ZERO
    };

    Some((t, norm))
}

pub fn box_contains_point(min: Vec2, max: Vec2, point: Vec2) -> bool {
    (point.x >= min.x && point.x <= max.x) && (point.y >= min.y && point.y <= max.y)
}

/// Strict overlap test (touching edges don't count), used for the
/// door/brick warp-on-overlap checks.
pub fn box_box_overlap(first_min: Vec2, first_max: Vec2, second_min: Vec2, second_max: Vec2) -> bool {
    first_max.x > second_min.x && first_min.x < second_max.x && first_max.y > second_min.y && first_min.y < second_max.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_unit_box_from_outside() {
        let hit = ray_box_intersect(Vec2::new(-1.0, 0.5), Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        assert!(hit.is_some());
        let (dist, normal) = hit.unwrap();
        assert_eq!(dist, 1.0);
        assert_eq!(normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn overlap_requires_strict_intersection() {
        let a_min = Vec2::new(0.0, 0.0);
        let a_max = Vec2::new(1.0, 1.0);
        let b_min = Vec2::new(1.0, 0.0);
        let b_max = Vec2::new(2.0, 1.0);
        assert!(!box_box_overlap(a_min, a_max, b_min, b_max));
    }
}
