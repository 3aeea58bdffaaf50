//! Utility terms shared by task scorers. Every term is in `0.0..=1.0`.

/// Saturating closeness: 1.0 at distance zero, 0.5 at `scale`.
pub fn distance_term(distance: f32, scale: f32) -> f32 {
    if scale <= 0.0 {
        return if distance <= 0.0 { 1.0 } else { 0.0 };
    }
    1.0 / (1.0 + distance.max(0.0) / scale)
}

/// How far hunger is past `threshold`, rescaled to `0.0..=1.0`.
pub fn hunger_need(hunger: f32, threshold: f32) -> f32 {
    if hunger < threshold {
        return 0.0;
    }
    let span = (1.0 - threshold).max(f32::EPSILON);
    ((hunger - threshold) / span).clamp(0.0, 1.0)
}

/// 1.0 when a threat is on top of the agent, 0.0 at `radius` and beyond.
pub fn threat_proximity(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

/// 1.0 for an empty population, 0.0 at or above `cap`.
pub fn population_room(population: usize, cap: usize) -> f32 {
    if cap == 0 {
        return 0.0;
    }
    (1.0 - population as f32 / cap as f32).clamp(0.0, 1.0)
}

/// Linear map of `t` into `min..=max`.
pub fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t.clamp(0.0, 1.0)
}

/// `base + weight * need`, scaled by closeness and clamped into range.
pub fn blend(base: f32, weight: f32, need: f32, closeness: f32) -> f32 {
    ((base + weight * need) * closeness).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_term_saturates() {
        assert_eq!(distance_term(0.0, 50.0), 1.0);
        assert_eq!(distance_term(50.0, 50.0), 0.5);
        assert!(distance_term(10.0, 50.0) > distance_term(20.0, 50.0));
        assert!(distance_term(10_000.0, 50.0) > 0.0);
    }

    #[test]
    fn test_hunger_need() {
        assert_eq!(hunger_need(0.2, 0.4), 0.0);
        assert_eq!(hunger_need(0.4, 0.4), 0.0);
        assert!((hunger_need(0.7, 0.4) - 0.5).abs() < 1e-6);
        assert_eq!(hunger_need(1.0, 0.4), 1.0);
    }

    #[test]
    fn test_threat_and_population() {
        assert_eq!(threat_proximity(0.0, 70.0), 1.0);
        assert_eq!(threat_proximity(70.0, 70.0), 0.0);
        assert_eq!(population_room(0, 10), 1.0);
        assert_eq!(population_room(12, 10), 0.0);
    }

    #[test]
    fn test_lerp_and_blend_clamp() {
        assert_eq!(lerp(0.3, 0.85, 2.0), 0.85);
        assert_eq!(lerp(0.3, 0.85, 0.0), 0.3);
        assert_eq!(blend(0.5, 1.0, 1.0, 1.0), 1.0);
    }
}
