/// Unit conversions used at the boundaries of the costing engine. Internal
/// computation is always millimetres / seconds / PLN; these helpers exist
/// for the places a RateBook or drawing expresses a quantity in another unit.
pub fn m_per_min_to_mm_per_s(v_m_min: f64) -> f64 {
    v_m_min * 1000.0 / 60.0
}

pub fn mm_per_s_to_m_per_min(v_mm_s: f64) -> f64 {
    v_mm_s * 60.0 / 1000.0
}

pub fn mm2_to_m2(area_mm2: f64) -> f64 {
    area_mm2 / 1_000_000.0
}

pub fn mm_to_m(len_mm: f64) -> f64 {
    len_mm / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedrate_conversion() {
        // 300 m/min is the feedrate used in scenario S1.
        let mm_s = m_per_min_to_mm_per_s(300.0);
        assert!((mm_s - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_feedrate_round_trip() {
        let original = 15.0;
        let round_trip = mm_per_s_to_m_per_min(m_per_min_to_mm_per_s(original));
        assert!((round_trip - original).abs() < 1e-9);
    }

    #[test]
    fn test_area_conversion() {
        assert!((mm2_to_m2(4_500_000.0) - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_length_conversion() {
        assert!((mm_to_m(10_000.0) - 10.0).abs() < 1e-9);
    }
}
