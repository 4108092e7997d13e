// levels below this are treated as silence
pub const FLOOR_DB: f32 = -80.0;

pub fn db_to_amplitude(db: f32) -> f32 {
    if !db.is_finite() || db <= FLOOR_DB {
        return 0.0;
    }
    f32::powf(10.0, db / 20.0).min(1.0)
}

pub fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return FLOOR_DB;
    }
    (20.0 * amplitude.log10()).max(FLOOR_DB)
}

#[cfg(test)]
mod test {
    #[test]
    fn full_scale() {
        assert_eq!(super::db_to_amplitude(0.0), 1.0);
        assert_eq!(super::amplitude_to_db(1.0), 0.0);
    }

    #[test]
    fn twenty_db_is_a_tenth() {
        assert!((super::db_to_amplitude(-20.0) - 0.1).abs() < 1e-6);
        assert!((super::amplitude_to_db(0.1) + 20.0).abs() < 1e-4);
    }

    #[test]
    fn floor() {
        assert_eq!(super::db_to_amplitude(-80.0), 0.0);
        assert_eq!(super::db_to_amplitude(-200.0), 0.0);
        assert_eq!(super::db_to_amplitude(f32::NEG_INFINITY), 0.0);
        assert_eq!(super::amplitude_to_db(0.0), super::FLOOR_DB);
        assert_eq!(super::amplitude_to_db(1e-9), super::FLOOR_DB);
    }

    #[test]
    fn positive_db_saturates() {
        assert_eq!(super::db_to_amplitude(6.0), 1.0);
    }
}
