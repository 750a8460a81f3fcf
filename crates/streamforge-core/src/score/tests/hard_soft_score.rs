use crate::score::*;

#[test]
fn test_creation() {
    let score = HardSoftScore::of(-2, -100);
    assert_eq!(score.hard(), -2);
    assert_eq!(score.soft(), -100);
    assert_eq!(HardSoftScore::of_hard(-1), HardSoftScore::of(-1, 0));
    assert_eq!(HardSoftScore::of_soft(-1), HardSoftScore::of(0, -1));
}

#[test]
fn test_feasibility() {
    assert!(HardSoftScore::of(0, -1000).is_feasible());
    assert!(!HardSoftScore::of(-1, 0).is_feasible());
}

#[test]
fn test_comparison() {
    // Hard level dominates
    assert!(HardSoftScore::of(0, -1000) > HardSoftScore::of(-1, 0));
    // Soft breaks ties
    assert!(HardSoftScore::of(-1, -5) > HardSoftScore::of(-1, -6));
}

#[test]
fn test_arithmetic() {
    let a = HardSoftScore::of(-1, -10);
    let b = HardSoftScore::of(-2, 5);
    assert_eq!(a + b, HardSoftScore::of(-3, -5));
    assert_eq!(a - b, HardSoftScore::of(1, -15));
    assert_eq!(-a, HardSoftScore::of(1, 10));
    assert_eq!(b.abs(), HardSoftScore::of(2, 5));
}

#[test]
fn test_multiply_long() {
    assert_eq!(
        HardSoftScore::ONE_SOFT.multiply_long(7),
        HardSoftScore::of(0, 7)
    );
    assert_eq!(
        HardSoftScore::of(2, 3).multiply_long(-2),
        HardSoftScore::of(-4, -6)
    );
}

#[test]
fn test_parse() {
    assert_eq!(
        HardSoftScore::parse("0hard/-100soft").unwrap(),
        HardSoftScore::of(0, -100)
    );
    assert_eq!(
        HardSoftScore::parse(" -1hard/0soft ").unwrap(),
        HardSoftScore::of(-1, 0)
    );
    assert!(HardSoftScore::parse("-1hard").is_err());
    assert!(HardSoftScore::parse("-1/0soft").is_err());
}

#[test]
fn test_display_round_trip() {
    let score = HardSoftScore::of(-1, -100);
    assert_eq!(format!("{}", score), "-1hard/-100soft");
    assert_eq!(HardSoftScore::parse(&score.to_string_repr()).unwrap(), score);
}

#[test]
fn test_level_label() {
    assert_eq!(HardSoftScore::level_label(0), ScoreLevel::Hard);
    assert_eq!(HardSoftScore::level_label(1), ScoreLevel::Soft);
}

#[test]
fn test_has_hard_impact() {
    assert!(HardSoftScore::ONE_HARD.has_hard_impact());
    assert!(HardSoftScore::of(-2, 5).has_hard_impact());
    assert!(!HardSoftScore::ONE_SOFT.has_hard_impact());
    assert!(!SimpleScore::of(-3).has_hard_impact());
}
