mod common;

use common::{triple, Staged};
use crespo_parts::{
    config::{COLOR_MULTIPLIER, COLOR_RAW_MAX, DEEPIDLE, GAMMA_OFFSET, VIBRATOR_DUTY},
    PreferenceStore, TunableError, Value,
};

#[test]
fn color_set_live_clamps_and_scales() {
    let staged = Staged::new(&triple(COLOR_MULTIPLIER, "1000000000\n"));
    let c = staged.controller();

    let s = c.open("color_multiplier").unwrap();
    assert_eq!(s.set_live(300).unwrap(), Value::from([255, 255, 255]));
    for p in COLOR_MULTIPLIER {
        assert_eq!(staged.read(p), format!("{}\n", COLOR_RAW_MAX));
    }
    s.set_live([0, 255, 0]).unwrap();
    assert_eq!(staged.read(COLOR_MULTIPLIER[0]), "0\n");
    assert_eq!(staged.read(COLOR_MULTIPLIER[1]), "2147483645\n");
    s.commit().unwrap();
}

#[test]
fn written_values_read_back_unchanged() {
    let mut files = triple(COLOR_MULTIPLIER, "0\n");
    files.extend(triple(GAMMA_OFFSET, "0\n"));
    files.push((DEEPIDLE, "0\n"));
    files.push((VIBRATOR_DUTY, "100\n"));
    let staged = Staged::new(&files);
    let c = staged.controller();

    for (key, values) in [
        ("color_multiplier", vec![0i64, 1, 127, 128, 200, 254, 255]),
        ("gamma_offset", vec![0, 1, 99, 100, 101, 200]),
        ("deepidle", vec![0, 1]),
        ("vibrator_intensity", vec![0, 42, 100]),
    ] {
        for v in values {
            c.set_live(key, v).unwrap();
            let back = c.read_current(key).unwrap();
            assert!(back.components().iter().all(|&x| x == v), "{} {} -> {}", key, v, back);
        }
    }
}

#[test]
fn open_then_discard_leaves_store_untouched() {
    let staged = Staged::new(&[
        (GAMMA_OFFSET[0], "  -7 \n"),
        (GAMMA_OFFSET[1], "12\nnoise\n"),
        (GAMMA_OFFSET[2], "0\n"),
    ]);
    let c = staged.controller();

    let s = c.open("gamma_offset").unwrap();
    assert!(!s.discard().unwrap());
    assert_eq!(staged.read(GAMMA_OFFSET[0]), "  -7 \n");
    assert_eq!(staged.read(GAMMA_OFFSET[1]), "12\nnoise\n");
    assert_eq!(c.open_sessions("gamma_offset"), 0);
}

#[test]
fn discard_restores_value_seen_at_open() {
    let staged = Staged::new(&triple(COLOR_MULTIPLIER, "1073741823\n"));
    let c = staged.controller();

    let s = c.open("color_multiplier").unwrap();
    s.set_live(10).unwrap();
    s.set_live([1, 2, 3]).unwrap();
    s.set_live(255).unwrap();
    assert!(s.discard().unwrap());
    for p in COLOR_MULTIPLIER {
        assert_eq!(staged.read(p), "1073741823\n");
    }
    assert_eq!(c.persisted("color_multiplier"), None);
}

#[test]
fn gamma_offset_shifts_both_ways() {
    let staged = Staged::new(&triple(GAMMA_OFFSET, "-50\n"));
    let c = staged.controller();

    let s = c.open("gamma_offset").unwrap();
    assert_eq!(s.original(), Value::from([50, 50, 50]));
    s.set_live(70).unwrap();
    for p in GAMMA_OFFSET {
        assert_eq!(staged.read(p), "-30\n");
    }
    assert_eq!(s.pending(), Value::from([70, 70, 70]));
    s.discard().unwrap();
    assert_eq!(staged.read(GAMMA_OFFSET[2]), "-50\n");
}

#[test]
fn last_session_to_close_rolls_back() {
    let staged = Staged::new(&[(VIBRATOR_DUTY, "80\n")]);
    let c = staged.controller();

    let a = c.open("vibrator_intensity").unwrap();
    let b = c.open("vibrator_intensity").unwrap();
    assert_eq!(c.open_sessions("vibrator_intensity"), 2);
    b.set_live(30).unwrap();

    assert!(!a.discard().unwrap());
    assert_eq!(c.open_sessions("vibrator_intensity"), 1);
    assert_eq!(staged.read(VIBRATOR_DUTY), "30\n");

    assert!(b.discard().unwrap());
    assert_eq!(c.open_sessions("vibrator_intensity"), 0);
    assert_eq!(staged.read(VIBRATOR_DUTY), "80\n");
}

#[test]
fn dropped_session_is_discarded() {
    let staged = Staged::new(&[(DEEPIDLE, "0\n")]);
    let c = staged.controller();
    {
        let s = c.open("deepidle").unwrap();
        s.set_live(true).unwrap();
        assert_eq!(staged.read(DEEPIDLE), "1\n");
    }
    assert_eq!(staged.read(DEEPIDLE), "0\n");
    assert_eq!(c.open_sessions("deepidle"), 0);
}

#[test]
fn commit_writes_preference_file() {
    let staged = Staged::new(&[(DEEPIDLE, "N\n")]);
    let c = staged.controller();

    let s = c.open("deepidle").unwrap();
    assert_eq!(s.original(), Value::from(0));
    s.set_live(true).unwrap();
    assert_eq!(s.commit().unwrap(), Value::from(1));

    let raw = std::fs::read_to_string(staged.prefs_path()).unwrap();
    assert!(raw.contains("\"deepidle\": true"), "{}", raw);
    assert_eq!(c.with_prefs(|p| p.get("deepidle").and_then(|v| v.to_value())), Some(Value::from(1)));
}

#[test]
fn missing_path_makes_tunable_unsupported() {
    let staged = Staged::new(&[(COLOR_MULTIPLIER[0], "0\n"), (COLOR_MULTIPLIER[2], "0\n")]);
    let c = staged.controller();

    assert!(!c.is_supported("color_multiplier"));
    assert!(matches!(c.open("color_multiplier"), Err(TunableError::UnsupportedParameter(_))));
    assert!(matches!(c.set_live("color_multiplier", 1), Err(TunableError::UnsupportedParameter(_))));
    assert!(matches!(c.open("no_such_knob"), Err(TunableError::UnknownParameter(_))));
    assert!(!staged.exists(COLOR_MULTIPLIER[1]));
}

#[test]
fn broken_node_reports_write_failure() {
    let staged = Staged::new(&[]);
    staged.put_broken(DEEPIDLE);
    let c = staged.controller();

    assert!(c.is_supported("deepidle"));
    // Unreadable: the default stands in.
    assert_eq!(c.read_current("deepidle").unwrap(), Value::from(0));
    let err = c.set_live("deepidle", 1).unwrap_err();
    assert!(matches!(err, TunableError::WriteFailed { index: 0, .. }));
}
