use crate::{
    descriptor::{Descriptor, Range, Value},
    presets::Preset,
    transform::Transform,
};

pub const CONFIG_PATH: &str = "/data/misc/crespo_parts/config.json";
pub const PREFS_PATH: &str = "/data/misc/crespo_parts/prefs.json";
pub const DEVICE_NAME: &str = "crespo";

// Display (samoled_color)
pub const COLOR_MULTIPLIER: &[&str] = &[
    "/sys/class/misc/samoled_color/red_multiplier",
    "/sys/class/misc/samoled_color/green_multiplier",
    "/sys/class/misc/samoled_color/blue_multiplier",
];
pub const GAMMA_OFFSET: &[&str] = &[
    "/sys/class/misc/samoled_color/red_v1_offset",
    "/sys/class/misc/samoled_color/green_v1_offset",
    "/sys/class/misc/samoled_color/blue_v1_offset",
];

// Full-scale multiplier the driver and the color presets agree on.
pub const COLOR_RAW_MAX: i64 = i32::MAX as i64 - 2;
pub const COLOR_USER_MAX: i64 = 255;
pub const GAMMA_OFFSET_SHIFT: i64 = 100;

// lulzactive governor: (key, path, min, max, default)
pub const LULZACTIVE: &[(&str, &str, i64, i64, i64)] = &[
    ("lulzactive_inc_cpu_load", "/sys/devices/system/cpu/cpufreq/lulzactive/inc_cpu_load", 30, 99, 60),
    ("lulzactive_pump_up_step", "/sys/devices/system/cpu/cpufreq/lulzactive/pump_up_step", 1, 5, 1),
    ("lulzactive_pump_down_step", "/sys/devices/system/cpu/cpufreq/lulzactive/pump_down_step", 1, 5, 1),
    ("lulzactive_up_sample_time", "/sys/devices/system/cpu/cpufreq/lulzactive/up_sample_time", 10000, 50000, 20000),
    ("lulzactive_down_sample_time", "/sys/devices/system/cpu/cpufreq/lulzactive/down_sample_time", 10000, 50000, 35000),
];

// WM8994 codec switches: (key, path)
pub const WM8994: &[(&str, &str)] = &[
    ("wm8994_control_enable", "/sys/class/misc/voodoo_sound_control/enable"),
    ("wm8994_speaker_tuning", "/sys/class/misc/voodoo_sound/speaker_tuning"),
    ("wm8994_mono_downmix", "/sys/class/misc/voodoo_sound/mono_downmix"),
    ("wm8994_stereo_expansion", "/sys/class/misc/voodoo_sound/stereo_expansion"),
    ("wm8994_dac_direct", "/sys/class/misc/voodoo_sound/dac_direct"),
    ("wm8994_dac_osr128", "/sys/class/misc/voodoo_sound/dac_osr128"),
    ("wm8994_adc_osr128", "/sys/class/misc/voodoo_sound/adc_osr128"),
    ("wm8994_fll_tuning", "/sys/class/misc/voodoo_sound/fll_tuning"),
];

pub const DEEPIDLE: &str = "/sys/class/misc/deepidle/enabled";
pub const DEEPIDLE_STATS: &str = "/sys/class/misc/deepidle/idle_stats_list";
pub const DEEPIDLE_RESET: &str = "/sys/class/misc/deepidle/reset_stats";
pub const TOUCHKEY_NOTIFICATION: &str = "/sys/class/misc/notification/enabled";
pub const TOUCHKEY_BL_TIMEOUT: &str = "/sys/class/misc/notification/bl_timeout";
pub const BACKLIGHT_DIMMER: &str = "/sys/class/misc/backlightdimmer/enabled";
pub const BACKLIGHT_DIMMER_DELAY: &str = "/sys/class/misc/backlightdimmer/delay";
pub const VIBRATOR_DUTY: &str = "/sys/class/misc/pwm_duty/pwm_duty";

fn switch(key: &str, title: &str, path: &str, default_on: bool) -> Descriptor {
    Descriptor::new(key, title, &[path], Range::new(0, 1), Transform::Boolean, default_on as i64)
}

/// Tunables this device tree knows about. Kernels without a driver simply
/// report them unsupported.
pub fn builtin_tunables() -> Vec<Descriptor> {
    let mut out = vec![
        Descriptor::new(
            "color_multiplier",
            "Color multipliers (R G B)",
            COLOR_MULTIPLIER,
            Range::new(0, COLOR_USER_MAX),
            Transform::Affine { raw_span: COLOR_RAW_MAX, user_span: COLOR_USER_MAX, bias: 0 },
            COLOR_USER_MAX,
        ),
        Descriptor::new(
            "gamma_offset",
            "Gamma offsets (R G B)",
            GAMMA_OFFSET,
            Range::new(0, 2 * GAMMA_OFFSET_SHIFT),
            Transform::Offset { offset: GAMMA_OFFSET_SHIFT },
            GAMMA_OFFSET_SHIFT,
        ),
    ];

    for &(key, path, min, max, default) in LULZACTIVE {
        out.push(Descriptor::new(key, key, &[path], Range::new(min, max), Transform::Identity, default));
    }

    for &(key, path) in WM8994 {
        out.push(switch(key, key, path, true));
    }

    out.push(switch("deepidle", "CPU deep idle", DEEPIDLE, false));
    out.push(switch("touchkey_notification", "Touchkey notification", TOUCHKEY_NOTIFICATION, false));
    out.push(switch("backlight_dimmer", "Touchkey backlight dimmer", BACKLIGHT_DIMMER, false));
    out.push(Descriptor::new(
        "backlight_dimmer_delay",
        "Backlight dimmer delay (s)",
        &[BACKLIGHT_DIMMER_DELAY],
        Range::new(0, 30),
        Transform::Affine { raw_span: 1000, user_span: 1, bias: 0 },
        5,
    ));
    out.push(Descriptor::new(
        "touchkey_bl_timeout",
        "Touchkey backlight timeout (s)",
        &[TOUCHKEY_BL_TIMEOUT],
        Range::new(0, 30),
        Transform::Identity,
        5,
    ));
    out.push(Descriptor::new(
        "vibrator_intensity",
        "Vibrator intensity",
        &[VIBRATOR_DUTY],
        Range::new(0, 100),
        Transform::Identity,
        100,
    ));
    out
}

fn color_preset(name: &str, multiplier: [i64; 3], gamma_raw: [i64; 3]) -> Preset {
    let gamma = gamma_raw.map(|g| g + GAMMA_OFFSET_SHIFT);
    Preset::new(
        name,
        "Color multiplier and gamma",
        vec![("color_multiplier", Value::from(multiplier)), ("gamma_offset", Value::from(gamma))],
    )
}

fn lulzactive_preset(name: &str, title: &str, values: [i64; 5]) -> Preset {
    Preset::new(
        name,
        title,
        LULZACTIVE
            .iter()
            .zip(values)
            .map(|(&(key, ..), v)| (key, Value::from(v)))
            .collect(),
    )
}

pub fn builtin_presets() -> Vec<Preset> {
    vec![
        color_preset("color-1", [255, 255, 255], [0, 0, 0]),
        color_preset("color-2", [219, 219, 219], [-50, -50, -40]),
        color_preset("color-3", [168, 186, 255], [-41, -46, -31]),
        color_preset("color-4", [184, 179, 167], [-35, -55, -48]),
        color_preset("color-5", [170, 170, 212], [-44, -44, -22]),
        color_preset("color-6", [255, 196, 63], [-57, -39, 45]),
        lulzactive_preset("lulzactive-default", "lulzactive defaults", [60, 1, 1, 20000, 35000]),
        lulzactive_preset("lulzactive-battery", "lulzactive battery saving", [90, 1, 2, 50000, 40000]),
        lulzactive_preset("lulzactive-speed", "lulzactive speed up", [60, 4, 1, 10000, 50000]),
    ]
}
