use crate::{
    descriptor::{Descriptor, Range, Value},
    transform::Transform,
};

pub fn fmt_range(r: &Range) -> String {
    format!("{}..{}", r.min, r.max)
}

pub fn fmt_switch(v: i64) -> &'static str {
    if v != 0 { "on" } else { "off" }
}

/// Value as shown in listings: switches as on/off, fixed-point multipliers
/// with their fraction of full scale.
pub fn fmt_value(desc: &Descriptor, value: &Value) -> String {
    match desc.transform {
        Transform::Boolean => value
            .components()
            .iter()
            .map(|&v| fmt_switch(v))
            .collect::<Vec<_>>()
            .join(" "),
        Transform::Affine { user_span, .. } if user_span > 1 => {
            let span = user_span as f64;
            let fractions: Vec<String> = value
                .components()
                .iter()
                .map(|&v| format!("{:.2}", v as f64 / span))
                .collect();
            format!("{} ({})", value, fractions.join(" "))
        }
        _ => value.to_string(),
    }
}
