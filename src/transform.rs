use serde::{Deserialize, Serialize};

/// Mapping between the raw kernel value and the value shown to the user.
///
/// Every variant round-trips exactly over integers: `to_user(to_raw(u)) == u`
/// for any `u`, and `to_raw(to_user(r)) == r` for any `r` produced by
/// `to_raw`. Boot restore, edit and discard cycles therefore never drift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Identity,
    /// `user = round(raw * user_span / raw_span) + bias`. Requires
    /// `raw_span >= user_span > 0`.
    Affine { raw_span: i64, user_span: i64, bias: i64 },
    /// `user = raw + offset`.
    Offset { offset: i64 },
    /// Raw "0"/"1" switch shown as 0/1.
    Boolean,
}

// Integer division rounding half away from zero. `d` must be positive.
fn div_round(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}

fn saturate(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl Transform {
    pub fn check(&self) -> Result<(), String> {
        match *self {
            Transform::Affine { raw_span, user_span, .. } => {
                if user_span <= 0 {
                    return Err(format!("affine user_span must be positive (got {})", user_span));
                }
                if raw_span < user_span {
                    return Err(format!(
                        "affine raw_span {} is smaller than user_span {}; values would not round-trip",
                        raw_span, user_span
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn to_user(&self, raw: i64) -> i64 {
        match *self {
            Transform::Identity => raw,
            Transform::Affine { raw_span, user_span, bias } => {
                let u = div_round(raw as i128 * user_span as i128, raw_span as i128);
                saturate(u + bias as i128)
            }
            Transform::Offset { offset } => raw.saturating_add(offset),
            Transform::Boolean => (raw != 0) as i64,
        }
    }

    pub fn to_raw(&self, user: i64) -> i64 {
        match *self {
            Transform::Identity => user,
            Transform::Affine { raw_span, user_span, bias } => {
                let shifted = user as i128 - bias as i128;
                saturate(div_round(shifted * raw_span as i128, user_span as i128))
            }
            Transform::Offset { offset } => user.saturating_sub(offset),
            Transform::Boolean => (user != 0) as i64,
        }
    }

    /// Parse one raw line as read from the backing file.
    pub fn decode(&self, line: &str) -> Option<i64> {
        let s = line.trim();
        if let Transform::Boolean = self {
            match s {
                "Y" | "y" => return Some(1),
                "N" | "n" => return Some(0),
                _ => {}
            }
        }
        s.parse::<i64>().ok().map(|raw| self.to_user(raw))
    }

    /// Raw line to write for a user value.
    pub fn encode(&self, user: i64) -> String {
        self.to_raw(user).to_string()
    }
}
