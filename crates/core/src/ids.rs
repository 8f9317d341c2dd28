//! Client-side id generation for surveys and floor entries.
//!
//! Ids follow the collector wire contract: `survey_<millis>_<suffix>` and
//! `floor_<millis>_<suffix>`, where the suffix is nine base-36 characters.

use chrono::Utc;
use rand::Rng;

const SUFFIX_LEN: usize = 9;
const SUFFIX_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_CHARSET.len());
            SUFFIX_CHARSET[idx] as char
        })
        .collect()
}

/// New unique id for a local survey.
pub fn new_survey_id() -> String {
    format!("survey_{}_{}", Utc::now().timestamp_millis(), random_suffix())
}

/// New unique id for a floor-assessment entry.
pub fn new_floor_id() -> String {
    format!("floor_{}_{}", Utc::now().timestamp_millis(), random_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_id_shape() {
        let id = new_survey_id();
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts[0], "survey");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .bytes()
            .all(|b| SUFFIX_CHARSET.contains(&b)));
    }

    #[test]
    fn floor_ids_are_distinct() {
        let a = new_floor_id();
        let b = new_floor_id();
        assert!(a.starts_with("floor_"));
        assert_ne!(a, b);
    }
}
