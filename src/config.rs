//! Process-wide settings, read from the environment once at dispatcher init.

pub const SEED_VAR: &str = "STSET_SEED";
pub const FORCE_SCALAR_VAR: &str = "STSET_FORCE_SCALAR";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Fixed hash seed. `None` draws a random one per process.
    pub seed: Option<u64>,
    /// Use the portable probe even when AVX2 is available.
    pub force_scalar: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            seed: lookup(SEED_VAR).and_then(|value| parse_seed(&value)),
            force_scalar: lookup(FORCE_SCALAR_VAR).is_some_and(|value| parse_flag(&value)),
        }
    }
}

fn parse_seed(value: &str) -> Option<u64> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    match parsed {
        Ok(seed) => Some(seed),
        Err(err) => {
            log::warn!("ignoring {SEED_VAR}={value:?}: {err}");
            None
        }
    }
}

fn parse_flag(value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "" | "0" | "false" | "no" | "off" => false,
        other => {
            log::warn!("ignoring {FORCE_SCALAR_VAR}={other:?}: expected a boolean");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        Config::from_lookup(|name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        })
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn seed_decimal_and_hex() {
        assert_eq!(config(&[(SEED_VAR, "42")]).seed, Some(42));
        assert_eq!(config(&[(SEED_VAR, " 0xff ")]).seed, Some(255));
        assert_eq!(config(&[(SEED_VAR, "0XFF")]).seed, Some(255));
        assert_eq!(config(&[(SEED_VAR, "banana")]).seed, None);
        assert_eq!(config(&[(SEED_VAR, "-1")]).seed, None);
    }

    #[test]
    fn force_scalar_flag() {
        assert!(config(&[(FORCE_SCALAR_VAR, "1")]).force_scalar);
        assert!(config(&[(FORCE_SCALAR_VAR, "TRUE")]).force_scalar);
        assert!(!config(&[(FORCE_SCALAR_VAR, "0")]).force_scalar);
        assert!(!config(&[(FORCE_SCALAR_VAR, "maybe")]).force_scalar);
    }
}
