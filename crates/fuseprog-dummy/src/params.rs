//! Programmer-string parameters for the dummy backend
//!
//! The CLI passes `dummy:key=value,...` options through here. Supported
//! keys:
//!
//! - `fill=<hex byte>` - initial value of every cell (default 00)
//! - `stuck=<addr>:<mask>` - bits at `addr` that refuse to burn

use thiserror::Error;

use crate::{DummyConfig, DummyProm};

/// Errors from dummy programmer parameters
#[derive(Debug, Error)]
pub enum DummyParamError {
    /// `fill` was not a hexadecimal byte
    #[error("invalid fill value '{0}' (expected a hex byte)")]
    InvalidFill(String),
    /// `stuck` was not an `ADDR:MASK` hex pair
    #[error("invalid stuck spec '{0}' (expected ADDR:MASK hex bytes)")]
    InvalidStuck(String),
    /// Unrecognized parameter key
    #[error("unknown dummy parameter '{0}'")]
    UnknownParam(String),
}

/// Open a dummy PROM from parsed `key=value` programmer parameters
pub fn open<'a, I>(params: I) -> Result<DummyProm, DummyParamError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut config = DummyConfig::default();
    let mut stuck = None;

    for (key, value) in params {
        match key {
            "fill" => {
                config.fill = u8::from_str_radix(value, 16)
                    .map_err(|_| DummyParamError::InvalidFill(value.into()))?;
            }
            "stuck" => {
                let (addr, mask) = value
                    .split_once(':')
                    .ok_or_else(|| DummyParamError::InvalidStuck(value.into()))?;
                let addr = u8::from_str_radix(addr, 16)
                    .map_err(|_| DummyParamError::InvalidStuck(value.into()))?;
                let mask = u8::from_str_radix(mask, 16)
                    .map_err(|_| DummyParamError::InvalidStuck(value.into()))?;
                stuck = Some((addr, mask));
            }
            other => return Err(DummyParamError::UnknownParam(other.into())),
        }
    }

    let mut prom = DummyProm::new(config);
    if let Some((addr, mask)) = stuck {
        prom.set_stuck(addr as usize, mask);
    }
    Ok(prom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_blank_chip() {
        let prom = open(std::iter::empty::<(&str, &str)>()).unwrap();
        assert!(prom.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn fill_and_stuck_parse() {
        let prom = open([("fill", "0F"), ("stuck", "02:02")]).unwrap();
        assert_eq!(prom.cells()[0], 0x0F);
        assert_eq!(prom.stuck[2], 0x02);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            open([("fill", "zz")]),
            Err(DummyParamError::InvalidFill(_))
        ));
        assert!(matches!(
            open([("stuck", "02")]),
            Err(DummyParamError::InvalidStuck(_))
        ));
        assert!(matches!(
            open([("speed", "9000")]),
            Err(DummyParamError::UnknownParam(_))
        ));
    }
}
