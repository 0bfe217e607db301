//! Programmer registry and initialization
//!
//! Opens programmer backends by `name[:key=value,...]` specification
//! strings. Backends implement the core `PromBus` + `Timing` traits;
//! commands receive the concrete type through the dispatch in `main`.

use std::error::Error;

#[cfg(feature = "dummy")]
use fuseprog_dummy::DummyProm;

/// Information about an available programmer backend
pub struct ProgrammerInfo {
    /// Name used in `-p` specifications
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
}

/// All programmer backends compiled into this binary
pub fn available() -> Vec<ProgrammerInfo> {
    let mut list = Vec::new();

    #[cfg(feature = "dummy")]
    list.push(ProgrammerInfo {
        name: "dummy",
        description: "In-memory fuse PROM emulator (params: fill=HH, stuck=AA:MM)",
    });

    list
}

/// Comma-separated backend names for help text
pub fn names_short() -> String {
    let names: Vec<&str> = available().iter().map(|i| i.name).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// An opened programmer backend
pub enum Programmer {
    /// In-memory emulator
    #[cfg(feature = "dummy")]
    Dummy(DummyProm),
}

/// Parse a programmer string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
fn parse_spec(spec: &str) -> Result<(&str, Vec<(&str, &str)>), Box<dyn Error>> {
    let (name, opts_str) = spec.split_once(':').unwrap_or((spec, ""));

    let mut params = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.push((key, value));
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok((name, params))
}

/// Open a programmer backend by specification string
pub fn open(spec: &str) -> Result<Programmer, Box<dyn Error>> {
    let (name, params) = parse_spec(spec)?;

    match name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let prom = fuseprog_dummy::params::open(params.iter().copied())?;
            log::debug!("opened dummy programmer");
            Ok(Programmer::Dummy(prom))
        }
        other => Err(format!(
            "Unknown programmer '{}' (available: {})",
            other,
            names_short()
        )
        .into()),
    }
}
