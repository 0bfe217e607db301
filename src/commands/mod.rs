//! Command implementations

pub mod console;
pub mod empty;
pub mod read;
pub mod verify;
pub mod write;

use fuseprog_core::chip;

/// Print the supported chip families
pub fn list_chips() {
    println!("Supported chips:");
    for profile in chip::PROFILES {
        println!(
            "  {:10} {} cells x {} bits",
            profile.name,
            profile.cell_count,
            profile.data_width()
        );
    }
}

/// Print the compiled-in programmer backends
pub fn list_programmers() {
    let available = crate::programmers::available();
    if available.is_empty() {
        println!("No programmers compiled in");
        return;
    }

    println!("Available programmers:");
    for info in available {
        println!("  {:10} {}", info.name, info.description);
    }
}
