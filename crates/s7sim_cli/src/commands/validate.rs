//! Validate command implementation.

use s7sim_core::SimulatorConfig;
use std::path::Path;

/// Runs the validate command.
pub fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating {:?}", config_path);
    println!();

    let config = SimulatorConfig::from_file(config_path)?;
    let layouts = config.layouts()?;

    for layout in layouts.iter() {
        println!("DB{} ({} bytes)", layout.db_number(), layout.size());
        for field in layout.fields() {
            match field.bit {
                Some(bit) => println!(
                    "  {:<24} {:<12} offset {}.{}",
                    field.name, field.ty, field.offset, bit
                ),
                None => println!(
                    "  {:<24} {:<12} offset {}",
                    field.name, field.ty, field.offset
                ),
            }
        }
    }

    println!();
    println!("✓ Configuration is valid");
    Ok(())
}
