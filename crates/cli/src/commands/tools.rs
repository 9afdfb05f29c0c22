//! `gyro tools` — list the registered action capabilities.

pub fn run() -> anyhow::Result<()> {
    let registry = gyro_tools::default_registry();

    println!();
    println!("  Available actions:");
    println!();
    for cap in registry.capabilities() {
        println!("  {} — {}", cap.name, cap.description);
        for param in &cap.params {
            let required = if param.required { "required" } else { "optional" };
            println!("      {} ({:?}, {required})", param.name, param.kind);
        }
        println!();
    }

    Ok(())
}
