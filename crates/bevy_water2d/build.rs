fn main() {
  // Define `physics` cfg alias for "a physics backend is enabled".
  // Keeps backend-specific systems behind one short cfg.
  println!("cargo:rustc-check-cfg=cfg(physics)");
  if std::env::var_os("CARGO_FEATURE_RAPIER2D").is_some() {
    println!("cargo:rustc-cfg=physics");
  }
}
