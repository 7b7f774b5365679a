use std::thread;
use std::time::Duration;
use trellis_cache::{configure_memory, memory, CacheConfig, NO_EXPIRATION};

#[derive(Debug, Clone)]
struct Profile {
  name: String,
}

fn main() {
  // Sweep quickly so the example does not have to wait long.
  let config = CacheConfig::from_yaml_str("cache:\n  sweep_interval: 500ms\n")
    .expect("Failed to parse cache config");
  configure_memory(config).expect("Memory store already configured");

  let store = memory();
  store.set_value(
    "profile:7".to_string(),
    Profile {
      name: "ada".to_string(),
    },
    NO_EXPIRATION,
  );
  store.set_value("otp:7".to_string(), 482913u32, Duration::from_secs(1));

  println!("profile: {:?}", store.get_as::<Profile, _>("profile:7"));
  println!("otp: {:?}", store.get_as::<u32, _>("otp:7"));

  println!("\nWaiting 2 seconds for the one-time password to expire...");
  thread::sleep(Duration::from_secs(2));

  println!("otp: {:?}", store.get_as::<u32, _>("otp:7"));
  println!("\nMemory store metrics: {:#?}", store.metrics());
}
