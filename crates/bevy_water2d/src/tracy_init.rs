//! Tracy profiler hookup for headless runs.
//!
//! Apps using `LogPlugin` get spans forwarded by bevy's own tracy support;
//! call [`init_tracy`] only when no global subscriber is installed.

use tracing_subscriber::layer::SubscriberExt;

pub fn init_tracy() {
  let subscriber = tracing_subscriber::registry().with(tracing_tracy::TracyLayer::default());
  if tracing::subscriber::set_global_default(subscriber).is_err() {
    bevy::log::warn!("Tracy not initialized: a global tracing subscriber is already set");
  }
}
