//! Poll a soundbar's volume and print connection state transitions.
//!
//! Usage: `cargo run -p sbctl --example volume-watch -- 192.168.1.50`

use std::time::Duration;

use sbctl::session::{Session, SessionConfig};
use sbctl::Soundbar;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = std::env::args()
        .nth(1)
        .ok_or("usage: volume-watch <host>")?;

    let session = Session::connect(host, sbctl::transport::DEFAULT_PORT, SessionConfig::default());
    let mut changes = session.state_changes();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            println!("state: {}", *changes.borrow_and_update());
        }
    });

    let soundbar = Soundbar::new(session);
    loop {
        match soundbar.volume().await {
            Ok(level) => println!("volume: {level}"),
            Err(err) => eprintln!("volume query failed: {err}"),
        }
        // Longer than the idle timeout, so every poll reconnects.
        tokio::time::sleep(Duration::from_secs(8)).await;
    }
}
