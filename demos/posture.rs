/*!
    drive a short posture sequence on the first serial port found.

    run with `RUST_LOG=debug cargo run --example posture` to watch the
    frames and acknowledgments go by.
*/

use std::time::Duration;

use quadlink::{Dispatcher, Task, Reply, serial::{SerialLink, DEFAULT_BAUD}, link::Transport};

#[tokio::main]
async fn main() {
    env_logger::init();

    let ports = SerialLink::available_ports().unwrap_or_default();
    let Some(path) = ports.first() else {
        eprintln!("no port available");
        return
    };
    println!("opening {}", path.display());
    let mut link = SerialLink::open(path, DEFAULT_BAUD).expect("failed to open the serial port");

    // the device prints a banner while booting, let it finish then drop it
    tokio::time::sleep(Duration::from_secs(5)).await;
    if let Ok(banner) = link.read_all().await {
        if !banner.is_empty() {
            println!("boot banner: {} bytes", banner.len());
        }
    }

    let dispatcher = Dispatcher::new();

    let sequence = [
        // named skill: stand balanced
        Task::bare("kbalance", Duration::from_secs(2)),
        // ease into a sit, then back up, with raw joint angles
        Task::numeric('L', [0, 0, 0, 0, 0, 0, 0, 0, 45, 45, 105, 105, 45, 45, -45, -45], Duration::from_secs(1)),
        Task::numeric('L', [0, 0, 0, 0, 0, 0, 0, 0, 50, 50, 110, 110, 50, 50, -50, -50], Duration::from_secs(1)),
        Task::numeric('L', [0, 0, 0, 0, 0, 0, 0, 0, 45, 45, 105, 105, 45, 45, -45, -45], Duration::from_secs(1)),
    ];
    for task in sequence {
        match dispatcher.send(Some(&mut link), task, None).await {
            Reply::Ack {line, ..} => println!("acknowledged: {:?}", line.trim_end()),
            Reply::TimedOut => println!("no acknowledgment"),
        }
    }

    // rest and release the port
    let mut all = vec![link];
    dispatcher.close_all(&mut all, true).await.expect("failed to close the serial port");
}
