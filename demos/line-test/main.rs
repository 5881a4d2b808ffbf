use std::{env, process::exit, time::Duration};

use labinst_rs::protocol::{Channel, ChannelConfig, transport_from_uri};
use tokio::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        println!("Usage: ... <uri> [<idn query>]");
        println!("  <uri>:");
        println!("    tcp://<host>:<port>: raw TCP socket");
        println!("    TCPIP::<host>::<port>::SOCKET: VISA raw socket resource");
        println!("    serial:<port>[?baud=<baud>]: serial port");
        println!("  <idn query>: defaults to *IDN?");
        exit(1);
    }

    let uri = &args[1];
    let idn = args.get(2).map(String::as_str).unwrap_or("*IDN?");

    let mut chan = Channel::new(
        "line-test",
        transport_from_uri(uri).await?,
        ChannelConfig::default(),
    );

    let start = Instant::now();
    chan.send(idn).await?;
    let stop = Instant::now();

    println!("Send: {} ms", (stop - start).as_secs_f64() * 1000.);

    let start = Instant::now();
    let data = chan.recv().await?;
    let stop = Instant::now();

    println!("Recv: {} ms", (stop - start).as_secs_f64() * 1000.);
    println!("  Data: {data}");

    let start = Instant::now();
    chan.query(idn).await?;
    let stop = Instant::now();

    println!("Query: {} ms", (stop - start).as_secs_f64() * 1000.);

    chan.flush_rx(Duration::from_millis(100)).await?;
    let start = Instant::now();
    let resp = chan.recv().await;
    let stop = Instant::now();

    println!(
        "Recv (no data, {} ms timeout): {} ms",
        chan.config().timeout.as_millis(),
        (stop - start).as_secs_f64() * 1000.
    );
    if let Err(e) = resp {
        println!("  Error: {e}");
    }

    chan.close().await?;

    Ok(())
}
