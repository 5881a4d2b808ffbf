use std::{env, process::exit, time::Duration};

use futures::FutureExt;
use labinst_rs::{
    data::{Reading, Unit},
    equipment::{
        BaseEquipment, Equipment, equipment_from_name,
        laser::{LaserEquipment, LaserMode},
        lcr_meter::LcrMeterEquipment,
        measurement::MeasurementMode,
    },
    error::Result,
    protocol::transport_from_uri,
};
use strum::IntoEnumIterator;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        println!("Usage: ... <instrument> <uri>");
        println!("  <instrument>:");
        println!("    laser: Labs Electronics DLnsec");
        println!("    lcr: B&K Precision 891 LCR meter");
        println!("  <uri>:");
        println!("    serial:<port>[?baud=<baud>]: serial port");
        println!("    tcp://<host>:<port>: raw TCP socket");
        println!("    TCPIP::<host>::<port>::SOCKET: VISA raw socket resource");
        exit(1);
    }

    let instrument = &args[1];
    let uri = &args[2];

    let transport = transport_from_uri(uri).await?;

    match equipment_from_name(instrument, instrument.as_str(), transport)? {
        Equipment::Laser(laser) => {
            laser
                .with_session(|laser| test_laser(laser).boxed())
                .await?
        }
        Equipment::LcrMeter(lcr) => lcr.with_session(|lcr| test_lcr(lcr).boxed()).await?,
    }

    Ok(())
}

async fn test_laser(laser: &mut dyn LaserEquipment) -> Result<()> {
    println!("Testing {}", laser.label());

    println!("  error status: {:?}", laser.get_error().await?);

    for power in [0, 50, 100] {
        laser.set_power(power).await?;
        let read_back = Reading::new(Unit::Percent, laser.get_power().await?.into());
        println!("  set {power}%, read back {read_back}");
    }

    for mode in LaserMode::iter() {
        laser.set_mode(mode).await?;
        println!("  mode: {}", mode.as_ref());
    }

    laser.set_power(10).await?;
    laser.set_mode(LaserMode::Continuous).await?;
    laser.set_enabled(true).await?;
    println!("  output on at 10% for 1 s");
    sleep(Duration::from_secs(1)).await;
    laser.set_enabled(false).await?;

    Ok(())
}

async fn test_lcr(lcr: &mut dyn LcrMeterEquipment) -> Result<()> {
    println!("Testing {}", lcr.label());

    let freq = Reading::new(Unit::Frequency, lcr.get_frequency().await?);
    let level = Reading::new(Unit::Voltage, lcr.get_ac_level().await?);
    println!("  frequency: {freq}");
    println!("  AC level:  {level}");
    println!("  function:  {}", lcr.get_mode().await?);

    for mode in MeasurementMode::iter() {
        match lcr.get_measurement(mode).await {
            Err(e) => println!("  Could not measure {mode}: {e}"),
            Ok(meas) => println!("  {meas}"),
        }
    }

    Ok(())
}
