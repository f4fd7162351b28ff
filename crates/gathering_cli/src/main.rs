//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire an explicit configuration into the core and run one headless
//!   gathering/attendee round trip with the logging notifier.
//!
//! Usage: `gathering_cli [memory|sqlite:<path>] [absolute-log-dir]`

use chrono::{Days, Local};
use gathering_core::{
    init_from_config, Attendee, AttendeeService, CoreConfig, Gathering, GatheringService,
    LogNotifier, StorageBackend, Storage,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gathering_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut config = CoreConfig::default();
    if let Some(backend) = args.next() {
        config.storage = StorageBackend::parse(&backend)?;
    }
    config.log_dir = args.next().map(PathBuf::from);
    init_from_config(&config)?;

    let storage = Storage::open(&config.storage)?;
    let gatherings = GatheringService::new(storage.gatherings.clone(), LogNotifier);
    let attendees = AttendeeService::new(
        storage.attendees.clone(),
        storage.gatherings.clone(),
        LogNotifier,
    );

    let date = Local::now().date_naive().checked_add_days(Days::new(10));
    gatherings.create(&Gathering::new("Music Festival", date, "Florence"))?;
    for gathering in gatherings.list_all()? {
        attendees.associate(Some(&Attendee::new("John", "john@x.com")), Some(&gathering))?;
    }

    println!("gathering_core version={}", gathering_core::core_version());
    for gathering in attendees.list_all_gatherings()? {
        println!(
            "gathering id={} name={} attendees={}",
            gathering.id,
            gathering.name,
            gathering.attendee_ids().len()
        );
    }
    Ok(())
}
