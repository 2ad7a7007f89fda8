use std::path::PathBuf;

use raco_pocket::resource::{Resource, ResourceSet};
use raco_pocket::session::refresh_progress::feedback_channel;
use raco_pocket::Session;
use raco_pocket::utils::{print_event, print_feed, print_subject_notices};

const USAGE: &str = "Usage: raco-sync <data-dir> [--force]";

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        },
    };
    let force = args.any(|a| a == "--force");

    let session = match Session::open(&data_dir) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("Unable to open session in {:?}: {}", data_dir, err);
            std::process::exit(1);
        },
    };

    let (sender, mut receiver) = feedback_channel();
    let printer = tokio::spawn(async move {
        while receiver.changed().await.is_ok() {
            println!("{}", *receiver.borrow());
        }
    });

    let success = session.refresh_all(ResourceSet::all(), force, Some(sender)).await;
    let _ = printer.await;
    if success == false {
        println!("Connection problems, showing cached data");
    }

    if let Some(profile) = session.profile() {
        println!("\nHello {}", profile.display_name());
    }

    println!("\nNotices:");
    print_subject_notices(session.notice_board().groups());

    println!("\nNews:");
    print_feed(&session.news());

    println!("\nTimetable:");
    let mut events = session.schedule(Resource::Timetable);
    events.sort_by_key(|e| e.starts_at());
    let now = chrono::Local::now().naive_local();
    for event in events.iter().filter(|e| e.starts_at().map(|s| s >= now).unwrap_or(false)).take(10) {
        print_event(event);
    }
}
