///! Some utility functions

use std::io::Write;
use std::path::Path;

use crate::aggregator::SubjectNotices;
use crate::formats::rss::FeedItem;
use crate::error::Result;
use crate::ScheduleEvent;

/// Replace the content of `path` in a single step, by writing a sibling temporary file first and renaming it
pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().to_simple()));

    let written = std::fs::File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        })
        .and_then(|_| std::fs::rename(&tmp_path, path));

    if let Err(err) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

/// A debug utility that pretty-prints notices grouped by subject
pub fn print_subject_notices(groups: &[SubjectNotices]) {
    for group in groups {
        println!("{} ({})", group.subject.name(), group.subject.id());
        for notice in &group.notices {
            print_notice(notice);
        }
    }
}

pub fn print_notice(notice: &crate::Notice) {
    let clip = if notice.attachments().is_empty() { " " } else { "@" };
    println!("    {} {}\t{}", clip, notice.pub_date(), notice.title());
}

/// A debug utility that pretty-prints a news feed
pub fn print_feed(items: &[FeedItem]) {
    for item in items {
        println!("  * {}\t{}", item.pub_date, item.title);
        println!("    {}", item.link);
    }
}

pub fn print_event(event: &ScheduleEvent) {
    let location = event.location().map(|l| format!(" [{}]", l)).unwrap_or_default();
    println!("  {} {}{}", event.start_raw().unwrap_or("?"), event.summary().unwrap_or("<no summary>"), location);
}
