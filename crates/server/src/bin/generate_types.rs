use std::{env, fs};

use db::models::{
    check_in::CheckInStatus,
    pact::{PactFrequency, PactStatus, PactType},
    weekday_set::WeekdaySet,
    weekly_recap::{ParticipantRecap, RecapData},
};
use server::routes::{
    functions::{AutoFoldRequest, ReminderRequest, WeeklyRecapRequest},
    pacts::OutstandingObligation,
};
use services::services::{
    auto_fold::AutoFoldSummary, check_in_reminder::ReminderSummary, obligation::WeeklyAnchor,
    weekly_recap::RecapSummary,
};
use ts_rs::TS;
use utils::response::ApiResponse;

fn generate_types_content() -> String {
    let header = "// This file was generated by `generate_types`. Do not edit manually.\n";
    let decls = [
        WeekdaySet::decl(),
        PactFrequency::decl(),
        PactType::decl(),
        PactStatus::decl(),
        CheckInStatus::decl(),
        WeeklyAnchor::decl(),
        ParticipantRecap::decl(),
        RecapData::decl(),
        ReminderRequest::decl(),
        AutoFoldRequest::decl(),
        WeeklyRecapRequest::decl(),
        ReminderSummary::decl(),
        AutoFoldSummary::decl(),
        RecapSummary::decl(),
        OutstandingObligation::decl(),
        ApiResponse::<()>::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| format!("export {decl}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{header}\n{body}\n")
}

fn main() {
    let content = generate_types_content();
    match env::args().nth(1) {
        Some(path) => {
            if let Err(e) = fs::write(&path, content) {
                eprintln!("failed to write {path}: {e}");
                std::process::exit(1);
            }
            println!("Generated TypeScript types in {path}");
        }
        None => print!("{content}"),
    }
}
