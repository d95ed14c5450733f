//! CSV fixtures shared by the integration tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const CHANNELS: [(&str, &str, &str); 3] = [
    ("mobile", "Mobile App", "Application mobile"),
    ("browser", "Web Browser", "Navigateur"),
    ("console", "Console", "Console"),
];

pub const STATUSES: [(&str, &str, &str); 2] = [
    ("COMPLETED", "Completed", "Terminé"),
    ("ABANDONED", "Abandoned", "Abandonné"),
];

pub const FREQUENCIES: [(&str, &str, &str); 2] = [
    ("MONTHLY", "Monthly", "Mensuel"),
    ("ANNUALLY", "Annually", "Annuel"),
];

/// Write `<dir>/<table>.csv` from a header and pre-formatted lines
pub fn write_csv(dir: &Path, table: &str, header: &str, lines: &[String]) {
    let mut content = String::from(header);
    content.push('\n');
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(dir.join(format!("{}.csv", table)), content).unwrap();
}

fn write_lookups(dir: &Path) {
    let lines = |rows: &[(&str, &str, &str)]| -> Vec<String> {
        rows.iter().map(|(c, en, fr)| format!("{},{},{}", c, en, fr)).collect()
    };
    write_csv(
        dir,
        "channel_code",
        "play_session_channel_code,english_description,french_description",
        &lines(&CHANNELS),
    );
    write_csv(
        dir,
        "status_code",
        "play_session_status_code,english_description,french_description",
        &lines(&STATUSES),
    );
    write_csv(
        dir,
        "plan_payment_frequency",
        "payment_frequency_code,english_description,french_description",
        &lines(&FREQUENCIES),
    );
    write_csv(
        dir,
        "plan",
        "plan_id,payment_frequency_code,cost_amount",
        &["1,MONTHLY,9.99".to_string(), "2,ANNUALLY,99.0".to_string()],
    );
}

/// Five users, two registered, eight sessions; session 8 belongs to unknown user 99
pub fn write_scenario(dir: &Path) {
    write_lookups(dir);

    let users: Vec<String> = (1..=5)
        .map(|id| format!("{},10.0.0.{},@player{},player{}@example.com", id, id, id, id))
        .collect();
    write_csv(dir, "user", "user_id,ip_address,social_media_handle,email", &users);

    write_csv(
        dir,
        "user_registration",
        "user_registration_id,user_id,username,email,first_name,last_name",
        &[
            "101,1,ace,ace@example.com,Ada,Lovelace".to_string(),
            "102,2,bolt,,Bo,Lee".to_string(),
        ],
    );

    write_csv(
        dir,
        "user_payment_detail",
        "payment_detail_id,payment_method_code,payment_method_value,payment_method_expiry",
        &[
            "1,CC,4111-xxxx,2027-01".to_string(),
            "2,PP,ace@example.com,".to_string(),
        ],
    );

    write_csv(
        dir,
        "user_plan",
        "user_registration_id,payment_detail_id,plan_id,start_date,end_date",
        &[
            "101,1,1,2024-01-05,2024-02-05".to_string(),
            "102,2,2,2024-03-01,9999-12-31".to_string(),
        ],
    );

    let mut sessions = Vec::new();
    for i in 1..=8 {
        let user = if i == 8 { 99 } else { (i - 1) % 5 + 1 };
        let (channel, _, _) = CHANNELS[i % CHANNELS.len()];
        sessions.push(format!(
            "{},{},2024-01-{:02} 10:00:00,2024-01-{:02} 10:45:00,{},COMPLETED,{}",
            i,
            user,
            i,
            i,
            channel,
            i * 100
        ));
    }
    write_csv(
        dir,
        "user_play_session",
        "play_session_id,user_id,start_datetime,end_datetime,channel_code,status_code,total_score",
        &sessions,
    );
}

/// A larger randomized dataset with a share of dangling references
pub fn write_random(dir: &Path, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    write_lookups(dir);

    let user_count = 60;
    let users: Vec<String> = (1..=user_count)
        .map(|id| format!("{},192.168.0.{},,user{}@example.com", id, id % 250, id))
        .collect();
    write_csv(dir, "user", "user_id,ip_address,social_media_handle,email", &users);

    let mut registrations = Vec::new();
    for user_id in 1..=user_count {
        if rng.gen_bool(0.4) {
            registrations.push(format!(
                "{},{},user{},,First{},Last{}",
                1000 + user_id,
                user_id,
                user_id,
                user_id,
                user_id
            ));
        }
    }
    write_csv(
        dir,
        "user_registration",
        "user_registration_id,user_id,username,email,first_name,last_name",
        &registrations,
    );

    let details: Vec<String> = (1..=20)
        .map(|id| format!("{},CC,card-{},2028-{:02}", id, id, id % 12 + 1))
        .collect();
    write_csv(
        dir,
        "user_payment_detail",
        "payment_detail_id,payment_method_code,payment_method_value,payment_method_expiry",
        &details,
    );

    let mut plans = Vec::new();
    for _ in 0..40 {
        // Ids above the registered range do not resolve
        let registration = 1000 + rng.gen_range(1..=user_count + 10);
        let start_month = rng.gen_range(1..=12);
        let end = if rng.gen_bool(0.3) {
            "9999-12-31".to_string()
        } else {
            format!("2025-{:02}-01", start_month)
        };
        plans.push(format!(
            "{},{},{},2024-{:02}-{:02},{}",
            registration,
            rng.gen_range(1..=22),
            rng.gen_range(1..=2),
            start_month,
            rng.gen_range(1..=28),
            end
        ));
    }
    write_csv(
        dir,
        "user_plan",
        "user_registration_id,payment_detail_id,plan_id,start_date,end_date",
        &plans,
    );

    let mut sessions = String::new();
    for id in 1..=300 {
        let user = rng.gen_range(1..=user_count + 5);
        let channel = if rng.gen_bool(0.05) {
            "fax"
        } else {
            CHANNELS[rng.gen_range(0..CHANNELS.len())].0
        };
        let (status, _, _) = STATUSES[rng.gen_range(0..STATUSES.len())];
        let month = rng.gen_range(1..=12);
        let day = rng.gen_range(1..=28);
        let minutes = rng.gen_range(1..=120);
        let _ = writeln!(
            sessions,
            "{},{},2024-{:02}-{:02} 08:00:00,2024-{:02}-{:02} {:02}:{:02}:00,{},{},{}",
            id,
            user,
            month,
            day,
            month,
            day,
            8 + minutes / 60,
            minutes % 60,
            channel,
            status,
            rng.gen_range(0..1000)
        );
    }
    let lines: Vec<String> = sessions.lines().map(String::from).collect();
    write_csv(
        dir,
        "user_play_session",
        "play_session_id,user_id,start_datetime,end_datetime,channel_code,status_code,total_score",
        &lines,
    );
}
