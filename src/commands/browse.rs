//! List and detail views over the mirrored data

use crate::db::{CrewMember, Launch, LaunchDetail, Payload, PayloadDetail, SpaceDb};
use crate::error::{Error, Result};

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

pub async fn cmd_list_launches(db: &SpaceDb, search: Option<&str>) -> Result<Vec<Launch>> {
    db.list_launches(search).await
}

pub async fn cmd_list_payloads(db: &SpaceDb, search: Option<&str>) -> Result<Vec<Payload>> {
    db.list_payloads(search).await
}

pub async fn cmd_list_crew(db: &SpaceDb, search: Option<&str>) -> Result<Vec<CrewMember>> {
    db.list_crew(search).await
}

pub async fn cmd_show_launch(db: &SpaceDb, external_id: &str) -> Result<LaunchDetail> {
    db.launch_detail(external_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("launch {}", external_id)))
}

pub async fn cmd_show_payload(db: &SpaceDb, external_id: &str) -> Result<PayloadDetail> {
    db.payload_detail(external_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("payload {}", external_id)))
}

pub async fn cmd_show_crew(db: &SpaceDb, external_id: &str) -> Result<CrewMember> {
    db.get_crew_member(external_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("crew member {}", external_id)))
}

pub fn print_launches(launches: &[Launch]) {
    println!("\n🚀 Launches\n");

    if launches.is_empty() {
        println!("No launches mirrored. Use 'spacex-mirror ingest launches' first.");
        return;
    }

    for launch in launches {
        let flight = launch
            .flight_number
            .map(|n| format!("#{}", n))
            .unwrap_or_else(|| "#?".to_string());
        println!(
            "{:>5}  {:<24}  {}  [{}]",
            flight,
            or_dash(launch.date_utc.as_deref()),
            launch,
            launch.external_id
        );
    }
}

pub fn print_payloads(payloads: &[Payload]) {
    println!("\n🛰  Payloads\n");

    if payloads.is_empty() {
        println!("No payloads mirrored. Use 'spacex-mirror ingest payloads' first.");
        return;
    }

    for payload in payloads {
        println!(
            "• {} ({}, {}) [{}]",
            payload,
            or_dash(payload.payload_type.as_deref()),
            or_dash(payload.orbit.as_deref()),
            payload.external_id
        );
    }
}

pub fn print_crew(crew: &[CrewMember]) {
    println!("\n👩‍🚀 Crew\n");

    if crew.is_empty() {
        println!("No crew mirrored. Use 'spacex-mirror ingest crew' first.");
        return;
    }

    for member in crew {
        println!(
            "• {} ({}, {}) [{}]",
            member,
            or_dash(member.agency.as_deref()),
            or_dash(member.status.as_deref()),
            member.external_id
        );
    }
}

pub fn print_launch_detail(detail: &LaunchDetail) {
    let launch = &detail.launch;
    println!("\n🚀 {}\n", launch);
    println!("ID: {}", launch.external_id);
    if let Some(n) = launch.flight_number {
        println!("Flight: #{}", n);
    }
    println!(
        "Date (UTC): {} [{}]",
        or_dash(launch.date_utc.as_deref()),
        or_dash(launch.date_precision.as_deref())
    );
    println!("Date (local): {}", or_dash(launch.date_local.as_deref()));
    println!("Upcoming: {}", yes_no(launch.upcoming));
    println!("Success: {}", yes_no(launch.success));
    println!("Rocket: {}", or_dash(launch.rocket.as_deref()));
    println!("Launchpad: {}", or_dash(launch.launchpad.as_deref()));
    if let Some(details) = &launch.details {
        println!("\n{}", details);
    }

    let failures = launch.failures();
    if !failures.is_empty() {
        println!("\nFailures:");
        for failure in failures {
            println!("  - {}", failure);
        }
    }

    if let Some(links) = &detail.links {
        println!("\n{}", links.links);
        if let Some(webcast) = &links.links.webcast {
            println!("  Webcast: {}", webcast);
        }
        if let Some(wikipedia) = &links.links.wikipedia {
            println!("  Wikipedia: {}", wikipedia);
        }
        if let Some(patch) = &links.patch {
            println!("  {}", patch);
        }
        if let Some(reddit) = &links.reddit {
            println!("  {}", reddit);
        }
        if let Some(flickr) = &links.flickr {
            println!("  {}, {} small", flickr, flickr.small().len());
        }
    }

    println!("\nCrew ({}):", detail.crew.len());
    for member in &detail.crew {
        println!("  • {} [{}]", member, member.external_id);
    }

    println!("\nPayloads ({}):", detail.payloads.len());
    for payload in &detail.payloads {
        println!("  • {} [{}]", payload, payload.external_id);
    }

    let ships = launch.ships();
    if !ships.is_empty() {
        println!("\nShips: {}", ships.join(", "));
    }
    let capsules = launch.capsules();
    if !capsules.is_empty() {
        println!("Capsules: {}", capsules.join(", "));
    }

    println!("\nCores ({}):", detail.cores.len());
    for core in &detail.cores {
        println!(
            "  • {} landing: {} {}",
            core,
            yes_no(core.landing_success),
            or_dash(core.landing_type.as_deref())
        );
    }
}

pub fn print_payload_detail(detail: &PayloadDetail) {
    let payload = &detail.payload;
    println!("\n🛰  {}\n", payload);
    println!("ID: {}", payload.external_id);
    println!("Type: {}", or_dash(payload.payload_type.as_deref()));
    println!("Reused: {}", yes_no(payload.reused));
    println!("Launch: {}", or_dash(payload.launch.as_deref()));

    let customers = payload.customers();
    if !customers.is_empty() {
        println!("Customers: {}", customers.join(", "));
    }
    let nationalities = payload.nationalities();
    if !nationalities.is_empty() {
        println!("Nationalities: {}", nationalities.join(", "));
    }
    let manufacturers = payload.manufacturers();
    if !manufacturers.is_empty() {
        println!("Manufacturers: {}", manufacturers.join(", "));
    }
    let norad_ids = payload.norad_ids();
    if !norad_ids.is_empty() {
        let ids: Vec<String> = norad_ids.iter().map(i64::to_string).collect();
        println!("NORAD IDs: {}", ids.join(", "));
    }
    if let Some(mass) = payload.mass_kg {
        println!("Mass: {} kg", mass);
    }

    println!(
        "\nOrbit: {} ({}, {})",
        or_dash(payload.orbit.as_deref()),
        or_dash(payload.reference_system.as_deref()),
        or_dash(payload.regime.as_deref())
    );
    if let (Some(peri), Some(apo)) = (payload.periapsis_km, payload.apoapsis_km) {
        println!("  Periapsis/apoapsis: {} km / {} km", peri, apo);
    }
    if let Some(inclination) = payload.inclination_deg {
        println!("  Inclination: {}°", inclination);
    }
    if let Some(epoch) = &payload.epoch {
        println!("  Epoch: {}", epoch);
    }

    if let Some(dragon) = &detail.dragon {
        println!("\n{}", dragon);
        if let Some(seconds) = dragon.flight_time_sec {
            println!("  Flight time: {} s", seconds);
        }
        println!("  Water landing: {}", yes_no(dragon.water_landing));
        println!("  Land landing: {}", yes_no(dragon.land_landing));
    }
}

pub fn print_crew_member(member: &CrewMember) {
    println!("\n👩‍🚀 {}\n", member);
    println!("ID: {}", member.external_id);
    println!("Agency: {}", or_dash(member.agency.as_deref()));
    println!("Status: {}", or_dash(member.status.as_deref()));
    println!("Wikipedia: {}", or_dash(member.wikipedia_url.as_deref()));
    let launches = member.launches();
    if !launches.is_empty() {
        println!("Launches: {}", launches.join(", "));
    }
}
