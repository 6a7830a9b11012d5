//! Text and JSON rendering of engine results.

use anyhow::{Context, Result};
use serde::Serialize;

use voyage_core::{ForecastSnapshot, HazardAlert, SpeedAdvisoryResult, Vessel};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")?;
    println!("{json}");
    Ok(())
}

pub fn forecast(snapshots: &[ForecastSnapshot], json: bool) -> Result<()> {
    if json {
        return print_json(snapshots);
    }

    let Some(first) = snapshots.first() else {
        println!("No forecast available.");
        return Ok(());
    };

    let at = first.key.coordinate();
    println!("Forecast for ({:.2}, {:.2})", at.lat, at.lon);
    for s in snapshots {
        let w = &s.weather;
        println!(
            "  {}  {:<14} wind {:>5.1} m/s  waves {:>4.1} m  current {:>4.1} m/s @ {:>3.0}°  vis {:>4.1} km  {:>5.1}°C",
            s.source_date(),
            w.condition.label(),
            w.wind_speed_mps,
            w.wave_height_m,
            w.current_speed_mps,
            w.current_direction_deg,
            w.visibility_km,
            w.temperature_c,
        );
    }

    Ok(())
}

pub fn advisory(vessel: &Vessel, result: &SpeedAdvisoryResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }

    let a = &result.advisory;
    let r = &a.recommendation;
    println!(
        "{} at ({:.2}, {:.2}), {}",
        vessel.name,
        a.position.lat,
        a.position.lon,
        a.timestamp.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  Recommended speed: {:.1} kn (baseline {:.1} kn)",
        r.recommended_knots, r.baseline_knots
    );
    println!("  Fuel savings:      {:+}%", r.fuel_savings_pct);
    println!("  Time impact:       {:+.1} h", r.time_impact_hours);
    println!("  {}", r.reasoning);

    Ok(())
}

pub fn alerts(alerts: &[HazardAlert], json: bool) -> Result<()> {
    if json {
        return print_json(alerts);
    }

    if alerts.is_empty() {
        println!("No active alerts.");
        return Ok(());
    }

    for alert in alerts {
        println!(
            "[{:<8}] {} ({} to {})",
            alert.severity.as_str().to_uppercase(),
            alert.title,
            alert.starts_at.format("%Y-%m-%d %H:%M"),
            alert.ends_at.format("%Y-%m-%d %H:%M"),
        );
        println!("           {}", alert.description);
    }

    Ok(())
}
