// src/cli/weather.rs — `tripkoi weather`: forecast window check

use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

use crate::core::types::Itinerary;
use crate::core::weather::{self, Forecast, ForecastSource};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WeatherReport {
    date: NaiveDate,
    #[serde(flatten)]
    source: ForecastSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<Forecast>,
}

pub fn run_weather(date: &str, itinerary: Option<&Path>) -> anyhow::Result<()> {
    let report = build_report(date, chrono::Local::now().date_naive(), itinerary)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn build_report(date: &str, today: NaiveDate, itinerary: Option<&Path>) -> anyhow::Result<WeatherReport> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("date must be YYYY-MM-DD, got '{date}'"))?;
    let source = weather::forecast_source(date, today)?;

    let forecast = match (source.is_real_time(), itinerary) {
        (false, Some(path)) => {
            let saved: Itinerary = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            saved.average_weather.as_ref().map(Forecast::from_average)
        }
        _ => None,
    };

    Ok(WeatherReport {
        date,
        source,
        forecast,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency;
    use crate::core::weather::AverageWeather;
    use std::io::Write;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_real_time_window() {
        let report = build_report("2026-10-20", today(), None).unwrap();
        assert!(report.source.is_real_time());
        assert!(report.forecast.is_none());
    }

    #[test]
    fn test_average_from_saved_itinerary() {
        let weather = AverageWeather {
            month: 12,
            temp_high: 32.0,
            temp_low: 24.0,
            rainy_days: 3,
            ..Default::default()
        };
        let itinerary =
            Itinerary::new("방콕", &currency::resolve("방콕"), 3, vec![], Some(weather));
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&itinerary).unwrap()).unwrap();

        let report = build_report("2026-12-01", today(), Some(file.path())).unwrap();
        assert_eq!(report.source.days_ahead(), 44);
        let forecast = report.forecast.unwrap();
        assert!(!forecast.is_real_time);
        assert_eq!(forecast.temp_high, 32.0);
    }

    #[test]
    fn test_past_and_malformed_dates() {
        assert!(build_report("2026-10-01", today(), None).is_err());
        assert!(build_report("next week", today(), None).is_err());
    }
}
